// Unit tests for business logic services

pub mod extraction_properties_test;
pub mod summary_test;
