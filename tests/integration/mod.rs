// Integration tests for API endpoints

pub mod training_routes_test;
