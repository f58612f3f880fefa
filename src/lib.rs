// Library exports for the fitness tracker backend
// This allows testing of internal modules

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;
