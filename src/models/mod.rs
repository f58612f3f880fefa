// Data models

pub mod extracted_training_data;
pub mod training_session;
pub mod user;

pub use extracted_training_data::*;
pub use training_session::*;
pub use user::*;
