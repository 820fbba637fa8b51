pub mod models;
pub mod schema;
pub mod steps;
pub mod errors;
pub mod job_application;

pub use models::*;
pub use schema::*;
pub use steps::*;
pub use errors::*;
