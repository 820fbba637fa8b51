//! Application layer managing the wizard and its workflows.
//!
//! This module coordinates between the domain layer and presentation layer,
//! driving step navigation, draft persistence and submission.

pub mod state;
pub mod submission;
pub mod wizard;

pub use state::*;
pub use submission::*;
pub use wizard::*;
