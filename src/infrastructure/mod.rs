//! Infrastructure layer providing external service integrations.
//!
//! This module contains the draft slots, the submission boundaries and the
//! process-level concerns (configuration, logging, clipboard).

pub mod persistence;
pub mod submission;
pub mod config;
pub mod logging;
pub mod clipboard;

pub use persistence::*;
pub use submission::*;
pub use config::*;
pub use logging::*;
pub use clipboard::*;
