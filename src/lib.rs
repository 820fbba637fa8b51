//! JOBWIZARD - Terminal Job Application Wizard Library
//!
//! A multi-step application form for the terminal, built in Rust. Answers
//! are validated step by step, kept as a draft between sessions and
//! submitted to an HTTP endpoint or a local CSV outbox.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
