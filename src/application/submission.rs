//! Contract of the system that receives finished applications.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DraftRecord;

/// Any failure reported by a submission boundary. Callers treat every
/// variant the same way: the record is kept and the user may retry.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("could not reach the intake endpoint: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("intake endpoint answered with status {status}")]
    Status { status: u16 },

    #[error("could not write outbox {path}: {source}")]
    Outbox {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("submission worker stopped before reporting a result")]
    WorkerLost,
}

/// Accepts a fully validated record.
///
/// Implementations may block (network, disk); the terminal front end calls
/// them from a worker thread.
pub trait SubmissionBoundary: Send + Sync {
    fn submit(&self, record: &DraftRecord) -> Result<(), SubmissionError>;
}
