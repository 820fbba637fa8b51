//! Command-line and environment configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;

use super::submission::{CsvOutbox, HttpSubmitter};
use crate::application::{SubmissionBoundary, SubmissionError};

#[derive(Debug, Clone, Parser)]
#[command(name = "jobwizard", version, about = "Step-by-step driver job application")]
pub struct Config {
    /// Directory holding the saved application draft
    #[arg(long, env = "JOBWIZARD_DRAFT_DIR")]
    pub draft_dir: Option<PathBuf>,

    /// HTTP endpoint that receives finished applications
    #[arg(long, env = "JOBWIZARD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// CSV file collecting applications when no endpoint is configured
    #[arg(long, env = "JOBWIZARD_OUTBOX", default_value = "applications.csv")]
    pub outbox: PathBuf,

    /// Log file (the terminal is used by the interface)
    #[arg(long, env = "JOBWIZARD_LOG_FILE", default_value = "jobwizard.log")]
    pub log_file: PathBuf,

    /// Timeout for a submission request, in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

impl Config {
    /// The configured draft directory, else the platform data directory, else `.`.
    pub fn draft_dir(&self) -> PathBuf {
        self.draft_dir
            .clone()
            .or_else(|| ProjectDirs::from("pl", "europegaz", "jobwizard").map(|d| d.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// HTTP submission when an endpoint is set, the CSV outbox otherwise.
    pub fn boundary(&self) -> Result<Arc<dyn SubmissionBoundary>, SubmissionError> {
        match &self.endpoint {
            Some(endpoint) => Ok(Arc::new(HttpSubmitter::new(endpoint.clone(), self.timeout())?)),
            None => Ok(Arc::new(CsvOutbox::new(self.outbox.clone()))),
        }
    }
}
