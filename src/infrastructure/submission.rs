//! Submission boundaries: an HTTP intake endpoint and a local CSV outbox.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use tracing::debug;

use crate::application::{SubmissionBoundary, SubmissionError};
use crate::domain::{format_timestamp, DraftRecord};

/// POSTs the full record as a JSON object. Any non-2xx answer is a failure.
pub struct HttpSubmitter {
    client: Client,
    endpoint: String,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SubmissionError::Transport)?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SubmissionBoundary for HttpSubmitter {
    fn submit(&self, record: &DraftRecord) -> Result<(), SubmissionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .map_err(SubmissionError::Transport)?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, %status, "intake endpoint answered");
        if status.is_success() {
            Ok(())
        } else {
            Err(SubmissionError::Status { status: status.as_u16() })
        }
    }
}

/// Appends each submitted record as one CSV row, prefixed with the time of
/// submission. The header is written when the file is new or empty.
pub struct CsvOutbox {
    path: PathBuf,
}

impl CsvOutbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn outbox_error(&self, source: csv::Error) -> SubmissionError {
        SubmissionError::Outbox { path: self.path.clone(), source }
    }

    fn append(&self, record: &DraftRecord) -> Result<(), csv::Error> {
        let fresh = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if fresh {
            let mut header = vec!["submitted_at"];
            header.extend(record.iter().map(|(name, _)| name));
            writer.write_record(&header)?;
        }

        let mut row = vec![format_timestamp(&Utc::now())];
        row.extend(record.iter().map(|(_, value)| value.to_plain_string()));
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }
}

impl SubmissionBoundary for CsvOutbox {
    fn submit(&self, record: &DraftRecord) -> Result<(), SubmissionError> {
        self.append(record).map_err(|e| self.outbox_error(e))?;
        debug!(path = %self.path.display(), "application written to outbox");
        Ok(())
    }
}
