//! Application state management for the terminal wizard.
//!
//! This module wraps the [`Wizard`] with the state the terminal interface
//! needs: which field has focus, the text typed into date fields, the
//! status line and the submission running in the background.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use super::submission::{SubmissionBoundary, SubmissionError};
use super::wizard::{Advance, SubmitOutcome, Wizard};
use crate::domain::{parse_day, FieldDefinition, FieldKind, FieldValue};

/// Represents the current mode of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Filling in the form
    Form,
    /// Help screen is displayed
    Help,
}

/// Main application state containing the wizard and UI state.
pub struct App {
    /// The wizard holding record, step and errors
    pub wizard: Wizard,
    /// Current application mode
    pub mode: AppMode,
    /// Index of the focused field within the current step
    pub focused: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Raw text typed into date fields, keyed by field name
    date_inputs: HashMap<String, String>,
    boundary: Arc<dyn SubmissionBoundary>,
    pending: Option<Receiver<Result<(), SubmissionError>>>,
    /// Set when the form is cleared while a submission is in flight
    cleared_while_sending: bool,
}

impl App {
    pub fn new(wizard: Wizard, boundary: Arc<dyn SubmissionBoundary>) -> Self {
        Self {
            wizard,
            mode: AppMode::Form,
            focused: 0,
            status_message: None,
            help_scroll: 0,
            date_inputs: HashMap::new(),
            boundary,
            pending: None,
            cleared_while_sending: false,
        }
    }

    /// Definition of the field that currently has focus.
    pub fn focused_field(&self) -> Option<&FieldDefinition> {
        let name = self.wizard.current_fields().get(self.focused)?;
        self.wizard.schema().field(name)
    }

    fn focused_name_and_kind(&self) -> Option<(String, FieldKind)> {
        self.focused_field().map(|f| (f.name.clone(), f.kind.clone()))
    }

    /// Text shown in the input of `name`.
    ///
    /// Date fields show what was typed until it parses, then the stored day.
    pub fn display_value(&self, name: &str) -> String {
        if let Some(typed) = self.date_inputs.get(name) {
            return typed.clone();
        }
        self.wizard.value(name).to_display_string()
    }

    pub fn focus_next(&mut self) {
        let count = self.wizard.current_fields().len();
        if count > 0 {
            self.focused = (self.focused + 1) % count;
        }
    }

    pub fn focus_previous(&mut self) {
        let count = self.wizard.current_fields().len();
        if count > 0 {
            self.focused = (self.focused + count - 1) % count;
        }
    }

    /// Appends a character to the focused text-like field.
    pub fn type_char(&mut self, c: char) {
        self.status_message = None;
        let Some((name, kind)) = self.focused_name_and_kind() else {
            return;
        };
        match kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Phone => {
                let mut text = self.wizard.value(&name).as_text().unwrap_or_default().to_string();
                text.push(c);
                self.set(&name, FieldValue::Text(text));
            }
            FieldKind::Date => {
                let mut typed = self.display_value(&name);
                typed.push(c);
                self.set_date_input(&name, typed);
            }
            FieldKind::Enum { .. } if c == ' ' => self.cycle_option(true),
            FieldKind::Boolean if c == ' ' => self.toggle(),
            _ => {}
        }
    }

    /// Inserts pasted text into the focused text-like field, one line only.
    pub fn paste(&mut self, pasted: &str) {
        let line = pasted.lines().next().unwrap_or_default().trim();
        for c in line.chars() {
            self.type_char(c);
        }
    }

    pub fn backspace(&mut self) {
        let Some((name, kind)) = self.focused_name_and_kind() else {
            return;
        };
        match kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Phone => {
                let mut text = self.wizard.value(&name).as_text().unwrap_or_default().to_string();
                text.pop();
                self.set(&name, FieldValue::Text(text));
            }
            FieldKind::Date => {
                let mut typed = self.display_value(&name);
                typed.pop();
                self.set_date_input(&name, typed);
            }
            _ => {}
        }
    }

    /// Selects the next (or previous) option of the focused select field.
    pub fn cycle_option(&mut self, forward: bool) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let options = field.kind.options();
        if options.is_empty() {
            return;
        }
        let current = self
            .wizard
            .value(&field.name)
            .as_text()
            .and_then(|v| options.iter().position(|o| o == v));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        let name = field.name.clone();
        let value = FieldValue::Text(options[next].clone());
        self.set(&name, value);
    }

    /// Flips the focused checkbox.
    pub fn toggle(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if field.kind != FieldKind::Boolean {
            return;
        }
        let name = field.name.clone();
        let checked = self.wizard.value(&name).as_bool().unwrap_or(false);
        self.set(&name, FieldValue::Bool(!checked));
    }

    /// Enter: next step, or submission on the last step.
    pub fn next(&mut self) {
        if self.wizard.is_last_step() {
            self.start_submission();
            return;
        }
        match self.wizard.advance() {
            Advance::Moved { to } => {
                self.focused = 0;
                self.status_message = Some(format!("Step {} of {}", to, self.wizard.step_count()));
            }
            Advance::AtLastStep => {}
            Advance::Rejected { fields } => self.report_invalid(&fields),
        }
    }

    pub fn back(&mut self) {
        if self.wizard.retreat() {
            self.focused = 0;
            self.status_message = None;
        }
    }

    pub fn clear_form(&mut self) {
        self.cleared_while_sending |= self.is_submitting();
        self.wizard.reset();
        self.date_inputs.clear();
        self.focused = 0;
        self.status_message = Some("Form cleared".to_string());
    }

    /// Starts the submission on a worker thread. Ignored while one is running.
    pub fn start_submission(&mut self) {
        let record = match self.wizard.begin_submission() {
            Ok(record) => record,
            Err(SubmitOutcome::Invalid { fields }) => {
                self.report_invalid(&fields);
                return;
            }
            Err(SubmitOutcome::AlreadyPending) => {
                self.status_message = Some("Submission already in progress...".to_string());
                return;
            }
            Err(other) => {
                debug!(?other, "unexpected outcome before submission");
                return;
            }
        };

        let (tx, rx) = mpsc::channel();
        let boundary = Arc::clone(&self.boundary);
        thread::spawn(move || {
            let _ = tx.send(boundary.submit(&record));
        });
        self.pending = Some(rx);
        self.status_message = Some("Sending application...".to_string());
    }

    /// Picks up the result of a background submission, if it has arrived.
    pub fn poll_submission(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(SubmissionError::WorkerLost),
        };
        self.pending = None;
        let cleared = std::mem::take(&mut self.cleared_while_sending);

        match self.wizard.finish_submission(result) {
            SubmitOutcome::Submitted => {
                self.date_inputs.clear();
                self.focused = 0;
                self.status_message = Some("Application sent successfully!".to_string());
            }
            SubmitOutcome::Failed { reason } if cleared => {
                self.status_message = Some(format!(
                    "Submission failed: {}. The form was cleared while sending",
                    reason
                ));
            }
            SubmitOutcome::Failed { reason } => {
                self.status_message = Some(format!(
                    "Submission failed: {}. Your answers are kept, press Enter to retry",
                    reason
                ));
            }
            _ => {}
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    fn set(&mut self, name: &str, value: FieldValue) {
        if let Err(e) = self.wizard.set_field(name, value) {
            self.status_message = Some(e.to_string());
        }
    }

    fn set_date_input(&mut self, name: &str, typed: String) {
        let value = parse_day(&typed).map(FieldValue::Date).unwrap_or(FieldValue::Unset);
        if matches!(value, FieldValue::Date(_)) || typed.is_empty() {
            self.date_inputs.remove(name);
        } else {
            self.date_inputs.insert(name.to_string(), typed);
        }
        self.set(name, value);
    }

    fn report_invalid(&mut self, fields: &[String]) {
        if let Some(index) = self
            .wizard
            .current_fields()
            .iter()
            .position(|name| fields.contains(name))
        {
            self.focused = index;
        }
        self.status_message = Some("Please fill in all required fields".to_string());
    }
}
