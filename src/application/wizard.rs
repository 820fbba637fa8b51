//! Multi-step application wizard.
//!
//! The wizard owns the draft record, the current step and the per-field
//! errors. Moving forward is gated on the current step's fields passing
//! validation; moving back never validates. Every edit is written to the
//! draft store so an interrupted application can be resumed, and a
//! restored draft always starts again at step 1.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::submission::{SubmissionBoundary, SubmissionError};
use crate::domain::job_application;
use crate::domain::{
    DraftRecord, FieldError, FieldSchema, FieldValue, SchemaResult, StepDefinition, StepPartition,
};
use crate::infrastructure::{DraftSlot, DraftStore};

/// Result of asking the wizard to move to the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The current step was valid and the wizard moved to step `to`.
    Moved { to: usize },
    /// The current step was valid but it is already the last one.
    AtLastStep,
    /// Some fields of the current step failed; the step did not change.
    Rejected { fields: Vec<String> },
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The boundary accepted the record; the wizard was reset.
    Submitted,
    /// The record failed validation; the boundary was not called.
    Invalid { fields: Vec<String> },
    /// The boundary reported a failure; record and draft are untouched.
    Failed { reason: String },
    /// Another submission is still in flight.
    AlreadyPending,
}

pub struct Wizard {
    schema: Arc<FieldSchema>,
    steps: StepPartition,
    store: DraftStore,
    clock: fn() -> DateTime<Utc>,
    current_step: usize,
    record: DraftRecord,
    field_errors: BTreeMap<String, String>,
    submission_pending: bool,
}

impl Wizard {
    /// Builds a wizard over `schema` split into `steps`, restoring any draft
    /// found in `slot` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::domain::SchemaError`] if the steps do not cover
    /// the schema exactly once each.
    pub fn new(
        schema: FieldSchema,
        steps: Vec<StepDefinition>,
        slot: Box<dyn DraftSlot>,
        key: &str,
    ) -> SchemaResult<Self> {
        let steps = StepPartition::new(&schema, steps)?;
        let schema = Arc::new(schema);
        let store = DraftStore::new(slot, key, Arc::clone(&schema));

        let mut record = schema.defaults();
        if let Some(draft) = store.load() {
            for (name, value) in draft.iter() {
                record.insert(name, value.clone());
            }
            info!(fields = draft.len(), "resuming saved application draft");
        }

        Ok(Self {
            schema,
            steps,
            store,
            clock: Utc::now,
            current_step: 1,
            record,
            field_errors: BTreeMap::new(),
            submission_pending: false,
        })
    }

    /// The driver job-application wizard.
    pub fn job_application(slot: Box<dyn DraftSlot>) -> SchemaResult<Self> {
        Self::new(
            job_application::schema()?,
            job_application::steps(),
            slot,
            job_application::STORAGE_KEY,
        )
    }

    /// Replaces the source of "now" used by date rules.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn steps(&self) -> &StepPartition {
        &self.steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.steps.len()
    }

    pub fn current_step_definition(&self) -> Option<&StepDefinition> {
        self.steps.step(self.current_step)
    }

    pub fn current_fields(&self) -> &[String] {
        self.steps.fields_of(self.current_step)
    }

    pub fn record(&self) -> &DraftRecord {
        &self.record
    }

    pub fn value(&self, name: &str) -> &FieldValue {
        self.record.get(name)
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }

    pub fn is_submission_pending(&self) -> bool {
        self.submission_pending
    }

    /// Stores `value` under `name` and writes the draft.
    ///
    /// A field that currently shows an error is re-checked so that stale
    /// messages disappear once the input is fixed.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        self.schema.check_assignable(name, &value)?;
        self.record.insert(name, value);

        if self.field_errors.contains_key(name) {
            let now = (self.clock)();
            match self.schema.validate_at(name, self.record.get(name), now) {
                Ok(()) => {
                    self.field_errors.remove(name);
                }
                Err(message) => {
                    self.field_errors.insert(name.to_string(), message);
                }
            }
        }

        debug!(field = name, "field updated");
        self.persist();
        Ok(())
    }

    pub fn advance(&mut self) -> Advance {
        let now = (self.clock)();
        let names = self.steps.fields_of(self.current_step);
        let errors = self
            .schema
            .validate_fields_at(names.iter().map(String::as_str), &self.record, now);

        for name in names {
            self.field_errors.remove(name);
        }

        if !errors.is_empty() {
            let fields: Vec<String> = names
                .iter()
                .filter(|name| errors.contains_key(*name))
                .cloned()
                .collect();
            debug!(step = self.current_step, ?fields, "step rejected");
            self.field_errors.extend(errors);
            return Advance::Rejected { fields };
        }

        if self.current_step < self.steps.len() {
            self.current_step += 1;
            debug!(step = self.current_step, "moved to next step");
            Advance::Moved { to: self.current_step }
        } else {
            Advance::AtLastStep
        }
    }

    /// Moves back one step without validating. Returns whether the step changed.
    pub fn retreat(&mut self) -> bool {
        if self.current_step > 1 {
            self.current_step -= 1;
            debug!(step = self.current_step, "moved to previous step");
            true
        } else {
            false
        }
    }

    /// Back to step 1 with default values and an empty draft store.
    pub fn reset(&mut self) {
        self.record = self.schema.defaults();
        self.current_step = 1;
        self.field_errors.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear application draft");
        }
        debug!("wizard reset");
    }

    /// Validates the whole record and marks a submission as in flight.
    ///
    /// Returns the record to hand to the boundary, or the outcome that
    /// stops the submission before it starts. Finish with
    /// [`Wizard::finish_submission`].
    pub fn begin_submission(&mut self) -> Result<DraftRecord, SubmitOutcome> {
        if self.submission_pending {
            debug!("ignoring duplicate submission");
            return Err(SubmitOutcome::AlreadyPending);
        }

        let now = (self.clock)();
        let errors = self.schema.validate_all_at(&self.record, now);
        if !errors.is_empty() {
            let fields: Vec<String> = self
                .schema
                .names()
                .filter(|name| errors.contains_key(*name))
                .map(str::to_string)
                .collect();
            debug!(?fields, "submission blocked by invalid fields");
            self.field_errors = errors;
            return Err(SubmitOutcome::Invalid { fields });
        }

        self.field_errors.clear();
        self.submission_pending = true;
        info!("submitting application");
        Ok(self.record.clone())
    }

    /// Applies the boundary's answer to a submission started with
    /// [`Wizard::begin_submission`].
    pub fn finish_submission(&mut self, result: Result<(), SubmissionError>) -> SubmitOutcome {
        self.submission_pending = false;
        match result {
            Ok(()) => {
                info!("application submitted");
                self.reset();
                SubmitOutcome::Submitted
            }
            Err(e) => {
                warn!(error = %e, "application submission failed");
                SubmitOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    /// Validates and submits in one blocking call.
    pub fn submit(&mut self, boundary: &dyn SubmissionBoundary) -> SubmitOutcome {
        match self.begin_submission() {
            Ok(record) => {
                let result = boundary.submit(&record);
                self.finish_submission(result)
            }
            Err(outcome) => outcome,
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.record) {
            warn!(error = %e, "could not save application draft");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job_application::*;
    use crate::domain::{FieldDefinition, FieldKind, SchemaError};
    use crate::infrastructure::MemorySlot;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 15, 9, 0, 0).unwrap()
    }

    fn wizard(slot: &MemorySlot) -> Wizard {
        Wizard::job_application(Box::new(slot.clone()))
            .unwrap()
            .with_clock(fixed_now)
    }

    fn fill_step_one(wizard: &mut Wizard) {
        wizard.set_field(FIRST_NAME, FieldValue::text("Oleh")).unwrap();
        wizard.set_field(EMAIL, FieldValue::text("oleh@example.com")).unwrap();
        wizard.set_field(PHONE, FieldValue::text("+380 67 123 45 67")).unwrap();
    }

    fn fill_step_three(wizard: &mut Wizard, consent: bool) {
        wizard.set_field(START_DATE, FieldValue::day(2030, 7, 1).unwrap()).unwrap();
        wizard.set_field(CONSENT, FieldValue::Bool(consent)).unwrap();
    }

    struct RecordingBoundary {
        fail: bool,
        calls: Mutex<Vec<DraftRecord>>,
    }

    impl RecordingBoundary {
        fn new(fail: bool) -> Self {
            Self { fail, calls: Mutex::new(Vec::new()) }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl SubmissionBoundary for RecordingBoundary {
        fn submit(&self, record: &DraftRecord) -> Result<(), SubmissionError> {
            self.calls.lock().unwrap().push(record.clone());
            if self.fail {
                Err(SubmissionError::Status { status: 503 })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let wizard = wizard(&MemorySlot::new());
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.step_count(), 3);
        assert_eq!(wizard.record(), &wizard.schema().defaults());
        assert!(wizard.field_errors().is_empty());
        assert!(!wizard.is_submission_pending());
    }

    #[test]
    fn test_construction_rejects_broken_partition() {
        let schema = FieldSchema::new(vec![
            FieldDefinition::new("a", "A", FieldKind::Text),
            FieldDefinition::new("b", "B", FieldKind::Text),
        ])
        .unwrap();
        let result = Wizard::new(
            schema,
            vec![StepDefinition::new(1, "Only", &["a"])],
            Box::new(MemorySlot::new()),
            "k",
        );
        assert!(matches!(result, Err(SchemaError::UnassignedField { field }) if field == "b"));
    }

    #[test]
    fn test_set_field_rejects_unknown_and_mistyped() {
        let mut wizard = wizard(&MemorySlot::new());
        assert_eq!(
            wizard.set_field("nickname", FieldValue::text("x")),
            Err(FieldError::UnknownField("nickname".into()))
        );
        assert!(wizard.set_field(CONSENT, FieldValue::text("yes")).is_err());
        assert!(!wizard.record().contains("nickname"));
        assert_eq!(wizard.value(CONSENT), &FieldValue::Bool(false));
    }

    #[test]
    fn test_set_field_saves_draft() {
        let slot = MemorySlot::new();
        let mut wizard = wizard(&slot);
        wizard.set_field(FIRST_NAME, FieldValue::text("Oleh")).unwrap();
        assert_eq!(slot.payload(STORAGE_KEY).as_deref(), Some(r#"{"first_name":"Oleh"}"#));
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn test_advance_rejected_when_step_invalid() {
        let mut wizard = wizard(&MemorySlot::new());
        wizard.set_field(FIRST_NAME, FieldValue::text("Oleh")).unwrap();
        wizard.set_field(EMAIL, FieldValue::text("not-an-email")).unwrap();

        let result = wizard.advance();
        assert_eq!(
            result,
            Advance::Rejected { fields: vec![EMAIL.to_string(), PHONE.to_string()] }
        );
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.error_for(EMAIL).is_some());
        assert!(wizard.error_for(PHONE).is_some());
        assert!(wizard.error_for(FIRST_NAME).is_none());
        assert!(wizard.error_for(CONSENT).is_none());
    }

    #[test]
    fn test_advance_only_checks_current_step() {
        let mut wizard = wizard(&MemorySlot::new());
        fill_step_one(&mut wizard);
        assert_eq!(wizard.advance(), Advance::Moved { to: 2 });
        assert_eq!(wizard.advance(), Advance::Moved { to: 3 });
        assert!(wizard.field_errors().is_empty());
    }

    #[test]
    fn test_advance_on_last_step_is_navigation_noop() {
        let mut wizard = wizard(&MemorySlot::new());
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        fill_step_three(&mut wizard, true);
        assert_eq!(wizard.advance(), Advance::AtLastStep);
        assert_eq!(wizard.current_step(), 3);
    }

    #[test]
    fn test_fixing_a_field_clears_its_error() {
        let mut wizard = wizard(&MemorySlot::new());
        wizard.advance();
        assert!(wizard.error_for(EMAIL).is_some());

        wizard.set_field(EMAIL, FieldValue::text("oleh@")).unwrap();
        assert_eq!(wizard.error_for(EMAIL), Some("Invalid email address"));

        wizard.set_field(EMAIL, FieldValue::text("oleh@example.com")).unwrap();
        assert!(wizard.error_for(EMAIL).is_none());
        assert!(wizard.error_for(PHONE).is_some());
    }

    #[test]
    fn test_retreat_bounds_and_keeps_data() {
        let mut wizard = wizard(&MemorySlot::new());
        assert!(!wizard.retreat());
        assert_eq!(wizard.current_step(), 1);

        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.set_field(CODE_95, FieldValue::text("")).unwrap();
        assert!(wizard.retreat());
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.value(FIRST_NAME), &FieldValue::text("Oleh"));
        assert_eq!(wizard.value(CODE_95), &FieldValue::text(""));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let slot = MemorySlot::new();
        let mut wizard = wizard(&slot);
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();

        wizard.reset();
        let once = (wizard.current_step(), wizard.record().clone(), wizard.field_errors().clone());
        wizard.reset();
        let twice = (wizard.current_step(), wizard.record().clone(), wizard.field_errors().clone());

        assert_eq!(once, twice);
        assert_eq!(once.0, 1);
        assert_eq!(once.1, wizard.schema().defaults());
        assert!(slot.payload(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_reload_restores_values_at_step_one() {
        let slot = MemorySlot::new();
        {
            let mut first = wizard(&slot);
            fill_step_one(&mut first);
            first.advance();
            first.set_field(HAS_EXPERIENCE, FieldValue::text("ДА")).unwrap();
            first.advance();
            assert_eq!(first.current_step(), 3);
        }

        let resumed = wizard(&slot);
        assert_eq!(resumed.current_step(), 1);
        assert_eq!(resumed.value(FIRST_NAME), &FieldValue::text("Oleh"));
        assert_eq!(resumed.value(HAS_EXPERIENCE), &FieldValue::text("ДА"));
        assert_eq!(resumed.value(CITIZENSHIP), &FieldValue::text("УКРАИНА"));
    }

    #[test]
    fn test_stale_draft_starts_from_defaults() {
        let slot = MemorySlot::new();
        slot.write(STORAGE_KEY, r#"{"first_name":"Oleh","code_95":""}"#).unwrap();
        let wizard = wizard(&slot);
        assert_eq!(wizard.record(), &wizard.schema().defaults());
        assert!(slot.payload(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_submit_without_consent_is_blocked() {
        let mut wizard = wizard(&MemorySlot::new());
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        fill_step_three(&mut wizard, false);

        let boundary = RecordingBoundary::new(false);
        let outcome = wizard.submit(&boundary);
        assert_eq!(outcome, SubmitOutcome::Invalid { fields: vec![CONSENT.to_string()] });
        assert_eq!(wizard.current_step(), 3);
        assert!(wizard.error_for(CONSENT).is_some());
        assert_eq!(boundary.call_count(), 0);
    }

    #[test]
    fn test_successful_submit_resets_and_clears_draft() {
        let slot = MemorySlot::new();
        let mut wizard = wizard(&slot);
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        fill_step_three(&mut wizard, true);

        let boundary = RecordingBoundary::new(false);
        assert_eq!(wizard.submit(&boundary), SubmitOutcome::Submitted);
        assert_eq!(boundary.call_count(), 1);
        let sent = boundary.calls.lock().unwrap()[0].clone();
        assert_eq!(sent.get(EMAIL), &FieldValue::text("oleh@example.com"));
        assert_eq!(sent.len(), 10);

        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.record(), &wizard.schema().defaults());
        assert!(slot.payload(STORAGE_KEY).is_none());
        assert!(!wizard.is_submission_pending());
    }

    #[test]
    fn test_failed_submit_keeps_record_and_draft() {
        let slot = MemorySlot::new();
        let mut wizard = wizard(&slot);
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        fill_step_three(&mut wizard, true);
        let stored = slot.payload(STORAGE_KEY);

        let boundary = RecordingBoundary::new(true);
        let outcome = wizard.submit(&boundary);
        assert!(matches!(outcome, SubmitOutcome::Failed { ref reason } if reason.contains("503")));
        assert_eq!(wizard.value(EMAIL), &FieldValue::text("oleh@example.com"));
        assert_eq!(wizard.current_step(), 3);
        assert_eq!(slot.payload(STORAGE_KEY), stored);
        assert!(stored.is_some());

        assert_eq!(wizard.submit(&RecordingBoundary::new(false)), SubmitOutcome::Submitted);
    }

    #[test]
    fn test_duplicate_submission_is_ignored_while_pending() {
        let mut wizard = wizard(&MemorySlot::new());
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        fill_step_three(&mut wizard, true);

        let record = wizard.begin_submission().unwrap();
        assert_eq!(record.get(FIRST_NAME), &FieldValue::text("Oleh"));
        assert!(wizard.is_submission_pending());
        assert_eq!(wizard.begin_submission(), Err(SubmitOutcome::AlreadyPending));

        let boundary = RecordingBoundary::new(false);
        assert_eq!(wizard.submit(&boundary), SubmitOutcome::AlreadyPending);
        assert_eq!(boundary.call_count(), 0);

        assert!(wizard.retreat());
        wizard.set_field(FIRST_NAME, FieldValue::text("Taras")).unwrap();
        assert_eq!(wizard.current_step(), 2);

        assert_eq!(
            wizard.finish_submission(Err(SubmissionError::WorkerLost)),
            SubmitOutcome::Failed { reason: SubmissionError::WorkerLost.to_string() }
        );
        assert!(!wizard.is_submission_pending());
        assert_eq!(wizard.value(FIRST_NAME), &FieldValue::text("Taras"));
    }

    #[test]
    fn test_past_start_date_blocks_step_three() {
        let mut wizard = wizard(&MemorySlot::new());
        fill_step_one(&mut wizard);
        wizard.advance();
        wizard.advance();
        wizard.set_field(START_DATE, FieldValue::day(2030, 6, 14).unwrap()).unwrap();
        wizard.set_field(CONSENT, FieldValue::Bool(true)).unwrap();
        assert_eq!(wizard.advance(), Advance::Rejected { fields: vec![START_DATE.to_string()] });
    }

    proptest! {
        #[test]
        fn prop_navigation_stays_in_bounds(moves in proptest::collection::vec(any::<bool>(), 0..40)) {
            let mut wizard = wizard(&MemorySlot::new());
            fill_step_one(&mut wizard);
            fill_step_three(&mut wizard, true);
            for forward in moves {
                let before = wizard.current_step();
                if forward {
                    wizard.advance();
                    prop_assert_eq!(wizard.current_step(), (before + 1).min(3));
                } else {
                    wizard.retreat();
                    prop_assert_eq!(wizard.current_step(), before.saturating_sub(1).max(1));
                }
            }
        }

        #[test]
        fn prop_invalid_step_never_advances(moves in proptest::collection::vec(any::<bool>(), 0..20)) {
            let mut wizard = wizard(&MemorySlot::new());
            for forward in moves {
                if forward {
                    prop_assert!(
                        matches!(wizard.advance(), Advance::Rejected { .. }),
                        "empty step one must never pass"
                    );
                } else {
                    wizard.retreat();
                }
                prop_assert_eq!(wizard.current_step(), 1);
            }
        }
    }
}
