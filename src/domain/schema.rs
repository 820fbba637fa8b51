//! Declarative field schema and validation.
//!
//! A [`FieldSchema`] lists every field of the application form together with
//! its kind, default and validity rule. Validation is a pure function of the
//! field definition, the value and the instant of validation.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::errors::{FieldError, SchemaError, SchemaResult};
use super::models::{DraftRecord, FieldValue};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        // dot-separated local atoms; domain labels ending in an alphabetic TLD
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .unwrap()
});

/// Kind of input a field holds.
///
/// Text, email, phone and enum fields carry `FieldValue::Text`; boolean
/// fields carry `FieldValue::Bool`; date fields carry `FieldValue::Date`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    /// Free-form contact (phone or messenger handle); any text is accepted.
    Phone,
    Enum { options: Vec<String> },
    Date,
    Boolean,
}

impl FieldKind {
    /// Whether `value` has the right shape for this kind. `Unset` always fits.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Unset) => true,
            (FieldKind::Boolean, FieldValue::Bool(_)) => true,
            (FieldKind::Date, FieldValue::Date(_)) => true,
            (FieldKind::Boolean | FieldKind::Date, _) => false,
            (_, FieldValue::Text(_)) => true,
            _ => false,
        }
    }

    pub fn value_label(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            _ => "text",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            FieldKind::Enum { options } => options,
            _ => &[],
        }
    }
}

/// Extra rule evaluated on top of the kind checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Date must fall on today's calendar day or later, "today" being the
    /// instant of validation.
    NotBeforeToday,
    /// Boolean must be `true` (legal consent). `false` and unset both fail.
    MustBeTrue,
}

/// Declarative description of one form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: FieldValue,
    pub constraint: Option<Constraint>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            default: FieldValue::Unset,
            constraint: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: FieldValue) -> Self {
        self.default = value;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Validates `value` for this field as of `now`.
    pub fn check(&self, value: &FieldValue, now: DateTime<Utc>) -> Result<(), String> {
        if !self.kind.accepts(value) {
            return Err(format!("Expected a {} value", self.kind.value_label()));
        }

        if self.required && value.is_empty() {
            return Err(format!("{} is required", self.label));
        }

        if let FieldValue::Text(text) = value {
            if !text.is_empty() {
                match &self.kind {
                    FieldKind::Email if !EMAIL.is_match(text) => {
                        return Err("Invalid email address".to_string());
                    }
                    FieldKind::Enum { options } if !options.iter().any(|o| o == text) => {
                        return Err("Choose one of the offered options".to_string());
                    }
                    _ => {}
                }
            }
        }

        match self.constraint {
            Some(Constraint::MustBeTrue) if value.as_bool() != Some(true) => {
                Err("Consent to data processing is required".to_string())
            }
            Some(Constraint::NotBeforeToday) => match value.as_date() {
                Some(date) if date.date_naive() < now.date_naive() => {
                    Err("Date cannot be in the past".to_string())
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// Ordered set of field definitions with unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDefinition>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if !field.kind.accepts(&field.default) {
                return Err(SchemaError::InvalidDefault(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A record holding every field at its default value.
    pub fn defaults(&self) -> DraftRecord {
        let mut record = DraftRecord::default();
        for field in &self.fields {
            record.insert(field.name.clone(), field.default.clone());
        }
        record
    }

    /// Checks that `value` may be stored under `name` at all.
    pub fn check_assignable(&self, name: &str, value: &FieldValue) -> Result<(), FieldError> {
        let field = self
            .field(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        if field.kind.accepts(value) {
            Ok(())
        } else {
            Err(FieldError::KindMismatch {
                field: name.to_string(),
                expected: field.kind.value_label(),
            })
        }
    }

    pub fn validate(&self, name: &str, value: &FieldValue) -> Result<(), String> {
        self.validate_at(name, value, Utc::now())
    }

    pub fn validate_at(&self, name: &str, value: &FieldValue, now: DateTime<Utc>) -> Result<(), String> {
        match self.field(name) {
            Some(field) => field.check(value, now),
            None => Err(format!("Unknown field: {}", name)),
        }
    }

    /// Validates the named fields of `record`, returning messages for the failing ones.
    pub fn validate_fields_at<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        record: &DraftRecord,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        names
            .into_iter()
            .filter_map(|name| {
                self.validate_at(name, record.get(name), now)
                    .err()
                    .map(|message| (name.to_string(), message))
            })
            .collect()
    }

    /// Errors of every failing field in `record`, keyed by field name.
    pub fn validate_all(&self, record: &DraftRecord) -> BTreeMap<String, String> {
        self.validate_all_at(record, Utc::now())
    }

    pub fn validate_all_at(&self, record: &DraftRecord, now: DateTime<Utc>) -> BTreeMap<String, String> {
        self.validate_fields_at(self.names(), record, now)
    }
}
