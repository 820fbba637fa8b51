use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Day format used when dates are typed or shown to the applicant.
pub const DAY_FORMAT: &str = "%d.%m.%Y";

static UNSET: FieldValue = FieldValue::Unset;

/// Current value of a single form field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Unset,
    Text(String),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Builds a date value at midnight UTC of the given calendar day.
    pub fn day(year: i32, month: u32, day: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(FieldValue::Date(date.and_hms_opt(0, 0, 0)?.and_utc()))
    }

    /// Unset, or a text value with no characters at all.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Unset => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Flat string form used for CSV rows. Dates use the timestamp format.
    pub fn to_plain_string(&self) -> String {
        match self {
            FieldValue::Unset => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => format_timestamp(d),
        }
    }

    /// Short form for the terminal; dates are shown as `dd.mm.yyyy`.
    pub fn to_display_string(&self) -> String {
        match self {
            FieldValue::Date(d) => d.format(DAY_FORMAT).to_string(),
            other => other.to_plain_string(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Unset => serializer.serialize_none(),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Date(d) => serializer.serialize_str(&format_timestamp(d)),
        }
    }
}

/// Timestamp with millisecond precision and a `Z` suffix, e.g. `2025-01-02T00:00:00.000Z`.
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Parses a typed `dd.mm.yyyy` day into midnight UTC.
pub fn parse_day(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    // a complete day only: chrono would accept "01.07.2" as year 2
    if input.len() != "dd.mm.yyyy".len() {
        return None;
    }
    let date = NaiveDate::parse_from_str(input, DAY_FORMAT).ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// In-progress application: field name to current value.
///
/// Only the schema and the wizard create records, so a record never holds
/// a key that the schema does not define.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct DraftRecord {
    values: BTreeMap<String, FieldValue>,
}

impl DraftRecord {
    pub fn get(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&UNSET)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }
}
