//! The driver job-application form: fields, defaults and steps.
//!
//! Option values are sent verbatim to the intake endpoint, so they keep the
//! exact spelling the receiving side expects.

use super::errors::SchemaResult;
use super::models::FieldValue;
use super::schema::{Constraint, FieldDefinition, FieldKind, FieldSchema};
use super::steps::StepDefinition;

/// Key of the draft slot.
pub const STORAGE_KEY: &str = "jobApplicationForm";

pub const FIRST_NAME: &str = "first_name";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const CITIZENSHIP: &str = "citizenship";
pub const HAS_EXPERIENCE: &str = "has_experience";
pub const CODE_95: &str = "code_95";
pub const LICENSE_YEAR: &str = "license_year";
pub const START_DATE: &str = "date-197";
pub const RESIDENCE_DOCUMENTS: &str = "residence_documents";
pub const CONSENT: &str = "acceptance-979";

const CITIZENSHIPS: &[&str] = &[
    "УКРАИНА",
    "БЕЛАРУСЬ",
    "МОЛДОВА",
    "КАЗАХСТАН",
    "УЗБЕКИСТАН",
    "КИРГИЗСТАН",
    "ТАДЖИКИСТАН",
    "ТУРКМЕНИСТАН",
    "ГРУЗИЯ",
    "АЗЕРБАЙДЖАН",
    "АРМЕНИЯ",
    "ДРУГОЕ",
];

const EXPERIENCE: &[&str] = &["НЕТ", "ДА"];

const CODE_95_OPTIONS: &[&str] = &["НЕТ", "ДА, ПОЛЬСКИЙ", "ДА, ДРУГОЙ СТРАНЫ ЕС"];

const LICENSE_YEARS: &[&str] = &["ПОСЛЕ 09.09.2009 Г", "ДО 09.09.2009 Г"];

const RESIDENCE: &[&str] = &[
    "ВИЗА ПОЛЬША",
    "ВИЗА ДРУГАЯ СТРАНА ЕС",
    "ВНЖ (КАРТА ПОБЫТУ ПОЛЬША)",
    "ВНЖ (ДРУГАЯ СТРАНА ЕС)",
    "ГРАЖДАНСТВО ОДНОЙ ИЗ СТРАН ЕС",
    "ТРЕБУЕТСЯ ПРИГЛАШЕНИЕ ДЛЯ ИЗГОТОВЛЕНИЯ ВИЗЫ",
    "ДРУГОЕ",
];

fn select(name: &str, label: &str, options: &[&str]) -> FieldDefinition {
    let options: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let default = options.first().cloned().map(FieldValue::Text).unwrap_or_default();
    FieldDefinition::new(name, label, FieldKind::Enum { options })
        .required()
        .default_value(default)
}

pub fn schema() -> SchemaResult<FieldSchema> {
    FieldSchema::new(vec![
        FieldDefinition::new(FIRST_NAME, "First name", FieldKind::Text).required(),
        FieldDefinition::new(EMAIL, "Email", FieldKind::Email).required(),
        FieldDefinition::new(PHONE, "WhatsApp number", FieldKind::Phone).required(),
        select(CITIZENSHIP, "Citizenship", CITIZENSHIPS),
        select(HAS_EXPERIENCE, "C+E experience in Europe", EXPERIENCE),
        select(CODE_95, "Code 95", CODE_95_OPTIONS),
        select(LICENSE_YEAR, "Category C licence obtained", LICENSE_YEARS),
        FieldDefinition::new(START_DATE, "Available from", FieldKind::Date)
            .required()
            .constraint(Constraint::NotBeforeToday),
        select(RESIDENCE_DOCUMENTS, "Residence documents", RESIDENCE),
        FieldDefinition::new(CONSENT, "Consent to data processing", FieldKind::Boolean)
            .default_value(FieldValue::Bool(false))
            .constraint(Constraint::MustBeTrue),
    ])
}

pub fn steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(1, "Personal details", &[FIRST_NAME, EMAIL, PHONE, CITIZENSHIP]),
        StepDefinition::new(2, "Work experience", &[HAS_EXPERIENCE, CODE_95, LICENSE_YEAR]),
        StepDefinition::new(3, "Documents", &[START_DATE, RESIDENCE_DOCUMENTS, CONSENT]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StepPartition;

    #[test]
    fn test_schema_and_steps_are_consistent() {
        let schema = schema().unwrap();
        let steps = StepPartition::new(&schema, steps()).unwrap();
        assert_eq!(schema.len(), 10);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps.step_of(CONSENT), Some(3));
    }

    #[test]
    fn test_defaults() {
        let schema = schema().unwrap();
        let defaults = schema.defaults();
        assert_eq!(defaults.get(CITIZENSHIP).as_text(), Some("УКРАИНА"));
        assert_eq!(defaults.get(HAS_EXPERIENCE).as_text(), Some("НЕТ"));
        assert_eq!(defaults.get(CODE_95).as_text(), Some("НЕТ"));
        assert_eq!(defaults.get(LICENSE_YEAR).as_text(), Some("ПОСЛЕ 09.09.2009 Г"));
        assert_eq!(defaults.get(RESIDENCE_DOCUMENTS).as_text(), Some("ВИЗА ПОЛЬША"));
        assert_eq!(defaults.get(CONSENT), &FieldValue::Bool(false));
        assert_eq!(defaults.get(START_DATE), &FieldValue::Unset);
        assert_eq!(defaults.get(FIRST_NAME), &FieldValue::Unset);
    }

    #[test]
    fn test_every_enum_default_is_valid() {
        let schema = schema().unwrap();
        let defaults = schema.defaults();
        for field in schema.fields() {
            if matches!(field.kind, FieldKind::Enum { .. }) {
                assert!(schema.validate(&field.name, defaults.get(&field.name)).is_ok());
            }
        }
    }
}
