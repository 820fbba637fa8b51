//! Static assignment of schema fields to ordered wizard steps.

use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use super::schema::FieldSchema;

/// One page of the wizard. Ids are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: usize,
    pub title: String,
    pub field_names: Vec<String>,
}

impl StepDefinition {
    pub fn new(id: usize, title: impl Into<String>, field_names: &[&str]) -> Self {
        Self {
            id,
            title: title.into(),
            field_names: field_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Steps that cover the field schema exactly once each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPartition {
    steps: Vec<StepDefinition>,
}

impl StepPartition {
    /// Builds the partition, rejecting gaps in step ids, unknown fields,
    /// fields listed twice and schema fields that no step lists.
    pub fn new(schema: &FieldSchema, steps: Vec<StepDefinition>) -> SchemaResult<Self> {
        if steps.is_empty() {
            return Err(SchemaError::NoSteps);
        }

        let mut owner: HashMap<&str, usize> = HashMap::new();
        for (position, step) in steps.iter().enumerate() {
            if step.id != position + 1 {
                return Err(SchemaError::NonContiguousStep { position: position + 1, found: step.id });
            }
            for name in &step.field_names {
                if schema.field(name).is_none() {
                    return Err(SchemaError::UnknownStepField { step: step.id, field: name.clone() });
                }
                if let Some(first) = owner.insert(name.as_str(), step.id) {
                    return Err(SchemaError::FieldInTwoSteps {
                        field: name.clone(),
                        first,
                        second: step.id,
                    });
                }
            }
        }

        if let Some(missing) = schema.names().find(|name| !owner.contains_key(name)) {
            return Err(SchemaError::UnassignedField { field: missing.to_string() });
        }

        Ok(Self { steps })
    }

    /// Number of steps (`N`).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, id: usize) -> Option<&StepDefinition> {
        id.checked_sub(1).and_then(|index| self.steps.get(index))
    }

    pub fn fields_of(&self, id: usize) -> &[String] {
        self.step(id).map(|s| s.field_names.as_slice()).unwrap_or(&[])
    }

    pub fn step_of(&self, field: &str) -> Option<usize> {
        self.steps
            .iter()
            .find(|s| s.field_names.iter().any(|n| n == field))
            .map(|s| s.id)
    }
}
