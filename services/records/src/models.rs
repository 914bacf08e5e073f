//! Record models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod dataset;
pub mod incident;
pub mod ticket;

/// Storage class of an updatable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

/// A column that may be changed through a field update
///
/// Implemented by closed enums only, so column names never come from input.
pub trait RecordField: Copy + std::fmt::Debug {
    fn column(&self) -> &'static str;

    fn kind(&self) -> ColumnKind;

    /// Whether the column accepts NULL
    fn nullable(&self) -> bool {
        true
    }
}

/// Typed value for a field update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Check this value against the column it is meant for
    pub fn check<F: RecordField>(&self, field: F) -> Result<(), String> {
        let ok = match (self, field.kind()) {
            (FieldValue::Null, _) => field.nullable(),
            (FieldValue::Text(_), ColumnKind::Text) => true,
            (FieldValue::Integer(_), ColumnKind::Integer | ColumnKind::Real) => true,
            (FieldValue::Real(_), ColumnKind::Real) => true,
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "Value {:?} does not fit column {} ({:?})",
                self,
                field.column(),
                field.kind()
            ))
        }
    }
}

/// Request for a single field update
#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest<F> {
    pub field: F,
    pub value: FieldValue,
}

/// One row of a grouped count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub label: Option<String>,
    pub count: i64,
}

/// Query parameters for the many-cases aggregate
#[derive(Debug, Deserialize)]
pub struct MinCountQuery {
    #[serde(default)]
    pub min_count: i64,
}

/// Query parameters for ticket listing
#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

/// Request for a ticket status change
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Request for a dataset record count change
#[derive(Debug, Deserialize)]
pub struct RecordCountRequest {
    pub record_count: i64,
}
