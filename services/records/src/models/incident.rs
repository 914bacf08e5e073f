//! Cyber security incident models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ColumnKind, RecordField};

/// Stored incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityIncident {
    pub id: i64,
    pub date: Option<String>,
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub reported_by: Option<String>,
}

impl SecurityIncident {
    /// 1 (low) to 4 (critical), 0 for anything else
    pub fn severity_level(&self) -> u8 {
        match self
            .severity
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("low") => 1,
            Some("medium") => 2,
            Some("high") => 3,
            Some("critical") => 4,
            _ => 0,
        }
    }
}

impl fmt::Display for SecurityIncident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Incident {} [{}] {}",
            self.id,
            self.severity.as_deref().unwrap_or("").to_uppercase(),
            self.incident_type.as_deref().unwrap_or("")
        )
    }
}

/// Incident as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IncidentDetail {
    #[serde(flatten)]
    pub incident: SecurityIncident,
    pub severity_level: u8,
}

impl From<SecurityIncident> for IncidentDetail {
    fn from(incident: SecurityIncident) -> Self {
        Self {
            severity_level: incident.severity_level(),
            incident,
        }
    }
}

/// Incident to insert
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIncident {
    pub date: Option<String>,
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub reported_by: Option<String>,
}

/// Updatable incident columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentField {
    Date,
    IncidentType,
    Severity,
    Status,
    Description,
    ReportedBy,
}

impl RecordField for IncidentField {
    fn column(&self) -> &'static str {
        match self {
            IncidentField::Date => "date",
            IncidentField::IncidentType => "incident_type",
            IncidentField::Severity => "severity",
            IncidentField::Status => "status",
            IncidentField::Description => "description",
            IncidentField::ReportedBy => "reported_by",
        }
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Text
    }
}
