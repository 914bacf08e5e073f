//! IT ticket models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ColumnKind, RecordField};

/// Stored IT ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItTicket {
    pub id: i64,
    pub ticket_id: String,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub created_date: Option<String>,
    pub resolved_date: Option<String>,
    pub assigned_to: Option<String>,
}

impl fmt::Display for ItTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket {}: {} [{}] - {} (assigned to: {})",
            self.ticket_id,
            self.subject,
            self.priority.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("-"),
            self.assigned_to.as_deref().unwrap_or("nobody")
        )
    }
}

/// Ticket to insert
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTicket {
    pub ticket_id: String,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub created_date: Option<String>,
    pub resolved_date: Option<String>,
    pub assigned_to: Option<String>,
}

/// Updatable ticket columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    TicketId,
    Priority,
    Status,
    Category,
    Subject,
    Description,
    CreatedDate,
    ResolvedDate,
    AssignedTo,
}

impl RecordField for TicketField {
    fn column(&self) -> &'static str {
        match self {
            TicketField::TicketId => "ticket_id",
            TicketField::Priority => "priority",
            TicketField::Status => "status",
            TicketField::Category => "category",
            TicketField::Subject => "subject",
            TicketField::Description => "description",
            TicketField::CreatedDate => "created_date",
            TicketField::ResolvedDate => "resolved_date",
            TicketField::AssignedTo => "assigned_to",
        }
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Text
    }

    fn nullable(&self) -> bool {
        !matches!(self, TicketField::TicketId | TicketField::Subject)
    }
}
