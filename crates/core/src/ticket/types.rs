//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TicketError;

// ============================================================================
// Classification Types
// ============================================================================

/// Ticket priority.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Canonical text form, as stored and exported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TicketError;

    /// Accepts the canonical names and the legacy Spanish labels
    /// (`Baja`, `Media`, `Alta`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "baja" => Ok(Priority::Low),
            "medium" | "media" => Ok(Priority::Medium),
            "high" | "alta" => Ok(Priority::High),
            other => Err(TicketError::Validation(format!(
                "unknown priority: {:?}",
                other
            ))),
        }
    }
}

/// Ticket status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Open,
    Closed,
}

impl Status {
    /// Canonical text form, as stored and exported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Closed => "Closed",
        }
    }

    /// Every lowercase label a stored row may carry for this status.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Status::Open => &["open", "abierto"],
            Status::Closed => &["closed", "cerrado"],
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TicketError;

    /// Accepts the canonical names and the legacy `Abierto`/`Cerrado` labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        [Status::Open, Status::Closed]
            .into_iter()
            .find(|status| status.labels().contains(&label.as_str()))
            .ok_or_else(|| TicketError::Validation(format!("unknown status: {:?}", label)))
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A support request record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    /// Store-assigned identifier. Never reused, even after deletion.
    pub id: i64,
    /// Client who opened the request.
    pub client: String,
    /// Short description of the problem.
    pub subject: String,
    pub priority: Priority,
    pub status: Status,
    /// Agent handling the ticket, if any.
    pub assigned_agent: Option<String>,
}

/// Renders the single-line listing form:
/// `ID: 1, Cliente: Acme, Asunto: Login bug, Prioridad: High, Estado: Open, Agente Asignado: None`
impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Cliente: {}, Asunto: {}, Prioridad: {}, Estado: {}, Agente Asignado: {}",
            self.id,
            self.client,
            self.subject,
            self.priority,
            self.status,
            self.assigned_agent.as_deref().unwrap_or("None")
        )
    }
}

/// Fields supplied when opening a ticket. Id and status are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub client: String,
    pub subject: String,
    pub priority: Priority,
}

impl NewTicket {
    pub fn new(client: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            subject: subject.into(),
            priority: Priority::default(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Full replacement of a ticket's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketUpdate {
    pub client: String,
    pub subject: String,
    pub priority: Priority,
    pub status: Status,
    pub assigned_agent: Option<String>,
}

impl From<Ticket> for TicketUpdate {
    fn from(ticket: Ticket) -> Self {
        Self {
            client: ticket.client,
            subject: ticket.subject,
            priority: ticket.priority,
            status: ticket.status,
            assigned_agent: ticket.assigned_agent,
        }
    }
}
