//! Ticket storage trait and types.

use std::path::{Component, Path};

use thiserror::Error;

use crate::ticket::{NewTicket, Status, Ticket, TicketUpdate};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// No ticket with this id exists.
    #[error("Ticket not found: {0}")]
    NotFound(i64),

    /// A required field was empty or a value could not be parsed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage could not be reached or a query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The export document could not be written.
    #[error("Export error: {0}")]
    Export(String),
}

/// Filter for querying tickets. Criteria combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Exact match on client.
    pub client: Option<String>,
    /// Exact match on status.
    pub status: Option<Status>,
}

impl TicketFilter {
    /// A filter matching every ticket.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
}

/// Reject blank values for required text fields.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), TicketError> {
    if value.trim().is_empty() {
        return Err(TicketError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Trait for ticket storage backends.
///
/// Every call is its own unit of work and is committed before it returns.
pub trait TicketStore: Send + Sync {
    /// Id the next created ticket will receive.
    fn next_id(&self) -> Result<i64, TicketError>;

    /// Create a new open, unassigned ticket.
    fn create(&self, request: NewTicket) -> Result<Ticket, TicketError>;

    /// Replace every mutable field of an existing ticket.
    fn modify(&self, id: i64, update: TicketUpdate) -> Result<Ticket, TicketError>;

    /// Permanently delete a ticket.
    fn delete(&self, id: i64) -> Result<(), TicketError>;

    /// Get a ticket by ID.
    fn find_by_id(&self, id: i64) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter, ordered by id.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Set the assigned agent without touching status.
    fn assign_agent(&self, id: i64, agent: &str) -> Result<Ticket, TicketError>;

    /// Mark a ticket closed, leaving every other field untouched.
    fn close(&self, id: i64) -> Result<Ticket, TicketError>;

    fn list_all(&self) -> Result<Vec<Ticket>, TicketError> {
        self.list(&TicketFilter::new())
    }

    fn find_by_client(&self, client: &str) -> Result<Vec<Ticket>, TicketError> {
        self.list(&TicketFilter::new().with_client(client))
    }

    fn find_by_status(&self, status: Status) -> Result<Vec<Ticket>, TicketError> {
        self.list(&TicketFilter::new().with_status(status))
    }

    /// Write every ticket to `destination` as a JSON array, replacing any
    /// existing file.
    fn export(&self, destination: &Path) -> Result<usize, TicketError> {
        let tickets = self.list_all()?;
        super::export::write_json(&tickets, destination)?;
        Ok(tickets.len())
    }

    /// Export into `file_name` inside `directory`.
    ///
    /// `file_name` must be a single plain path component, so the export can
    /// never land outside `directory`.
    fn export_to_dir(&self, directory: &Path, file_name: &str) -> Result<usize, TicketError> {
        require_non_empty("file name", file_name)?;
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(TicketError::Validation(format!(
                    "file name must not contain a path: {:?}",
                    file_name
                )))
            }
        }
        self.export(&directory.join(file_name))
    }
}
