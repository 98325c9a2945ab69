//! JSON export of the ticket table.
//!
//! The document keeps the column labels of the legacy desktop tool so existing
//! consumers of exported files keep working.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::info;

use super::{Priority, Status, Ticket, TicketError};

/// One element of the exported array. Field order is the key order on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Cliente")]
    pub client: String,
    #[serde(rename = "Asunto")]
    pub subject: String,
    #[serde(rename = "Prioridad")]
    pub priority: Priority,
    #[serde(rename = "Estado")]
    pub status: Status,
    #[serde(rename = "Agente Asignado")]
    pub assigned_agent: Option<String>,
}

impl From<&Ticket> for ExportRecord {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            client: ticket.client.clone(),
            subject: ticket.subject.clone(),
            priority: ticket.priority,
            status: ticket.status,
            assigned_agent: ticket.assigned_agent.clone(),
        }
    }
}

/// Serialize tickets as a 4-space indented JSON array.
pub fn to_json(tickets: &[Ticket]) -> Result<Vec<u8>, TicketError> {
    let records: Vec<ExportRecord> = tickets.iter().map(ExportRecord::from).collect();

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| TicketError::Export(e.to_string()))?;
    Ok(buf)
}

/// Write tickets to `destination`, truncating any existing file.
pub fn write_json(tickets: &[Ticket], destination: &Path) -> Result<(), TicketError> {
    let bytes = to_json(tickets)?;

    let file = File::create(destination)
        .map_err(|e| TicketError::Export(format!("{}: {}", destination.display(), e)))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| TicketError::Export(format!("{}: {}", destination.display(), e)))?;

    info!(
        count = tickets.len(),
        path = %destination.display(),
        "Exported tickets"
    );
    Ok(())
}
