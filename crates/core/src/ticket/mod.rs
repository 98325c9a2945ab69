//! Ticket records, their storage, and JSON export.

mod export;
mod sqlite_store;
mod store;
mod types;

pub use export::{to_json, write_json, ExportRecord};
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketStore};
pub use types::{NewTicket, Priority, Status, Ticket, TicketUpdate};
