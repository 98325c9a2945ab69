pub mod config;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ExportConfig, ServerConfig,
};
pub use ticket::{
    ExportRecord, NewTicket, Priority, SqliteTicketStore, Status, Ticket, TicketError,
    TicketFilter, TicketStore, TicketUpdate,
};
