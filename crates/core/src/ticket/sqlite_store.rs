//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::store::require_non_empty;
use super::{NewTicket, Status, Ticket, TicketError, TicketFilter, TicketStore, TicketUpdate};

const SELECT_COLUMNS: &str =
    "SELECT id, client, subject, priority, status, assigned_agent FROM tickets";

/// SQLite-backed ticket store.
///
/// A single connection is held for the store's lifetime. The mutex makes this
/// store the only writer, so id assignment cannot race between callers.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, TicketError> {
        Self::initialize_schema(&conn)?;

        // Storage may have been changed by another process since the last run.
        let next_id = Self::query_next_id(&conn)?;
        info!(next_id, "Ticket store opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client TEXT NOT NULL,
                subject TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'Medium',
                status TEXT NOT NULL DEFAULT 'Open',
                assigned_agent TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_client ON tickets(client);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("ticket store lock poisoned".to_string()))
    }

    /// One past the highest id ever issued. AUTOINCREMENT keeps the high-water
    /// mark in `sqlite_sequence`, so deleting the newest ticket does not free
    /// its id. `MAX(id)` covers rows inserted with explicit ids.
    fn query_next_id(conn: &Connection) -> Result<i64, TicketError> {
        conn.query_row(
            r#"
            SELECT MAX(
                COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'tickets'), 0),
                COALESCE((SELECT MAX(id) FROM tickets), 0)
            ) + 1
            "#,
            [],
            |row| row.get(0),
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref client) = filter.client {
            conditions.push("client = ?".to_string());
            params.push(Box::new(client.clone()));
        }

        // Legacy rows keep their Spanish label, so match every form
        if let Some(status) = filter.status {
            let labels = status.labels();
            conditions.push(format!(
                "LOWER(TRIM(status)) IN ({})",
                vec!["?"; labels.len()].join(", ")
            ));
            for label in labels {
                params.push(Box::new(*label));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let priority: String = row.get(3)?;
        let status: String = row.get(4)?;

        // Unknown labels are a read error rather than a silent default
        let conversion = |idx: usize, e: TicketError| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        };

        Ok(Ticket {
            id: row.get(0)?,
            client: row.get(1)?,
            subject: row.get(2)?,
            priority: priority.parse().map_err(|e| conversion(3, e))?,
            status: status.parse().map_err(|e| conversion(4, e))?,
            assigned_agent: row.get(5)?,
        })
    }

    fn get_with(conn: &Connection, id: i64) -> Result<Option<Ticket>, TicketError> {
        conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    /// Run a single-row UPDATE and return the row as it now reads.
    fn update_one(
        conn: &Connection,
        id: i64,
        sql: &str,
        values: &[&dyn rusqlite::ToSql],
    ) -> Result<Ticket, TicketError> {
        let rows_affected = conn
            .execute(sql, values)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(TicketError::NotFound(id));
        }

        Self::get_with(conn, id)?.ok_or(TicketError::NotFound(id))
    }
}

impl TicketStore for SqliteTicketStore {
    fn next_id(&self) -> Result<i64, TicketError> {
        let conn = self.lock()?;
        Self::query_next_id(&conn)
    }

    fn create(&self, request: NewTicket) -> Result<Ticket, TicketError> {
        require_non_empty("client", &request.client)?;
        require_non_empty("subject", &request.subject)?;

        let conn = self.lock()?;
        let status = Status::Open;

        conn.execute(
            "INSERT INTO tickets (client, subject, priority, status, assigned_agent) VALUES (?, ?, ?, ?, NULL)",
            params![
                request.client,
                request.subject,
                request.priority.as_str(),
                status.as_str(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        info!(id, client = %request.client, priority = %request.priority, "Created ticket");

        Ok(Ticket {
            id,
            client: request.client,
            subject: request.subject,
            priority: request.priority,
            status,
            assigned_agent: None,
        })
    }

    fn modify(&self, id: i64, update: TicketUpdate) -> Result<Ticket, TicketError> {
        require_non_empty("client", &update.client)?;
        require_non_empty("subject", &update.subject)?;

        let conn = self.lock()?;
        let ticket = Self::update_one(
            &conn,
            id,
            "UPDATE tickets SET client = ?, subject = ?, priority = ?, status = ?, assigned_agent = ? WHERE id = ?",
            params![
                update.client,
                update.subject,
                update.priority.as_str(),
                update.status.as_str(),
                update.assigned_agent,
                id,
            ],
        )?;

        info!(id, "Modified ticket");
        Ok(ticket)
    }

    fn delete(&self, id: i64) -> Result<(), TicketError> {
        let conn = self.lock()?;

        let rows_affected = conn
            .execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if rows_affected == 0 {
            return Err(TicketError::NotFound(id));
        }

        info!(id, "Deleted ticket");
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;
        Self::get_with(&conn, id)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("{} {} ORDER BY id ASC", SELECT_COLUMNS, where_clause);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let tickets = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        debug!(?filter, count = tickets.len(), "Listed tickets");
        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn assign_agent(&self, id: i64, agent: &str) -> Result<Ticket, TicketError> {
        require_non_empty("agent", agent)?;

        let conn = self.lock()?;
        let ticket = Self::update_one(
            &conn,
            id,
            "UPDATE tickets SET assigned_agent = ? WHERE id = ?",
            params![agent, id],
        )?;

        info!(id, agent, "Assigned agent");
        Ok(ticket)
    }

    fn close(&self, id: i64) -> Result<Ticket, TicketError> {
        let conn = self.lock()?;
        let ticket = Self::update_one(
            &conn,
            id,
            "UPDATE tickets SET status = ? WHERE id = ?",
            params![Status::Closed.as_str(), id],
        )?;

        info!(id, "Closed ticket");
        Ok(ticket)
    }
}
