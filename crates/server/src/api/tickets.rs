//! Ticket API handlers.
//!
//! Every handler checks that the required fields are present, asks for
//! confirmation where the operation destroys or closes a ticket, then calls a
//! single store operation.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use helpdesk_core::{
    NewTicket, Priority, Status, Ticket, TicketError, TicketFilter, TicketUpdate,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub client: Option<String>,
    pub subject: Option<String>,
    /// Defaults to Medium when omitted
    pub priority: Option<String>,
}

/// Request body for replacing a ticket's fields
#[derive(Debug, Deserialize)]
pub struct ModifyTicketBody {
    pub client: Option<String>,
    pub subject: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    /// Empty or missing clears the assignment
    pub assigned_agent: Option<String>,
}

/// Request body for assigning an agent
#[derive(Debug, Deserialize)]
pub struct AssignAgentBody {
    pub agent: Option<String>,
}

/// Request body for exporting tickets
#[derive(Debug, Deserialize)]
pub struct ExportBody {
    pub file_name: Option<String>,
    /// Falls back to the configured export directory
    pub directory: Option<String>,
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    /// Exact client match
    pub client: Option<String>,
    /// Exact status match
    pub status: Option<String>,
    /// `text` renders one line per ticket instead of JSON
    pub format: Option<String>,
}

/// Confirmation flag for destructive operations
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub total: usize,
}

/// Response for operations that change a ticket
#[derive(Debug, Serialize)]
pub struct TicketMutationResponse {
    pub message: String,
    pub ticket: Ticket,
}

/// Response for delete
#[derive(Debug, Serialize)]
pub struct DeleteTicketResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct NextIdResponse {
    pub next_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub message: String,
    pub path: String,
    pub count: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<TicketErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(TicketErrorResponse {
            error: message.into(),
        }),
    )
}

fn store_error(err: TicketError) -> ApiError {
    let status = match err {
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        TicketError::Validation(_) => StatusCode::BAD_REQUEST,
        TicketError::Database(_) | TicketError::Export(_) => {
            warn!("Ticket operation failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, err.to_string())
}

/// Collect the names of required fields that are missing or blank.
fn missing_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), ApiError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Please complete all fields: {}", missing.join(", ")),
        ))
    }
}

fn require_confirmation(params: &ConfirmParams, action: &str, id: i64) -> Result<(), ApiError> {
    if params.confirm {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::PRECONDITION_REQUIRED,
            format!("Confirm to {} ticket {} (add ?confirm=true)", action, id),
        ))
    }
}

fn parse_field<T>(value: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = TicketError>,
{
    value.parse().map_err(store_error)
}

/// Present, non-blank field value. Only called after `require_fields`.
fn field(value: Option<String>) -> String {
    value.unwrap_or_default()
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<TicketMutationResponse>), ApiError> {
    require_fields(&[
        ("client", body.client.as_deref()),
        ("subject", body.subject.as_deref()),
    ])?;

    let priority = match body.priority.as_deref() {
        Some(p) if !p.trim().is_empty() => parse_field::<Priority>(p)?,
        _ => Priority::default(),
    };

    let request = NewTicket::new(field(body.client), field(body.subject)).with_priority(priority);
    let ticket = state.ticket_store().create(request).map_err(store_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TicketMutationResponse {
            message: format!("Created ticket with ID: {}", ticket.id),
            ticket,
        }),
    ))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    match state.ticket_store().find_by_id(id) {
        Ok(Some(ticket)) => Ok(Json(ticket)),
        Ok(None) => Err(store_error(TicketError::NotFound(id))),
        Err(e) => Err(store_error(e)),
    }
}

/// List tickets, optionally filtered by client and/or status
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Response, ApiError> {
    let mut filter = TicketFilter::new();

    if let Some(client) = params.client.as_deref().filter(|c| !c.is_empty()) {
        filter = filter.with_client(client);
    }

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        filter = filter.with_status(parse_field::<Status>(status)?);
    }

    let tickets = state.ticket_store().list(&filter).map_err(store_error)?;

    if params.format.as_deref() == Some("text") {
        let body: String = tickets.iter().map(|t| format!("{}\n", t)).collect();
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response());
    }

    let total = tickets.len();
    Ok(Json(ListTicketsResponse { tickets, total }).into_response())
}

/// Id the next created ticket will receive
pub async fn next_id(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NextIdResponse>, ApiError> {
    let next_id = state.ticket_store().next_id().map_err(store_error)?;
    Ok(Json(NextIdResponse { next_id }))
}

/// Replace all mutable fields of a ticket
pub async fn modify_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ModifyTicketBody>,
) -> Result<Json<TicketMutationResponse>, ApiError> {
    require_fields(&[
        ("client", body.client.as_deref()),
        ("subject", body.subject.as_deref()),
        ("priority", body.priority.as_deref()),
        ("status", body.status.as_deref()),
    ])?;

    let update = TicketUpdate {
        priority: parse_field(body.priority.as_deref().unwrap_or_default())?,
        status: parse_field(body.status.as_deref().unwrap_or_default())?,
        client: field(body.client),
        subject: field(body.subject),
        assigned_agent: body.assigned_agent.filter(|a| !a.trim().is_empty()),
    };

    let ticket = state.ticket_store().modify(id, update).map_err(store_error)?;

    Ok(Json(TicketMutationResponse {
        message: format!("Modified ticket with ID: {}", id),
        ticket,
    }))
}

/// Delete a ticket (requires confirmation)
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(confirm): Query<ConfirmParams>,
) -> Result<Json<DeleteTicketResponse>, ApiError> {
    require_confirmation(&confirm, "delete", id)?;

    state.ticket_store().delete(id).map_err(store_error)?;

    Ok(Json(DeleteTicketResponse {
        message: format!("Deleted ticket with ID: {}", id),
        id,
    }))
}

/// Assign an agent to a ticket
pub async fn assign_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<AssignAgentBody>,
) -> Result<Json<TicketMutationResponse>, ApiError> {
    require_fields(&[("agent", body.agent.as_deref())])?;
    let agent = field(body.agent);

    let ticket = state
        .ticket_store()
        .assign_agent(id, &agent)
        .map_err(store_error)?;

    Ok(Json(TicketMutationResponse {
        message: format!("Assigned agent {} to ticket with ID: {}", agent, id),
        ticket,
    }))
}

/// Close a ticket (requires confirmation)
pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(confirm): Query<ConfirmParams>,
) -> Result<Json<TicketMutationResponse>, ApiError> {
    require_confirmation(&confirm, "close", id)?;

    let ticket = state.ticket_store().close(id).map_err(store_error)?;

    Ok(Json(TicketMutationResponse {
        message: format!("Closed ticket with ID: {}", id),
        ticket,
    }))
}

/// Export every ticket as a JSON document on the server's filesystem
pub async fn export_tickets(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExportBody>,
) -> Result<Json<ExportResponse>, ApiError> {
    require_fields(&[("file_name", body.file_name.as_deref())])?;
    let file_name = field(body.file_name);

    let directory = body
        .directory
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config().export.directory.clone());

    let count = state
        .ticket_store()
        .export_to_dir(&directory, &file_name)
        .map_err(store_error)?;

    Ok(Json(ExportResponse {
        message: format!(
            "Exported {} tickets as '{}' in '{}'",
            count,
            file_name,
            directory.display()
        ),
        path: directory.join(&file_name).display().to_string(),
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_reports_blank_and_absent() {
        let missing = missing_fields(&[
            ("client", Some("Acme")),
            ("subject", Some("  ")),
            ("priority", None),
        ]);
        assert_eq!(missing, vec!["subject", "priority"]);
    }

    #[test]
    fn test_require_fields_message() {
        let (status, Json(body)) =
            require_fields(&[("client", None), ("subject", None)]).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Please complete all fields: client, subject");
    }

    #[test]
    fn test_store_error_status_mapping() {
        assert_eq!(store_error(TicketError::NotFound(1)).0, StatusCode::NOT_FOUND);
        assert_eq!(
            store_error(TicketError::Validation("x".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            store_error(TicketError::Database("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            store_error(TicketError::Export("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_require_confirmation() {
        assert!(require_confirmation(&ConfirmParams { confirm: true }, "close", 1).is_ok());
        let (status, _) =
            require_confirmation(&ConfirmParams { confirm: false }, "close", 1).unwrap_err();
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    }
}
