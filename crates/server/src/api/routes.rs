use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Tickets
        .route(
            "/tickets",
            post(tickets::create_ticket).get(tickets::list_tickets),
        )
        .route("/tickets/next-id", get(tickets::next_id))
        .route("/tickets/export", post(tickets::export_tickets))
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket)
                .put(tickets::modify_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/tickets/{id}/assign", post(tickets::assign_agent))
        .route("/tickets/{id}/close", post(tickets::close_ticket))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
