//! HTTP front end for the helpdesk ticket store.
//!
//! Each route validates the raw request fields and delegates to exactly one
//! [`helpdesk_core::TicketStore`] operation.

pub mod api;
pub mod state;
