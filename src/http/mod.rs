//! HTTP control plane for conversation sessions
//!
//! Thin presentation layer over the session engine: handlers translate REST
//! calls into engine operations and report status snapshots and drained
//! lifecycle events back to the caller.

pub mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{ActiveSession, AppState};
