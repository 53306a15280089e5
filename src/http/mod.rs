//! HTTP API server, the UI context's view of the system
//!
//! This module exposes the coordinator's message contracts as a REST API:
//! - POST /recording/start - Start recording a tab
//! - POST /recording/auto-start - Start requested by presence detection
//! - POST /recording/stop - Stop recording
//! - GET /recording/status - Query recording state
//! - GET /transcript - Accumulated transcript
//! - DELETE /transcript - Clear the transcript
//! - POST /analysis - Generate an analysis of the transcript
//! - GET /analysis/templates - List analysis templates
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
