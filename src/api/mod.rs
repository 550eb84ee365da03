// ==========================================
// MES Core - HTTP/SSE API layer, spec.md §6
// ==========================================
// Thin axum handlers over the repository and engine layers; no business
// rules live here beyond request parsing, status-code mapping, and wiring a
// handler to the Hub topic it reads or writes.
// ==========================================

pub mod energy;
pub mod error;
pub mod maintenance;
pub mod planning;
pub mod priority;
pub mod production;
pub mod reschedule;
pub mod routes;
pub mod sse;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::{AppState, SharedState};
