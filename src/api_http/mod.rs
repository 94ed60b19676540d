//! HTTP transport (spec.md §4.6): ranking, cluster inspection,
//! shortest-intro-path, and recompute triggers over `RankingEngine`.
//! Every endpoint enables permissive cross-origin access, per spec.

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
