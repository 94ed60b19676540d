//! Shared axum handler state: just the one transport-independent engine
//! (spec.md §9's "global singletons expressed as dependencies carried
//! through a context/handle").

use std::sync::Arc;

use crate::engine::RankingEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RankingEngine>,
}

impl AppState {
    pub fn new(engine: Arc<RankingEngine>) -> Self {
        Self { engine }
    }
}
