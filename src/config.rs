//! Environment-driven configuration, per spec.md §6 "Configuration".
//!
//! Required values missing at startup are fatal (`CoreError::ConfigMissing`);
//! ranking-weight overrides are optional and fall back to the defaults in
//! `rank::Weights::default()`.

use std::env;
use std::time::Duration;

use crate::error::CoreError;
use crate::rank::Weights;

/// Graph store connectivity knobs. Field names mirror spec.md §6's
/// enumerated env vars directly (`URI`, `USER`, `PASS`, ...) under a
/// `GRAPH_STORE_` prefix so they don't collide with the vector-store ones.
#[derive(Debug, Clone)]
pub struct GraphStoreConfig {
    pub uri: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub connect_retries: u32,
    pub connect_initial_delay: Duration,
    pub connect_max_delay: Duration,
}

/// Vector store connectivity knobs (unused by the bundled `InMemoryVectorStore`,
/// read here only so a real adapter has somewhere to pull config from).
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub index_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub graph_store: GraphStoreConfig,
    pub vector_store: VectorStoreConfig,
    pub default_weights: Weights,
    pub bind_addr: String,
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Settings {
    /// Loads settings from the process environment. `GRAPH_STORE_URI` is the
    /// only value this crate treats as genuinely required — a `SqliteStore`
    /// always needs a path (or `:memory:`) to open.
    pub fn from_env() -> Result<Self, CoreError> {
        let uri = env::var("GRAPH_STORE_URI")
            .map_err(|_| CoreError::ConfigMissing("GRAPH_STORE_URI".into()))?;

        let graph_store = GraphStoreConfig {
            uri,
            user: env::var("GRAPH_STORE_USER").ok(),
            pass: env::var("GRAPH_STORE_PASS").ok(),
            connect_retries: env_u32("GRAPH_STORE_CONNECT_RETRIES", 3),
            connect_initial_delay: Duration::from_millis(env_u32(
                "GRAPH_STORE_CONNECT_INITIAL_DELAY_MS",
                200,
            ) as u64),
            connect_max_delay: Duration::from_millis(env_u32(
                "GRAPH_STORE_CONNECT_MAX_DELAY_MS",
                5_000,
            ) as u64),
        };

        let vector_store = VectorStoreConfig {
            api_key: env::var("VECTOR_STORE_API_KEY").ok(),
            region: env::var("VECTOR_STORE_REGION").ok(),
            index_name: env::var("VECTOR_STORE_INDEX_NAME").ok(),
        };

        let default_weights = Weights {
            vec: env_f64("RANK_WEIGHT_VEC", Weights::default().vec),
            skill: env_f64("RANK_WEIGHT_SKILL", Weights::default().skill),
            job: env_f64("RANK_WEIGHT_JOB", Weights::default().job),
            struct_global: env_f64("RANK_WEIGHT_STRUCT_GLOBAL", Weights::default().struct_global),
            struct_ego: env_f64("RANK_WEIGHT_STRUCT_EGO", Weights::default().struct_ego),
            company: env_f64("RANK_WEIGHT_COMPANY", Weights::default().company),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(Self {
            graph_store,
            vector_store,
            default_weights,
            bind_addr,
        })
    }
}
