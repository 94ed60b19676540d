//! Connector Ranker: a personal-network connector-ranking engine.
//!
//! Ranks a user's first-degree professional contacts for a free-text query
//! by combining semantic similarity, structured attribute matches, and
//! graph-structural signals (betweenness, bridging) over two similarity
//! layers (shared skills, canonical job title) derived from a property
//! graph of people.
//!
//! # Layout
//!
//! - [`graph`] — `Person`/edge types and the per-layer metric properties.
//! - [`storage`] — the `GraphStore` adapter contract and its SQLite backend.
//! - [`vector`] — the `Embedder`/`VectorStore` adapter contracts.
//! - [`canon`] — job-title canonicalization.
//! - [`similarity`] — `SIMILAR`/`SIMILAR_JOB` edge construction.
//! - [`metrics`] — community detection, betweenness, bridging coefficient.
//! - [`query`] — free-text query parsing.
//! - [`rank`] — the connection ranker.
//! - [`engine`] — glues the above behind one transport-independent API.
//! - [`api_http`] — the axum HTTP transport.

pub mod api_http;
pub mod canon;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod query;
pub mod rank;
pub mod similarity;
pub mod storage;
pub mod vector;

pub use config::Settings;
pub use engine::RankingEngine;
pub use error::{CoreError, CoreResult};
pub use graph::{Layer, Person, PersonId};
pub use storage::{GraphStore, OpenStore, SqliteStore};
pub use vector::{Embedder, HashEmbedder, InMemoryVectorStore, VectorStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
