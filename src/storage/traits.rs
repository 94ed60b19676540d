//! `GraphStore`: the minimal contract the ranking core requires of whatever
//! backs the property graph (spec.md §6). Grounded on the teacher's
//! `storage::GraphStore` trait shape — CRUD plus a couple of read
//! projections — generalized from content-graph contexts to the
//! person/edge-layer model this crate actually has.

use thiserror::Error;

use crate::graph::{KnowsEdge, Layer, Person, PersonId, SimilarEdge, SimilarJobEdge};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("person not found: {0}")]
    PersonNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An unweighted/weighted adjacency projection of one similarity layer,
/// restricted to persons that have at least one edge in it (minus any
/// `exclude_ids`). This is what the Metrics Engine computes Louvain,
/// betweenness, and bridging coefficient against.
#[derive(Debug, Clone, Default)]
pub struct LayerProjection {
    pub nodes: Vec<PersonId>,
    /// `(a, b, weight)` — each unordered pair appears once, `a < b`.
    pub edges: Vec<(PersonId, PersonId, f64)>,
}

pub trait GraphStore: Send + Sync {
    // === Person CRUD ===
    fn upsert_person(&self, person: &Person) -> StorageResult<()>;
    fn get_person(&self, id: &PersonId) -> StorageResult<Option<Person>>;
    fn list_persons(&self) -> StorageResult<Vec<Person>>;
    fn delete_person(&self, id: &PersonId) -> StorageResult<()>;

    /// Atomically replace `LayerMetrics` for every listed person on one
    /// layer — spec.md §4.3's "commit all properties atomically per layer".
    fn apply_layer_metrics(
        &self,
        layer: Layer,
        metrics: &[(PersonId, crate::graph::LayerMetrics)],
    ) -> StorageResult<()>;

    // === KNOWS (social graph) ===
    fn knows_neighbors(&self, id: &PersonId) -> StorageResult<Vec<PersonId>>;
    fn add_knows(&self, edge: &KnowsEdge) -> StorageResult<()>;
    fn shortest_knows_path(
        &self,
        src: &PersonId,
        dst: &PersonId,
        max_depth: usize,
    ) -> StorageResult<Option<Vec<PersonId>>>;

    // === SIMILAR / SIMILAR_JOB edges, owned wholesale by recompute ===
    fn replace_similar_edges(&self, edges: &[SimilarEdge]) -> StorageResult<()>;
    fn replace_similar_job_edges(&self, edges: &[SimilarJobEdge]) -> StorageResult<()>;
    fn list_similar_edges(&self) -> StorageResult<Vec<SimilarEdge>>;
    fn list_similar_job_edges(&self) -> StorageResult<Vec<SimilarJobEdge>>;

    /// Project one similarity layer as an adjacency list, with `exclude_ids`
    /// removed before projection (spec.md §4.3's exclusion set).
    fn project_layer(&self, layer: Layer, exclude_ids: &[PersonId]) -> StorageResult<LayerProjection>;

    // === Vocabularies, cached process-lifetime by the engine ===
    fn all_skills(&self) -> StorageResult<std::collections::BTreeSet<String>>;
    fn all_companies(&self) -> StorageResult<std::collections::BTreeSet<String>>;
}

pub trait OpenStore: Sized {
    fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self>;
    fn open_in_memory() -> StorageResult<Self>;
}
