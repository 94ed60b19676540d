//! HTTP handlers (spec.md §4.6). Every handler is a thin translation from
//! an axum extractor to a `RankingEngine` call and back to JSON — no
//! ranking/graph logic lives here.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::CoreError;
use crate::graph::{Layer, PersonId};

use super::dto::{
    ClusterDetailQuery, ClusterSummaryQuery, ClustersQuery, ExplainRequest, HealthResponse,
    IntroPathQuery, IntroPathResponse, RankConnectionsBatchRequest, RankConnectionsRequest,
    RecomputeRequest, WholeGraphRankRequest,
};
use super::error::ApiResult;
use super::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clusters", get(clusters))
        .route("/clusters/summary", get(clusters_summary))
        .route("/clusters/:cid", get(cluster_members))
        .route("/person/:pid", get(person))
        .route("/rank", post(whole_graph_rank))
        .route("/rank-connections", post(rank_connections))
        .route("/rank-connections/batch", post(rank_connections_batch))
        .route("/rank-connections/explain", post(rank_connections_explain))
        .route("/rank-connections/graph", post(rank_connections_graph))
        .route("/recompute", post(recompute))
        .route("/intro-path", get(intro_path))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_layer(layer: &Option<String>) -> Layer {
    match layer.as_deref() {
        Some(s) if s.eq_ignore_ascii_case("job") => Layer::Job,
        _ => Layer::Skills,
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::ValidationError(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn clusters(State(state): State<AppState>, Query(q): Query<ClustersQuery>) -> ApiResult<impl axum::response::IntoResponse> {
    let layer = parse_layer(&q.layer);
    Ok(Json(state.engine.clusters(layer)?))
}

async fn clusters_summary(
    State(state): State<AppState>,
    Query(q): Query<ClusterSummaryQuery>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let layer = parse_layer(&q.layer);
    Ok(Json(state.engine.cluster_summary(layer, q.top_n)?))
}

async fn cluster_members(
    State(state): State<AppState>,
    Path(cid): Path<i64>,
    Query(q): Query<ClusterDetailQuery>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let layer = parse_layer(&q.layer);
    Ok(Json(state.engine.cluster_members(layer, cid, q.limit)?))
}

async fn person(State(state): State<AppState>, Path(pid): Path<String>) -> ApiResult<impl axum::response::IntoResponse> {
    let id = PersonId::from(pid);
    match state.engine.get_person(&id)? {
        Some(p) => Ok(Json(p)),
        None => Err(CoreError::NotFound(id.as_str().to_string()).into()),
    }
}

async fn whole_graph_rank(
    State(state): State<AppState>,
    Json(body): Json<WholeGraphRankRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_non_empty("query", &body.query)?;
    let ranked = state.engine.whole_graph_rank(&body.query, body.top_k).await?;
    Ok(Json(ranked))
}

async fn rank_connections(
    State(state): State<AppState>,
    Json(body): Json<RankConnectionsRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_non_empty("me_id", &body.me_id)?;
    require_non_empty("query", &body.query)?;
    let me = PersonId::from(body.me_id.clone());
    let params = body.to_rank_params();
    let ranked = state.engine.rank_connections(&me, &body.query, params).await?;
    Ok(Json(ranked))
}

async fn rank_connections_batch(
    State(state): State<AppState>,
    Json(body): Json<RankConnectionsBatchRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_non_empty("me_id", &body.me_id)?;
    for q in &body.queries {
        require_non_empty("query", q)?;
    }
    let me = PersonId::from(body.me_id.clone());
    let params = body.base.to_rank_params();
    let ranked = state.engine.rank_connections_batch(&me, &body.queries, params).await?;
    Ok(Json(ranked))
}

async fn rank_connections_explain(
    State(state): State<AppState>,
    Json(body): Json<ExplainRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_non_empty("me_id", &body.me_id)?;
    require_non_empty("query", &body.query)?;
    let me = PersonId::from(body.me_id.clone());
    let result = state.engine.explain_connections(&me, &body.query, body.prefilter).await?;
    Ok(Json(result))
}

/// On embedding failure, degrades to an ego-network fallback with
/// `fallback=true` rather than a 500 — spec.md §4.5/§7's graph-variant
/// carve-out. Never fails this handler; `RankingEngine::rank_connections_graph`
/// already absorbs the `EmbedFailure`.
async fn rank_connections_graph(
    State(state): State<AppState>,
    Json(body): Json<RankConnectionsRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    require_non_empty("me_id", &body.me_id)?;
    require_non_empty("query", &body.query)?;
    let me = PersonId::from(body.me_id.clone());
    let params = body.to_rank_params();
    let graph = state.engine.rank_connections_graph(&me, &body.query, params).await?;
    Ok(Json(graph))
}

async fn recompute(State(state): State<AppState>, Json(body): Json<RecomputeRequest>) -> ApiResult<impl axum::response::IntoResponse> {
    let summary = state.engine.recompute(body.params).await?;
    Ok(Json(summary))
}

async fn intro_path(State(state): State<AppState>, Query(q): Query<IntroPathQuery>) -> ApiResult<impl axum::response::IntoResponse> {
    let src = PersonId::from(q.src);
    let dst = PersonId::from(q.dst);
    let path = state.engine.intro_path(&src, &dst, q.max_depth).await?;
    match path {
        Some(nodes) => {
            let hops = nodes.len() - 1;
            Ok(Json(IntroPathResponse {
                path: nodes.into_iter().map(|id| id.as_str().to_string()).collect(),
                hops: Some(hops),
            }))
        }
        None => Ok(Json(IntroPathResponse { path: Vec::new(), hops: None })),
    }
}
