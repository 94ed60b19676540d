//! Request/response shapes for the HTTP transport, per spec.md §6's
//! documented `/recompute` and `/rank-connections` bodies.

use serde::{Deserialize, Serialize};

use crate::engine::RecomputeParams;
use crate::rank::{RankParams, Weights};

#[derive(Debug, Deserialize)]
pub struct RankConnectionsRequest {
    pub me_id: String,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_pinecone_top_k")]
    pub pinecone_top_k: usize,
    #[serde(default = "default_true")]
    pub prefilter: bool,
    #[serde(default = "default_w_vec")]
    pub w_vec: f64,
    #[serde(default = "default_w_skill")]
    pub w_skill: f64,
    #[serde(default = "default_w_job")]
    pub w_job: f64,
    #[serde(default = "default_w_struct_global")]
    pub w_struct_global: f64,
    #[serde(default = "default_w_struct_ego")]
    pub w_struct_ego: f64,
    #[serde(default = "default_w_company")]
    pub w_company: f64,
    #[serde(default = "default_rescale_top")]
    pub rescale_top: Option<f64>,
    #[serde(default)]
    pub debug: bool,
}

fn default_top_k() -> usize {
    20
}
fn default_pinecone_top_k() -> usize {
    1000
}
fn default_true() -> bool {
    true
}
fn default_w_vec() -> f64 {
    Weights::default().vec
}
fn default_w_skill() -> f64 {
    Weights::default().skill
}
fn default_w_job() -> f64 {
    Weights::default().job
}
fn default_w_struct_global() -> f64 {
    Weights::default().struct_global
}
fn default_w_struct_ego() -> f64 {
    Weights::default().struct_ego
}
fn default_w_company() -> f64 {
    Weights::default().company
}
fn default_rescale_top() -> Option<f64> {
    Some(0.8)
}

impl RankConnectionsRequest {
    pub fn to_rank_params(&self) -> RankParams {
        RankParams {
            top_k: self.top_k,
            weights: Weights {
                vec: self.w_vec,
                skill: self.w_skill,
                job: self.w_job,
                struct_global: self.w_struct_global,
                struct_ego: self.w_struct_ego,
                company: self.w_company,
            },
            pinecone_top_k: self.pinecone_top_k,
            prefilter: self.prefilter,
            rescale_top: self.rescale_top,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RankConnectionsBatchRequest {
    pub me_id: String,
    pub queries: Vec<String>,
    #[serde(flatten)]
    pub base: RankConnectionsRequestDefaults,
}

/// The weight/top_k/prefilter knobs shared by batch and single requests,
/// without `query`/`me_id` (batch carries those separately).
#[derive(Debug, Deserialize)]
pub struct RankConnectionsRequestDefaults {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_pinecone_top_k")]
    pub pinecone_top_k: usize,
    #[serde(default = "default_true")]
    pub prefilter: bool,
    #[serde(default = "default_w_vec")]
    pub w_vec: f64,
    #[serde(default = "default_w_skill")]
    pub w_skill: f64,
    #[serde(default = "default_w_job")]
    pub w_job: f64,
    #[serde(default = "default_w_struct_global")]
    pub w_struct_global: f64,
    #[serde(default = "default_w_struct_ego")]
    pub w_struct_ego: f64,
    #[serde(default = "default_w_company")]
    pub w_company: f64,
    #[serde(default = "default_rescale_top")]
    pub rescale_top: Option<f64>,
}

impl RankConnectionsRequestDefaults {
    pub fn to_rank_params(&self) -> RankParams {
        RankParams {
            top_k: self.top_k,
            weights: Weights {
                vec: self.w_vec,
                skill: self.w_skill,
                job: self.w_job,
                struct_global: self.w_struct_global,
                struct_ego: self.w_struct_ego,
                company: self.w_company,
            },
            pinecone_top_k: self.pinecone_top_k,
            prefilter: self.prefilter,
            rescale_top: self.rescale_top,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub me_id: String,
    pub query: String,
    #[serde(default = "default_true")]
    pub prefilter: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecomputeRequest {
    #[serde(flatten)]
    pub params: RecomputeParams,
}

#[derive(Debug, Deserialize)]
pub struct IntroPathQuery {
    pub src: String,
    pub dst: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    4
}

#[derive(Debug, Serialize)]
pub struct IntroPathResponse {
    pub path: Vec<String>,
    pub hops: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct ClustersQuery {
    #[serde(default)]
    pub layer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterSummaryQuery {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub layer: Option<String>,
}

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct ClusterDetailQuery {
    #[serde(default = "default_cluster_limit")]
    pub limit: usize,
    #[serde(default)]
    pub layer: Option<String>,
}

fn default_cluster_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct WholeGraphRankRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}
