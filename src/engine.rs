//! `RankingEngine`: glues storage, vector store, embedder, similarity
//! builder, metrics engine, and ranker behind one transport-independent
//! API, carrying the concurrency model from spec.md §5 (bounded
//! connection use lives in the store itself; this layer owns the
//! process-lifetime vocabulary caches and the recompute mutex).

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::error::CoreError;
use crate::graph::{Layer, Person, PersonId};
use crate::query::{self, ParsedQuery};
use crate::rank::{self, ExplainResult, RankParams, RankedPerson};
use crate::similarity::{self, RebuildSimilarParams, WeightMode};
use crate::storage::GraphStore;
use crate::vector::{Embedder, VectorStore};

#[derive(Debug, Clone, Deserialize)]
pub struct RecomputeParams {
    #[serde(default = "default_min_shared_skills")]
    pub min_shared_skills: usize,
    #[serde(default = "default_weight_mode")]
    pub weight_mode: String,
    #[serde(default = "default_boost_company")]
    pub boost_company: f64,
    #[serde(default = "default_boost_school")]
    pub boost_school: f64,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default)]
    pub embed_top_k: usize,
    #[serde(default = "default_embed_scale")]
    pub embed_scale: f64,
}

fn default_min_shared_skills() -> usize {
    2
}
fn default_weight_mode() -> String {
    "jaccard".to_string()
}
fn default_boost_company() -> f64 {
    1.0
}
fn default_boost_school() -> f64 {
    0.5
}
fn default_max_iter() -> usize {
    20
}
fn default_embed_scale() -> f64 {
    1.0
}

impl Default for RecomputeParams {
    fn default() -> Self {
        Self {
            min_shared_skills: default_min_shared_skills(),
            weight_mode: default_weight_mode(),
            boost_company: default_boost_company(),
            boost_school: default_boost_school(),
            exclude: Vec::new(),
            max_iter: default_max_iter(),
            embed_top_k: 0,
            embed_scale: default_embed_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecomputeSummary {
    pub similar_edges: usize,
    pub similar_job_edges: usize,
    pub embedding_edges_augmented: usize,
    pub persons_scored_skills: usize,
    pub persons_scored_job: usize,
}

pub struct RankingEngine {
    store: Arc<dyn GraphStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    skills_cache: RwLock<Option<BTreeSet<String>>>,
    companies_cache: RwLock<Option<BTreeSet<String>>>,
    recompute_lock: Mutex<()>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn GraphStore>, vectors: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            vectors,
            embedder,
            skills_cache: RwLock::new(None),
            companies_cache: RwLock::new(None),
            recompute_lock: Mutex::new(()),
        }
    }

    /// Vocabularies are loaded once per process and invalidated only by
    /// explicit recompute (spec.md §4.4).
    async fn vocabularies(&self) -> Result<(BTreeSet<String>, BTreeSet<String>), CoreError> {
        {
            let skills = self.skills_cache.read().await;
            let companies = self.companies_cache.read().await;
            if let (Some(s), Some(c)) = (skills.as_ref(), companies.as_ref()) {
                return Ok((s.clone(), c.clone()));
            }
        }

        let skills = self.store.all_skills()?;
        let companies = self.store.all_companies()?;
        *self.skills_cache.write().await = Some(skills.clone());
        *self.companies_cache.write().await = Some(companies.clone());
        Ok((skills, companies))
    }

    async fn invalidate_vocabularies(&self) {
        *self.skills_cache.write().await = None;
        *self.companies_cache.write().await = None;
    }

    async fn parse_query(&self, text: &str) -> Result<ParsedQuery, CoreError> {
        let (skills, companies) = self.vocabularies().await?;
        Ok(query::parse(text, &skills, &companies))
    }

    /// `POST /recompute`: rebuilds `SIMILAR`/`SIMILAR_JOB` edges and
    /// recomputes both layers' metrics, serialized against concurrent
    /// recomputes (spec.md §5). Readers never block on this lock.
    pub async fn recompute(&self, params: RecomputeParams) -> Result<RecomputeSummary, CoreError> {
        let _guard = self.recompute_lock.lock().await;
        info!(min_shared_skills = params.min_shared_skills, "starting recompute");

        let exclude_ids: Vec<PersonId> = params.exclude.iter().map(|s| PersonId::from(s.clone())).collect();
        let weight_mode = if params.weight_mode.eq_ignore_ascii_case("count") {
            WeightMode::Count
        } else {
            WeightMode::Jaccard
        };

        let similar_params = RebuildSimilarParams {
            min_shared: params.min_shared_skills,
            weight_mode,
            boost_company: params.boost_company,
            boost_school: params.boost_school,
        };

        let similar_edges = similarity::rebuild_similar(self.store.as_ref(), &similar_params)?;
        let similar_job_edges = similarity::rebuild_similar_job(self.store.as_ref(), 1.0)?;

        let embedding_edges_augmented = if params.embed_top_k > 0 {
            similarity::augment_with_embedding_edges(
                self.store.as_ref(),
                self.vectors.as_ref(),
                params.embed_top_k,
                params.embed_scale,
            )
            .await
            .unwrap_or(0)
        } else {
            0
        };

        let persons_scored_skills =
            crate::metrics::recompute_layer(self.store.as_ref(), Layer::Skills, params.max_iter, &exclude_ids)?;
        let persons_scored_job =
            crate::metrics::recompute_layer(self.store.as_ref(), Layer::Job, params.max_iter, &exclude_ids)?;

        self.invalidate_vocabularies().await;

        Ok(RecomputeSummary {
            similar_edges,
            similar_job_edges,
            embedding_edges_augmented,
            persons_scored_skills,
            persons_scored_job,
        })
    }

    pub async fn rank_connections(&self, me: &PersonId, query_text: &str, params: RankParams) -> Result<Vec<RankedPerson>, CoreError> {
        let parsed = self.parse_query(query_text).await?;
        let embedding = self.embedder.embed(query_text).await?;
        rank::rank(
            self.store.as_ref(),
            self.vectors.as_ref(),
            Some(&embedding),
            me,
            &parsed,
            &params,
        )
        .await
    }

    pub async fn rank_connections_batch(
        &self,
        me: &PersonId,
        queries: &[String],
        params: RankParams,
    ) -> Result<Vec<Vec<RankedPerson>>, CoreError> {
        let mut prepared = Vec::with_capacity(queries.len());
        for q in queries {
            let parsed = self.parse_query(q).await?;
            let embedding = self.embedder.embed(q).await?;
            prepared.push((parsed, Some(embedding)));
        }
        rank::rank_batch(self.store.as_ref(), self.vectors.as_ref(), me, &prepared, &params).await
    }

    pub async fn explain_connections(&self, me: &PersonId, query_text: &str, prefilter: bool) -> Result<ExplainResult, CoreError> {
        let parsed = self.parse_query(query_text).await?;
        rank::explain(self.store.as_ref(), me, &parsed, prefilter)
    }

    /// Graph variant: `{me} ∪ top_k` plus `KNOWS` edges between them. On
    /// embedding failure, falls back to `me`'s bounded direct neighbors
    /// with `fallback=true` rather than erroring (spec.md §4.5).
    pub async fn rank_connections_graph(&self, me: &PersonId, query_text: &str, params: RankParams) -> Result<RankGraph, CoreError> {
        let parsed = self.parse_query(query_text).await?;
        match self.embedder.embed(query_text).await {
            Ok(embedding) => {
                let ranked = rank::rank(
                    self.store.as_ref(),
                    self.vectors.as_ref(),
                    Some(&embedding),
                    me,
                    &parsed,
                    &params,
                )
                .await?;
                let node_ids: Vec<PersonId> = std::iter::once(me.clone()).chain(ranked.iter().map(|r| r.id.clone())).collect();
                let edges = self.knows_edges_within(&node_ids)?;
                let mut nodes = Vec::with_capacity(ranked.len() + 1);
                nodes.push(self.me_node(me)?);
                nodes.extend(ranked);
                Ok(RankGraph {
                    nodes,
                    edges,
                    fallback: false,
                    error: None,
                })
            }
            Err(err) => {
                let neighbors = self.store.knows_neighbors(me)?;
                let bounded: Vec<PersonId> = neighbors.into_iter().take(params.top_k).collect();
                let fallback_nodes: Vec<RankedPerson> = bounded
                    .iter()
                    .filter_map(|id| self.store.get_person(id).ok().flatten())
                    .map(|p| RankedPerson {
                        id: p.id.clone(),
                        name: p.name,
                        title: p.title,
                        score: 0.0,
                        components: rank::ScoreComponents {
                            vec_sim: 0.0,
                            skill_match: 0.0,
                            job_match: 0.0,
                            struct_global: 0.0,
                            struct_ego: 0.0,
                            company_match: 0.0,
                        },
                    })
                    .collect();
                let node_ids: Vec<PersonId> = std::iter::once(me.clone()).chain(fallback_nodes.iter().map(|r| r.id.clone())).collect();
                let edges = self.knows_edges_within(&node_ids)?;
                let mut nodes = Vec::with_capacity(fallback_nodes.len() + 1);
                nodes.push(self.me_node(me)?);
                nodes.extend(fallback_nodes);
                Ok(RankGraph {
                    nodes,
                    edges,
                    fallback: true,
                    error: Some(err.to_string()),
                })
            }
        }
    }

    /// `me` always appears in the returned subgraph's node set, scored
    /// `1.0` with zeroed components — spec.md §4.5's "`{me} ∪ top_k`, each
    /// node annotated with its score".
    fn me_node(&self, me: &PersonId) -> Result<RankedPerson, CoreError> {
        let (name, title) = match self.store.get_person(me)? {
            Some(p) => (p.name, p.title),
            None => (String::new(), String::new()),
        };
        Ok(RankedPerson {
            id: me.clone(),
            name,
            title,
            score: 1.0,
            components: rank::ScoreComponents {
                vec_sim: 0.0,
                skill_match: 0.0,
                job_match: 0.0,
                struct_global: 0.0,
                struct_ego: 0.0,
                company_match: 0.0,
            },
        })
    }

    fn knows_edges_within(&self, ids: &[PersonId]) -> Result<Vec<(PersonId, PersonId)>, CoreError> {
        let set: BTreeSet<&PersonId> = ids.iter().collect();
        let mut edges = Vec::new();
        for id in ids {
            for neighbor in self.store.knows_neighbors(id)? {
                if set.contains(&neighbor) && neighbor.as_str() > id.as_str() {
                    edges.push((id.clone(), neighbor));
                }
            }
        }
        Ok(edges)
    }

    pub async fn intro_path(&self, src: &PersonId, dst: &PersonId, max_depth: usize) -> Result<Option<Vec<PersonId>>, CoreError> {
        Ok(self.store.shortest_knows_path(src, dst, max_depth)?)
    }

    pub fn get_person(&self, id: &PersonId) -> Result<Option<Person>, CoreError> {
        Ok(self.store.get_person(id)?)
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankGraph {
    pub nodes: Vec<RankedPerson>,
    pub edges: Vec<(PersonId, PersonId)>,
    pub fallback: bool,
    pub error: Option<String>,
}

/// Cluster inspection and whole-graph rank (spec.md §4.6's `/clusters*` and
/// `/rank`), grounded on `original_source/graph-processor-api/api.py`'s
/// Cypher-only aggregation queries — reimplemented here as in-process scans
/// over `list_persons()` since there is no Cypher layer underneath.
impl RankingEngine {
    pub fn clusters(&self, layer: Layer) -> Result<Vec<ClusterInfo>, CoreError> {
        let persons = self.store.list_persons()?;
        let mut sizes: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
        for p in &persons {
            if let Some(community) = p.layer_metrics(layer).community {
                *sizes.entry(community).or_insert(0) += 1;
            }
        }
        let mut clusters: Vec<ClusterInfo> = sizes
            .into_iter()
            .map(|(community, size)| ClusterInfo { community, size })
            .collect();
        clusters.sort_by(|a, b| b.size.cmp(&a.size));
        Ok(clusters)
    }

    pub fn cluster_summary(&self, layer: Layer, top_n: usize) -> Result<Vec<ClusterSummary>, CoreError> {
        let persons = self.store.list_persons()?;
        let mut by_community: std::collections::HashMap<i64, Vec<&Person>> = std::collections::HashMap::new();
        for p in &persons {
            if let Some(community) = p.layer_metrics(layer).community {
                by_community.entry(community).or_default().push(p);
            }
        }

        let mut summaries: Vec<ClusterSummary> = by_community
            .into_iter()
            .map(|(community, members)| {
                let top_skills = top_by_frequency(members.iter().flat_map(|p| p.skills.iter().cloned()), top_n);
                let top_titles = top_by_frequency(
                    members
                        .iter()
                        .filter_map(|p| p.job_title.clone().or_else(|| Some(p.title.clone())))
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| t.to_lowercase()),
                    top_n,
                );
                ClusterSummary {
                    community,
                    size: members.len(),
                    top_skills,
                    top_titles,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.size.cmp(&a.size));
        Ok(summaries)
    }

    pub fn cluster_members(&self, layer: Layer, community: i64, limit: usize) -> Result<Vec<ClusterMember>, CoreError> {
        let persons = self.store.list_persons()?;
        let mut members: Vec<ClusterMember> = persons
            .into_iter()
            .filter(|p| p.layer_metrics(layer).community == Some(community))
            .map(|p| ClusterMember {
                bridge_potential: p.layer_metrics(layer).bridge_potential,
                id: p.id,
                name: p.name,
                title: p.title,
                company: p.company,
            })
            .collect();
        members.sort_by(|a, b| b.bridge_potential.partial_cmp(&a.bridge_potential).unwrap_or(std::cmp::Ordering::Equal));
        members.truncate(limit);
        Ok(members)
    }

    /// `POST /rank`: whole-graph vector rank weighted by `bridgePotential`,
    /// simpler than the connection ranker (no `KNOWS`-candidate restriction,
    /// no structural/attribute components) — spec.md §4.6.
    pub async fn whole_graph_rank(&self, query_text: &str, top_k: usize) -> Result<Vec<WholeGraphRankedPerson>, CoreError> {
        let embedding = self.embedder.embed(query_text).await?;
        let matches = self.vectors.query(&embedding, top_k).await?;
        let mut ranked = Vec::with_capacity(matches.len());
        for m in matches {
            if let Some(person) = self.store.get_person(&m.id)? {
                let score = m.score as f64 * person.bridge_potential_sum();
                ranked.push(WholeGraphRankedPerson {
                    id: person.id,
                    name: person.name,
                    score,
                });
            }
        }
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }
}

fn top_by_frequency(items: impl Iterator<Item = String>, top_n: usize) -> Vec<String> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for item in items {
        if item.trim().is_empty() {
            continue;
        }
        *counts.entry(item).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.into_iter().take(top_n).map(|(k, _)| k).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterInfo {
    pub community: i64,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub community: i64,
    pub size: usize,
    pub top_skills: Vec<String>,
    pub top_titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterMember {
    pub id: PersonId,
    pub name: String,
    pub title: String,
    pub company: Option<String>,
    pub bridge_potential: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WholeGraphRankedPerson {
    pub id: PersonId,
    pub name: String,
    pub score: f64,
}
