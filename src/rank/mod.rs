//! Connection Ranker (spec.md §4.5): the per-query pipeline combining
//! vector similarity, attribute Jaccard, and structural signals into a
//! final score.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::{Person, PersonId};
use crate::metrics::bridging::bridging_coefficients;
use crate::query::{expand_job_tokens, ParsedQuery};
use crate::storage::GraphStore;
use crate::vector::VectorStore;

/// Weights `(α, β, γ, δ, ε, ζ)` for `vec, skill, job, struct_global,
/// struct_ego, company` respectively. Defaults per spec.md §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub vec: f64,
    pub skill: f64,
    pub job: f64,
    pub struct_global: f64,
    pub struct_ego: f64,
    pub company: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            vec: 0.40,
            skill: 0.18,
            job: 0.14,
            struct_global: 0.14,
            struct_ego: 0.09,
            company: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub vec_sim: f64,
    pub skill_match: f64,
    pub job_match: f64,
    pub struct_global: f64,
    pub struct_ego: f64,
    pub company_match: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPerson {
    pub id: PersonId,
    pub name: String,
    pub title: String,
    pub score: f64,
    pub components: ScoreComponents,
}

#[derive(Debug, Clone)]
pub struct RankParams {
    pub top_k: usize,
    pub weights: Weights,
    pub pinecone_top_k: usize,
    pub prefilter: bool,
    pub rescale_top: Option<f64>,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            top_k: 10,
            weights: Weights::default(),
            pinecone_top_k: 100,
            prefilter: true,
            rescale_top: Some(0.8),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResult {
    pub goal_skills: BTreeSet<String>,
    pub goal_job_tokens: BTreeSet<String>,
    pub goal_companies: BTreeSet<String>,
    pub candidate_count: usize,
    pub sample_candidate_ids: Vec<PersonId>,
}

fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn min_max_normalize(values: &HashMap<PersonId, f64>) -> HashMap<PersonId, f64> {
    if values.is_empty() {
        return HashMap::new();
    }
    let min = values.values().cloned().fold(f64::INFINITY, f64::min);
    let max = values.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|(id, v)| {
            let normalized = if span > 0.0 { (v - min) / span } else { 0.0 };
            (id.clone(), normalized)
        })
        .collect()
}

/// Candidate set = `me`'s `KNOWS` neighbors, optionally narrowed by the
/// prefilter rule in spec.md §4.5.
fn select_candidates(
    store: &dyn GraphStore,
    me: &PersonId,
    parsed: &ParsedQuery,
    prefilter: bool,
) -> Result<Vec<Person>, CoreError> {
    let neighbor_ids = store.knows_neighbors(me)?;
    let mut candidates = Vec::with_capacity(neighbor_ids.len());
    for id in &neighbor_ids {
        if let Some(person) = store.get_person(id)? {
            candidates.push(person);
        }
    }

    let has_goals = !parsed.goal_skills.is_empty() || !parsed.goal_job_tokens.is_empty() || !parsed.goal_companies.is_empty();
    if !prefilter || !has_goals {
        return Ok(candidates);
    }

    let job_and_company_only = !parsed.goal_job_tokens.is_empty() && !parsed.goal_companies.is_empty() && parsed.goal_skills.is_empty();

    Ok(candidates
        .into_iter()
        .filter(|p| {
            let skill_hit = !parsed.goal_skills.is_empty() && !p.skills.is_disjoint(&parsed.goal_skills);
            let expanded_job = expand_job_tokens(&p.job_title_canon_tokens);
            let job_hit = !parsed.goal_job_tokens.is_empty() && !expanded_job.is_disjoint(&parsed.goal_job_tokens);
            let company_hit = !parsed.goal_companies.is_empty() && !p.company_set().is_disjoint(&parsed.goal_companies);

            if job_and_company_only {
                job_hit && company_hit
            } else {
                skill_hit || job_hit || company_hit
            }
        })
        .collect())
}

fn struct_ego_scores(store: &dyn GraphStore, me: &PersonId, candidates: &[Person]) -> Result<HashMap<PersonId, f64>, CoreError> {
    let ego_nodes = store.knows_neighbors(me)?;
    let ego_set: BTreeSet<&PersonId> = ego_nodes.iter().collect();
    let index: HashMap<&PersonId, usize> = ego_nodes.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); ego_nodes.len()];
    for (i, id) in ego_nodes.iter().enumerate() {
        for neighbor in store.knows_neighbors(id)? {
            if ego_set.contains(&neighbor) {
                if let Some(&j) = index.get(&neighbor) {
                    adjacency[i].push(j);
                }
            }
        }
    }

    let coeffs = bridging_coefficients(&adjacency);
    let raw: HashMap<PersonId, f64> = ego_nodes.iter().enumerate().map(|(i, id)| (id.clone(), coeffs[i])).collect();

    let candidate_ids: BTreeSet<&PersonId> = candidates.iter().map(|p| &p.id).collect();
    let restricted: HashMap<PersonId, f64> = raw.into_iter().filter(|(id, _)| candidate_ids.contains(id)).collect();
    Ok(min_max_normalize(&restricted))
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// `rank(me_id, query, top_k, weights, pinecone_top_k, prefilter,
/// rescale_top) -> ordered list of RankedPerson`.
pub async fn rank(
    store: &dyn GraphStore,
    vectors: &dyn VectorStore,
    embed_query_vector: Option<&[f32]>,
    me: &PersonId,
    parsed: &ParsedQuery,
    params: &RankParams,
) -> Result<Vec<RankedPerson>, CoreError> {
    let candidates = select_candidates(store, me, parsed, params.prefilter)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let vec_scores: HashMap<PersonId, f64> = if let Some(qvec) = embed_query_vector {
        let matches = vectors.query(qvec, params.pinecone_top_k).await?;
        matches.into_iter().map(|m| (m.id, m.score as f64)).collect()
    } else {
        HashMap::new()
    };

    let struct_global_raw: HashMap<PersonId, f64> =
        candidates.iter().map(|p| (p.id.clone(), p.bridge_potential_sum())).collect();
    let struct_global = min_max_normalize(&struct_global_raw);

    let struct_ego = struct_ego_scores(store, me, &candidates)?;

    let mut ranked: Vec<RankedPerson> = candidates
        .iter()
        .map(|p| {
            let vec_sim = round4(vec_scores.get(&p.id).copied().unwrap_or(0.0));
            let skill_match = round4(jaccard(&parsed.goal_skills, &p.skills));
            let expanded_job = expand_job_tokens(&p.job_title_canon_tokens);
            let job_match = round4(jaccard(&parsed.goal_job_tokens, &expanded_job));
            let struct_global_score = round4(struct_global.get(&p.id).copied().unwrap_or(0.0));
            let struct_ego_score = round4(struct_ego.get(&p.id).copied().unwrap_or(0.0));
            let company_match = if parsed.goal_companies.is_empty() {
                0.0
            } else {
                round4(jaccard(&parsed.goal_companies, &p.company_set()))
            };

            let w = &params.weights;
            let score = round4(
                w.vec * vec_sim
                    + w.skill * skill_match
                    + w.job * job_match
                    + w.struct_global * struct_global_score
                    + w.struct_ego * struct_ego_score
                    + w.company * company_match,
            );

            RankedPerson {
                id: p.id.clone(),
                name: p.name.clone(),
                title: p.title.clone(),
                score,
                components: ScoreComponents {
                    vec_sim,
                    skill_match,
                    job_match,
                    struct_global: struct_global_score,
                    struct_ego: struct_ego_score,
                    company_match,
                },
            }
        })
        .collect();

    if let Some(rescale_top) = params.rescale_top {
        let max_score = ranked.iter().map(|r| r.score).fold(0.0f64, f64::max);
        if max_score > 0.0 {
            for r in &mut ranked {
                r.score = round4((r.score / max_score) * rescale_top);
            }
        }
    }

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(params.top_k);
    Ok(ranked)
}

/// Batch variant: same logic iterated over queries, reusing the candidate
/// fetch when every query shares the same `me`.
pub async fn rank_batch(
    store: &dyn GraphStore,
    vectors: &dyn VectorStore,
    me: &PersonId,
    queries: &[(ParsedQuery, Option<Vec<f32>>)],
    params: &RankParams,
) -> Result<Vec<Vec<RankedPerson>>, CoreError> {
    let mut results = Vec::with_capacity(queries.len());
    for (parsed, embedding) in queries {
        let ranked = rank(store, vectors, embedding.as_deref(), me, parsed, params).await?;
        results.push(ranked);
    }
    Ok(results)
}

/// Explain variant: returns parsed goals, candidate count, and a sample of
/// candidate ids — no scoring.
pub fn explain(store: &dyn GraphStore, me: &PersonId, parsed: &ParsedQuery, prefilter: bool) -> Result<ExplainResult, CoreError> {
    let candidates = select_candidates(store, me, parsed, prefilter)?;
    let sample_candidate_ids = candidates.iter().take(10).map(|p| p.id.clone()).collect();
    Ok(ExplainResult {
        goal_skills: parsed.goal_skills.clone(),
        goal_job_tokens: parsed.goal_job_tokens.clone(),
        goal_companies: parsed.goal_companies.clone(),
        candidate_count: candidates.len(),
        sample_candidate_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_default_matches_spec() {
        let w = Weights::default();
        let sum = w.vec + w.skill + w.job + w.struct_global + w.struct_ego + w.company;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a: BTreeSet<String> = ["rust".to_string()].into_iter().collect();
        let b: BTreeSet<String> = ["python".to_string()].into_iter().collect();
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a: BTreeSet<String> = ["rust".to_string()].into_iter().collect();
        assert_eq!(jaccard(&a, &a.clone()), 1.0);
    }

    #[test]
    fn min_max_normalize_maps_extremes_to_zero_and_one() {
        let mut values = HashMap::new();
        values.insert(PersonId::from("A"), 1.0);
        values.insert(PersonId::from("B"), 5.0);
        let normalized = min_max_normalize(&values);
        assert_eq!(normalized[&PersonId::from("A")], 0.0);
        assert_eq!(normalized[&PersonId::from("B")], 1.0);
    }
}
