//! Similarity Graph Builder (spec.md §4.2): derives `SIMILAR` (shared
//! skills) and `SIMILAR_JOB` (equal canonical title) edges from the person
//! table, optionally augmented with embedding-kNN edges.
//!
//! Grounded on `original_source/scripts/precompute_graph.py`'s pairwise
//! shared-skill pass, rebuilt here as an in-process O(n^2) scan since the
//! store has no native graph-projection operator to push it into.

use std::collections::BTreeSet;

use tracing::warn;

use crate::error::CoreError;
use crate::graph::{Person, SimilarEdge, SimilarJobEdge};
use crate::storage::GraphStore;
use crate::vector::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    Count,
    Jaccard,
}

pub struct RebuildSimilarParams {
    pub min_shared: usize,
    pub weight_mode: WeightMode,
    pub boost_company: f64,
    pub boost_school: f64,
}

impl Default for RebuildSimilarParams {
    fn default() -> Self {
        Self {
            min_shared: 1,
            weight_mode: WeightMode::Jaccard,
            boost_company: 0.0,
            boost_school: 0.0,
        }
    }
}

fn shared<'a>(a: &'a BTreeSet<String>, b: &'a BTreeSet<String>) -> BTreeSet<&'a String> {
    a.intersection(b).collect()
}

/// Rebuilds `SIMILAR` edges wholesale from the current person table.
pub fn rebuild_similar(store: &dyn GraphStore, params: &RebuildSimilarParams) -> Result<usize, CoreError> {
    let persons = store.list_persons()?;
    let mut edges: Vec<SimilarEdge> = Vec::new();

    for i in 0..persons.len() {
        for j in (i + 1)..persons.len() {
            let (p1, p2) = order_pair(&persons[i], &persons[j]);
            let shared_skills = shared(&p1.skills, &p2.skills);
            let shared_count = shared_skills.len();

            let mut weight = if shared_count >= params.min_shared {
                match params.weight_mode {
                    WeightMode::Count => shared_count as f64,
                    WeightMode::Jaccard => {
                        let union = p1.skills.union(&p2.skills).count();
                        if union == 0 {
                            0.0
                        } else {
                            shared_count as f64 / union as f64
                        }
                    }
                }
            } else {
                0.0
            };

            let shares_company = !p1.company_set().is_disjoint(&p2.company_set());
            let shares_school = !p1.attended.is_disjoint(&p2.attended);

            if shares_company {
                weight += params.boost_company;
            }
            if shares_school {
                weight += params.boost_school;
            }

            let creates_edge = shared_count >= params.min_shared || shares_company || shares_school;
            if !creates_edge {
                continue;
            }

            let jaccard = if params.weight_mode == WeightMode::Jaccard {
                let union = p1.skills.union(&p2.skills).count();
                Some(if union == 0 { 0.0 } else { shared_count as f64 / union as f64 })
            } else {
                None
            };

            edges.push(
                SimilarEdge::new(p1.id.clone(), p2.id.clone(), weight, shared_count as u32)
                    .with_jaccard(jaccard),
            );
        }
    }

    let count = edges.len();
    store.replace_similar_edges(&edges)?;
    Ok(count)
}

/// Rebuilds `SIMILAR_JOB` edges wholesale: one constant-weight edge per
/// pair sharing a non-empty canonical job title.
pub fn rebuild_similar_job(store: &dyn GraphStore, weight: f64) -> Result<usize, CoreError> {
    let persons = store.list_persons()?;
    let mut edges: Vec<SimilarJobEdge> = Vec::new();

    for i in 0..persons.len() {
        for j in (i + 1)..persons.len() {
            let (p1, p2) = order_pair(&persons[i], &persons[j]);
            match (&p1.job_title_canon, &p2.job_title_canon) {
                (Some(a), Some(b)) if !a.is_empty() && a == b => {
                    edges.push(SimilarJobEdge::new(p1.id.clone(), p2.id.clone(), weight));
                }
                _ => {}
            }
        }
    }

    let count = edges.len();
    store.replace_similar_job_edges(&edges)?;
    Ok(count)
}

fn order_pair<'a>(a: &'a Person, b: &'a Person) -> (&'a Person, &'a Person) {
    if a.id.as_str() < b.id.as_str() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Augments `SIMILAR` edges with embedding-kNN edges. Per-pair vector
/// failures are logged and skipped rather than aborting the pass
/// (spec.md §4.2's "partial failures of the vector augmentation are
/// skipped silently").
pub async fn augment_with_embedding_edges(
    store: &dyn GraphStore,
    vectors: &dyn VectorStore,
    top_k: usize,
    scale: f64,
) -> Result<usize, CoreError> {
    let persons = store.list_persons()?;
    let mut existing: Vec<SimilarEdge> = store.list_similar_edges()?;
    let mut index: std::collections::HashMap<(String, String), usize> = std::collections::HashMap::new();
    for (i, e) in existing.iter().enumerate() {
        index.insert((e.a.as_str().to_string(), e.b.as_str().to_string()), i);
    }

    let mut augmented = 0usize;
    for person in &persons {
        let matches = match vectors.query_by_id(&person.id, top_k + 1).await {
            Ok(m) => m,
            Err(err) => {
                warn!(person = %person.id, error = %err, "skipping embedding augmentation for person");
                continue;
            }
        };

        for m in matches.into_iter().take(top_k) {
            if m.id == person.id || m.score <= 0.0 {
                continue;
            }
            let (a, b) = if person.id.as_str() < m.id.as_str() {
                (person.id.clone(), m.id.clone())
            } else {
                (m.id.clone(), person.id.clone())
            };
            let delta = scale * m.score as f64;
            let key = (a.as_str().to_string(), b.as_str().to_string());
            if let Some(&idx) = index.get(&key) {
                existing[idx].weight += delta;
            } else {
                index.insert(key, existing.len());
                existing.push(SimilarEdge::new(a, b, delta, 0));
            }
            augmented += 1;
        }
    }

    store.replace_similar_edges(&existing)?;
    Ok(augmented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};

    fn person(id: &str, skills: &[&str]) -> Person {
        Person::new(id, id).with_skills(skills.iter().map(|s| s.to_string()))
    }

    #[test]
    fn rebuild_similar_creates_edge_for_shared_skills() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_person(&person("P1", &["rust", "python"])).unwrap();
        store.upsert_person(&person("P2", &["rust", "go"])).unwrap();

        let count = rebuild_similar(
            &store,
            &RebuildSimilarParams {
                min_shared: 1,
                weight_mode: WeightMode::Jaccard,
                boost_company: 0.0,
                boost_school: 0.0,
            },
        )
        .unwrap();

        assert_eq!(count, 1);
        let edges = store.list_similar_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert!((edges[0].jaccard.unwrap() - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn rebuild_similar_job_matches_equal_canon_titles() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut p1 = person("P1", &[]);
        p1.job_title_canon = Some("SoftwareEngineer".to_string());
        let mut p2 = person("P2", &[]);
        p2.job_title_canon = Some("SoftwareEngineer".to_string());
        store.upsert_person(&p1).unwrap();
        store.upsert_person(&p2).unwrap();

        let count = rebuild_similar_job(&store, 0.5).unwrap();
        assert_eq!(count, 1);
    }
}
