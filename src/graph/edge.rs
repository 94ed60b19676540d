//! Edge types over the person graph.
//!
//! `SIMILAR` and `SIMILAR_JOB` edges carry a canonical-orientation invariant
//! (`a.id < b.id`) so the edge set never holds both directions of the same
//! pair — enforced at construction, not just documented.

use serde::{Deserialize, Serialize};

use super::person::PersonId;

fn ordered(a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A `KNOWS` edge — the social graph. Undirected semantically; stored with
/// the same ordering invariant so accidental duplicate direction doesn't
/// silently double edges, though per spec.md §9 callers must still tolerate
/// duplicate rows from upstream ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowsEdge {
    pub a: PersonId,
    pub b: PersonId,
}

impl KnowsEdge {
    pub fn new(a: PersonId, b: PersonId) -> Self {
        let (a, b) = ordered(a, b);
        Self { a, b }
    }

    pub fn other<'a>(&'a self, id: &PersonId) -> Option<&'a PersonId> {
        if &self.a == id {
            Some(&self.b)
        } else if &self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// Skills-layer similarity edge (`SIMILAR`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEdge {
    pub a: PersonId,
    pub b: PersonId,
    pub weight: f64,
    pub shared_skills: u32,
    pub jaccard: Option<f64>,
}

impl SimilarEdge {
    pub fn new(a: PersonId, b: PersonId, weight: f64, shared_skills: u32) -> Self {
        let (a, b) = ordered(a, b);
        Self {
            a,
            b,
            weight,
            shared_skills,
            jaccard: None,
        }
    }

    pub fn with_jaccard(mut self, jaccard: Option<f64>) -> Self {
        self.jaccard = jaccard;
        self
    }
}

/// Job-layer similarity edge (`SIMILAR_JOB`) — constant weight, grouped by
/// identical `jobTitleCanon`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarJobEdge {
    pub a: PersonId,
    pub b: PersonId,
    pub weight: f64,
}

impl SimilarJobEdge {
    pub fn new(a: PersonId, b: PersonId, weight: f64) -> Self {
        let (a, b) = ordered(a, b);
        Self { a, b, weight }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_edge_always_canonically_ordered() {
        let e1 = SimilarEdge::new(PersonId::from("P2"), PersonId::from("P1"), 3.0, 3);
        assert_eq!(e1.a, PersonId::from("P1"));
        assert_eq!(e1.b, PersonId::from("P2"));
    }

    #[test]
    fn knows_edge_other_resolves_either_side() {
        let e = KnowsEdge::new(PersonId::from("P1"), PersonId::from("P2"));
        assert_eq!(e.other(&PersonId::from("P1")), Some(&PersonId::from("P2")));
        assert_eq!(e.other(&PersonId::from("P2")), Some(&PersonId::from("P1")));
        assert_eq!(e.other(&PersonId::from("P9")), None);
    }
}
