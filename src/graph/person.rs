//! The `Person` node and its derived per-layer metric properties.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Stable external identifier for a person. Ids come from ingestion (out of
/// scope for this crate) and are never generated here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        PersonId(s.to_string())
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        PersonId(s)
    }
}

/// Per-layer structural metrics written by the Metrics Engine.
///
/// Community ids are opaque and only meaningful within a single run of
/// `recompute`; there is no cross-run stability guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMetrics {
    pub community: Option<i64>,
    pub betweenness: f64,
    pub similar_degree: u32,
    pub bridge_coeff: f64,
    pub bridge_potential: f64,
}

impl LayerMetrics {
    /// `bridgePotential = betweenness * bridgeCoeff` — never computed any
    /// other way than through this constructor, so the invariant can't drift.
    pub fn new(betweenness: f64, bridge_coeff: f64, degree: u32) -> Self {
        Self {
            community: None,
            betweenness,
            similar_degree: degree,
            bridge_coeff,
            bridge_potential: betweenness * bridge_coeff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub title: String,
    pub skills: BTreeSet<String>,
    pub job_title: Option<String>,
    pub job_title_canon: Option<String>,
    pub job_title_canon_tokens: Vec<String>,
    pub job_title_tokens: Vec<String>,
    pub company: Option<String>,
    pub worked_at: BTreeSet<String>,
    pub attended: BTreeSet<String>,
    pub metrics_skills: LayerMetrics,
    pub metrics_job: LayerMetrics,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: String::new(),
            skills: BTreeSet::new(),
            job_title: None,
            job_title_canon: None,
            job_title_canon_tokens: Vec::new(),
            job_title_tokens: Vec::new(),
            company: None,
            worked_at: BTreeSet::new(),
            attended: BTreeSet::new(),
            metrics_skills: LayerMetrics::default(),
            metrics_job: LayerMetrics::default(),
        }
    }

    pub fn with_skills(mut self, skills: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.skills = skills.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    pub fn with_job_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Union of the `company` scalar and any `WORKED_AT` companies, matching
    /// spec.md §4.5's `company(p)` source set.
    pub fn company_set(&self) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self.worked_at.iter().cloned().collect();
        if let Some(c) = &self.company {
            set.insert(c.to_lowercase());
        }
        set
    }

    pub fn bridge_potential_sum(&self) -> f64 {
        self.metrics_skills.bridge_potential + self.metrics_job.bridge_potential
    }

    pub fn layer_metrics(&self, layer: super::Layer) -> &LayerMetrics {
        match layer {
            super::Layer::Skills => &self.metrics_skills,
            super::Layer::Job => &self.metrics_job,
        }
    }
}
