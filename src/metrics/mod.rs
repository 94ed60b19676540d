//! Metrics Engine (spec.md §4.3): community detection, betweenness
//! centrality, and bridging coefficient over each similarity layer,
//! committed atomically per layer.

pub mod betweenness;
pub mod bridging;
pub mod louvain;

use std::collections::HashMap;

use crate::error::CoreError;
use crate::graph::{Layer, LayerMetrics, PersonId};
use crate::storage::{GraphStore, LayerProjection};

/// Runs community detection, betweenness, and bridging coefficient for one
/// layer and commits the result as a single `apply_layer_metrics` call —
/// spec.md §4.3's "commit all properties atomically per layer".
///
/// Returns the number of persons whose metrics were updated.
pub fn recompute_layer(
    store: &dyn GraphStore,
    layer: Layer,
    max_iter: usize,
    exclude_ids: &[PersonId],
) -> Result<usize, CoreError> {
    let projection = store.project_layer(layer, exclude_ids)?;
    let metrics = compute_layer_metrics(&projection, max_iter);
    let count = metrics.len();
    store.apply_layer_metrics(layer, &metrics)?;
    Ok(count)
}

fn compute_layer_metrics(projection: &LayerProjection, max_iter: usize) -> Vec<(PersonId, LayerMetrics)> {
    let n = projection.nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let index: HashMap<&PersonId, usize> = projection.nodes.iter().enumerate().map(|(i, id)| (id, i)).collect();

    let mut weighted_adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut unweighted_adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (a, b, weight) in &projection.edges {
        if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
            weighted_adjacency[ia].push((ib, *weight));
            weighted_adjacency[ib].push((ia, *weight));
            unweighted_adjacency[ia].push(ib);
            unweighted_adjacency[ib].push(ia);
        }
    }

    let communities = louvain::louvain_communities(&weighted_adjacency, max_iter);
    let betweennesses = betweenness::betweenness_centrality(&unweighted_adjacency);
    let bridge_coeffs = bridging::bridging_coefficients(&unweighted_adjacency);

    projection
        .nodes
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let degree = unweighted_adjacency[i].len() as u32;
            let mut layer_metrics = LayerMetrics::new(betweennesses[i], bridge_coeffs[i], degree);
            layer_metrics.community = communities.get(i).copied();
            (id.clone(), layer_metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_projection_produces_no_metrics() {
        let projection = LayerProjection::default();
        let metrics = compute_layer_metrics(&projection, 10);
        assert!(metrics.is_empty());
    }

    #[test]
    fn path_graph_assigns_highest_betweenness_to_middle_node() {
        let nodes = vec![PersonId::from("A"), PersonId::from("B"), PersonId::from("C")];
        let edges = vec![
            (PersonId::from("A"), PersonId::from("B"), 1.0),
            (PersonId::from("B"), PersonId::from("C"), 1.0),
        ];
        let projection = LayerProjection { nodes, edges };
        let metrics = compute_layer_metrics(&projection, 10);
        let by_id: HashMap<&str, &LayerMetrics> = metrics.iter().map(|(id, m)| (id.as_str(), m)).collect();
        assert!(by_id["B"].betweenness > by_id["A"].betweenness);
        assert_eq!(by_id["A"].similar_degree, 1);
        assert_eq!(by_id["B"].similar_degree, 2);
    }
}
