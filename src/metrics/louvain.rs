//! Louvain-style community detection (spec.md §4.3 step 1): greedy
//! modularity-gain over a weighted graph, capped at `max_iter` passes.
//!
//! This is a simplified single-level Louvain (no community-aggregation
//! phase): each node starts in its own community and repeatedly moves to
//! whichever neighboring community yields the largest modularity gain,
//! until a pass makes no moves or `max_iter` is hit. Grounded on
//! `original_source/scripts/precompute_graph.py`'s call into
//! `networkx.algorithms.community.louvain_communities`, reimplemented here
//! since the store has no native graph library to delegate to.

/// `adjacency[i]` = `(neighbor_index, weight)` pairs for node `i`.
pub fn louvain_communities(adjacency: &[Vec<(usize, f64)>], max_iter: usize) -> Vec<i64> {
    let n = adjacency.len();
    if n == 0 {
        return Vec::new();
    }

    let degree_weight: Vec<f64> = adjacency.iter().map(|edges| edges.iter().map(|(_, w)| w).sum()).collect();
    let total_weight: f64 = degree_weight.iter().sum::<f64>() / 2.0;

    let mut community: Vec<usize> = (0..n).collect();
    let mut community_weight: Vec<f64> = degree_weight.clone();

    if total_weight <= 0.0 {
        return community.iter().map(|&c| c as i64).collect();
    }

    for _ in 0..max_iter {
        let mut moved = false;

        for v in 0..n {
            let current_community = community[v];
            let mut weight_to_community: std::collections::HashMap<usize, f64> = std::collections::HashMap::new();
            for &(u, w) in &adjacency[v] {
                if u == v {
                    continue;
                }
                *weight_to_community.entry(community[u]).or_insert(0.0) += w;
            }

            community_weight[current_community] -= degree_weight[v];

            let mut best_community = current_community;
            let mut best_gain = weight_to_community.get(&current_community).copied().unwrap_or(0.0)
                - degree_weight[v] * community_weight[current_community] / (2.0 * total_weight);

            for (&candidate, &w_to) in &weight_to_community {
                if candidate == current_community {
                    continue;
                }
                let gain = w_to - degree_weight[v] * community_weight[candidate] / (2.0 * total_weight);
                if gain > best_gain {
                    best_gain = gain;
                    best_community = candidate;
                }
            }

            community_weight[best_community] += degree_weight[v];
            if best_community != current_community {
                community[v] = best_community;
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    // Relabel to small contiguous ids for stable, readable output.
    let mut relabel: std::collections::HashMap<usize, i64> = std::collections::HashMap::new();
    let mut next_id = 0i64;
    community
        .iter()
        .map(|&c| {
            *relabel.entry(c).or_insert_with(|| {
                let id = next_id;
                next_id += 1;
                id
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_disconnected_triangles_form_two_communities() {
        // Triangle A: 0-1-2, Triangle B: 3-4-5, no edges between.
        let adjacency = vec![
            vec![(1, 1.0), (2, 1.0)],
            vec![(0, 1.0), (2, 1.0)],
            vec![(0, 1.0), (1, 1.0)],
            vec![(4, 1.0), (5, 1.0)],
            vec![(3, 1.0), (5, 1.0)],
            vec![(3, 1.0), (4, 1.0)],
        ];
        let communities = louvain_communities(&adjacency, 20);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn empty_graph_returns_empty_communities() {
        let adjacency: Vec<Vec<(usize, f64)>> = Vec::new();
        assert_eq!(louvain_communities(&adjacency, 10), Vec::new());
    }

    #[test]
    fn isolated_nodes_each_keep_their_own_community() {
        let adjacency = vec![Vec::new(), Vec::new()];
        let communities = louvain_communities(&adjacency, 10);
        assert_ne!(communities[0], communities[1]);
    }
}
