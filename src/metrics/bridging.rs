//! Bridging coefficient (spec.md §4.3 step 3):
//!
//! `bridgeCoeff(v) = (1/deg(v)) / sum_{u in N(v)} (1/deg(u))` when
//! `deg(v) > 0` and the sum is positive; else `0`.
//!
//! Grounded on `original_source/scripts/cluster_and_bridge.py`'s bridging
//! coefficient pass (the same formula, computed there via a Python/NetworkX
//! walk over `G.neighbors(v)`).

/// `adjacency[i]` holds the neighbor indices of node `i` (simple graph, no
/// self-loops, each edge listed from both endpoints).
pub fn bridging_coefficients(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let degree: Vec<usize> = adjacency.iter().map(|n| n.len()).collect();

    adjacency
        .iter()
        .enumerate()
        .map(|(v, neighbors)| {
            let deg_v = degree[v];
            if deg_v == 0 {
                return 0.0;
            }
            let sum_inv_deg_neighbors: f64 = neighbors
                .iter()
                .map(|&u| if degree[u] > 0 { 1.0 / degree[u] as f64 } else { 0.0 })
                .sum();
            if sum_inv_deg_neighbors <= 0.0 {
                0.0
            } else {
                (1.0 / deg_v as f64) / sum_inv_deg_neighbors
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_graph_center_has_low_bridge_coefficient() {
        // 0 is the hub connected to 1,2,3 (leaves).
        let adjacency = vec![vec![1, 2, 3], vec![0], vec![0], vec![0]];
        let coeffs = bridging_coefficients(&adjacency);
        assert!(coeffs[0] < coeffs[1]);
    }

    #[test]
    fn isolated_node_has_zero_bridge_coefficient() {
        let adjacency = vec![vec![1], vec![0], vec![]];
        let coeffs = bridging_coefficients(&adjacency);
        assert_eq!(coeffs[2], 0.0);
    }
}
