//! Parallel bin merge reduction (KW).
//!
//! Reduces any proper coloring toward Δ+1 colors, the bound that always
//! suffices for a graph of maximum degree Δ.
//!
//! ## Algorithm
//!
//! 1. Graphs with fewer than `2·(Δ+1)` nodes go to [`NaiveReduction`],
//!    spawned as a single task
//! 2. Nodes are partitioned into color bins, first-seen order
//! 3. While there are more than Δ+1 bins:
//!    - split the bins into contiguous groups of `2·(Δ+1)`
//!    - merge every group on the worker pool: nodes of the later bins move
//!      first-fit into the first of the Δ+1 core bins holding none of
//!      their neighbors
//!    - concatenate the merged groups in order
//! 4. Each node takes its bin index as color
//!
//! Δ is the declared maximum degree clamped to the node count, see
//! [`Graph::color_bound`].
//!
//! A node only joins a core bin that holds none of its neighbors, so every
//! bin stays an independent set and the coloring stays proper throughout.
//! With an accurate Δ a node can be blocked by at most Δ core bins, so it
//! always finds a home and each round roughly halves the bin count.
//!
//! Nodes that find no core bin stay behind in their original bin (overflow)
//! for the next round. Running past `max_rounds` stops merging and lets the
//! naive reduction finish from the current (proper) bins. A round that fails
//! to lower the bin count does the same; graphs built by [`GraphBuilder`]
//! always carry a valid Δ, so that branch is a guard only.
//!
//! [`GraphBuilder`]: crate::types::GraphBuilder

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::naive::NaiveReduction;
use super::pool::{Bin, MergePool};
use super::{Reduction, ReductionError};
use crate::config::ReductionConfig;
use crate::types::{Adjacency, Color, Graph, NodeId};

/// Parallel bin merge reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct KwReduction;

#[async_trait]
impl Reduction for KwReduction {
    fn name(&self) -> &'static str {
        "KW"
    }

    async fn reduce(&self, mut graph: Graph, config: &ReductionConfig) -> Result<Graph, ReductionError> {
        config.validate()?;
        if config.debug.trace {
            info!(graph = %graph.name(), pool_size = config.pool_size, "Starting KW reduction");
        }

        let core_len = graph.color_bound();
        let group_len = core_len.saturating_mul(2);

        if graph.len() < group_len {
            debug!(nodes = graph.len(), group_len, "graph too small to split, delegating");
            let config = config.clone();
            let naive = tokio::spawn(async move { NaiveReduction.reduce(graph, &config).await });
            return naive.await?;
        }

        let mut bins = color_bins(&graph);
        if bins.len() <= core_len {
            return Ok(graph);
        }

        let mut pool = MergePool::spawn(config.pool_size, Arc::new(graph.adjacency()), core_len);
        let mut round = 0;
        let mut stalled = false;

        while bins.len() > core_len {
            if round == config.max_rounds {
                warn!(round, bins = bins.len(), "round limit reached, falling back to naive");
                stalled = true;
                break;
            }
            round += 1;

            let before = bins.len();
            let groups = split_groups(bins, group_len);
            debug!(round, bins = before, groups = groups.len(), "merge round");
            bins = pool.run_round(groups).await?;

            // Unreachable while Δ is valid: the first group always shrinks.
            if bins.len() >= before {
                warn!(round, bins = bins.len(), "merge round made no progress, falling back to naive");
                stalled = true;
                break;
            }
        }
        pool.shutdown().await?;

        write_back(&mut graph, &bins);
        if stalled {
            NaiveReduction::recolor(&mut graph);
        }
        if config.debug.trace {
            info!(graph = %graph.name(), rounds = round, colors = graph.count_colors(), "KW reduction done");
        }
        Ok(graph)
    }
}

/// One bin per distinct color, in first-seen node order.
pub(crate) fn color_bins(graph: &Graph) -> Vec<Bin> {
    let mut index: HashMap<Color, usize> = HashMap::new();
    let mut bins: Vec<Bin> = Vec::new();
    for (id, node) in graph.node_ids().zip(graph.nodes()) {
        let slot = *index.entry(node.color()).or_insert_with(|| {
            bins.push(Vec::new());
            bins.len() - 1
        });
        bins[slot].push(id);
    }
    bins
}

/// Contiguous groups of `group_len` bins; the last may be shorter.
pub(crate) fn split_groups(bins: Vec<Bin>, group_len: usize) -> Vec<Vec<Bin>> {
    let mut groups = Vec::with_capacity(bins.len().div_ceil(group_len.max(1)));
    let mut rest = bins.into_iter().peekable();
    while rest.peek().is_some() {
        groups.push(rest.by_ref().take(group_len.max(1)).collect());
    }
    groups
}

/// Merge one group into its first `core_len` bins.
///
/// Returns the core bins followed by whatever could not be placed, each
/// leftover kept in the bin it came from.
pub(crate) fn merge_group(mut group: Vec<Bin>, core_len: usize, adjacency: &Adjacency) -> Vec<Bin> {
    if group.len() <= core_len {
        return group;
    }
    let later = group.split_off(core_len);
    let mut core = group;

    let mut owner: HashMap<NodeId, usize> = HashMap::new();
    for (slot, bin) in core.iter().enumerate() {
        owner.extend(bin.iter().map(|&n| (n, slot)));
    }

    let mut overflow = Vec::new();
    let mut blocked = vec![false; core_len];
    for bin in later {
        let mut left = Vec::new();
        for node in bin {
            blocked.fill(false);
            for n in adjacency.get(node.index()).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(&slot) = owner.get(n) {
                    blocked[slot] = true;
                }
            }
            match blocked.iter().position(|b| !b) {
                Some(slot) => {
                    core[slot].push(node);
                    owner.insert(node, slot);
                }
                None => left.push(node),
            }
        }
        if !left.is_empty() {
            overflow.push(left);
        }
    }

    core.extend(overflow);
    core
}

fn write_back(graph: &mut Graph, bins: &[Bin]) {
    let mut colors = graph.colors();
    for (color, bin) in bins.iter().enumerate() {
        for node in bin {
            colors[node.index()] = color;
        }
    }
    graph.apply_colors(&colors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphBuilder;

    fn ids(raw: &[usize]) -> Bin {
        raw.iter().copied().map(NodeId::new).collect()
    }

    fn cycle(n: usize) -> Graph {
        let mut b = GraphBuilder::new(format!("cycle{n}"));
        let ids: Vec<_> = (0..n).map(|i| b.add_node(format!("v{i}"), 0).unwrap()).collect();
        for i in 0..n {
            b.add_edge(ids[i], ids[(i + 1) % n]).unwrap();
        }
        let mut g = b.build().unwrap();
        g.run_color_init();
        g
    }

    #[test]
    fn test_color_bins_first_seen_order() {
        let mut g = cycle(4);
        for (id, color) in g.node_ids().collect::<Vec<_>>().into_iter().zip([7, 3, 7, 3]) {
            g.set_color(id, color).unwrap();
        }
        assert_eq!(color_bins(&g), vec![ids(&[0, 2]), ids(&[1, 3])]);
    }

    #[test]
    fn test_split_groups_last_shorter() {
        let bins: Vec<Bin> = (0..7).map(|i| ids(&[i])).collect();
        let groups = split_groups(bins, 3);
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(groups[2], vec![ids(&[6])]);
    }

    #[test]
    fn test_merge_first_fit() {
        // Path 0-1-2-3, one bin per node, two core bins.
        let adjacency: Adjacency = vec![
            ids(&[1]),
            ids(&[0, 2]),
            ids(&[1, 3]),
            ids(&[2]),
        ];
        let merged = merge_group(
            vec![ids(&[0]), ids(&[1]), ids(&[2]), ids(&[3])],
            2,
            &adjacency,
        );
        // 2 is blocked by 1 only, lands in core 0; 3 is blocked by 2 in core 0.
        assert_eq!(merged, vec![ids(&[0, 2]), ids(&[1, 3])]);
    }

    #[test]
    fn test_merge_small_group_untouched() {
        let adjacency: Adjacency = vec![Vec::new(); 2];
        let group = vec![ids(&[0]), ids(&[1])];
        assert_eq!(merge_group(group.clone(), 2, &adjacency), group);
    }

    #[test]
    fn test_merge_keeps_overflow_in_original_bins() {
        // Triangle 0-1-2 plus isolated 3, core of two bins: node 2 fits nowhere.
        let adjacency: Adjacency = vec![ids(&[1, 2]), ids(&[0, 2]), ids(&[0, 1]), Vec::new()];
        let merged = merge_group(vec![ids(&[0]), ids(&[1]), ids(&[2, 3])], 2, &adjacency);
        assert_eq!(merged, vec![ids(&[0, 3]), ids(&[1]), ids(&[2])]);
    }

    #[tokio::test]
    async fn test_cycle_reduced_to_three() {
        let g = cycle(12);
        let out = KwReduction.reduce(g, &ReductionConfig::with_pool_size(2)).await.unwrap();
        assert!(out.is_safe());
        assert!(out.count_colors() <= 3);
    }

    #[tokio::test]
    async fn test_pool_size_does_not_change_result() {
        let a = KwReduction.reduce(cycle(30), &ReductionConfig::with_pool_size(1)).await.unwrap();
        let b = KwReduction.reduce(cycle(30), &ReductionConfig::with_pool_size(8)).await.unwrap();
        assert_eq!(a.colors(), b.colors());
    }

    #[tokio::test]
    async fn test_round_limit_falls_back() {
        let mut config = ReductionConfig::with_pool_size(2);
        config.max_rounds = 1;
        let out = KwReduction.reduce(cycle(40), &config).await.unwrap();
        assert!(out.is_safe());
        assert!(out.count_colors() <= 3);
    }

    #[tokio::test]
    async fn test_huge_declared_degree() {
        let text = r#"{
            "name": "loose",
            "max_degree": 18446744073709551615,
            "nodes": [
                { "name": "a", "color": 4, "neighbors": ["b"] },
                { "name": "b", "color": 9, "neighbors": ["a"] }
            ]
        }"#;
        let g = crate::parser::parse_str(text, false).unwrap();
        let out = KwReduction.reduce(g, &ReductionConfig::with_pool_size(2)).await.unwrap();
        assert!(out.is_safe());
        assert_eq!(out.colors(), vec![4, 9]);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = KwReduction.reduce(cycle(12), &ReductionConfig::with_pool_size(0)).await;
        assert!(matches!(result, Err(ReductionError::InvalidConfig(_))));
    }
}
