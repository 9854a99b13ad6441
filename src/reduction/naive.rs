//! Single-unit greedy reduction.
//!
//! Colorings already within Δ+1 colors are returned untouched. Anything
//! larger is recolored first-fit in smallest-last (degeneracy) order, which
//! never needs more than Δ+1 colors. The greedy result is only kept when it
//! beats the input.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{Reduction, ReductionError};
use crate::config::ReductionConfig;
use crate::types::{Color, Graph, NodeId};

/// Greedy recoloring in degeneracy order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveReduction;

impl NaiveReduction {
    /// Reduce in place. Returns true if any color changed.
    pub fn recolor(graph: &mut Graph) -> bool {
        let input_colors = graph.count_colors();
        let input_safe = graph.is_safe();
        if input_safe && input_colors <= graph.color_bound() {
            return false;
        }

        let greedy = greedy_coloring(graph, &smallest_last_order(graph));
        let greedy_colors = greedy.iter().collect::<BTreeSet<_>>().len();
        if input_safe && greedy_colors >= input_colors {
            return false;
        }

        debug!(
            graph = %graph.name(),
            from = input_colors,
            to = greedy_colors,
            "greedy recoloring applied"
        );
        graph.apply_colors(&greedy);
        true
    }
}

#[async_trait]
impl Reduction for NaiveReduction {
    fn name(&self) -> &'static str {
        "Naive"
    }

    async fn reduce(&self, mut graph: Graph, config: &ReductionConfig) -> Result<Graph, ReductionError> {
        if config.debug.trace {
            info!(graph = %graph.name(), "Starting reduction for Naive algorithm");
        }
        Self::recolor(&mut graph);
        Ok(graph)
    }
}

/// Order nodes so that each has few neighbors earlier in the order.
///
/// Repeatedly removes a node of minimum remaining degree, then reverses.
fn smallest_last_order(graph: &Graph) -> Vec<NodeId> {
    let mut degree: Vec<usize> = graph.nodes().iter().map(|n| n.degree()).collect();
    let mut removed = vec![false; graph.len()];
    let mut queue: BTreeSet<(usize, usize)> = degree.iter().copied().zip(0..).collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some((_, i)) = queue.pop_first() {
        removed[i] = true;
        order.push(NodeId::new(i));
        for n in graph.neighbors(NodeId::new(i)) {
            let j = n.index();
            if !removed[j] {
                queue.remove(&(degree[j], j));
                degree[j] -= 1;
                queue.insert((degree[j], j));
            }
        }
    }

    order.reverse();
    order
}

/// First-fit coloring following `order`; returns colors in arena order.
fn greedy_coloring(graph: &Graph, order: &[NodeId]) -> Vec<Color> {
    let mut colors: Vec<Option<Color>> = vec![None; graph.len()];
    for &id in order {
        let neighbors = graph.neighbors(id);
        let mut taken = vec![false; neighbors.len() + 1];
        for n in neighbors {
            if let Some(c) = colors[n.index()] {
                if c < taken.len() {
                    taken[c] = true;
                }
            }
        }
        colors[id.index()] = taken.iter().position(|t| !t);
    }
    colors.into_iter().map(|c| c.unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphBuilder;

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
    fn test_smallest_last_covers_all_nodes() {
        let g = cycle(6);
        let mut order: Vec<_> = smallest_last_order(&g).into_iter().map(|n| n.index()).collect();
        order.sort();
        assert_eq!(order, (0..6).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reduces_cycle_to_three() {
        let g = cycle(7);
        let out = NaiveReduction.reduce(g, &ReductionConfig::with_pool_size(1)).await.unwrap();
        assert!(out.is_safe());
        assert!(out.count_colors() <= 3);
    }

    #[tokio::test]
    async fn test_small_coloring_untouched() {
        let mut g = cycle(4);
        for (i, id) in g.node_ids().collect::<Vec<_>>().into_iter().enumerate() {
            g.set_color(id, 10 + i % 2).unwrap();
        }
        let before = g.colors();
        let out = NaiveReduction.reduce(g, &ReductionConfig::with_pool_size(1)).await.unwrap();
        assert_eq!(out.colors(), before);
    }

    #[test]
    fn test_repairs_improper_input() {
        let mut g = cycle(5);
        for id in g.node_ids().collect::<Vec<_>>() {
            g.set_color(id, 0).unwrap();
        }
        assert!(NaiveReduction::recolor(&mut g));
        assert!(g.is_safe());
    }

    #[test]
    fn test_huge_declared_degree() {
        let mut g = GraphBuilder::new("loose")
            .with_max_degree(usize::MAX)
            .build()
            .unwrap();
        assert!(!NaiveReduction::recolor(&mut g));

        let mut g = cycle(5);
        let mut b = GraphBuilder::new("loose_cycle").with_max_degree(usize::MAX);
        let ids: Vec<_> = g.nodes().iter().map(|n| b.add_node(n.name(), 0).unwrap()).collect();
        for (a, c) in g.edges() {
            b.add_edge(ids[a.index()], ids[c.index()]).unwrap();
        }
        let mut loose = b.build().unwrap();
        loose.run_color_init();
        // Five colors on five nodes is already within the clamped bound.
        assert!(!NaiveReduction::recolor(&mut loose));
        assert!(loose.is_safe());
        assert!(NaiveReduction::recolor(&mut g));
    }

    #[test]
    fn test_empty_graph() {
        let mut g = GraphBuilder::new("empty").build().unwrap();
        assert!(!NaiveReduction::recolor(&mut g));
        assert!(g.is_safe());
        assert_eq!(g.count_colors(), 0);
    }
}
