//! Ticker correlation graph.
//!
//! - graph container over `petgraph` (`TickerGraph`)
//! - correlation-threshold construction and the method factory (`correlation`)
//! - per-node structural metrics (`features`)

pub mod correlation;
pub mod features;

pub use correlation::*;
pub use features::*;

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

/// Undirected weighted graph whose nodes are tickers.
///
/// Node order is insertion order; nodes are never removed, so `NodeIndex::index()`
/// doubles as a dense position in that order.
#[derive(Debug, Clone, Default)]
pub struct TickerGraph {
    graph: UnGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl TickerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker node (idempotent).
    pub fn add_node(&mut self, ticker: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(ticker) {
            return idx;
        }
        let idx = self.graph.add_node(ticker.to_string());
        self.index.insert(ticker.to_string(), idx);
        idx
    }

    /// Add or overwrite the edge between two distinct tickers.
    ///
    /// Self-loops are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) {
        if a == b {
            return;
        }
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        self.graph.update_edge(ia, ib, weight);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.index.contains_key(ticker)
    }

    /// Tickers in insertion order.
    pub fn tickers(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|i| self.graph[i].as_str())
            .collect()
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = self.index.get(a)?;
        let ib = self.index.get(b)?;
        let e = self.graph.find_edge(*ia, *ib)?;
        self.graph.edge_weight(e).copied()
    }

    pub fn degree(&self, ticker: &str) -> usize {
        self.index
            .get(ticker)
            .map(|&i| self.graph.neighbors(i).count())
            .unwrap_or(0)
    }

    /// Neighbour lists by dense node position, each sorted ascending.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|i| {
                let mut nbrs: Vec<usize> = self.graph.neighbors(i).map(|n| n.index()).collect();
                nbrs.sort_unstable();
                nbrs.dedup();
                nbrs
            })
            .collect()
    }

    /// Edges as `(a, b, weight)` in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str, f64)> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                let w = *self.graph.edge_weight(e)?;
                Some((self.graph[a].as_str(), self.graph[b].as_str(), w))
            })
            .collect()
    }

    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n <= 1.0 {
            0.0
        } else {
            2.0 * self.edge_count() as f64 / (n * (n - 1.0))
        }
    }

    pub fn summary(&self) -> GraphSummary {
        let weights: Vec<f64> = self.edges().iter().map(|e| e.2).collect();
        GraphSummary {
            nodes: self.node_count(),
            edges: self.edge_count(),
            density: self.density(),
            isolated: self.adjacency().iter().filter(|n| n.is_empty()).count(),
            mean_weight: crate::math::mean(&weights),
        }
    }
}

/// Headline numbers for reports.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub isolated: usize,
    /// `None` when the graph has no edges.
    pub mean_weight: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_undirected_without_self_loops() {
        let mut g = TickerGraph::new();
        g.add_edge("A", "B", 0.8);
        g.add_edge("B", "A", 0.9);
        g.add_edge("A", "A", 1.0);
        g.add_node("C");

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_weight("A", "B"), Some(0.9));
        assert_eq!(g.edge_weight("B", "A"), Some(0.9));
        assert_eq!(g.degree("A"), 1);
        assert_eq!(g.degree("C"), 0);
        assert_eq!(g.tickers(), vec!["A", "B", "C"]);
    }

    #[test]
    fn summary_counts_isolated_nodes() {
        let mut g = TickerGraph::new();
        g.add_edge("A", "B", 0.7);
        g.add_edge("B", "C", 0.9);
        g.add_node("D");

        let s = g.summary();
        assert_eq!(s.nodes, 4);
        assert_eq!(s.edges, 2);
        assert_eq!(s.isolated, 1);
        assert!((s.density - 2.0 / 6.0).abs() < 1e-12);
        assert!((s.mean_weight.unwrap() - 0.8).abs() < 1e-12);
    }
}
