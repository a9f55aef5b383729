//! Per-node structural metrics.
//!
//! All metrics treat the graph as unweighted (hop distances), matching the
//! standard definitions:
//!
//! - degree: `deg / (N - 1)`, 0 when `N = 1`
//! - closeness: `(r - 1) / Σ d(u, v)` over the `r` nodes reachable from `u`
//!   (itself included), scaled by `(r - 1) / (N - 1)` so nodes in small
//!   components are not over-rated; 0 for isolated nodes
//! - betweenness: Brandes accumulation over every source, normalized by
//!   `1 / ((N - 1)(N - 2))`; 0 when `N <= 2`
//! - clustering: linked neighbour pairs / all neighbour pairs; 0 when `deg < 2`

use std::collections::{HashMap, VecDeque};

use crate::domain::GraphFeatureRow;
use crate::graph::TickerGraph;

/// One feature row per node, in graph insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<GraphFeatureRow>,
    index: HashMap<String, usize>,
}

impl FeatureTable {
    pub fn from_rows(rows: Vec<GraphFeatureRow>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.ticker.clone(), i))
            .collect();
        Self { rows, index }
    }

    pub fn rows(&self) -> &[GraphFeatureRow] {
        &self.rows
    }

    pub fn get(&self, ticker: &str) -> Option<&GraphFeatureRow> {
        self.index.get(ticker).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by ticker.
    pub fn sorted(&self) -> Vec<GraphFeatureRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        rows
    }
}

/// Compute every metric for every node of `graph`.
pub fn extract_features(graph: &TickerGraph) -> FeatureTable {
    let adj = graph.adjacency();
    let degree = degree_centrality(&adj);
    let closeness = closeness_centrality(&adj);
    let betweenness = betweenness_centrality(&adj);
    let clustering = clustering_coefficient(&adj);

    let rows = graph
        .tickers()
        .into_iter()
        .enumerate()
        .map(|(i, ticker)| GraphFeatureRow {
            ticker: ticker.to_string(),
            degree: degree[i],
            closeness: closeness[i],
            betweenness: betweenness[i],
            clustering: clustering[i],
        })
        .collect();

    tracing::debug!(nodes = adj.len(), "extracted graph features");
    FeatureTable::from_rows(rows)
}

pub fn degree_centrality(adj: &[Vec<usize>]) -> Vec<f64> {
    let n = adj.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let denom = (n - 1) as f64;
    adj.iter().map(|nbrs| nbrs.len() as f64 / denom).collect()
}

pub fn closeness_centrality(adj: &[Vec<usize>]) -> Vec<f64> {
    let n = adj.len();
    (0..n)
        .map(|u| {
            let dist = bfs_distances(adj, u);
            let reached: Vec<usize> = dist.iter().flatten().copied().collect();
            let total: usize = reached.iter().sum();
            let r = reached.len();
            if total == 0 || n <= 1 {
                return 0.0;
            }
            let base = (r - 1) as f64 / total as f64;
            base * (r - 1) as f64 / (n - 1) as f64
        })
        .collect()
}

pub fn betweenness_centrality(adj: &[Vec<usize>]) -> Vec<f64> {
    let n = adj.len();
    let mut bc = vec![0.0; n];

    for s in 0..n {
        // Brandes: BFS from s recording shortest-path counts and predecessors,
        // then accumulate dependencies in reverse BFS order.
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[s] = 1.0;
        dist[s] = Some(0);

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in &adj[v] {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for v in &mut bc {
            *v *= scale;
        }
    }
    bc
}

pub fn clustering_coefficient(adj: &[Vec<usize>]) -> Vec<f64> {
    adj.iter()
        .map(|nbrs| {
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for (i, &a) in nbrs.iter().enumerate() {
                for &b in &nbrs[i + 1..] {
                    // Neighbour lists are sorted, so binary search is valid.
                    if adj[a].binary_search(&b).is_ok() {
                        links += 1;
                    }
                }
            }
            links as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

fn bfs_distances(adj: &[Vec<usize>], source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let dv = dist[v].unwrap_or(0);
        for &w in &adj[v] {
            if dist[w].is_none() {
                dist[w] = Some(dv + 1);
                queue.push_back(w);
            }
        }
    }
    dist
}
