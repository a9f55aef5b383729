//! Correlation-threshold graph construction.
//!
//! Algorithm:
//! 1. pivot closes into a date × ticker matrix (missing cells stay missing)
//! 2. pairwise-complete Pearson correlation for every ticker pair
//! 3. one node per ticker, in order of first appearance in the table
//! 4. edge `(i, j)` with weight `corr(i, j)` when `corr(i, j) > threshold`
//!
//! The result depends only on the close history, not on row order.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::error::AppError;
use crate::graph::TickerGraph;
use crate::io::PriceTable;
use crate::math::pairwise_pearson;

/// Close prices pivoted to one column per ticker over the union of dates.
#[derive(Debug, Clone)]
pub struct ClosePivot {
    pub dates: Vec<NaiveDate>,
    /// Tickers in discovery order; `columns[k]` belongs to `tickers[k]`.
    pub tickers: Vec<String>,
    pub columns: Vec<Vec<Option<f64>>>,
}

impl ClosePivot {
    pub fn from_table(table: &PriceTable) -> Self {
        let tickers = table.tickers_in_discovery_order();
        let dates: Vec<NaiveDate> = table
            .records()
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let date_pos: HashMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let ticker_pos: HashMap<&str, usize> =
            tickers.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

        let mut columns = vec![vec![None; dates.len()]; tickers.len()];
        for r in table.records() {
            let (Some(&col), Some(&row)) = (ticker_pos.get(r.ticker.as_str()), date_pos.get(&r.date)) else {
                continue;
            };
            columns[col][row] = Some(r.close);
        }

        Self {
            dates,
            tickers,
            columns,
        }
    }

    /// Full correlation matrix; `None` where the correlation is undefined.
    pub fn correlation_matrix(&self) -> Vec<Vec<Option<f64>>> {
        let n = self.columns.len();
        (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| pairwise_pearson(&self.columns[i], &self.columns[j]))
                    .collect()
            })
            .collect()
    }
}

/// Build the correlation graph with a strict `> threshold` edge rule.
pub fn build_correlation_graph(table: &PriceTable, threshold: f64) -> TickerGraph {
    let pivot = ClosePivot::from_table(table);
    let corr = pivot.correlation_matrix();

    let mut graph = TickerGraph::new();
    for ticker in &pivot.tickers {
        graph.add_node(ticker);
    }

    for (i, row) in corr.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate().skip(i + 1) {
            if let Some(c) = cell.filter(|&c| c > threshold) {
                graph.add_edge(&pivot.tickers[i], &pivot.tickers[j], c);
            }
        }
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dates = pivot.dates.len(),
        threshold,
        "built correlation graph"
    );
    graph
}

type GraphCtor = fn(&PriceTable, f64) -> TickerGraph;

/// Tag → builder table.
const GRAPH_BUILDERS: &[(&str, GraphCtor)] = &[("correlation", build_correlation_graph)];

/// Known graph method tags.
pub fn graph_methods() -> Vec<&'static str> {
    GRAPH_BUILDERS.iter().map(|(tag, _)| *tag).collect()
}

/// Build a graph by method tag (`"correlation"`).
pub fn build_graph(method: &str, table: &PriceTable, threshold: f64) -> Result<TickerGraph, AppError> {
    let (_, ctor) = GRAPH_BUILDERS
        .iter()
        .find(|(tag, _)| *tag == method)
        .ok_or_else(|| AppError::InvalidGraphType(method.to_string()))?;
    Ok(ctor(table, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;

    fn table_from_series(series: &[(&str, Vec<f64>)]) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut records = Vec::new();
        for (ticker, closes) in series {
            for (i, &c) in closes.iter().enumerate() {
                records.push(PriceRecord {
                    ticker: ticker.to_string(),
                    date: start + chrono::Duration::days(i as i64),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: 1.0,
                });
            }
        }
        PriceTable::from_records(records).unwrap()
    }

    #[test]
    fn identical_series_form_a_triangle_and_noise_is_isolated() {
        let base = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 8.0, 7.0];
        // Alternating series: orthogonal to the trend-dominated base.
        let flip = vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let table = table_from_series(&[
            ("A", base.clone()),
            ("B", base.clone()),
            ("C", base.clone()),
            ("D", flip),
        ]);

        let corr_ad = pairwise_pearson(
            &base.iter().copied().map(Some).collect::<Vec<_>>(),
            &[1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0].map(Some),
        )
        .unwrap();
        assert!(corr_ad.abs() < 0.6, "fixture should be weakly correlated, got {corr_ad}");

        let g = build_correlation_graph(&table, 0.6);
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);
        for (a, b) in [("A", "B"), ("A", "C"), ("B", "C")] {
            assert!((g.edge_weight(a, b).unwrap() - 1.0).abs() < 1e-12);
        }
        assert_eq!(g.degree("D"), 0);
    }

    #[test]
    fn threshold_is_strict() {
        let table = table_from_series(&[("A", vec![1.0, 2.0, 3.0]), ("B", vec![2.0, 4.0, 6.0])]);
        // Correlation is exactly 1.0, which does not clear a 1.0 cutoff.
        let g = build_correlation_graph(&table, 1.0);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn nodes_follow_discovery_order_and_graph_ignores_row_order() {
        let a = ("ZED", vec![1.0, 2.0, 4.0, 3.0]);
        let b = ("ALP", vec![2.0, 4.0, 8.0, 6.0]);
        let forward = table_from_series(&[a.clone(), b.clone()]);
        let g = build_correlation_graph(&forward, 0.6);
        assert_eq!(g.tickers(), vec!["ZED", "ALP"]);

        let mut shuffled: Vec<PriceRecord> = forward.records().to_vec();
        shuffled.reverse();
        let g2 = build_correlation_graph(&PriceTable::from_records(shuffled).unwrap(), 0.6);
        assert_eq!(g2.edge_count(), g.edge_count());
        assert_eq!(g2.edge_weight("ZED", "ALP"), g.edge_weight("ZED", "ALP"));
    }

    #[test]
    fn unequal_coverage_uses_shared_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mk = |t: &str, day: i64, c: f64| PriceRecord {
            ticker: t.to_string(),
            date: start + chrono::Duration::days(day),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1.0,
        };
        let table = PriceTable::from_records(vec![
            mk("A", 0, 1.0),
            mk("A", 1, 2.0),
            mk("A", 2, 3.0),
            mk("A", 3, 100.0),
            mk("B", 0, 10.0),
            mk("B", 1, 20.0),
            mk("B", 2, 30.0),
        ])
        .unwrap();
        let g = build_correlation_graph(&table, 0.6);
        assert!((g.edge_weight("A", "B").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let table = table_from_series(&[("A", vec![1.0, 2.0])]);
        assert!(build_graph("correlation", &table, 0.6).is_ok());
        let err = build_graph("knn", &table, 0.6).unwrap_err();
        assert_eq!(err, AppError::InvalidGraphType("knn".to_string()));
        assert_eq!(graph_methods(), vec!["correlation"]);
    }
}
