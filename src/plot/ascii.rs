//! ASCII actual-vs-predicted chart for terminal output.
//!
//! Fixed-size character grid, deterministic for a given input:
//! - predicted closes: `-` line
//! - actual closes: `o` points (drawn last, so they stay visible)
//!
//! The x axis is calendar time, so gaps (weekends, holidays) keep their width.

use chrono::NaiveDate;

use crate::domain::Prediction;

/// Render `prediction` as a `width` × `height` chart with a one-line header and legend.
pub fn render_prediction_plot(prediction: &Prediction, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();
    let Some((first, last)) = date_span(&prediction.dates) else {
        out.push_str("Plot: (no points)\n");
        return out;
    };

    let t_max = ((last - first).num_days() as f64).max(1.0);
    let xs: Vec<f64> = prediction.dates.iter().map(|d| (*d - first).num_days() as f64).collect();

    let (y_min, y_max) = y_range(&prediction.actual, &prediction.predicted).unwrap_or_else(|| {
        let v = prediction.actual.first().copied().unwrap_or(0.0);
        (v - 0.5, v + 0.5)
    });
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
    let line: Vec<(usize, usize)> = order
        .iter()
        .map(|&i| (map_x(xs[i], t_max, width), map_y(prediction.predicted[i], y_min, y_max, height)))
        .collect();
    draw_polyline(&mut grid, &line);

    for (x, y) in xs.iter().zip(&prediction.actual) {
        grid[map_y(*y, y_min, y_max, height)][map_x(*x, t_max, width)] = 'o';
    }

    out.push_str(&format!("Plot: {first}..{last} | close=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("Legend: o actual, - predicted\n");
    out
}

fn date_span(dates: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    Some((*dates.iter().min()?, *dates.iter().max()?))
}

fn y_range(actual: &[f64], predicted: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &y in actual.iter().chain(predicted) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_max: f64, width: usize) -> usize {
    let u = (t / t_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the chart.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(usize, usize)]) {
    match points {
        [] => {}
        [(x, y)] => grid[*y][*x] = '-',
        _ => {
            for pair in points.windows(2) {
                let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                draw_line(grid, x0, y0, x1, y1, '-');
            }
        }
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            *cell = ch;
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let p = Prediction {
            dates: vec![day(1), day(2)],
            actual: vec![100.0, 110.0],
            predicted: vec![105.0, 105.0],
            mae: 5.0,
        };
        let txt = render_prediction_plot(&p, 10, 5);
        let expected = concat!(
            "Plot: 2025-01-01..2025-01-02 | close=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "----------\n",
            "          \n",
            "o         \n",
            "Legend: o actual, - predicted\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_prediction_renders_placeholder() {
        let p = Prediction {
            dates: vec![],
            actual: vec![],
            predicted: vec![],
            mae: f64::NAN,
        };
        assert_eq!(render_prediction_plot(&p, 20, 8), "Plot: (no points)\n");
    }

    #[test]
    fn single_flat_point_does_not_panic() {
        let p = Prediction {
            dates: vec![day(3)],
            actual: vec![50.0],
            predicted: vec![50.0],
            mae: 0.0,
        };
        let txt = render_prediction_plot(&p, 12, 6);
        assert!(txt.contains('o'));
        assert_eq!(txt.lines().count(), 1 + 6 + 1);
    }
}
