use super::Series;
use super::scale::{Scale, ScaleMode, compute_scale, compute_scale_with};
use crate::util::{date_label, fmt_price, format_with_commas};

use chrono::{DateTime, Utc};
use exchange::Period;

const DEFAULT_VALUE_TICKS: usize = 5;
const DEFAULT_INDEX_TICKS: usize = 5;
const DEFAULT_LABEL_SIZE: (f64, f64) = (64.0, 20.0);
/// Horizontal distance between the last point and its label
const LABEL_GAP: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Drawable region inside the margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// A series point placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Gridline position with its label; `position` is a y for value ticks and an
/// x for index ticks
#[derive(Debug, Clone, PartialEq)]
pub struct GridTick {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSpec {
    /// Polyline through every point
    pub line: Vec<(f64, f64)>,
    /// Polyline closed down to the baseline on both ends
    pub area: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineGeometry {
    pub points: Vec<Point2D>,
    pub path: PathSpec,
    pub scale: Scale,
    pub plot: PlotArea,
    pub value_ticks: Vec<GridTick>,
    pub index_ticks: Vec<GridTick>,
    pub last_label: LabelRect,
}

impl LineGeometry {
    pub fn last_point(&self) -> Option<&Point2D> {
        self.points.last()
    }
}

/// Outcome of a build, too short a series is a regular `NoData`
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    NoData,
    Line(LineGeometry),
}

/// Maps a series onto a `width` x `height` canvas
#[derive(Debug, Clone)]
pub struct GeometryBuilder {
    width: f64,
    height: f64,
    margins: Margins,
    value_ticks: usize,
    index_ticks: usize,
    label_size: (f64, f64),
    mode: ScaleMode,
    period: Period,
}

impl GeometryBuilder {
    pub fn new(width: f64, height: f64, margins: Margins) -> Self {
        Self {
            width,
            height,
            margins,
            value_ticks: DEFAULT_VALUE_TICKS,
            index_ticks: DEFAULT_INDEX_TICKS,
            label_size: DEFAULT_LABEL_SIZE,
            mode: ScaleMode::default(),
            period: Period::default(),
        }
    }

    pub fn value_ticks(mut self, count: usize) -> Self {
        self.value_ticks = count;
        self
    }

    pub fn index_ticks(mut self, count: usize) -> Self {
        self.index_ticks = count;
        self
    }

    pub fn label_size(mut self, width: f64, height: f64) -> Self {
        self.label_size = (width, height);
        self
    }

    pub fn scale_mode(mut self, mode: ScaleMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn plot_area(&self) -> PlotArea {
        let m = self.margins;
        PlotArea {
            left: m.left,
            top: m.top,
            width: (self.width - m.left - m.right).max(0.0),
            height: (self.height - m.top - m.bottom).max(0.0),
        }
    }

    pub fn build(&self, series: &Series) -> Geometry {
        if !series.is_drawable() {
            return Geometry::NoData;
        }

        let plot = self.plot_area();
        let scale = compute_scale_with(&series.closes(), self.mode);

        let n = series.len();
        let last_index = (n - 1) as f64;

        let points: Vec<Point2D> = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| Point2D {
                x: plot.left + (i as f64 / last_index) * plot.width,
                y: self.price_to_y(p.close, &scale, &plot),
                price: p.close,
                timestamp: p.timestamp,
            })
            .collect();

        let line: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();

        let baseline = self.height - self.margins.bottom;
        let mut area = Vec::with_capacity(line.len() + 2);
        area.push((points[0].x, baseline));
        area.extend_from_slice(&line);
        area.push((points[n - 1].x, baseline));

        let value_ticks = self.value_gridlines(&scale, &plot);
        let index_ticks = self.index_gridlines(&points);
        let last_label = self.last_label(&points[n - 1], &plot);

        Geometry::Line(LineGeometry {
            points,
            path: PathSpec { line, area },
            scale,
            plot,
            value_ticks,
            index_ticks,
            last_label,
        })
    }

    fn price_to_y(&self, price: f64, scale: &Scale, plot: &PlotArea) -> f64 {
        let y = plot.top + scale.inverted_ratio(price) * plot.height;

        match self.mode {
            ScaleMode::Trimmed if !scale.contains(price) => y.clamp(plot.top, plot.bottom()),
            _ => y,
        }
    }

    fn value_gridlines(&self, scale: &Scale, plot: &PlotArea) -> Vec<GridTick> {
        let count = self.value_ticks;

        (0..count)
            .map(|k| {
                let ratio = if count == 1 {
                    0.5
                } else {
                    k as f64 / (count - 1) as f64
                };
                let value = scale.max - ratio * scale.range();
                GridTick {
                    position: plot.top + ratio * plot.height,
                    label: format_with_commas(value),
                }
            })
            .collect()
    }

    fn index_gridlines(&self, points: &[Point2D]) -> Vec<GridTick> {
        let count = self.index_ticks;
        let last = points.len() - 1;

        let mut indices: Vec<usize> = (0..count)
            .map(|k| {
                if count == 1 {
                    last
                } else {
                    ((k * last) as f64 / (count - 1) as f64).round() as usize
                }
            })
            .collect();
        indices.dedup();

        indices
            .into_iter()
            .map(|i| GridTick {
                position: points[i].x,
                label: date_label(points[i].timestamp, self.period),
            })
            .collect()
    }

    fn last_label(&self, last: &Point2D, plot: &PlotArea) -> LabelRect {
        let (width, height) = self.label_size;

        let mut x = last.x + LABEL_GAP;
        if x + width > plot.right() {
            x = last.x - LABEL_GAP - width;
        }
        let x = x.min(plot.right() - width).max(plot.left);

        let max_y = self.height - self.margins.bottom - height;
        let y = (last.y - height / 2.0).min(max_y).max(self.margins.top);

        LabelRect {
            x,
            y,
            width,
            height,
            text: fmt_price(last.price),
        }
    }
}

pub fn build(series: &Series, width: f64, height: f64, margins: Margins) -> Geometry {
    GeometryBuilder::new(width, height, margins).build(series)
}

/// Bare polyline of `values` filling a `width` x `height` box, empty when
/// fewer than two finite values are given
pub fn sparkline(values: &[f64], width: f64, height: f64) -> Vec<(f64, f64)> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        return vec![];
    }

    let scale = compute_scale(&values);
    let last_index = (values.len() - 1) as f64;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            (
                (i as f64 / last_index) * width,
                scale.inverted_ratio(*v) * height,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::PricePoint;

    fn series(closes: &[f64]) -> Series {
        Series::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    PricePoint::new(DateTime::from_timestamp(i as i64 + 1, 0).unwrap(), *c)
                })
                .collect(),
        )
    }

    fn line(geometry: Geometry) -> LineGeometry {
        match geometry {
            Geometry::Line(line) => line,
            Geometry::NoData => panic!("expected a line"),
        }
    }

    #[test]
    fn short_series_is_no_data() {
        assert_eq!(build(&series(&[]), 100.0, 40.0, Margins::ZERO), Geometry::NoData);
        assert_eq!(build(&series(&[5.0]), 100.0, 40.0, Margins::ZERO), Geometry::NoData);
    }

    #[test]
    fn near_flat_series_end_to_end() {
        let line = line(build(&series(&[50.0, 50.0, 51.0]), 100.0, 40.0, Margins::ZERO));

        let xs: Vec<f64> = line.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);

        // 6% of 51 beats the raw range of 1, then 10% padding on each side
        assert!((line.scale.range() - 3.06 * 1.2).abs() < 1e-9);
        assert!(line.points[2].y < line.points[0].y);
        assert!(line.points[2].y < line.points[1].y);
        assert_eq!(line.points[0].y, line.points[1].y);
    }

    #[test]
    fn points_span_the_plot_width() {
        let margins = Margins::new(10.0, 30.0, 20.0, 40.0);
        let builder = GeometryBuilder::new(400.0, 200.0, margins);
        let plot = builder.plot_area();
        let line = line(builder.build(&series(&[3.0, 9.0, 4.0, 7.0, 5.0])));

        assert_eq!(line.points.len(), 5);
        assert_eq!(line.points[0].x, margins.left);
        assert_eq!(line.points[4].x, margins.left + plot.width);
        for p in &line.points {
            assert!(p.y >= plot.top && p.y <= plot.bottom());
        }
    }

    #[test]
    fn area_closes_on_the_baseline() {
        let margins = Margins::new(5.0, 5.0, 15.0, 5.0);
        let line = line(build(&series(&[1.0, 2.0, 3.0]), 100.0, 80.0, margins));

        let baseline = 80.0 - 15.0;
        assert_eq!(line.path.area.len(), line.path.line.len() + 2);
        assert_eq!(line.path.area.first(), Some(&(5.0, baseline)));
        assert_eq!(line.path.area.last(), Some(&(95.0, baseline)));
        assert_eq!(&line.path.area[1..4], line.path.line.as_slice());
    }

    #[test]
    fn ticks_are_evenly_spaced() {
        let line = line(
            GeometryBuilder::new(100.0, 100.0, Margins::ZERO)
                .value_ticks(5)
                .index_ticks(3)
                .build(&series(&[10.0, 20.0, 30.0, 40.0, 50.0])),
        );

        let ys: Vec<f64> = line.value_ticks.iter().map(|t| t.position).collect();
        assert_eq!(ys, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(line.value_ticks[0].label, format_with_commas(line.scale.max));

        let xs: Vec<f64> = line.index_ticks.iter().map(|t| t.position).collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn index_ticks_collapse_on_short_series() {
        let line = line(
            GeometryBuilder::new(100.0, 100.0, Margins::ZERO)
                .index_ticks(6)
                .build(&series(&[1.0, 2.0])),
        );

        assert_eq!(line.index_ticks.len(), 2);
    }

    #[test]
    fn last_label_flips_left_and_stays_inside() {
        let margins = Margins::new(10.0, 10.0, 10.0, 10.0);
        let line = line(
            GeometryBuilder::new(200.0, 100.0, margins)
                .label_size(50.0, 20.0)
                .build(&series(&[1.0, 2.0, 100.0])),
        );

        let last = line.last_point().unwrap();
        let label = &line.last_label;

        assert!(label.x + label.width <= last.x);
        assert!(label.x >= margins.left);
        assert!(label.y >= margins.top);
        assert!(label.y <= 100.0 - margins.bottom - label.height);
        assert_eq!(label.text, "$100.00");
    }

    #[test]
    fn last_label_clamps_to_bottom() {
        let line = line(
            GeometryBuilder::new(100.0, 60.0, Margins::ZERO)
                .label_size(30.0, 40.0)
                .build(&series(&[100.0, 50.0])),
        );

        assert_eq!(line.last_label.y, 60.0 - 40.0);
    }

    #[test]
    fn trimmed_mode_keeps_spikes_inside_the_plot() {
        let mut closes = vec![100.0; 40];
        closes.push(1000.0);

        let line = line(
            GeometryBuilder::new(300.0, 100.0, Margins::ZERO)
                .scale_mode(ScaleMode::Trimmed)
                .build(&series(&closes)),
        );

        assert_eq!(line.points[40].y, 0.0);
    }

    #[test]
    fn sparkline_fills_its_box() {
        let path = sparkline(&[1.0, f64::NAN, 3.0, 2.0], 60.0, 20.0);

        assert_eq!(path.len(), 3);
        assert_eq!(path[0].0, 0.0);
        assert_eq!(path[2].0, 60.0);
        assert!(path[1].1 < path[0].1);
        assert!(path.iter().all(|(_, y)| *y >= 0.0 && *y <= 20.0));
        assert!(sparkline(&[1.0], 60.0, 20.0).is_empty());
    }
}
