use super::geometry::{LineGeometry, Point2D};
use crate::util::{fmt_price, tooltip_date};

use exchange::Period;

/// Index of the series point closest to `pointer_x` along the plot.
///
/// The pointer is clamped to the plot, so any position resolves to a valid
/// index once there is at least one point. Exact halves go to the lower index.
pub fn resolve_index(pointer_x: f64, len: usize, plot_left: f64, plot_width: f64) -> Option<usize> {
    let last = len.checked_sub(1)?;

    let t = if pointer_x.is_finite() && plot_width > 0.0 {
        ((pointer_x - plot_left) / plot_width).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let scaled = t * last as f64;
    let index = (scaled - 0.5).ceil().max(0.0) as usize;

    Some(index.min(last))
}

pub fn resolve(pointer_x: f64, points: &[Point2D], plot_left: f64, plot_width: f64) -> Option<&Point2D> {
    resolve_index(pointer_x, points.len(), plot_left, plot_width).map(|i| &points[i])
}

/// Point under the crosshair with its tooltip text
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub index: usize,
    pub point: Point2D,
    pub date: String,
    pub price: String,
}

impl Hover {
    pub fn label(&self) -> String {
        format!("{}  {}", self.date, self.price)
    }
}

pub fn hover(pointer_x: f64, geometry: &LineGeometry, period: Period) -> Option<Hover> {
    let index = resolve_index(
        pointer_x,
        geometry.points.len(),
        geometry.plot.left,
        geometry.plot.width,
    )?;
    let point = geometry.points[index];

    Some(Hover {
        index,
        point,
        date: tooltip_date(point.timestamp, period),
        price: fmt_price(point.price),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Geometry, GeometryBuilder, Margins, Series};
    use chrono::{DateTime, TimeZone, Utc};
    use exchange::PricePoint;

    #[test]
    fn extreme_pointers_stay_in_bounds() {
        for x in [-1e9, -1.0, 0.0, 50.0, 100.0, 101.0, 1e9] {
            let index = resolve_index(x, 10, 0.0, 100.0).unwrap();
            assert!(index < 10, "{x} -> {index}");
        }

        assert_eq!(resolve_index(-500.0, 10, 0.0, 100.0), Some(0));
        assert_eq!(resolve_index(500.0, 10, 0.0, 100.0), Some(9));
    }

    #[test]
    fn degenerate_inputs_resolve_to_first() {
        assert_eq!(resolve_index(f64::NAN, 5, 0.0, 100.0), Some(0));
        assert_eq!(resolve_index(f64::INFINITY, 5, 0.0, 100.0), Some(0));
        assert_eq!(resolve_index(40.0, 5, 0.0, 0.0), Some(0));
        assert_eq!(resolve_index(40.0, 5, 0.0, -10.0), Some(0));
        assert_eq!(resolve_index(40.0, 1, 0.0, 100.0), Some(0));
        assert_eq!(resolve_index(40.0, 0, 0.0, 100.0), None);
    }

    #[test]
    fn nearest_by_index_with_ties_going_low() {
        // 3 points at x = 10, 60, 110
        assert_eq!(resolve_index(34.0, 3, 10.0, 100.0), Some(0));
        assert_eq!(resolve_index(35.0, 3, 10.0, 100.0), Some(0));
        assert_eq!(resolve_index(36.0, 3, 10.0, 100.0), Some(1));
        assert_eq!(resolve_index(85.0, 3, 10.0, 100.0), Some(1));
        assert_eq!(resolve_index(86.0, 3, 10.0, 100.0), Some(2));
    }

    #[test]
    fn hover_formats_the_resolved_point() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let series = Series::new(
            [100.0, 1250.7, 101.0]
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let ts = DateTime::from_timestamp(start.timestamp() + i as i64 * 86_400, 0)
                        .unwrap();
                    PricePoint::new(ts, *c)
                })
                .collect(),
        );

        let Geometry::Line(line) =
            GeometryBuilder::new(200.0, 100.0, Margins::ZERO).build(&series)
        else {
            panic!("expected a line");
        };

        let hover = hover(100.0, &line, Period::M1).unwrap();

        assert_eq!(hover.index, 1);
        assert_eq!(hover.date, "2024-01-03");
        assert_eq!(hover.price, "$1,250.70");
        assert_eq!(hover.label(), "2024-01-03  $1,250.70");
        assert_eq!(resolve(100.0, &line.points, 0.0, 200.0), Some(&line.points[1]));
    }
}
