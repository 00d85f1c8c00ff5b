pub mod geometry;
pub mod interaction;
pub mod scale;

pub use geometry::{Geometry, GeometryBuilder, LineGeometry, Margins, Point2D};
pub use scale::{Scale, ScaleMode};

use exchange::{History, HistoryMeta, Period, PricePoint};

/// Chronological closes of one ticker, non-finite closes never get in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series(Vec<PricePoint>);

impl Series {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self(points.into_iter().filter(|p| p.close.is_finite()).collect())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn closes(&self) -> Vec<f64> {
        self.0.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Enough points to draw a line
    pub fn is_drawable(&self) -> bool {
        self.0.len() >= 2
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    /// Close before the latest one
    pub fn previous_close(&self) -> Option<f64> {
        self.0.len().checked_sub(2).map(|i| self.0[i].close)
    }
}

impl From<Vec<PricePoint>> for Series {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::new(points)
    }
}

/// The chart's current dataset; every load replaces it wholesale
#[derive(Debug, Clone, Default)]
pub struct ChartSession {
    ticker: String,
    period: Period,
    series: Series,
    meta: HistoryMeta,
}

impl ChartSession {
    pub fn new(ticker: impl Into<String>, period: Period) -> Self {
        Self {
            ticker: ticker.into(),
            period,
            ..Self::default()
        }
    }

    pub fn load(&mut self, ticker: impl Into<String>, period: Period, history: History) {
        let ticker = ticker.into();
        let series = Series::new(history.prices);

        log::debug!(
            "Chart session for {ticker} ({period}) loaded with {} points",
            series.len()
        );

        *self = Self {
            ticker: history.ticker.unwrap_or(ticker),
            period,
            series,
            meta: history.meta,
        };
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn meta(&self) -> &HistoryMeta {
        &self.meta
    }

    /// Same builder always produces the same geometry, so this can be called on
    /// every resize or redraw. The session supplies its own period.
    pub fn geometry(&self, builder: GeometryBuilder) -> Geometry {
        builder.period(self.period).build(&self.series)
    }
}
