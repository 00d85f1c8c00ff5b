use crate::chart::Series;
use crate::tickers_table::PriceChangeDirection;
use crate::util::{PLACEHOLDER, fmt_money, fmt_number, fmt_pct};

use exchange::HistoryMeta;

/// Last close against the one before it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastChange {
    pub diff: f64,
    pub pct: f64,
}

impl LastChange {
    pub fn from_series(series: &Series) -> Option<Self> {
        let last = series.last()?.close;
        let prev = series.previous_close()?;

        let diff = last - prev;
        let pct = diff / prev * 100.0;

        pct.is_finite().then_some(Self { diff, pct })
    }

    pub fn direction(&self) -> PriceChangeDirection {
        PriceChangeDirection::from_change(Some(self.diff))
    }
}

/// Formatted header statistics of the chart view
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub price: String,
    pub change: String,
    pub direction: PriceChangeDirection,
    pub previous_close: String,
    pub high_52w: String,
    pub pe: String,
    pub peg: String,
    pub eps: String,
    pub dividend_yield: String,
}

impl Snapshot {
    pub fn new(ticker: &str, meta: &HistoryMeta, series: &Series) -> Self {
        let change = LastChange::from_series(series);

        Self {
            ticker: ticker.to_string(),
            name: non_empty(meta.long_name.as_deref()).unwrap_or(ticker).to_string(),
            sector: non_empty(meta.sector.as_deref())
                .unwrap_or(PLACEHOLDER)
                .to_string(),
            price: fmt_money(meta.price),
            change: change.map_or_else(
                || PLACEHOLDER.to_string(),
                |c| format!("{} ({})", fmt_money(Some(c.diff)), fmt_pct(Some(c.pct))),
            ),
            direction: change.map_or(PriceChangeDirection::Unchanged, |c| c.direction()),
            previous_close: fmt_number(series.previous_close(), 2),
            high_52w: fmt_number(meta.high_52w, 2),
            pe: fmt_number(meta.pe, 2),
            peg: fmt_number(meta.peg, 2),
            eps: fmt_number(meta.eps, 2),
            dividend_yield: fmt_pct(meta.dividend_yield_pct),
        }
    }

    /// Label and value pairs in display order
    pub fn stats(&self) -> [(&'static str, &str); 6] {
        [
            ("Prev close", self.previous_close.as_str()),
            ("52w high", self.high_52w.as_str()),
            ("P/E", self.pe.as_str()),
            ("PEG", self.peg.as_str()),
            ("EPS", self.eps.as_str()),
            ("Div. yield", self.dividend_yield.as_str()),
        ]
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use exchange::PricePoint;

    fn series(closes: &[f64]) -> Series {
        Series::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| PricePoint::new(DateTime::from_timestamp(i as i64, 0).unwrap(), *c))
                .collect(),
        )
    }

    #[test]
    fn empty_meta_falls_back() {
        let snapshot = Snapshot::new("AAPL", &HistoryMeta::default(), &series(&[]));

        assert_eq!(snapshot.name, "AAPL");
        assert_eq!(snapshot.sector, PLACEHOLDER);
        assert_eq!(snapshot.price, PLACEHOLDER);
        assert_eq!(snapshot.change, PLACEHOLDER);
        assert_eq!(snapshot.direction, PriceChangeDirection::Unchanged);
        assert!(snapshot.stats().iter().all(|(_, v)| *v == PLACEHOLDER));
    }

    #[test]
    fn full_meta_is_formatted() {
        let meta = HistoryMeta {
            long_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            price: Some(189.5),
            high_52w: Some(199.62),
            pe: Some(29.1),
            peg: None,
            eps: Some(6.43),
            dividend_yield_pct: Some(0.51),
        };

        let snapshot = Snapshot::new("AAPL", &meta, &series(&[200.0, 190.0]));

        assert_eq!(snapshot.name, "Apple Inc.");
        assert_eq!(snapshot.price, "$189.50");
        assert_eq!(snapshot.change, "-$10.00 (-5.00%)");
        assert_eq!(snapshot.direction, PriceChangeDirection::Decreased);
        assert_eq!(snapshot.previous_close, "200.00");
        assert_eq!(snapshot.high_52w, "199.62");
        assert_eq!(snapshot.peg, PLACEHOLDER);
        assert_eq!(snapshot.dividend_yield, "0.51%");
    }

    #[test]
    fn zero_previous_close_has_no_change() {
        assert_eq!(LastChange::from_series(&series(&[0.0, 5.0])), None);

        let change = LastChange::from_series(&series(&[4.0, 5.0])).unwrap();
        assert_eq!(change.diff, 1.0);
        assert_eq!(change.pct, 25.0);
        assert_eq!(change.direction(), PriceChangeDirection::Increased);
    }
}
