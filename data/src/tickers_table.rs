use crate::util::{PLACEHOLDER, fmt_money, fmt_number, pct_change};

use exchange::{MetricValue, RowRecord};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

/// Which metric the table is ordered by, `None` keeps the load order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: Option<String>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: None,
            ascending: true,
        }
    }
}

impl SortState {
    /// Same key flips the direction, a new key starts ascending
    fn toggle(&mut self, key: &str) {
        if self.key.as_deref() == Some(key) {
            self.ascending = !self.ascending;
        } else {
            self.key = Some(key.to_string());
            self.ascending = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceChangeDirection {
    Increased,
    Decreased,
    Unchanged,
}

impl PriceChangeDirection {
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            Some(c) if c > 0.0 => PriceChangeDirection::Increased,
            Some(c) if c < 0.0 => PriceChangeDirection::Decreased,
            _ => PriceChangeDirection::Unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    Money,
    Ratio,
    SignedPct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Ticker,
    Sector,
    Price,
    Pe,
    Peg,
    Eps,
    EpsGrowth,
    DividendYield,
    High52w,
    FromHigh52w,
    WeeklyChange,
    MonthlyChange,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Ticker,
        Column::Sector,
        Column::Price,
        Column::Pe,
        Column::Peg,
        Column::Eps,
        Column::EpsGrowth,
        Column::DividendYield,
        Column::High52w,
        Column::FromHigh52w,
        Column::WeeklyChange,
        Column::MonthlyChange,
    ];

    /// Metric name in the `/metrics` payload
    pub fn key(self) -> &'static str {
        match self {
            Column::Ticker => "ticker",
            Column::Sector => "sector",
            Column::Price => "price",
            Column::Pe => "pe",
            Column::Peg => "peg",
            Column::Eps => "eps",
            Column::EpsGrowth => "epsGrowthPct",
            Column::DividendYield => "dividendYieldPct",
            Column::High52w => "high52w",
            Column::FromHigh52w => "pctFrom52wHigh",
            Column::WeeklyChange => "weeklyChangePct",
            Column::MonthlyChange => "monthlyChangePct",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Ticker => "Ticker",
            Column::Sector => "Sector",
            Column::Price => "Price",
            Column::Pe => "P/E",
            Column::Peg => "PEG",
            Column::Eps => "EPS",
            Column::EpsGrowth => "EPS growth",
            Column::DividendYield => "Div. yield",
            Column::High52w => "52w high",
            Column::FromHigh52w => "From high",
            Column::WeeklyChange => "1w",
            Column::MonthlyChange => "1m",
        }
    }

    pub fn format(self) -> CellFormat {
        match self {
            Column::Ticker | Column::Sector => CellFormat::Text,
            Column::Price | Column::High52w => CellFormat::Money,
            Column::Pe | Column::Peg | Column::Eps => CellFormat::Ratio,
            Column::EpsGrowth
            | Column::DividendYield
            | Column::FromHigh52w
            | Column::WeeklyChange
            | Column::MonthlyChange => CellFormat::SignedPct,
        }
    }

    pub fn cell(self, row: &RowRecord) -> String {
        let value = row.get(self.key());

        match self.format() {
            CellFormat::Text => match value {
                MetricValue::Text(s) if !s.is_empty() => s.clone(),
                MetricValue::Number(n) => fmt_number(Some(*n), 2),
                _ => PLACEHOLDER.to_string(),
            },
            CellFormat::Money => fmt_money(value.as_f64()),
            CellFormat::Ratio => fmt_number(value.as_f64(), 2),
            CellFormat::SignedPct => pct_change(value.as_f64()),
        }
    }

    /// Colour hint for percentage cells, other columns stay neutral
    pub fn direction(self, row: &RowRecord) -> PriceChangeDirection {
        match self.format() {
            CellFormat::SignedPct => PriceChangeDirection::from_change(row.number(self.key())),
            _ => PriceChangeDirection::Unchanged,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rows of the metrics table in their current display order
#[derive(Debug, Default)]
pub struct TickersTable {
    rows: Vec<RowRecord>,
    sort: SortState,
}

impl TickersTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every row and forgets the previous ordering
    pub fn set_rows(&mut self, rows: Vec<RowRecord>) {
        let mut seen = FxHashSet::default();
        let mut kept = Vec::with_capacity(rows.len());

        for row in rows {
            if let Some(ticker) = row.ticker() {
                if !seen.insert(ticker.to_string()) {
                    log::warn!("Dropping duplicate row for ticker {ticker}");
                    continue;
                }
            }
            kept.push(row);
        }

        self.rows = kept;
        self.sort = SortState::default();
    }

    pub fn sort_by(&mut self, key: &str) -> &[RowRecord] {
        self.sort.toggle(key);

        let ascending = self.sort.ascending;
        self.rows
            .sort_by(|a, b| compare_values(a.get(key), b.get(key), ascending));

        &self.rows
    }

    pub fn current_view(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Direction marker for a column header
    pub fn sort_indicator(&self, column: Column) -> Option<&'static str> {
        match &self.sort.key {
            Some(key) if key == column.key() => Some(if self.sort.ascending { "▲" } else { "▼" }),
            _ => None,
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.ticker().map(str::to_string))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Absent values sort last in either direction
fn compare_values(a: &MetricValue, b: &MetricValue, ascending: bool) -> Ordering {
    match (a.is_absent(), b.is_absent()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_present(a, b);
            if ascending { ord } else { ord.reverse() }
        }
    }
}

fn compare_present(a: &MetricValue, b: &MetricValue) -> Ordering {
    match (a, b) {
        (MetricValue::Number(x), MetricValue::Number(y)) => x.total_cmp(y),
        (MetricValue::Number(_), MetricValue::Text(_)) => Ordering::Less,
        (MetricValue::Text(_), MetricValue::Number(_)) => Ordering::Greater,
        (MetricValue::Text(x), MetricValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        _ => Ordering::Equal,
    }
}
