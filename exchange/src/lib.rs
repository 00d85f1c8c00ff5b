pub mod fetcher;
mod http;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    #[error("{0}")]
    FetchError(#[from] reqwest::Error),
    #[error("API error {0} for {1}")]
    Status(u16, String),
    #[error("Parsing: {0}")]
    ParseError(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Look-back window of a `/history` request
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Period {
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "6m")]
    M6,
    #[default]
    #[serde(rename = "1y")]
    Y1,
    #[serde(rename = "5y")]
    Y5,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::D1,
        Period::W1,
        Period::M1,
        Period::M3,
        Period::M6,
        Period::Y1,
        Period::Y5,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::D1 => "1d",
            Period::W1 => "1w",
            Period::M1 => "1m",
            Period::M3 => "3m",
            Period::M6 => "6m",
            Period::Y1 => "1y",
            Period::Y5 => "5y",
        }
    }

    pub fn is_intraday(self) -> bool {
        matches!(self, Period::D1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AdapterError::InvalidRequest(format!("unknown period: {s:?}")))
    }
}

/// One close observation of a price history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Value of a single metric cell, anything that is not a finite number or a
/// string is carried as `Absent`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, MetricValue::Absent)
    }
}

impl From<Value> for MetricValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map_or(MetricValue::Absent, MetricValue::Number),
            Value::String(s) => MetricValue::Text(s),
            _ => MetricValue::Absent,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            MetricValue::Number(value)
        } else {
            MetricValue::Absent
        }
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

const SPARK_KEY: &str = "spark";
const TICKER_KEY: &str = "ticker";

/// One ticker's snapshot metrics as returned by `/metrics`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct RowRecord {
    fields: BTreeMap<String, MetricValue>,
    spark: Vec<f64>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<MetricValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_spark(mut self, spark: Vec<f64>) -> Self {
        self.spark = spark;
        self
    }

    pub fn ticker(&self) -> Option<&str> {
        self.fields.get(TICKER_KEY).and_then(MetricValue::as_str)
    }

    /// Missing keys read as `Absent`
    pub fn get(&self, key: &str) -> &MetricValue {
        static ABSENT: MetricValue = MetricValue::Absent;
        self.fields.get(key).unwrap_or(&ABSENT)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).as_f64()
    }

    pub fn spark(&self) -> &[f64] {
        &self.spark
    }
}

impl From<BTreeMap<String, Value>> for RowRecord {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut record = RowRecord::default();

        for (key, value) in raw {
            if key == SPARK_KEY {
                if let Value::Array(items) = value {
                    record.spark = items
                        .iter()
                        .filter_map(Value::as_f64)
                        .filter(|v| v.is_finite())
                        .collect();
                }
                continue;
            }
            record.fields.insert(key, MetricValue::from(value));
        }

        record
    }
}

/// Snapshot fields attached to a `/history` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryMeta {
    #[serde(deserialize_with = "ok_or_default")]
    pub long_name: Option<String>,
    #[serde(deserialize_with = "ok_or_default")]
    pub sector: Option<String>,
    #[serde(deserialize_with = "finite_or_none")]
    pub price: Option<f64>,
    #[serde(rename = "high52w", deserialize_with = "finite_or_none")]
    pub high_52w: Option<f64>,
    #[serde(deserialize_with = "finite_or_none")]
    pub pe: Option<f64>,
    #[serde(deserialize_with = "finite_or_none")]
    pub peg: Option<f64>,
    #[serde(deserialize_with = "finite_or_none")]
    pub eps: Option<f64>,
    /// Already expressed in percent, e.g. `0.75` means 0.75%
    #[serde(deserialize_with = "finite_or_none")]
    pub dividend_yield_pct: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    pub ticker: Option<String>,
    pub meta: HistoryMeta,
    pub prices: Vec<PricePoint>,
}

#[derive(Deserialize)]
pub(crate) struct DeHistory {
    #[serde(default, deserialize_with = "ok_or_default")]
    ticker: Option<String>,
    #[serde(default, deserialize_with = "ok_or_default")]
    meta: HistoryMeta,
    #[serde(default, deserialize_with = "ok_or_default")]
    prices: Vec<Value>,
}

#[derive(Deserialize)]
struct DePricePoint {
    #[serde(deserialize_with = "de_timestamp")]
    t: DateTime<Utc>,
    #[serde(default, deserialize_with = "finite_or_none")]
    close: Option<f64>,
}

impl From<DeHistory> for History {
    fn from(de: DeHistory) -> Self {
        let total = de.prices.len();

        let prices: Vec<PricePoint> = de
            .prices
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<DePricePoint>(raw).ok())
            .filter_map(|p| p.close.map(|close| PricePoint::new(p.t, close)))
            .collect();

        if prices.len() < total {
            log::debug!(
                "Dropped {} of {} price entries without a usable close",
                total - prices.len(),
                total
            );
        }

        History {
            ticker: de.ticker,
            meta: de.meta,
            prices,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct DeMetrics {
    #[serde(default, deserialize_with = "ok_or_default")]
    data: Vec<Value>,
}

impl DeMetrics {
    /// Entries that are not objects are skipped, the rest of the table still loads
    pub(crate) fn into_rows(self) -> Vec<RowRecord> {
        let total = self.data.len();

        let rows: Vec<RowRecord> = self
            .data
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<RowRecord>(raw).ok())
            .collect();

        if rows.len() < total {
            log::warn!("Dropped {} of {} malformed metrics rows", total - rows.len(), total);
        }

        rows
    }
}

/// Deserializes into the target type, falling back to its default on any mismatch
pub fn ok_or_default<'a, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'a> + Default,
    D: Deserializer<'a>,
{
    let v: Value = Deserialize::deserialize(deserializer)?;
    Ok(T::deserialize(v).unwrap_or_default())
}

fn finite_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Value = Deserialize::deserialize(deserializer)?;
    Ok(v.as_f64().filter(|x| x.is_finite()))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_timestamp(&s).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {s}")))
}

/// Accepts RFC 3339, a naive date-time taken as UTC, or a bare date
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_round_trips_through_its_label() {
        for period in Period::ALL {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
        assert!("2w".parse::<Period>().is_err());
        assert_eq!(
            serde_json::to_string(&Period::M6).unwrap(),
            "\"6m\"".to_string()
        );
    }

    #[test]
    fn row_record_keeps_scalars_and_spark() {
        let json = r#"{
            "ticker": "AAPL",
            "sector": "Technology",
            "price": 189.5,
            "peg": null,
            "weeklyChangePct": -1.25,
            "flags": {"x": 1},
            "spark": [1.0, 2.0, null, 3.0]
        }"#;
        let record: RowRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.ticker(), Some("AAPL"));
        assert_eq!(record.number("price"), Some(189.5));
        assert_eq!(record.number("weeklyChangePct"), Some(-1.25));
        assert!(record.get("peg").is_absent());
        assert!(record.get("flags").is_absent());
        assert!(record.get("notThere").is_absent());
        assert_eq!(record.spark(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn history_treats_malformed_fields_as_absent() {
        let json = r#"{
            "ticker": "MSFT",
            "meta": {"longName": "Microsoft", "price": "n/a", "pe": 31.2, "dividendYieldPct": 0.72},
            "prices": [
                {"t": "2024-01-02T00:00:00-05:00", "close": 370.6},
                {"t": "2024-01-03", "close": null},
                {"t": "garbage", "close": 1.0},
                {"t": "2024-01-04T00:00:00", "close": 368.0}
            ]
        }"#;
        let de: DeHistory = serde_json::from_str(json).unwrap();
        let history = History::from(de);

        assert_eq!(history.ticker.as_deref(), Some("MSFT"));
        assert_eq!(history.meta.long_name.as_deref(), Some("Microsoft"));
        assert_eq!(history.meta.price, None);
        assert_eq!(history.meta.pe, Some(31.2));
        assert_eq!(history.meta.dividend_yield_pct, Some(0.72));
        assert_eq!(history.prices.len(), 2);
        assert_eq!(history.prices[0].close, 370.6);
        assert_eq!(
            history.prices[0].timestamp,
            parse_timestamp("2024-01-02T05:00:00Z").unwrap()
        );
    }

    #[test]
    fn history_without_meta_or_prices_is_empty() {
        let de: DeHistory = serde_json::from_str(r#"{"meta": 5}"#).unwrap();
        let history = History::from(de);

        assert!(history.prices.is_empty());
        assert_eq!(history.meta, HistoryMeta::default());
    }
}
