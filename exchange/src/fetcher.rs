use crate::http::http_parse;
use crate::{AdapterError, DeHistory, DeMetrics, History, Period, RowRecord};

use reqwest::Url;

pub const DEFAULT_API_BASE: &str = "https://stock-watcher-backend.onrender.com";

/// Endpoints of one API deployment
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, AdapterError> {
        let base = base.trim().trim_end_matches('/');
        Url::parse(base).map_err(|e| AdapterError::InvalidRequest(format!("{base}: {e}")))?;

        Ok(Self {
            base: base.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn metrics_url(&self, tickers: &[String]) -> Result<Url, AdapterError> {
        if tickers.is_empty() {
            return Err(AdapterError::InvalidRequest("no tickers given".to_string()));
        }

        Url::parse_with_params(
            &format!("{}/metrics", self.base),
            tickers.iter().map(|t| ("tickers", t.as_str())),
        )
        .map_err(|e| AdapterError::InvalidRequest(e.to_string()))
    }

    pub fn history_url(&self, ticker: &str, period: Period) -> Result<Url, AdapterError> {
        if ticker.trim().is_empty() {
            return Err(AdapterError::InvalidRequest("no ticker given".to_string()));
        }

        Url::parse_with_params(
            &format!("{}/history", self.base),
            [("ticker", ticker.trim()), ("period", period.as_str())],
        )
        .map_err(|e| AdapterError::InvalidRequest(e.to_string()))
    }

    /// One record per known ticker; the order is whatever the server returns
    pub async fn fetch_metrics(&self, tickers: &[String]) -> Result<Vec<RowRecord>, AdapterError> {
        let url = self.metrics_url(tickers)?;
        log::debug!("Fetching metrics: {url}");

        let metrics: DeMetrics = http_parse(&url).await?;
        Ok(metrics.into_rows())
    }

    pub async fn fetch_history(&self, ticker: &str, period: Period) -> Result<History, AdapterError> {
        let url = self.history_url(ticker, period)?;
        log::debug!("Fetching history: {url}");

        let history: DeHistory = http_parse(&url).await?;
        Ok(History::from(history))
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self {
            base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Identity of an issued fetch, carried back with its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub id: u64,
    pub subject: String,
    pub period: Option<Period>,
}

/// Keeps the most recently issued request of one kind so that slower, older
/// responses can be recognized and dropped
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: u64,
    latest: Option<RequestTag>,
}

impl RequestTracker {
    pub fn issue(&mut self, subject: impl Into<String>, period: Option<Period>) -> RequestTag {
        self.next_id += 1;

        let tag = RequestTag {
            id: self.next_id,
            subject: subject.into(),
            period,
        };
        self.latest = Some(tag.clone());
        tag
    }

    pub fn is_current(&self, tag: &RequestTag) -> bool {
        self.latest.as_ref() == Some(tag)
    }
}
