use super::ScaleMode;
use exchange::Period;
use exchange::fetcher::DEFAULT_API_BASE;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const DEFAULT_TICKERS: &str = "AAPL MSFT GOOGL";

/// Application state persisted between runs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct State {
    #[serde(deserialize_with = "api_base_or_default")]
    pub api_base: String,
    #[serde(deserialize_with = "tickers_or_default")]
    pub tickers_input: String,
    #[serde(deserialize_with = "exchange::ok_or_default")]
    pub period: Period,
    #[serde(deserialize_with = "exchange::ok_or_default")]
    pub active_watchlist: Option<String>,
    #[serde(deserialize_with = "exchange::ok_or_default")]
    pub scale_mode: ScaleMode,
}

impl Default for State {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            tickers_input: DEFAULT_TICKERS.to_string(),
            period: Period::default(),
            active_watchlist: None,
            scale_mode: ScaleMode::default(),
        }
    }
}

fn string_or<'de, D>(deserializer: D, fallback: &str) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(fallback.to_string()),
    }
}

fn api_base_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    string_or(deserializer, DEFAULT_API_BASE)
}

fn tickers_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    string_or(deserializer, DEFAULT_TICKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_or_missing_fields_fall_back() {
        let state: State =
            serde_json::from_str(r#"{"period": "7y", "tickers_input": 3, "active_watchlist": "tech"}"#)
                .unwrap();

        assert_eq!(state.period, Period::Y1);
        assert_eq!(state.tickers_input, DEFAULT_TICKERS);
        assert_eq!(state.active_watchlist.as_deref(), Some("tech"));
        assert_eq!(state.scale_mode, ScaleMode::Full);
        assert_eq!(state.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn ill_typed_fields_keep_their_defaults() {
        let state: State = serde_json::from_str(
            r#"{"api_base": false, "tickers_input": ["AAPL"], "active_watchlist": 12, "scale_mode": "zoomed"}"#,
        )
        .unwrap();

        assert_eq!(state, State::default());
    }

    #[test]
    fn round_trips() {
        let state = State {
            period: Period::M3,
            scale_mode: ScaleMode::Trimmed,
            ..State::default()
        };
        let json = serde_json::to_string(&state).unwrap();

        assert_eq!(serde_json::from_str::<State>(&json).unwrap(), state);
    }
}
