pub mod state;

pub use crate::chart::scale::ScaleMode;

use exchange::fetcher::DEFAULT_API_BASE;

const API_URL_ENV: &str = "STOCKWATCH_API_URL";

/// API base url, the environment wins over the saved value
pub fn api_base(saved: &str) -> String {
    match std::env::var(API_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => url,
        _ if saved.trim().is_empty() => DEFAULT_API_BASE.to_string(),
        _ => saved.to_string(),
    }
}
