use crate::AdapterError;

use reqwest::{Client, Url};
use std::sync::LazyLock;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {e}");
            Client::new()
        })
});

/// GET the url and return the body, non-2xx statuses are errors
pub async fn http_request(url: &Url) -> Result<String, AdapterError> {
    let response = HTTP_CLIENT
        .get(url.clone())
        .send()
        .await
        .map_err(AdapterError::FetchError)?;

    let status = response.status();
    if !status.is_success() {
        log::error!("HTTP error {} for: {}", status, url);
        return Err(AdapterError::Status(status.as_u16(), url.to_string()));
    }

    response.text().await.map_err(AdapterError::FetchError)
}

pub async fn http_parse<V>(url: &Url) -> Result<V, AdapterError>
where
    V: serde::de::DeserializeOwned,
{
    let body = http_request(url).await?;
    parse_body(url.as_str(), &body)
}

pub(crate) fn parse_body<V>(url: &str, body: &str) -> Result<V, AdapterError>
where
    V: serde::de::DeserializeOwned,
{
    let trimmed = body.trim();

    let body_preview = |body: &str, n: usize| {
        let trimmed = body.trim();
        let mut preview = trimmed.chars().take(n).collect::<String>();
        if trimmed.len() > n {
            preview.push('…');
        }
        preview
    };

    if trimmed.is_empty() {
        let msg = format!("Empty response body | url={url}");
        log::error!("{}", msg);
        return Err(AdapterError::ParseError(msg));
    }
    if trimmed.starts_with('<') {
        let msg = format!(
            "Non-JSON (HTML?) response | url={} | len={} | preview={:?}",
            url,
            body.len(),
            body_preview(body, 200)
        );
        log::error!("{}", msg);
        return Err(AdapterError::ParseError(msg));
    }

    serde_json::from_str(body).map_err(|e| {
        let msg = format!(
            "JSON parse failed: {} | url={} | response_len={} | preview={:?}",
            e,
            url,
            body.len(),
            body_preview(body, 200)
        );
        log::error!("{}", msg);
        AdapterError::ParseError(msg)
    })
}
