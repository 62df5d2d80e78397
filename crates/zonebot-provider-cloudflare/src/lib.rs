// # Cloudflare DNS API
//
// `DnsApi` implementation for Cloudflare API v4.
//
// ## Behavior
//
// - One `request` call is one HTTP request, authenticated with the bearer
//   token it is handed
// - The `{success, result, errors}` envelope is unwrapped here; callers only
//   ever see `result`
// - No retries, no caching, no account selection (owned by `ResourceGateway`)
//
// ## Error Mapping
//
// | Response                              | Error                      |
// |---------------------------------------|----------------------------|
// | envelope with `success = false`       | `RemoteRejected(messages)` |
// | non-envelope body, status 5xx         | `TransportFailure`         |
// | non-envelope body, other non-2xx      | `RemoteRejected(status)`   |
// | non-envelope body, 2xx                | `TransportFailure`         |
// | connect error / timeout               | `TransportFailure`         |
//
// ## Security Requirements
//
// - Tokens NEVER appear in logs or in `Debug` output
// - Tokens are passed per call and never stored by this crate
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use zonebot_core::config::ProviderConfig;
use zonebot_core::traits::{ApiToken, DnsApi, Method};
use zonebot_core::{Error, Result};

/// Message used when the provider rejects a request without saying why
const GENERIC_REJECTION: &str = "Cloudflare error";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,

    #[serde(default)]
    result: Value,

    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    /// Every reported error message joined by newlines
    fn rejection(&self) -> String {
        let messages: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
            .collect();

        if messages.is_empty() {
            GENERIC_REJECTION.to_string()
        } else {
            messages.join("\n")
        }
    }
}

/// Cloudflare API v4 client
///
/// Cheap to clone; the underlying `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct CloudflareApi {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for CloudflareApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareApi {
    /// Create a client from provider configuration
    ///
    /// The configured timeout applies to every request.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.api_base_url))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Map a response without a readable envelope to an error
fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    if status.is_server_error() {
        Error::transport(format!("Cloudflare server error (transient): {}", status))
    } else if status.is_success() {
        Error::transport(format!("Unreadable Cloudflare response: {}", truncate(body)))
    } else {
        Error::remote_rejected(format!("Cloudflare request failed: {}", status))
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(120) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl DnsApi for CloudflareApi {
    async fn request(
        &self,
        token: &ApiToken,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!(%method, path, "Cloudflare request");

        let mut request = self
            .client
            .request(to_reqwest(method), self.url(path))
            .bearer_auth(token.expose());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                Error::transport(format!("Failed to read response: {}", e.without_url()))
            })?;

        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) => {
                tracing::warn!(
                    %method,
                    path,
                    %status,
                    "Cloudflare response is not an API envelope"
                );
                return Err(status_error(status, &text));
            }
        };

        if !envelope.success {
            tracing::debug!(%method, path, %status, "Cloudflare rejected request");
            return Err(Error::remote_rejected(envelope.rejection()));
        }

        Ok(envelope.result)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_joins_messages() {
        let envelope: Envelope = serde_json::from_value(serde_json::json!({
            "success": false,
            "errors": [
                {"code": 9109, "message": "Invalid access token"},
                {"code": 6003, "message": "Invalid request headers"}
            ],
            "result": null
        }))
        .unwrap();

        assert_eq!(
            envelope.rejection(),
            "Invalid access token\nInvalid request headers"
        );
    }

    #[test]
    fn test_rejection_without_messages_is_generic() {
        let envelope: Envelope =
            serde_json::from_value(serde_json::json!({"success": false, "errors": []})).unwrap();
        assert_eq!(envelope.rejection(), "Cloudflare error");

        let envelope: Envelope =
            serde_json::from_value(serde_json::json!({"success": false})).unwrap();
        assert_eq!(envelope.rejection(), "Cloudflare error");
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(reqwest::StatusCode::BAD_GATEWAY, "<html>"),
            Error::TransportFailure(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::FORBIDDEN, "Forbidden"),
            Error::RemoteRejected(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::OK, "not json"),
            Error::TransportFailure(_)
        ));
    }

    #[test]
    fn test_url_joining() {
        let api = CloudflareApi::with_client(reqwest::Client::new(), "http://localhost:1/v4/");
        assert_eq!(api.base_url(), "http://localhost:1/v4");
        assert_eq!(api.url("/zones"), "http://localhost:1/v4/zones");
        assert_eq!(api.url("zones"), "http://localhost:1/v4/zones");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProviderConfig {
            api_base_url: "ftp://example.com".to_string(),
            request_timeout_secs: 25,
        };
        assert!(CloudflareApi::new(&config).is_err());
    }

    #[test]
    fn test_provider_name() {
        let api = CloudflareApi::new(&ProviderConfig::default()).unwrap();
        assert_eq!(api.provider_name(), "cloudflare");
    }
}
