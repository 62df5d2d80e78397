// # DNS API Trait
//
// Defines the raw, authenticated request boundary to the DNS provider.
//
// ## Implementations
//
// - Cloudflare: `zonebot-provider-cloudflare` crate
//
// ## Contract
//
// One call is one HTTP request. The implementation authenticates with the
// token it is handed, unwraps the provider's `{success, result, errors}`
// envelope and returns `result`. It never retries, caches or decides which
// account to use; token resolution and caching belong to `ResourceGateway`.

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::credential_store::ApiToken;

/// HTTP method of a provider request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for DNS provider API implementations
///
/// # Errors
///
/// - `Error::RemoteRejected`: the provider answered with `success = false`;
///   the message is every reported error message joined by newlines, or a
///   generic fallback when the provider reported none
/// - `Error::TransportFailure`: network failure, timeout or unreadable body
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Issue one authenticated request
    ///
    /// # Parameters
    ///
    /// - `token`: Token of the account the request acts for
    /// - `method`: HTTP method
    /// - `path`: Path below the API base, including any query string
    /// - `body`: Optional JSON body
    ///
    /// # Returns
    ///
    /// The envelope's `result` (`Value::Null` when absent)
    async fn request(
        &self,
        token: &ApiToken,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
