//! Error types for the zonebot core
//!
//! The first five variants are the operator-facing taxonomy: every handler
//! translates them into a message and a safe menu state. The remaining
//! variants cover local plumbing: the account store, configuration and
//! serialization.

use thiserror::Error;

/// Result type alias for zonebot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonebot
#[derive(Error, Debug)]
pub enum Error {
    /// No token could be resolved for the session; the operator must pick an account
    #[error("No active account selected")]
    NoActiveAccount,

    /// A token failed verification against the provider
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// A selector token did not resolve against the current index map
    #[error("Stale selector: {0}")]
    StaleSelector(String),

    /// The provider answered with `success = false`
    #[error("{0}")]
    RemoteRejected(String),

    /// Network failure or timeout while talking to the provider
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Credential store errors
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid credential error
    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    /// Create a stale selector error
    pub fn stale_selector(msg: impl Into<String>) -> Self {
        Self::StaleSelector(msg.into())
    }

    /// Create a provider rejection error
    pub fn remote_rejected(msg: impl Into<String>) -> Self {
        Self::RemoteRejected(msg.into())
    }

    /// Create a transport failure error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Sentence shown to the operator when this error ends a handler.
    ///
    /// Provider rejections are surfaced verbatim; transport and local
    /// failures collapse into generic wording so internals stay out of chat.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoActiveAccount => {
                "No account selected yet. Please choose an account first.".to_string()
            }
            Self::InvalidCredential(_) => {
                "Invalid token! Make sure it was copied correctly and send it again.".to_string()
            }
            Self::StaleSelector(_) => "Item not found, please refresh the menu.".to_string(),
            Self::RemoteRejected(msg) => msg.clone(),
            Self::TransportFailure(_) => {
                "Could not reach the DNS provider. Check connectivity and try again.".to_string()
            }
            Self::CredentialStore(_) => "Could not access the account store.".to_string(),
            Self::Config(_) | Self::Json(_) => "Internal error, please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_rejection_is_verbatim() {
        let err = Error::remote_rejected("Record already exists.\nInvalid TTL");
        assert_eq!(err.user_message(), "Record already exists.\nInvalid TTL");
        assert_eq!(err.to_string(), "Record already exists.\nInvalid TTL");
    }

    #[test]
    fn test_transport_failure_hides_details() {
        let err = Error::transport("dns error: failed to lookup address 10.0.0.1");
        assert!(!err.user_message().contains("10.0.0.1"));
    }

    #[test]
    fn test_local_failures_stay_generic() {
        let err = Error::credential_store("Failed to rename /var/lib/zonebot/accounts.tmp");
        assert_eq!(err.user_message(), "Could not access the account store.");

        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(Error::from(json).user_message(), "Internal error, please try again.");
    }
}
