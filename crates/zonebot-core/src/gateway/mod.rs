//! Remote resource gateway
//!
//! Every provider call made on behalf of an operator goes through
//! [`ResourceGateway`]. It resolves the caller's token from the session and
//! the credential store on each call (no token is cached), delegates the
//! request to the [`DnsApi`], and writes successful reads and mutations back
//! into the session cache.
//!
//! Lists are fetched as a single page of a fixed size; there is no cursor
//! following.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{Record, RecordPayload, Zone, ZoneScope};
use crate::session::Session;
use crate::traits::{ApiToken, CredentialStore, DnsApi, Method};

const TOKEN_VERIFY_PATH: &str = "/user/tokens/verify";

/// Zone counts of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneSummary {
    /// Zones returned by the provider
    pub total: usize,
    /// Zones with status `active`
    pub active: usize,
    /// Zones with status `pending`
    pub pending: usize,
}

impl ZoneSummary {
    fn of(zones: &[Zone]) -> Self {
        Self {
            total: zones.len(),
            active: zones.iter().filter(|z| z.is_active()).count(),
            pending: zones.iter().filter(|z| z.status == "pending").count(),
        }
    }
}

/// Token-resolving, caching front of the provider API
pub struct ResourceGateway {
    credentials: Arc<dyn CredentialStore>,
    api: Arc<dyn DnsApi>,
    config: EngineConfig,
}

impl ResourceGateway {
    /// Create a gateway
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        api: Arc<dyn DnsApi>,
        config: EngineConfig,
    ) -> Self {
        Self {
            credentials,
            api,
            config,
        }
    }

    /// Issue a request as the session's active account
    ///
    /// # Errors
    ///
    /// - `Error::NoActiveAccount`: no token resolvable for the session
    /// - `Error::StaleSelector`: the active account vanished and resolution
    ///   switched to another one, so `path` belongs to the old account
    /// - whatever the [`DnsApi`] reports
    pub async fn call(
        &self,
        session: &mut Session,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let expected = session.active_account().map(str::to_owned);
        let token = session
            .resolve_active_token(self.credentials.as_ref())
            .await?
            .ok_or(Error::NoActiveAccount)?;

        if let Some(expected) = expected {
            if session.active_account() != Some(expected.as_str()) {
                return Err(Error::stale_selector(format!("account {} is gone", expected)));
            }
        }

        debug!(
            user = session.user_id(),
            account = session.active_account().unwrap_or_default(),
            provider = self.api.provider_name(),
            "{} {}",
            method,
            path
        );
        self.api.request(&token, method, path, body).await
    }

    /// Check that `token` is valid and currently active
    ///
    /// Provider rejections and inactive tokens become `InvalidCredential`;
    /// transport failures pass through unchanged.
    pub async fn verify_token(&self, token: &ApiToken) -> Result<()> {
        let result = match self.api.request(token, Method::Get, TOKEN_VERIFY_PATH, None).await {
            Ok(result) => result,
            Err(Error::RemoteRejected(msg)) => return Err(Error::invalid_credential(msg)),
            Err(e) => return Err(e),
        };

        match result.get("status").and_then(Value::as_str) {
            Some("active") => Ok(()),
            status => Err(Error::invalid_credential(format!(
                "token status is {}",
                status.unwrap_or("unknown")
            ))),
        }
    }

    /// Fetch the active account's zones into the session cache
    pub async fn list_zones(&self, session: &mut Session) -> Result<()> {
        let path = self.zones_path();
        let zones: Vec<Zone> = decode(self.call(session, Method::Get, &path, None).await?)?;

        if zones.len() >= self.config.zones_fetch_size as usize {
            warn!(
                user = session.user_id(),
                "Zone list filled a whole page ({}); further zones are not shown",
                zones.len()
            );
        }
        session.cache_zones(zones);
        Ok(())
    }

    /// Fetch the records of `zone` into the session cache
    pub async fn list_records(&self, session: &mut Session, zone: &ZoneScope) -> Result<()> {
        let path = format!(
            "/zones/{}/dns_records?per_page={}",
            zone.id, self.config.records_fetch_size
        );
        let records: Vec<Record> = decode(self.call(session, Method::Get, &path, None).await?)?;

        if records.len() >= self.config.records_fetch_size as usize {
            warn!(
                user = session.user_id(),
                zone = %zone.name,
                "Record list filled a whole page ({}); further records are not shown",
                records.len()
            );
        }
        session.enter_scope(zone.clone());
        session.cache_records(records);
        Ok(())
    }

    /// Create a record and append the provider's representation to the cache
    pub async fn create_record(
        &self,
        session: &mut Session,
        zone: &ZoneScope,
        payload: &RecordPayload,
    ) -> Result<Record> {
        let path = format!("/zones/{}/dns_records", zone.id);
        let body = serde_json::to_value(payload)?;
        let record: Record = decode(self.call(session, Method::Post, &path, Some(&body)).await?)?;

        if session.scope().map(|s| s.id.as_str()) == Some(zone.id.as_str()) {
            session.push_record(record.clone());
        }
        Ok(record)
    }

    /// Re-submit a full record and replace the cached entry with the response
    pub async fn update_record(
        &self,
        session: &mut Session,
        zone: &ZoneScope,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<Record> {
        let path = format!("/zones/{}/dns_records/{}", zone.id, record_id);
        let body = serde_json::to_value(payload)?;
        let record: Record = decode(self.call(session, Method::Put, &path, Some(&body)).await?)?;

        if !session.replace_record(record.clone()) {
            debug!(record = %record.id, "Updated record was not cached");
        }
        Ok(record)
    }

    /// Delete a record and drop it from the cache
    pub async fn delete_record(
        &self,
        session: &mut Session,
        zone: &ZoneScope,
        record_id: &str,
    ) -> Result<()> {
        let path = format!("/zones/{}/dns_records/{}", zone.id, record_id);
        self.call(session, Method::Delete, &path, None).await?;
        session.remove_record(record_id);
        Ok(())
    }

    /// Zone counts for every stored account, each queried with its own token
    ///
    /// Per-account failures are returned inline; only a credential store
    /// failure fails the whole call.
    pub async fn account_summaries(&self) -> Result<Vec<(String, Result<ZoneSummary>)>> {
        let accounts = self.credentials.list().await?;
        let path = self.zones_path();

        let mut summaries = Vec::with_capacity(accounts.len());
        for (name, token) in accounts {
            let summary = match self.api.request(&token, Method::Get, &path, None).await {
                Ok(result) => decode::<Vec<Zone>>(result).map(|zones| ZoneSummary::of(&zones)),
                Err(e) => Err(e),
            };
            if let Err(e) = &summary {
                warn!(account = %name, "Failed to summarize account: {}", e);
            }
            summaries.push((name, summary));
        }
        Ok(summaries)
    }

    fn zones_path(&self) -> String {
        format!("/zones?per_page={}", self.config.zones_fetch_size)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::transport(format!("Unexpected provider response: {}", e)))
}
