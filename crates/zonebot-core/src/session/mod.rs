// # Session
//
// Per-user conversational state: the active account name, the last fetched
// zone and record lists, the selector maps for each rendered list and the
// live wizard.
//
// ## Invariants
//
// - At most one wizard is live; starting one returns the one it replaced.
// - Selector handles resolve only against the most recent render of their
//   list in this session; anything older, or minted by another session,
//   resolves to `StaleSelector`.
// - The record cache belongs to the zone in `scope`; entering another zone
//   empties it.
// - The session never stores a secret, only the active account *name*. The
//   token is looked up in the credential store on every call.

pub mod selector;

use chrono::Utc;
use tracing::{debug, warn};

use crate::model::{Record, Zone, ZoneScope};
use crate::traits::{Accounts, ApiToken, CredentialStore};
use crate::wizard::Wizard;
use crate::{Error, Result};

pub use selector::{SelectorMap, SelectorToken};

/// Chat identity of an operator
pub type UserId = i64;

/// Mutable state of one operator
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    active_account: Option<String>,
    account_selectors: SelectorMap<String>,
    zones: Vec<Zone>,
    zone_selectors: SelectorMap<String>,
    scope: Option<ZoneScope>,
    records: Vec<Record>,
    record_selectors: SelectorMap<String>,
    wizard: Option<Wizard>,
}

impl Session {
    /// Fresh, idle session
    pub fn new(user_id: UserId) -> Self {
        let epoch = selector::next_epoch(Utc::now());
        Self {
            user_id,
            active_account: None,
            account_selectors: SelectorMap::new(epoch),
            zones: Vec::new(),
            zone_selectors: SelectorMap::new(epoch),
            scope: None,
            records: Vec::new(),
            record_selectors: SelectorMap::new(epoch),
            wizard: None,
        }
    }

    /// Owner of the session
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    // ---- active account ----

    /// Name of the active account, if any
    pub fn active_account(&self) -> Option<&str> {
        self.active_account.as_deref()
    }

    /// Make `name` the active account
    ///
    /// Switching accounts drops every cache that belonged to the previous one.
    pub fn activate(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.active_account.as_deref() != Some(name.as_str()) {
            self.forget_resources();
        }
        self.active_account = Some(name);
    }

    /// Clear the active account and every cache derived from it
    pub fn deactivate(&mut self) {
        self.active_account = None;
        self.forget_resources();
    }

    /// Resolve the active token against an already loaded account set
    ///
    /// - active and present: its token
    /// - active but deleted: cleared, then falls through
    /// - exactly one account: auto-activated
    /// - otherwise: `None` (the caller must prompt for a selection)
    pub fn resolve_in(&mut self, accounts: &Accounts) -> Option<ApiToken> {
        if let Some(name) = self.active_account.as_deref() {
            if let Some(token) = accounts.get(name) {
                return Some(token.clone());
            }
            warn!(
                user = self.user_id,
                account = %name,
                "Active account no longer exists; clearing"
            );
            self.deactivate();
        }

        if accounts.len() == 1 {
            if let Some((name, token)) = accounts.first() {
                debug!(user = self.user_id, account = %name, "Auto-activating the only account");
                self.activate(name.clone());
                return Some(token.clone());
            }
        }

        None
    }

    /// Resolve the active token from `store`
    pub async fn resolve_active_token(
        &mut self,
        store: &dyn CredentialStore,
    ) -> Result<Option<ApiToken>> {
        let accounts = store.list().await?;
        Ok(self.resolve_in(&accounts))
    }

    // ---- accounts list ----

    /// Assign handles to a freshly rendered account list
    pub fn render_accounts<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Vec<SelectorToken> {
        self.account_selectors.rebuild(names.into_iter().cloned())
    }

    /// Account name behind a handle
    pub fn resolve_account(&self, token: &SelectorToken) -> Result<&str> {
        self.account_selectors
            .resolve(token)
            .map(String::as_str)
            .ok_or_else(|| Error::stale_selector(token.as_str()))
    }

    // ---- zones ----

    /// Replace the zone cache after a fetch
    pub fn cache_zones(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        self.zone_selectors.invalidate();
    }

    /// Cached zones in provider order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Assign handles to a rendered slice of the zone cache
    pub fn render_zones(&mut self, ids: impl IntoIterator<Item = String>) -> Vec<SelectorToken> {
        self.zone_selectors.rebuild(ids)
    }

    /// Zone behind a handle
    pub fn resolve_zone(&self, token: &SelectorToken) -> Result<&Zone> {
        self.zone_selectors
            .resolve(token)
            .and_then(|id| self.zones.iter().find(|zone| &zone.id == id))
            .ok_or_else(|| Error::stale_selector(token.as_str()))
    }

    /// Enter a zone; leaving the previous one drops its record cache
    pub fn enter_scope(&mut self, scope: ZoneScope) {
        if self.scope.as_ref().map(|s| &s.id) != Some(&scope.id) {
            self.records.clear();
            self.record_selectors.invalidate();
        }
        self.scope = Some(scope);
    }

    /// Zone currently browsed
    pub fn scope(&self) -> Option<&ZoneScope> {
        self.scope.as_ref()
    }

    // ---- records ----

    /// Replace the record cache after a fetch
    pub fn cache_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.record_selectors.invalidate();
    }

    /// Cached records of the current zone
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Assign handles to a rendered record list
    pub fn render_records(&mut self, ids: impl IntoIterator<Item = String>) -> Vec<SelectorToken> {
        self.record_selectors.rebuild(ids)
    }

    /// Record behind a handle
    pub fn resolve_record(&self, token: &SelectorToken) -> Result<&Record> {
        self.record_selectors
            .resolve(token)
            .and_then(|id| self.record(id))
            .ok_or_else(|| Error::stale_selector(token.as_str()))
    }

    /// Cached record by id
    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Handle currently denoting record `id`
    pub fn record_token(&self, id: &str) -> Option<SelectorToken> {
        self.record_selectors.token_for(&id.to_string())
    }

    /// Replace a cached record with the provider's returned representation
    ///
    /// Returns `false` if the record is not cached.
    pub fn replace_record(&mut self, record: Record) -> bool {
        match self.records.iter_mut().find(|cached| cached.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Append a newly created record to the cache
    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Drop a deleted record and every outstanding record handle
    pub fn remove_record(&mut self, id: &str) -> Option<Record> {
        let position = self.records.iter().position(|record| record.id == id)?;
        self.record_selectors.invalidate();
        Some(self.records.remove(position))
    }

    // ---- wizard ----

    /// Start `wizard`, returning the one it replaced
    pub fn start_wizard(&mut self, wizard: impl Into<Wizard>) -> Option<Wizard> {
        self.wizard.replace(wizard.into())
    }

    /// Live wizard, if any
    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    /// Take the live wizard out to drive a transition
    pub fn take_wizard(&mut self) -> Option<Wizard> {
        self.wizard.take()
    }

    /// Discard the live wizard
    pub fn clear_wizard(&mut self) -> Option<Wizard> {
        self.wizard.take()
    }

    fn forget_resources(&mut self) {
        self.zones.clear();
        self.zone_selectors.invalidate();
        self.scope = None;
        self.records.clear();
        self.record_selectors.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{AddAccount, AddRecord};
    use serde_json::json;

    fn accounts(entries: &[(&str, &str)]) -> Accounts {
        entries
            .iter()
            .map(|(name, token)| (name.to_string(), ApiToken::new(*token)))
            .collect()
    }

    fn zone(id: &str, name: &str) -> Zone {
        serde_json::from_value(json!({"id": id, "name": name, "status": "active"})).unwrap()
    }

    fn record(id: &str) -> Record {
        serde_json::from_value(json!({
            "id": id, "type": "A", "name": "www.example.com", "content": "1.2.3.4", "ttl": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_single_account_auto_activates() {
        let mut session = Session::new(1);
        let token = session.resolve_in(&accounts(&[("work", "tok1")]));
        assert_eq!(token, Some(ApiToken::new("tok1")));
        assert_eq!(session.active_account(), Some("work"));
    }

    #[test]
    fn test_deleted_account_is_cleared() {
        let mut session = Session::new(1);
        session.activate("gone");
        let token = session.resolve_in(&accounts(&[("a", "t1"), ("b", "t2")]));
        assert!(token.is_none());
        assert!(session.active_account().is_none());
    }

    #[test]
    fn test_no_accounts_resolves_nothing() {
        let mut session = Session::new(1);
        assert!(session.resolve_in(&Accounts::new()).is_none());
    }

    #[test]
    fn test_render_accounts_invalidates_previous_handles() {
        let mut session = Session::new(1);
        let names = vec!["work".to_string(), "home".to_string()];
        let first = session.render_accounts(&names);
        let second = session.render_accounts(&names);

        assert!(matches!(
            session.resolve_account(&first[0]),
            Err(Error::StaleSelector(_))
        ));
        assert_eq!(session.resolve_account(&second[1]).unwrap(), "home");
    }

    #[test]
    fn test_entering_other_zone_drops_records() {
        let mut session = Session::new(1);
        session.cache_zones(vec![zone("z1", "a.com"), zone("z2", "b.com")]);
        session.enter_scope(ZoneScope::from(&session.zones()[0].clone()));
        session.cache_records(vec![record("r1")]);
        let tokens = session.render_records(vec!["r1".to_string()]);

        session.enter_scope(ZoneScope {
            id: "z1".into(),
            name: "a.com".into(),
        });
        assert_eq!(session.records().len(), 1);

        session.enter_scope(ZoneScope {
            id: "z2".into(),
            name: "b.com".into(),
        });
        assert!(session.records().is_empty());
        assert!(session.resolve_record(&tokens[0]).is_err());
    }

    #[test]
    fn test_remove_record_invalidates_handles() {
        let mut session = Session::new(1);
        session.cache_records(vec![record("r1"), record("r2")]);
        let tokens = session.render_records(vec!["r1".to_string(), "r2".to_string()]);

        assert!(session.remove_record("r1").is_some());
        assert!(session.resolve_record(&tokens[1]).is_err());
        assert_eq!(session.records().len(), 1);
        assert!(session.remove_record("r1").is_none());
    }

    #[test]
    fn test_replace_record() {
        let mut session = Session::new(1);
        session.cache_records(vec![record("r1")]);
        let mut updated = record("r1");
        updated.ttl = 600;

        assert!(session.replace_record(updated));
        assert_eq!(session.record("r1").map(|r| r.ttl), Some(600));
        assert!(!session.replace_record(record("missing")));
    }

    #[test]
    fn test_starting_wizard_replaces_previous() {
        let mut session = Session::new(1);
        let scope = ZoneScope {
            id: "z1".into(),
            name: "a.com".into(),
        };
        assert!(session.start_wizard(AddRecord::start(scope)).is_none());

        let previous = session.start_wizard(AddAccount::start());
        assert!(matches!(previous, Some(Wizard::AddRecord(_))));
        assert!(matches!(session.wizard(), Some(Wizard::AddAccount(AddAccount::Name))));
    }

    #[test]
    fn test_switching_account_drops_caches() {
        let mut session = Session::new(1);
        session.activate("work");
        session.cache_zones(vec![zone("z1", "a.com")]);
        session.activate("work");
        assert_eq!(session.zones().len(), 1);

        session.activate("home");
        assert!(session.zones().is_empty());
        assert!(session.scope().is_none());
    }
}
