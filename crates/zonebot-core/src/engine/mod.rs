//! Session engine
//!
//! The SessionEngine turns transport events into render instructions:
//! - Loads the operator's session, mutates it, writes it back
//! - Drives wizards and performs their committing side effect
//! - Resolves selector handles, never guessing on a stale one
//! - Translates every error into an operator message and a stable screen
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Transport  │─── Event ───┐
//! └─────────────┘             │
//!                             ▼
//!                    ┌────────────────┐
//!                    │ SessionEngine  │─── Response ──▶ Transport
//!                    └────────────────┘
//!                             │
//!     ┌───────────────────────┼───────────────────────┐
//!     │                       │                       │
//!     ▼                       ▼                       ▼
//! ┌───────────────┐   ┌─────────────────┐     ┌─────────────┐
//! │ SessionRepo   │   │ ResourceGateway │     │   Events    │
//! │ CredentialSt. │   │ (DnsApi)        │     │  (notify)   │
//! └───────────────┘   └─────────────────┘     └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Check the session out of the repository
//! 2. Dispatch on the event (start, text, selection)
//! 3. On error, build the operator message and a safe screen
//! 4. Write the session back and return the response

mod accounts;
pub mod action;
mod records;
pub mod render;
pub mod views;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::gateway::ResourceGateway;
use crate::session::{Session, UserId};
use crate::traits::{CredentialStore, DnsApi, SessionRepository};
use crate::wizard::{Wizard, WizardKind};

pub use action::Action;
pub use render::{Button, Keyboard, Notice, Response, Screen};

/// Inbound interaction from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `/start` command
    Start(UserId),
    /// Free text message
    Text(UserId, String),
    /// Button press carrying an encoded [`Action`]
    Select(UserId, String),
}

impl Event {
    /// Originating operator
    pub fn user(&self) -> UserId {
        match self {
            Event::Start(user) | Event::Text(user, _) | Event::Select(user, _) => *user,
        }
    }
}

/// Events emitted by the SessionEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Account verified and stored
    AccountAdded { user: UserId, account: String },

    /// Account removed from the credential store
    AccountDeleted { user: UserId, account: String },

    /// Active account switched explicitly
    AccountActivated { user: UserId, account: String },

    /// Active account cleared
    LoggedOut { user: UserId },

    /// Wizard started
    WizardStarted { user: UserId, kind: WizardKind },

    /// Wizard dropped by navigation or replaced by another one
    WizardDiscarded { user: UserId, kind: WizardKind },

    /// Record created at the provider
    RecordCreated {
        user: UserId,
        zone: String,
        record_id: String,
    },

    /// Record re-submitted at the provider
    RecordUpdated {
        user: UserId,
        zone: String,
        record_id: String,
    },

    /// Record deleted at the provider
    RecordDeleted {
        user: UserId,
        zone: String,
        record_id: String,
    },

    /// A selection referenced an outdated list
    StaleSelector { user: UserId, token: String },

    /// A handler ended with an error (already shown to the operator)
    HandlerFailed { user: UserId, error: String },
}

/// Core session engine
///
/// Cheap to share behind an `Arc`; every call is independent and different
/// operators never contend on the same session.
pub struct SessionEngine {
    /// Durable account store
    credentials: Arc<dyn CredentialStore>,

    /// Per-user volatile state
    sessions: Arc<dyn SessionRepository>,

    /// Provider access
    gateway: ResourceGateway,

    /// Paging and channel settings
    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SessionEngine {
    /// Create a new session engine
    ///
    /// # Parameters
    ///
    /// - `credentials`: Credential store implementation
    /// - `sessions`: Session repository implementation
    /// - `api`: DNS provider API implementation
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionRepository>,
        api: Arc<dyn DnsApi>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let gateway = ResourceGateway::new(credentials.clone(), api, config.clone());

        let engine = Self {
            credentials,
            sessions,
            gateway,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Handle one inbound event
    ///
    /// Domain errors never escape: they become a notice plus a stable screen.
    /// Only a session repository failure is returned as `Err`.
    pub async fn handle(&self, event: Event) -> Result<Response> {
        let user = event.user();
        let mut session = self.sessions.get_or_create(user).await?;

        let result = match event {
            Event::Start(_) => self.on_start(&mut session).await,
            Event::Text(_, text) => self.on_text(&mut session, &text).await,
            Event::Select(_, raw) => self.on_select(&mut session, &raw).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => self.recover(&mut session, e).await,
        };

        self.sessions.save(session).await?;
        Ok(response)
    }

    /// Current state of a user's session
    pub async fn session_snapshot(&self, user: UserId) -> Result<Session> {
        self.sessions.get_or_create(user).await
    }

    async fn on_start(&self, session: &mut Session) -> Result<Response> {
        self.discard_wizard(session);
        self.home(session).await
    }

    async fn on_text(&self, session: &mut Session, text: &str) -> Result<Response> {
        let Some(wizard) = session.take_wizard() else {
            debug!(user = session.user_id(), "Text with no wizard running");
            return Ok(Response::screen(views::hint()));
        };

        match wizard {
            Wizard::AddAccount(wizard) => self.add_account_text(session, wizard, text).await,
            Wizard::AddRecord(wizard) => {
                let transition = wizard.accept_text(text);
                self.drive_add_record(session, transition).await
            }
            Wizard::EditField(wizard) => self.edit_field_text(session, wizard, text).await,
        }
    }

    async fn on_select(&self, session: &mut Session, raw: &str) -> Result<Response> {
        let Some(action) = Action::parse(raw) else {
            return Err(Error::stale_selector(raw));
        };
        debug!(user = session.user_id(), action = raw, "Selection");

        if action.discards_wizard() {
            self.discard_wizard(session);
        }

        match action {
            Action::Home => self.home(session).await,
            Action::Help => Ok(Response::screen(views::help(session))),
            Action::Tutorial => Ok(Response::screen(views::tutorial())),
            Action::Logout => self.logout(session).await,
            Action::Stats => self.stats(session).await,
            Action::Accounts => Ok(Response::screen(self.accounts_screen(session).await?)),
            Action::AddAccount => Ok(self.start_add_account(session)),
            Action::SelectAccount(token) => self.select_account(session, &token).await,
            Action::DeleteAccount(token) => {
                let name = session.resolve_account(&token)?;
                Ok(Response::screen(views::confirm_account_delete(name, &token)))
            }
            Action::ConfirmDeleteAccount(token) => self.delete_account(session, &token).await,
            Action::Zones => self.zones(session).await,
            Action::ZonePage(page) => Ok(Response::screen(self.zones_screen(session, page))),
            Action::OpenZone(token) => self.open_zone(session, &token).await,
            Action::Records => Ok(Response::screen(self.records_screen(session)?)),
            Action::RefreshRecords => self.refresh_records(session).await,
            Action::NewRecord => self.start_add_record(session),
            Action::PickType(record_type) => {
                let wizard = self.take_add_record(session, raw)?;
                let transition = wizard.choose_type(record_type);
                self.drive_add_record(session, transition).await
            }
            Action::PickProxied(proxied) => {
                let wizard = self.take_add_record(session, raw)?;
                let transition = wizard.choose_proxied(proxied);
                self.drive_add_record(session, transition).await
            }
            Action::OpenRecord(token) => self.open_record(session, &token),
            Action::EditField(field, token) => self.start_edit_field(session, field, &token),
            Action::ToggleProxy(token) => {
                let record = session.resolve_record(&token)?;
                Ok(Response::screen(views::proxy_choice(record, &token)))
            }
            Action::SetProxy(proxied, token) => self.set_proxy(session, proxied, &token).await,
            Action::AskDeleteRecord(token) => {
                let record = session.resolve_record(&token)?;
                Ok(Response::screen(views::confirm_record_delete(record, &token)))
            }
            Action::ConfirmDeleteRecord(token) => self.delete_record(session, &token).await,
            Action::Noop => Ok(Response::empty()),
        }
    }

    /// Translate a handler error into what the operator sees
    async fn recover(&self, session: &mut Session, error: Error) -> Response {
        let user = session.user_id();
        match &error {
            Error::StaleSelector(token) => {
                debug!(user, token = %token, "Stale selection");
                self.emit_event(EngineEvent::StaleSelector {
                    user,
                    token: token.clone(),
                });
                return Response::alert(error.user_message());
            }
            Error::NoActiveAccount => {
                info!(user, "No active account; prompting for a selection");
                return match self.accounts_screen(session).await {
                    Ok(screen) => Response::alert(error.user_message()).and_screen(screen),
                    Err(e) => {
                        error!(user, "Failed to render accounts: {}", e);
                        Response::alert(error.user_message())
                    }
                };
            }
            Error::RemoteRejected(_) | Error::TransportFailure(_) | Error::InvalidCredential(_) => {
                warn!(user, "Provider call failed: {}", error);
            }
            _ => {
                error!(user, "Handler failed: {}", error);
            }
        }

        self.emit_event(EngineEvent::HandlerFailed {
            user,
            error: error.to_string(),
        });
        Response::alert(error.user_message())
    }

    /// Drop the live wizard, if any
    fn discard_wizard(&self, session: &mut Session) {
        if let Some(wizard) = session.clear_wizard() {
            debug!(user = session.user_id(), kind = %wizard.kind(), "Discarding wizard");
            self.emit_event(EngineEvent::WizardDiscarded {
                user: session.user_id(),
                kind: wizard.kind(),
            });
        }
    }

    /// Make `wizard` the live one
    fn start_wizard(&self, session: &mut Session, wizard: impl Into<Wizard>) {
        let wizard = wizard.into();
        let kind = wizard.kind();
        if let Some(previous) = session.start_wizard(wizard) {
            self.emit_event(EngineEvent::WizardDiscarded {
                user: session.user_id(),
                kind: previous.kind(),
            });
        }
        self.emit_event(EngineEvent::WizardStarted {
            user: session.user_id(),
            kind,
        });
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // Bounded channel: when the consumer lags, the event is dropped
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_user() {
        assert_eq!(Event::Start(1).user(), 1);
        assert_eq!(Event::Text(2, "x".into()).user(), 2);
        assert_eq!(Event::Select(3, "home".into()).user(), 3);
    }

    #[test]
    fn test_engine_event_clone_eq() {
        let event = EngineEvent::WizardDiscarded {
            user: 1,
            kind: WizardKind::AddRecord,
        };
        assert_eq!(event.clone(), event);
    }
}
