//! Account handlers: onboarding, selection, deletion, add-account wizard,
//! global stats

use chrono::Utc;
use tracing::{info, warn};

use super::render::{Response, Screen};
use super::views;
use super::{EngineEvent, SessionEngine};
use crate::error::{Error, Result};
use crate::session::{SelectorToken, Session};
use crate::wizard::{AddAccount, Transition};

impl SessionEngine {
    /// Onboarding, account choice or dashboard, depending on what resolves
    pub(super) async fn home(&self, session: &mut Session) -> Result<Response> {
        let accounts = self.credentials.list().await?;
        if accounts.is_empty() {
            return Ok(Response::screen(views::onboarding()));
        }

        if session.resolve_in(&accounts).is_none() {
            return Ok(Response::screen(self.accounts_screen(session).await?));
        }
        Ok(Response::screen(views::dashboard(session)))
    }

    /// Account list with fresh handles
    pub(super) async fn accounts_screen(&self, session: &mut Session) -> Result<Screen> {
        let accounts = self.credentials.list().await?;
        let tokens = session.render_accounts(accounts.keys());
        let entries: Vec<(&str, SelectorToken)> = accounts
            .keys()
            .map(String::as_str)
            .zip(tokens)
            .collect();
        Ok(views::accounts(session, &entries))
    }

    pub(super) async fn logout(&self, session: &mut Session) -> Result<Response> {
        if let Some(name) = session.active_account() {
            info!(user = session.user_id(), account = %name, "Logging out");
        }
        session.deactivate();
        self.emit_event(EngineEvent::LoggedOut {
            user: session.user_id(),
        });
        Ok(Response::notice("Logged out").and_screen(self.accounts_screen(session).await?))
    }

    pub(super) async fn select_account(
        &self,
        session: &mut Session,
        token: &SelectorToken,
    ) -> Result<Response> {
        let name = session.resolve_account(token)?.to_string();

        // The account may have been deleted since the list was rendered
        let accounts = self.credentials.list().await?;
        if !accounts.contains_key(&name) {
            return Err(Error::stale_selector(token.as_str()));
        }

        if session.active_account() == Some(name.as_str()) {
            return Ok(Response::notice("This account is already active"));
        }

        session.activate(name.clone());
        info!(user = session.user_id(), account = %name, "Account activated");
        self.emit_event(EngineEvent::AccountActivated {
            user: session.user_id(),
            account: name.clone(),
        });
        Ok(Response::notice(format!("Switched to {}", name)).and_screen(views::dashboard(session)))
    }

    pub(super) async fn delete_account(
        &self,
        session: &mut Session,
        token: &SelectorToken,
    ) -> Result<Response> {
        let name = session.resolve_account(token)?.to_string();
        self.credentials.delete(&name).await?;

        if session.active_account() == Some(name.as_str()) {
            session.deactivate();
        }
        info!(user = session.user_id(), account = %name, "Account deleted");
        self.emit_event(EngineEvent::AccountDeleted {
            user: session.user_id(),
            account: name.clone(),
        });

        Ok(Response::notice(format!("Account {} deleted", name))
            .and_screen(self.accounts_screen(session).await?))
    }

    pub(super) fn start_add_account(&self, session: &mut Session) -> Response {
        self.start_wizard(session, AddAccount::start());
        Response::screen(views::account_name_prompt())
    }

    pub(super) async fn add_account_text(
        &self,
        session: &mut Session,
        wizard: AddAccount,
        text: &str,
    ) -> Result<Response> {
        let submission = match wizard.accept_text(text) {
            Transition::Advance(next) => {
                let screen = account_prompt(&next);
                session.start_wizard(next);
                return Ok(Response::screen(screen));
            }
            Transition::Reprompt(same, reason) => {
                let screen = account_prompt(&same);
                session.start_wizard(same);
                return Ok(Response::alert(reason).and_screen(screen));
            }
            Transition::Commit(submission) => submission,
        };

        if let Err(e) = self.gateway.verify_token(&submission.token).await {
            warn!(
                user = session.user_id(),
                account = %submission.name,
                "Token verification failed: {}",
                e
            );
            session.start_wizard(submission.retry());
            let message = e.user_message();
            return Ok(Response::screen(views::account_token_prompt(
                &submission.name,
                Some(&message),
            )));
        }

        if let Err(e) = self.credentials.save(&submission.name, &submission.token).await {
            session.start_wizard(submission.retry());
            return Err(e);
        }

        session.activate(submission.name.clone());
        info!(user = session.user_id(), account = %submission.name, "Account added");
        self.emit_event(EngineEvent::AccountAdded {
            user: session.user_id(),
            account: submission.name.clone(),
        });
        self.emit_event(EngineEvent::AccountActivated {
            user: session.user_id(),
            account: submission.name.clone(),
        });

        Ok(Response::notice(format!("Account {} added", submission.name))
            .and_screen(views::dashboard(session)))
    }

    pub(super) async fn stats(&self, session: &mut Session) -> Result<Response> {
        let summaries = self.gateway.account_summaries().await?;
        Ok(Response::screen(views::stats(session, &summaries, Utc::now())))
    }
}

fn account_prompt(wizard: &AddAccount) -> Screen {
    match wizard {
        AddAccount::Name => views::account_name_prompt(),
        AddAccount::Token { name } => views::account_token_prompt(name, None),
    }
}
