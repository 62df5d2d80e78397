//! Zone and record handlers: browsing, add-record and edit-field wizards,
//! proxy toggle, deletion

use tracing::{info, warn};

use super::action::Action;
use super::render::{Response, Screen};
use super::views;
use super::{EngineEvent, SessionEngine};
use crate::error::{Error, Result};
use crate::model::{EditableField, Record, Zone, ZoneScope};
use crate::session::{SelectorToken, Session};
use crate::wizard::{AddRecord, EditField, RecordSubmission, Transition, Wizard};

impl SessionEngine {
    pub(super) async fn zones(&self, session: &mut Session) -> Result<Response> {
        self.gateway.list_zones(session).await?;
        Ok(Response::screen(self.zones_screen(session, 0)))
    }

    /// One page of the cached zone list; out-of-range pages clamp to the last
    pub(super) fn zones_screen(&self, session: &mut Session, page: usize) -> Screen {
        let page_size = self.config.zones_page_size;
        let pages = session.zones().len().div_ceil(page_size).max(1);
        let page = page.min(pages - 1);

        let start = page * page_size;
        let end = (start + page_size).min(session.zones().len());
        let ids: Vec<String> = session.zones()[start..end]
            .iter()
            .map(|zone| zone.id.clone())
            .collect();
        let tokens = session.render_zones(ids);

        let entries: Vec<(&Zone, SelectorToken)> =
            session.zones()[start..end].iter().zip(tokens).collect();
        views::zones(session, page, pages, &entries)
    }

    pub(super) async fn open_zone(
        &self,
        session: &mut Session,
        token: &SelectorToken,
    ) -> Result<Response> {
        let scope = ZoneScope::from(session.resolve_zone(token)?);
        self.gateway.list_records(session, &scope).await?;
        Ok(Response::screen(self.records_screen(session)?))
    }

    pub(super) async fn refresh_records(&self, session: &mut Session) -> Result<Response> {
        let scope = current_scope(session)?;
        self.gateway.list_records(session, &scope).await?;
        Ok(Response::screen(self.records_screen(session)?))
    }

    /// Record list of the current zone, from cache, with fresh handles
    pub(super) fn records_screen(&self, session: &mut Session) -> Result<Screen> {
        let scope = current_scope(session)?;
        let ids: Vec<String> = session.records().iter().map(|r| r.id.clone()).collect();
        let tokens = session.render_records(ids);

        let entries: Vec<(&Record, SelectorToken)> =
            session.records().iter().zip(tokens).collect();
        Ok(views::records(session, &scope, &entries))
    }

    /// Detail screen of cached record `id`
    ///
    /// Reuses the record's current handle; re-renders the record map only
    /// when the handle was invalidated.
    fn record_detail_screen(&self, session: &mut Session, id: &str) -> Result<Screen> {
        let scope = current_scope(session)?;
        let token = match session.record_token(id) {
            Some(token) => token,
            None => {
                let ids: Vec<String> = session.records().iter().map(|r| r.id.clone()).collect();
                session.render_records(ids);
                session
                    .record_token(id)
                    .ok_or_else(|| Error::stale_selector(id))?
            }
        };
        let record = session.record(id).ok_or_else(|| Error::stale_selector(id))?;
        Ok(views::record_detail(session, &scope, record, &token))
    }

    pub(super) fn open_record(
        &self,
        session: &mut Session,
        token: &SelectorToken,
    ) -> Result<Response> {
        let scope = current_scope(session)?;
        let record = session.resolve_record(token)?;
        Ok(Response::screen(views::record_detail(session, &scope, record, token)))
    }

    pub(super) fn start_add_record(&self, session: &mut Session) -> Result<Response> {
        let scope = current_scope(session)?;
        let wizard = AddRecord::start(scope);
        let screen = views::add_record_prompt(wizard.zone(), wizard.step());
        self.start_wizard(session, wizard);
        Ok(Response::screen(screen))
    }

    /// Take the live add-record wizard for a menu choice
    ///
    /// A choice button from a wizard that is no longer live is stale.
    pub(super) fn take_add_record(&self, session: &mut Session, raw: &str) -> Result<AddRecord> {
        match session.take_wizard() {
            Some(Wizard::AddRecord(wizard)) => Ok(wizard),
            Some(other) => {
                session.start_wizard(other);
                Err(Error::stale_selector(raw))
            }
            None => Err(Error::stale_selector(raw)),
        }
    }

    pub(super) async fn drive_add_record(
        &self,
        session: &mut Session,
        transition: Transition<AddRecord, RecordSubmission>,
    ) -> Result<Response> {
        let submission = match transition {
            Transition::Advance(next) => {
                let screen = views::add_record_prompt(next.zone(), next.step());
                session.start_wizard(next);
                return Ok(Response::screen(screen));
            }
            Transition::Reprompt(same, reason) => {
                let screen = views::add_record_prompt(same.zone(), same.step());
                session.start_wizard(same);
                return Ok(Response::alert(reason).and_screen(screen));
            }
            Transition::Commit(submission) => submission,
        };

        // The wizard is already gone: a failed create returns to idle
        match self
            .gateway
            .create_record(session, &submission.zone, &submission.payload)
            .await
        {
            Ok(record) => {
                info!(
                    user = session.user_id(),
                    zone = %submission.zone.name,
                    record = %record.id,
                    "Record created"
                );
                self.emit_event(EngineEvent::RecordCreated {
                    user: session.user_id(),
                    zone: submission.zone.id.clone(),
                    record_id: record.id.clone(),
                });
                let in_scope = session
                    .scope()
                    .is_some_and(|scope| scope.id == submission.zone.id);
                let screen = if in_scope {
                    self.records_screen(session)?
                } else {
                    views::dashboard(session)
                };
                Ok(Response::notice("Record created").and_screen(screen))
            }
            Err(e) => {
                warn!(user = session.user_id(), "Record creation failed: {}", e);
                self.emit_event(EngineEvent::HandlerFailed {
                    user: session.user_id(),
                    error: e.to_string(),
                });
                let message = e.user_message();
                Ok(Response::alert(message.clone())
                    .and_screen(views::operation_failed(&message, Action::Records)))
            }
        }
    }

    pub(super) fn start_edit_field(
        &self,
        session: &mut Session,
        field: EditableField,
        token: &SelectorToken,
    ) -> Result<Response> {
        let scope = current_scope(session)?;
        let record = session.resolve_record(token)?.clone();
        let screen = views::edit_prompt(field, &record, Action::OpenRecord(token.clone()));
        self.start_wizard(session, EditField::start(scope, field, record));
        Ok(Response::screen(screen))
    }

    pub(super) async fn edit_field_text(
        &self,
        session: &mut Session,
        wizard: EditField,
        text: &str,
    ) -> Result<Response> {
        let update = match wizard.accept_text(text) {
            Transition::Advance(same) => {
                let back = back_to_record(session, &same.record().id);
                let screen = views::edit_prompt(same.field(), same.record(), back);
                session.start_wizard(same);
                return Ok(Response::screen(screen));
            }
            Transition::Reprompt(same, reason) => {
                let back = back_to_record(session, &same.record().id);
                let screen = views::edit_prompt(same.field(), same.record(), back);
                session.start_wizard(same);
                return Ok(Response::alert(reason).and_screen(screen));
            }
            Transition::Commit(update) => update,
        };

        match self
            .gateway
            .update_record(session, &update.zone, &update.record_id, &update.payload)
            .await
        {
            Ok(record) => {
                info!(user = session.user_id(), record = %record.id, "Record updated");
                self.emit_event(EngineEvent::RecordUpdated {
                    user: session.user_id(),
                    zone: update.zone.id.clone(),
                    record_id: record.id.clone(),
                });
                Ok(Response::notice("Record updated")
                    .and_screen(self.record_detail_screen(session, &record.id)?))
            }
            Err(e) => {
                warn!(
                    user = session.user_id(),
                    record = %update.record_id,
                    "Record update failed: {}",
                    e
                );
                self.emit_event(EngineEvent::HandlerFailed {
                    user: session.user_id(),
                    error: e.to_string(),
                });
                let message = e.user_message();
                let back = back_to_record(session, &update.record_id);
                Ok(Response::alert(message.clone())
                    .and_screen(views::operation_failed(&message, back)))
            }
        }
    }

    pub(super) async fn set_proxy(
        &self,
        session: &mut Session,
        proxied: bool,
        token: &SelectorToken,
    ) -> Result<Response> {
        let scope = current_scope(session)?;
        let record = session.resolve_record(token)?;
        let record_id = record.id.clone();
        let mut payload = record.payload();
        payload.proxied = proxied;

        let updated = self
            .gateway
            .update_record(session, &scope, &record_id, &payload)
            .await?;
        info!(user = session.user_id(), record = %updated.id, proxied, "Proxy flag changed");
        self.emit_event(EngineEvent::RecordUpdated {
            user: session.user_id(),
            zone: scope.id.clone(),
            record_id: updated.id.clone(),
        });

        Ok(Response::notice("Proxy updated")
            .and_screen(self.record_detail_screen(session, &updated.id)?))
    }

    pub(super) async fn delete_record(
        &self,
        session: &mut Session,
        token: &SelectorToken,
    ) -> Result<Response> {
        let scope = current_scope(session)?;
        let record_id = session.resolve_record(token)?.id.clone();

        self.gateway.delete_record(session, &scope, &record_id).await?;
        info!(user = session.user_id(), zone = %scope.name, record = %record_id, "Record deleted");
        self.emit_event(EngineEvent::RecordDeleted {
            user: session.user_id(),
            zone: scope.id.clone(),
            record_id,
        });

        Ok(Response::notice("Record deleted").and_screen(self.records_screen(session)?))
    }
}

fn current_scope(session: &Session) -> Result<ZoneScope> {
    session
        .scope()
        .cloned()
        .ok_or_else(|| Error::stale_selector("zone"))
}

fn back_to_record(session: &Session, record_id: &str) -> Action {
    session
        .record_token(record_id)
        .map(Action::OpenRecord)
        .unwrap_or(Action::Records)
}
