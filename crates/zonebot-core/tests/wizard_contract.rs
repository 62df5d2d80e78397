//! Contract Test: Wizards
//!
//! Constraints verified:
//! - Add-record TTL input that is not a positive number becomes automatic (1)
//! - Edit-field TTL input that is not a positive number is re-prompted with
//!   no provider call and no cache change
//! - Updates resend the full record with one field replaced
//! - The cache holds exactly what the provider returned after a mutation
//! - A new wizard replaces the old one without carrying its fields
//! - A rejected token keeps the add-account wizard on the token step
//!
//! If this test fails, a wizard is leaking state or guessing provider data.

mod common;

use common::*;
use serde_json::{Value, json};
use zonebot_core::engine::{Action, EngineEvent, Response};
use zonebot_core::model::{EditableField, RecordType};
use zonebot_core::traits::{CredentialStore, Method};
use zonebot_core::wizard::{AddAccount, AddRecordStep, Wizard, WizardKind};

async fn add_record(h: &Harness, ttl: &str, created: Value) -> Response {
    h.api
        .respond(Method::Post, "/zones/z1/dns_records", created);

    h.select(&Action::NewRecord).await;
    h.select(&Action::PickType(RecordType::A)).await;
    h.text("www").await;
    h.text("1.2.3.4").await;
    h.text(ttl).await;
    h.select(&Action::PickProxied(false)).await
}

async fn open_record_detail(h: &Harness) -> Response {
    let records = h.open_first_zone().await;
    let open = action_where(&records, |a| matches!(a, Action::OpenRecord(_)));
    h.select(&open).await
}

#[tokio::test]
async fn add_record_ttl_is_lenient() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(&h.api, vec![]);
    h.open_first_zone().await;

    let created = record_json("new1", "A", "www.example.com", "1.2.3.4", 1);
    let response = add_record(&h, "abc", created.clone()).await;
    assert_eq!(response.notice.unwrap().text, "Record created");

    let created = record_json("new2", "A", "www.example.com", "1.2.3.4", 300);
    add_record(&h, "300", created.clone()).await;

    let posts = h.api.calls_with(Method::Post);
    assert_eq!(posts.len(), 2);
    assert_eq!(
        posts[0].body,
        Some(json!({"type": "A", "name": "www", "content": "1.2.3.4", "ttl": 1, "proxied": false}))
    );
    assert_eq!(posts[1].body.as_ref().unwrap()["ttl"], json!(300));

    // The cache holds the provider's representation, not the submitted one
    let session = h.session().await;
    let cached = serde_json::to_value(session.record("new2").unwrap()).unwrap();
    assert_eq!(cached, created);
    assert!(session.wizard().is_none());
}

#[tokio::test]
async fn add_record_steps_collect_in_order() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(&h.api, vec![]);
    h.open_first_zone().await;

    h.select(&Action::NewRecord).await;
    // Free text before a type is chosen is re-prompted
    let response = h.text("www").await;
    assert!(is_alert(&response));

    h.select(&Action::PickType(RecordType::Mx)).await;
    h.text("@").await;
    h.text("mail.example.com").await;
    h.text("600").await;

    let session = h.session().await;
    let Some(Wizard::AddRecord(wizard)) = session.wizard() else {
        panic!("add-record wizard should be live");
    };
    assert_eq!(
        wizard.step(),
        &AddRecordStep::Proxied {
            record_type: RecordType::Mx,
            name: "@".into(),
            content: "mail.example.com".into(),
            ttl: 600,
        }
    );
    assert_eq!(wizard.zone().id, "z1");
}

#[tokio::test]
async fn failed_create_returns_to_idle_with_message() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(&h.api, vec![]);
    h.open_first_zone().await;
    h.api
        .reject(Method::Post, "/zones/z1/dns_records", "Record already exists.");

    h.select(&Action::NewRecord).await;
    h.select(&Action::PickType(RecordType::A)).await;
    h.text("www").await;
    h.text("1.2.3.4").await;
    h.text("1").await;
    let response = h.select(&Action::PickProxied(true)).await;

    assert_eq!(response.notice.unwrap().text, "Record already exists.");
    assert!(response.screen.unwrap().text.contains("Record already exists."));
    assert!(h.session().await.wizard().is_none());
    assert!(h.session().await.records().is_empty());

    // A late proxy button press no longer resolves
    let late = h.select(&Action::PickProxied(true)).await;
    assert!(is_alert(&late));
    assert_eq!(h.api.calls_with(Method::Post).len(), 1);
}

#[tokio::test]
async fn edit_ttl_rejects_non_numeric_without_calling_provider() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(
        &h.api,
        vec![record_json("r1", "A", "www.example.com", "1.2.3.4", 1)],
    );
    let detail = open_record_detail(&h).await;
    let edit = action_where(&detail, |a| {
        matches!(a, Action::EditField(EditableField::Ttl, _))
    });
    h.select(&edit).await;
    let before = h.session().await.records().to_vec();

    let response = h.text("abc").await;

    assert!(is_alert(&response));
    assert!(h.api.calls_with(Method::Put).is_empty());
    let session = h.session().await;
    assert_eq!(session.records(), before.as_slice());
    assert!(matches!(session.wizard(), Some(Wizard::EditField(_))));

    // Empty input is re-prompted too
    let response = h.text("   ").await;
    assert!(is_alert(&response));
    assert!(h.api.calls_with(Method::Put).is_empty());
}

#[tokio::test]
async fn edit_ttl_resubmits_full_record_and_caches_response() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(
        &h.api,
        vec![record_json("r1", "A", "www.example.com", "1.2.3.4", 1)],
    );
    let mut returned = record_json("r1", "A", "www.example.com", "1.2.3.4", 600);
    returned["modified_on"] = json!("2024-06-01T12:00:00Z");
    h.api
        .respond(Method::Put, "/zones/z1/dns_records/r1", returned.clone());

    let detail = open_record_detail(&h).await;
    let edit = action_where(&detail, |a| {
        matches!(a, Action::EditField(EditableField::Ttl, _))
    });
    h.select(&edit).await;
    let response = h.text("600").await;

    let puts = h.api.calls_with(Method::Put);
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].path, "/zones/z1/dns_records/r1");
    assert_eq!(
        puts[0].body,
        Some(json!({
            "type": "A",
            "name": "www.example.com",
            "content": "1.2.3.4",
            "ttl": 600,
            "proxied": false
        }))
    );

    let session = h.session().await;
    let cached = serde_json::to_value(session.record("r1").unwrap()).unwrap();
    assert_eq!(cached, returned);
    assert!(session.wizard().is_none());
    assert!(response.screen.unwrap().text.contains("600s"));
}

#[tokio::test]
async fn proxy_toggle_resubmits_with_flag_replaced() {
    let h = Harness::new(&[("work", "tok1")]);
    script_zone(
        &h.api,
        vec![record_json("r1", "CNAME", "app.example.com", "target.example.net", 300)],
    );
    let mut returned = record_json("r1", "CNAME", "app.example.com", "target.example.net", 300);
    returned["proxied"] = json!(true);
    h.api
        .respond(Method::Put, "/zones/z1/dns_records/r1", returned.clone());

    let detail = open_record_detail(&h).await;
    let toggle = action_where(&detail, |a| matches!(a, Action::ToggleProxy(_)));
    let choice = h.select(&toggle).await;
    let set = action_where(&choice, |a| matches!(a, Action::SetProxy(true, _)));
    h.select(&set).await;

    let puts = h.api.calls_with(Method::Put);
    assert_eq!(puts[0].body.as_ref().unwrap()["proxied"], json!(true));
    assert_eq!(puts[0].body.as_ref().unwrap()["ttl"], json!(300));
    let session = h.session().await;
    assert_eq!(serde_json::to_value(session.record("r1").unwrap()).unwrap(), returned);
}

#[tokio::test]
async fn new_wizard_discards_previous_one() {
    let mut h = Harness::new(&[("work", "tok1")]);
    script_zone(&h.api, vec![]);
    h.open_first_zone().await;

    h.select(&Action::NewRecord).await;
    h.select(&Action::PickType(RecordType::Txt)).await;
    h.text("_dmarc").await;

    h.select(&Action::AddAccount).await;
    let session = h.session().await;
    assert!(matches!(session.wizard(), Some(Wizard::AddAccount(AddAccount::Name))));

    // The text now lands in the new wizard's first step
    h.text("home").await;
    let session = h.session().await;
    assert_eq!(
        session.wizard(),
        Some(&Wizard::AddAccount(AddAccount::Token { name: "home".into() }))
    );

    let events = h.drain_events();
    assert!(events.contains(&EngineEvent::WizardDiscarded {
        user: USER,
        kind: WizardKind::AddRecord
    }));
}

#[tokio::test]
async fn tutorial_keeps_add_account_wizard() {
    let h = Harness::new(&[]);

    h.select(&Action::AddAccount).await;
    h.text("home").await;
    h.select(&Action::Tutorial).await;

    let session = h.session().await;
    assert!(matches!(
        session.wizard(),
        Some(Wizard::AddAccount(AddAccount::Token { .. }))
    ));

    // Navigation does discard it
    h.select(&Action::Home).await;
    assert!(h.session().await.wizard().is_none());
}

#[tokio::test]
async fn rejected_token_keeps_wizard_on_token_step() {
    let h = Harness::new(&[("work", "tok1")]);
    h.api
        .reject(Method::Get, "/user/tokens/verify", "Invalid API Token");

    h.select(&Action::Accounts).await;
    h.select(&Action::AddAccount).await;
    h.text("home").await;
    let response = h.text("bad-token").await;

    let accounts = h.store.list().await.unwrap();
    assert_eq!(accounts.keys().collect::<Vec<_>>(), vec!["work"]);
    let session = h.session().await;
    assert_eq!(
        session.wizard(),
        Some(&Wizard::AddAccount(AddAccount::Token { name: "home".into() }))
    );
    assert!(response.screen.unwrap().text.contains("Invalid token"));

    // A verified token completes the wizard and activates the account
    h.api.respond(Method::Get, "/user/tokens/verify", token_active());
    h.text("good-token").await;

    let accounts = h.store.list().await.unwrap();
    assert_eq!(accounts.get("home").map(|t| t.expose()), Some("good-token"));
    let session = h.session().await;
    assert_eq!(session.active_account(), Some("home"));
    assert!(session.wizard().is_none());

    let verify_tokens: Vec<String> = h
        .api
        .calls()
        .into_iter()
        .filter(|c| c.path == "/user/tokens/verify")
        .map(|c| c.token)
        .collect();
    assert_eq!(verify_tokens, vec!["bad-token", "good-token"]);
}
