//! Test doubles and common utilities for engine contract tests
//!
//! `MockDnsApi` answers from a route table and records every call, so tests
//! can assert both what the operator sees and exactly what reached the
//! provider.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zonebot_core::engine::{Action, EngineEvent, Event, Response, SessionEngine};
use zonebot_core::error::{Error, Result};
use zonebot_core::state::{MemoryCredentialStore, MemorySessionRepository};
use zonebot_core::traits::{ApiToken, DnsApi, Method};
use zonebot_core::{EngineConfig, Session, UserId};

/// Operator used by every test
pub const USER: UserId = 42;

/// One request as the provider saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub token: String,
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Rejected(String),
    Transport(String),
}

#[derive(Clone)]
struct Route {
    token: Option<String>,
    method: Method,
    path: String,
    reply: Reply,
}

/// A scripted DnsApi that tracks calls
#[derive(Clone, Default)]
pub struct MockDnsApi {
    routes: Arc<Mutex<Vec<Route>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockDnsApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, token: Option<&str>, method: Method, path: &str, reply: Reply) {
        self.routes.lock().unwrap().push(Route {
            token: token.map(str::to_string),
            method,
            path: path.to_string(),
            reply,
        });
    }

    /// Answer `method path` with `result` (later routes win)
    pub fn respond(&self, method: Method, path: &str, result: Value) {
        self.route(None, method, path, Reply::Ok(result));
    }

    /// Answer only requests made with `token`
    pub fn respond_for(&self, token: &str, method: Method, path: &str, result: Value) {
        self.route(Some(token), method, path, Reply::Ok(result));
    }

    /// Answer with `success = false`
    pub fn reject(&self, method: Method, path: &str, message: &str) {
        self.route(None, method, path, Reply::Rejected(message.to_string()));
    }

    /// Reject only requests made with `token`
    pub fn reject_for(&self, token: &str, method: Method, path: &str, message: &str) {
        self.route(Some(token), method, path, Reply::Rejected(message.to_string()));
    }

    /// Fail with a transport error
    pub fn fail_for(&self, token: &str, method: Method, path: &str) {
        self.route(
            Some(token),
            method,
            path,
            Reply::Transport("connection refused".to_string()),
        );
    }

    /// Total number of requests
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests with the given method
    pub fn calls_with(&self, method: Method) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }
}

#[async_trait::async_trait]
impl DnsApi for MockDnsApi {
    async fn request(
        &self,
        token: &ApiToken,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall {
            token: token.expose().to_string(),
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let routes = self.routes.lock().unwrap().clone();
        let route = routes.iter().rev().find(|route| {
            route.method == method
                && route.path == path
                && route.token.as_deref().is_none_or(|t| t == token.expose())
        });

        match route.map(|route| route.reply.clone()) {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Rejected(message)) => Err(Error::remote_rejected(message)),
            Some(Reply::Transport(message)) => Err(Error::transport(message)),
            None => Err(Error::remote_rejected(format!("no route for {} {}", method, path))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Engine wired to in-memory stores and a scripted provider
pub struct Harness {
    pub engine: SessionEngine,
    pub events: mpsc::Receiver<EngineEvent>,
    pub api: MockDnsApi,
    pub store: MemoryCredentialStore,
}

impl Harness {
    /// Harness whose credential store holds `accounts`
    pub fn new(accounts: &[(&str, &str)]) -> Self {
        let store = MemoryCredentialStore::with_accounts(
            accounts
                .iter()
                .map(|(name, token)| (name.to_string(), ApiToken::new(*token)))
                .collect(),
        );
        let api = MockDnsApi::new();

        let (engine, events) = SessionEngine::new(
            Arc::new(store.clone()),
            Arc::new(MemorySessionRepository::new()),
            Arc::new(api.clone()),
            EngineConfig::default(),
        )
        .expect("engine construction succeeds");

        Self {
            engine,
            events,
            api,
            store,
        }
    }

    pub async fn start(&self) -> Response {
        self.engine.handle(Event::Start(USER)).await.expect("handle succeeds")
    }

    pub async fn text(&self, text: &str) -> Response {
        self.engine
            .handle(Event::Text(USER, text.to_string()))
            .await
            .expect("handle succeeds")
    }

    pub async fn select(&self, action: &Action) -> Response {
        self.select_raw(&action.encode()).await
    }

    pub async fn select_raw(&self, raw: &str) -> Response {
        self.engine
            .handle(Event::Select(USER, raw.to_string()))
            .await
            .expect("handle succeeds")
    }

    pub async fn session(&self) -> Session {
        self.engine.session_snapshot(USER).await.expect("session")
    }

    /// Every event emitted so far
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Fetch zones, open the first one and return the record list
    pub async fn open_first_zone(&self) -> Response {
        let zones = self.select(&Action::Zones).await;
        let open = action_where(&zones, |a| matches!(a, Action::OpenZone(_)));
        self.select(&open).await
    }
}

/// First action on the response's screen matching `predicate`
pub fn action_where(response: &Response, predicate: impl Fn(&Action) -> bool) -> Action {
    response
        .screen
        .as_ref()
        .and_then(|screen| screen.find_action(predicate))
        .cloned()
        .expect("screen offers the action")
}

/// Every action on the response's screen
pub fn actions(response: &Response) -> Vec<Action> {
    response
        .screen
        .as_ref()
        .and_then(|screen| screen.keyboard.as_ref())
        .map(|keyboard| keyboard.buttons().map(|b| b.action.clone()).collect())
        .unwrap_or_default()
}

/// `true` if the response carries an error notice
pub fn is_alert(response: &Response) -> bool {
    response.notice.as_ref().is_some_and(|notice| notice.alert)
}

pub fn zone_json(id: &str, name: &str, status: &str) -> Value {
    json!({"id": id, "name": name, "status": status, "paused": false})
}

pub fn record_json(id: &str, record_type: &str, name: &str, content: &str, ttl: u32) -> Value {
    json!({
        "id": id,
        "type": record_type,
        "name": name,
        "content": content,
        "ttl": ttl,
        "proxied": false,
        "zone_id": "z1",
        "modified_on": "2024-05-01T10:00:00Z"
    })
}

/// Provider answer for a valid token
pub fn token_active() -> Value {
    json!({"id": "tok-id", "status": "active"})
}

/// Route a single zone `z1` (`example.com`) holding `records`
pub fn script_zone(api: &MockDnsApi, records: Vec<Value>) {
    api.respond(
        Method::Get,
        "/zones?per_page=50",
        json!([zone_json("z1", "example.com", "active")]),
    );
    api.respond(Method::Get, "/zones/z1/dns_records?per_page=100", Value::Array(records));
}
