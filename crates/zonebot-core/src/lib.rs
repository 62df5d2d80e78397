// # zonebot-core
//
// Core library of a chat-driven DNS control console.
//
// ## Architecture Overview
//
// - **CredentialStore**: Durable account name → provider token mapping
// - **SessionRepository**: Per-operator volatile state (active account,
//   cached lists, selector maps, live wizard)
// - **DnsApi**: Authenticated request boundary to the DNS provider
// - **ResourceGateway**: Token resolution + caching in front of `DnsApi`
// - **Wizards**: Typed, linear input flows (add account, add record, edit field)
// - **SessionEngine**: Turns transport events into render instructions
//
// ## Design Principles
//
// 1. **Transport-agnostic**: The engine knows events and screens, not chat APIs
// 2. **No stale guesses**: Selector handles from an old render never resolve
// 3. **Secrets stay in the store**: Sessions hold account names only
// 4. **Library-First**: The daemon is a thin shell around this crate

pub mod access;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod session;
pub mod state;
pub mod traits;
pub mod wizard;

// Re-export core types for convenience
pub use access::{AccessPolicy, AllowList};
pub use config::{AccessConfig, BotConfig, CredentialStoreConfig, EngineConfig, ProviderConfig};
pub use engine::{Action, EngineEvent, Event, Response, Screen, SessionEngine};
pub use error::{Error, Result};
pub use gateway::{ResourceGateway, ZoneSummary};
pub use model::{EditableField, Record, RecordPayload, RecordType, Zone, ZoneScope};
pub use session::{SelectorToken, Session, UserId};
pub use state::{FileCredentialStore, MemoryCredentialStore, MemorySessionRepository};
pub use traits::{Accounts, ApiToken, CredentialStore, DnsApi, Method, SessionRepository};
