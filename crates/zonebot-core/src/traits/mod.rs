//! Core traits for zonebot
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`CredentialStore`]: Durable account name → token mapping
//! - [`SessionRepository`]: Per-user volatile conversation state
//! - [`DnsApi`]: Authenticated requests to the DNS provider

pub mod credential_store;
pub mod dns_api;
pub mod session_repository;

pub use credential_store::{Accounts, ApiToken, CredentialStore};
pub use dns_api::{DnsApi, Method};
pub use session_repository::SessionRepository;
