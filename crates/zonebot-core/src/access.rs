//! Identity policy checked at the transport boundary
//!
//! The engine never sees events from identities the policy rejects; the
//! transport drops them before dispatch.

use std::collections::HashSet;

use crate::config::AccessConfig;
use crate::session::UserId;

/// Decides whether an inbound identity may operate the bot
pub trait AccessPolicy: Send + Sync {
    /// `true` if events from `user` should reach the engine
    fn permits(&self, user: UserId) -> bool;
}

/// Fixed allow-list of operator ids
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    operators: HashSet<UserId>,
}

impl AllowList {
    /// Create an allow-list from operator ids
    pub fn new(operators: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }

    /// Number of allowed operators
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// `true` if nobody is allowed
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl From<&AccessConfig> for AllowList {
    fn from(config: &AccessConfig) -> Self {
        Self::new(config.operator_ids.iter().copied())
    }
}

impl AccessPolicy for AllowList {
    fn permits(&self, user: UserId) -> bool {
        self.operators.contains(&user)
    }
}
