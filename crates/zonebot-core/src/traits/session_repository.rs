// # Session Repository Trait
//
// Defines where per-user conversational state lives between interactions.
//
// The engine checks a session out at the start of each interaction, mutates
// it while handling the event, and writes it back before returning. Sessions
// are volatile: no implementation is expected to survive a restart.

use async_trait::async_trait;

use crate::session::{Session, UserId};

/// Trait for session repository implementations
///
/// # Thread Safety
///
/// Different users never share an entry, so there is no cross-user race.
/// Two interactions from the *same* user that overlap are last-writer-wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Return the user's session, creating an empty one on first contact
    async fn get_or_create(&self, user: UserId) -> Result<Session, crate::Error>;

    /// Write a session back
    async fn save(&self, session: Session) -> Result<(), crate::Error>;
}
