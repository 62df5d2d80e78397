use super::Transition;
use crate::traits::ApiToken;

/// Add-account flow: `Name → Token → commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddAccount {
    /// Waiting for the account name
    Name,
    /// Waiting for the API token of `name`
    Token {
        /// Name collected in the previous step
        name: String,
    },
}

/// Collected account, ready for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSubmission {
    /// Account name
    pub name: String,
    /// Token to verify
    pub token: ApiToken,
}

impl AccountSubmission {
    /// Wizard state to return to when verification fails
    pub fn retry(&self) -> AddAccount {
        AddAccount::Token {
            name: self.name.clone(),
        }
    }
}

impl AddAccount {
    /// Fresh wizard
    pub fn start() -> Self {
        AddAccount::Name
    }

    /// Feed a text message
    pub fn accept_text(self, text: &str) -> Transition<Self, AccountSubmission> {
        let value = text.trim();
        match self {
            AddAccount::Name if value.is_empty() => {
                Transition::Reprompt(AddAccount::Name, "The account name cannot be empty.".into())
            }
            AddAccount::Name => Transition::Advance(AddAccount::Token {
                name: value.to_string(),
            }),
            AddAccount::Token { name } if value.is_empty() => Transition::Reprompt(
                AddAccount::Token { name },
                "The token cannot be empty.".into(),
            ),
            AddAccount::Token { name } => Transition::Commit(AccountSubmission {
                name,
                token: ApiToken::new(value),
            }),
        }
    }
}
