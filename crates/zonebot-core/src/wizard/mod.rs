//! Conversation state machines
//!
//! Every wizard is a strict linear sequence of steps. Steps are enum variants
//! that carry exactly the fields collected so far, so a field cannot be read
//! before the step that sets it. Transitions are pure: they consume the
//! wizard and return a [`Transition`]. Side effects (token verification,
//! store writes, gateway calls) are performed by the engine when a wizard
//! commits.
//!
//! ```text
//! AddAccount:  Name ─text─▶ Token ─text─▶ commit (verify, save, activate)
//! AddRecord:   Type ─pick─▶ Name ─text─▶ Content ─text─▶ Ttl ─text─▶ Proxied ─pick─▶
//!              commit (create)
//! EditField:   Value ─text─▶ commit (update with one field replaced)
//! ```

mod add_account;
mod add_record;
mod edit_field;
mod ttl;

pub use add_account::{AccountSubmission, AddAccount};
pub use add_record::{AddRecord, AddRecordStep, RecordSubmission};
pub use edit_field::{EditField, RecordUpdate};
pub use ttl::{AUTOMATIC_TTL, TtlPolicy, parse_ttl};

/// Outcome of feeding one input into a wizard
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<S, C> {
    /// Moved to the next step; nothing external happened
    Advance(S),
    /// Input rejected; the wizard stays on the same step
    Reprompt(S, String),
    /// Final input accepted; the engine must perform the side effect
    Commit(C),
}

/// Kind of a live wizard (for logging and events)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardKind {
    /// Add-account flow
    AddAccount,
    /// Add-record flow
    AddRecord,
    /// Single field edit flow
    EditField,
}

impl std::fmt::Display for WizardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WizardKind::AddAccount => "add-account",
            WizardKind::AddRecord => "add-record",
            WizardKind::EditField => "edit-field",
        };
        f.write_str(name)
    }
}

/// The live wizard of a session
#[derive(Debug, Clone, PartialEq)]
pub enum Wizard {
    /// Add-account flow
    AddAccount(AddAccount),
    /// Add-record flow
    AddRecord(AddRecord),
    /// Single field edit flow
    EditField(EditField),
}

impl Wizard {
    /// Kind of this wizard
    pub fn kind(&self) -> WizardKind {
        match self {
            Wizard::AddAccount(_) => WizardKind::AddAccount,
            Wizard::AddRecord(_) => WizardKind::AddRecord,
            Wizard::EditField(_) => WizardKind::EditField,
        }
    }
}

impl From<AddAccount> for Wizard {
    fn from(wizard: AddAccount) -> Self {
        Wizard::AddAccount(wizard)
    }
}

impl From<AddRecord> for Wizard {
    fn from(wizard: AddRecord) -> Self {
        Wizard::AddRecord(wizard)
    }
}

impl From<EditField> for Wizard {
    fn from(wizard: EditField) -> Self {
        Wizard::EditField(wizard)
    }
}
