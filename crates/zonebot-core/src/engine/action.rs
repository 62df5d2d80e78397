//! Selection payloads
//!
//! Every button carries an [`Action`]. The transport round-trips it as a
//! short string (`Action::encode` / `Action::parse`), so payloads stay well
//! below the 64-byte callback ceiling. Entity references are always
//! [`SelectorToken`]s, never ids or names.

use crate::model::{EditableField, RecordType};
use crate::session::SelectorToken;

/// What a button asks the engine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Dashboard (or onboarding when no account exists)
    Home,
    /// Help screen
    Help,
    /// How to create a provider token
    Tutorial,
    /// Forget the active account
    Logout,
    /// Zone counts for every account
    Stats,
    /// Account list
    Accounts,
    /// Start the add-account wizard
    AddAccount,
    /// Make an account active
    SelectAccount(SelectorToken),
    /// Ask before deleting an account
    DeleteAccount(SelectorToken),
    /// Delete an account
    ConfirmDeleteAccount(SelectorToken),
    /// Fetch zones and show the first page
    Zones,
    /// Show a page of the cached zones
    ZonePage(usize),
    /// Enter a zone and fetch its records
    OpenZone(SelectorToken),
    /// Show the cached records of the current zone
    Records,
    /// Re-fetch the records of the current zone
    RefreshRecords,
    /// Start the add-record wizard in the current zone
    NewRecord,
    /// Add-record wizard: type choice
    PickType(RecordType),
    /// Add-record wizard: proxy choice
    PickProxied(bool),
    /// Record detail
    OpenRecord(SelectorToken),
    /// Start editing one field of a record
    EditField(EditableField, SelectorToken),
    /// Offer the proxy choice for a record
    ToggleProxy(SelectorToken),
    /// Re-submit a record with the proxy flag set
    SetProxy(bool, SelectorToken),
    /// Ask before deleting a record
    AskDeleteRecord(SelectorToken),
    /// Delete a record
    ConfirmDeleteRecord(SelectorToken),
    /// Inert button (page indicator)
    Noop,
}

impl Action {
    /// Wire form
    pub fn encode(&self) -> String {
        match self {
            Action::Home => "home".into(),
            Action::Help => "help".into(),
            Action::Tutorial => "tut".into(),
            Action::Logout => "logout".into(),
            Action::Stats => "stats".into(),
            Action::Accounts => "acc".into(),
            Action::AddAccount => "acc+".into(),
            Action::SelectAccount(t) => format!("as:{}", t),
            Action::DeleteAccount(t) => format!("ad:{}", t),
            Action::ConfirmDeleteAccount(t) => format!("adc:{}", t),
            Action::Zones => "zones".into(),
            Action::ZonePage(page) => format!("zp:{}", page),
            Action::OpenZone(t) => format!("z:{}", t),
            Action::Records => "rl".into(),
            Action::RefreshRecords => "zr".into(),
            Action::NewRecord => "rn".into(),
            Action::PickType(record_type) => format!("rt:{}", record_type),
            Action::PickProxied(proxied) => format!("rp:{}", flag(*proxied)),
            Action::OpenRecord(t) => format!("r:{}", t),
            Action::EditField(field, t) => format!("ef:{}:{}", field_code(*field), t),
            Action::ToggleProxy(t) => format!("ep:{}", t),
            Action::SetProxy(proxied, t) => format!("sp:{}:{}", flag(*proxied), t),
            Action::AskDeleteRecord(t) => format!("da:{}", t),
            Action::ConfirmDeleteRecord(t) => format!("dc:{}", t),
            Action::Noop => "noop".into(),
        }
    }

    /// Decode a wire payload; `None` for anything this version never emits
    pub fn parse(raw: &str) -> Option<Self> {
        let action = match raw {
            "home" => Action::Home,
            "help" => Action::Help,
            "tut" => Action::Tutorial,
            "logout" => Action::Logout,
            "stats" => Action::Stats,
            "acc" => Action::Accounts,
            "acc+" => Action::AddAccount,
            "zones" => Action::Zones,
            "rl" => Action::Records,
            "zr" => Action::RefreshRecords,
            "rn" => Action::NewRecord,
            "noop" => Action::Noop,
            _ => {
                let (head, rest) = raw.split_once(':')?;
                match head {
                    "as" => Action::SelectAccount(token(rest)?),
                    "ad" => Action::DeleteAccount(token(rest)?),
                    "adc" => Action::ConfirmDeleteAccount(token(rest)?),
                    "zp" => Action::ZonePage(rest.parse().ok()?),
                    "z" => Action::OpenZone(token(rest)?),
                    "rt" => Action::PickType(RecordType::parse(rest)?),
                    "rp" => Action::PickProxied(parse_flag(rest)?),
                    "r" => Action::OpenRecord(token(rest)?),
                    "ef" => {
                        let (field, t) = rest.split_once(':')?;
                        Action::EditField(parse_field(field)?, token(t)?)
                    }
                    "ep" => Action::ToggleProxy(token(rest)?),
                    "sp" => {
                        let (proxied, t) = rest.split_once(':')?;
                        Action::SetProxy(parse_flag(proxied)?, token(t)?)
                    }
                    "da" => Action::AskDeleteRecord(token(rest)?),
                    "dc" => Action::ConfirmDeleteRecord(token(rest)?),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    /// Whether acting on this discards a live wizard
    ///
    /// Wizard inputs and the tutorial keep it; every other action is
    /// navigation away from the wizard.
    pub fn discards_wizard(&self) -> bool {
        !matches!(
            self,
            Action::Tutorial | Action::PickType(_) | Action::PickProxied(_) | Action::Noop
        )
    }
}

fn token(raw: &str) -> Option<SelectorToken> {
    (!raw.is_empty()).then(|| SelectorToken::from_wire(raw))
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

fn field_code(field: EditableField) -> &'static str {
    match field {
        EditableField::Name => "n",
        EditableField::Content => "c",
        EditableField::Ttl => "t",
    }
}

fn parse_field(raw: &str) -> Option<EditableField> {
    match raw {
        "n" => Some(EditableField::Name),
        "c" => Some(EditableField::Content),
        "t" => Some(EditableField::Ttl),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        let t = SelectorToken::from_wire("18f2c.3.1");
        assert_eq!(Action::EditField(EditableField::Ttl, t.clone()).encode(), "ef:t:18f2c.3.1");
        assert_eq!(Action::SetProxy(true, t.clone()).encode(), "sp:1:18f2c.3.1");
        assert_eq!(Action::PickType(RecordType::Aaaa).encode(), "rt:AAAA");

        assert_eq!(
            Action::parse("ef:c:18f2c.3.1"),
            Some(Action::EditField(EditableField::Content, t.clone()))
        );
        assert_eq!(Action::parse("sp:0:18f2c.3.1"), Some(Action::SetProxy(false, t)));
        assert_eq!(Action::parse("zp:2"), Some(Action::ZonePage(2)));
    }

    #[test]
    fn test_unknown_payloads() {
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("zone_abc"), None);
        assert_eq!(Action::parse("as:"), None);
        assert_eq!(Action::parse("rt:SRV"), None);
        assert_eq!(Action::parse("sp:2:1.0"), None);
        assert_eq!(Action::parse("zp:x"), None);
    }

    #[test]
    fn test_payloads_fit_callback_limit() {
        let t = SelectorToken::from_wire(format!("{:x}.{}.{}", u64::MAX, u32::MAX, 9999));
        for action in [
            Action::ConfirmDeleteAccount(t.clone()),
            Action::EditField(EditableField::Content, t.clone()),
            Action::SetProxy(false, t),
        ] {
            assert!(action.encode().len() <= 64);
        }
    }

    #[test]
    fn test_wizard_inputs_keep_wizard() {
        assert!(!Action::Tutorial.discards_wizard());
        assert!(!Action::PickProxied(true).discards_wizard());
        assert!(Action::Home.discards_wizard());
        assert!(Action::Zones.discards_wizard());
    }
}
