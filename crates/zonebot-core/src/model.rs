//! Provider resources mirrored into the session cache
//!
//! `Zone` and `Record` deserialize straight from the provider's `result`
//! objects. Fields the console does not interpret are kept in `extra`, so a
//! cached entry is exactly what the provider returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A DNS zone (the "resource" level of the console)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider zone id
    pub id: String,
    /// Zone apex, e.g. `example.com`
    pub name: String,
    /// Provider status (`active`, `pending`, ...)
    #[serde(default)]
    pub status: String,
    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Zone {
    /// `true` once the zone is serving
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// A DNS record inside a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Provider record id
    pub id: String,
    /// Record type as reported by the provider (may be outside [`RecordType`])
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully qualified record name
    pub name: String,
    /// Record content (address, target, text...)
    pub content: String,
    /// TTL in seconds, `1` meaning automatic
    pub ttl: u32,
    /// Whether traffic is proxied through the provider
    #[serde(default)]
    pub proxied: bool,
    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Full representation to resend on update
    pub fn payload(&self) -> RecordPayload {
        RecordPayload {
            record_type: self.record_type.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
            ttl: self.ttl,
            proxied: self.proxied,
        }
    }

    /// Record name relative to its zone, `@` for the apex
    pub fn short_name(&self, zone_name: &str) -> String {
        if self.name == zone_name {
            return "@".to_string();
        }
        match self.name.strip_suffix(zone_name) {
            Some(prefix) if prefix.ends_with('.') => prefix.trim_end_matches('.').to_string(),
            _ => self.name.clone(),
        }
    }
}

/// Body of create and update requests
///
/// Updates always send the complete shape; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name
    pub name: String,
    /// Record content
    pub content: String,
    /// TTL in seconds, `1` meaning automatic
    pub ttl: u32,
    /// Proxy flag
    pub proxied: bool,
}

/// Record types offered by the add-record wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Text
    Txt,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
}

impl RecordType {
    /// Every selectable type, in menu order
    pub const ALL: [RecordType; 6] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Txt,
        RecordType::Mx,
        RecordType::Ns,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
        }
    }

    /// Parse a wire name (case-sensitive, as the provider reports it)
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record fields editable through free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    /// Record name
    Name,
    /// Record content
    Content,
    /// TTL
    Ttl,
}

impl EditableField {
    /// Human label
    pub fn label(&self) -> &'static str {
        match self {
            EditableField::Name => "name",
            EditableField::Content => "content",
            EditableField::Ttl => "TTL",
        }
    }
}

/// The zone currently being browsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneScope {
    /// Zone id, used in record paths
    pub id: String,
    /// Zone name, used for display
    pub name: String,
}

impl From<&Zone> for ZoneScope {
    fn from(zone: &Zone) -> Self {
        Self {
            id: zone.id.clone(),
            name: zone.name.clone(),
        }
    }
}
