use super::{Transition, TtlPolicy, parse_ttl};
use crate::model::{EditableField, Record, RecordPayload, ZoneScope};

/// Single field edit, carrying the record snapshot it started from
#[derive(Debug, Clone, PartialEq)]
pub struct EditField {
    zone: ZoneScope,
    field: EditableField,
    record: Record,
}

/// Full record representation with one field replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Zone of the record
    pub zone: ZoneScope,
    /// Record id
    pub record_id: String,
    /// Complete update body
    pub payload: RecordPayload,
}

impl EditField {
    /// Start editing `field` of `record`
    pub fn start(zone: ZoneScope, field: EditableField, record: Record) -> Self {
        Self { zone, field, record }
    }

    /// Field being edited
    pub fn field(&self) -> EditableField {
        self.field
    }

    /// Snapshot the edit started from
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Zone of the record
    pub fn zone(&self) -> &ZoneScope {
        &self.zone
    }

    /// Feed the new value
    pub fn accept_text(self, text: &str) -> Transition<Self, RecordUpdate> {
        let value = text.trim();
        if value.is_empty() {
            return Transition::Reprompt(self, "The value cannot be empty.".into());
        }

        let mut payload = self.record.payload();
        match self.field {
            EditableField::Name => payload.name = value.to_string(),
            EditableField::Content => payload.content = value.to_string(),
            EditableField::Ttl => match parse_ttl(value, TtlPolicy::Reject) {
                Ok(ttl) => payload.ttl = ttl,
                Err(reason) => return Transition::Reprompt(self, reason),
            },
        }

        Transition::Commit(RecordUpdate {
            zone: self.zone,
            record_id: self.record.id,
            payload,
        })
    }
}
