use super::{Transition, TtlPolicy, parse_ttl};
use crate::model::{RecordPayload, RecordType, ZoneScope};

/// Steps of the add-record flow, each holding what has been collected so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddRecordStep {
    /// Waiting for a type selection
    Type,
    /// Waiting for the record name
    Name { record_type: RecordType },
    /// Waiting for the record content
    Content { record_type: RecordType, name: String },
    /// Waiting for the TTL
    Ttl {
        record_type: RecordType,
        name: String,
        content: String,
    },
    /// Waiting for the proxy selection
    Proxied {
        record_type: RecordType,
        name: String,
        content: String,
        ttl: u32,
    },
}

/// Add-record flow bound to the zone it was started in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRecord {
    zone: ZoneScope,
    step: AddRecordStep,
}

/// Collected record, ready to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSubmission {
    /// Target zone
    pub zone: ZoneScope,
    /// Create body
    pub payload: RecordPayload,
}

impl AddRecord {
    /// Fresh wizard in `zone`
    pub fn start(zone: ZoneScope) -> Self {
        Self {
            zone,
            step: AddRecordStep::Type,
        }
    }

    /// Zone the record will be created in
    pub fn zone(&self) -> &ZoneScope {
        &self.zone
    }

    /// Current step
    pub fn step(&self) -> &AddRecordStep {
        &self.step
    }

    fn with_step(self, step: AddRecordStep) -> Self {
        Self { step, ..self }
    }

    /// Type picked from the menu
    pub fn choose_type(self, record_type: RecordType) -> Transition<Self, RecordSubmission> {
        match self.step {
            AddRecordStep::Type => {
                let next = AddRecordStep::Name { record_type };
                Transition::Advance(self.with_step(next))
            }
            _ => Transition::Reprompt(self, "The record type was already chosen.".into()),
        }
    }

    /// Free text for the name, content or TTL steps
    pub fn accept_text(self, text: &str) -> Transition<Self, RecordSubmission> {
        let value = text.trim();
        match self.step.clone() {
            AddRecordStep::Type => {
                Transition::Reprompt(self, "Pick a record type from the menu.".into())
            }
            AddRecordStep::Proxied { .. } => {
                Transition::Reprompt(self, "Pick a proxy option from the menu.".into())
            }
            AddRecordStep::Name { .. } | AddRecordStep::Content { .. } if value.is_empty() => {
                Transition::Reprompt(self, "The value cannot be empty.".into())
            }
            AddRecordStep::Name { record_type } => {
                let next = AddRecordStep::Content {
                    record_type,
                    name: value.to_string(),
                };
                Transition::Advance(self.with_step(next))
            }
            AddRecordStep::Content { record_type, name } => {
                let next = AddRecordStep::Ttl {
                    record_type,
                    name,
                    content: value.to_string(),
                };
                Transition::Advance(self.with_step(next))
            }
            AddRecordStep::Ttl {
                record_type,
                name,
                content,
            } => match parse_ttl(value, TtlPolicy::DefaultToAutomatic) {
                Ok(ttl) => {
                    let next = AddRecordStep::Proxied {
                        record_type,
                        name,
                        content,
                        ttl,
                    };
                    Transition::Advance(self.with_step(next))
                }
                Err(reason) => Transition::Reprompt(self, reason),
            },
        }
    }

    /// Proxy flag picked from the menu; completes the wizard
    pub fn choose_proxied(self, proxied: bool) -> Transition<Self, RecordSubmission> {
        match self.step {
            AddRecordStep::Proxied {
                record_type,
                name,
                content,
                ttl,
            } => Transition::Commit(RecordSubmission {
                zone: self.zone,
                payload: RecordPayload {
                    record_type: record_type.as_str().to_string(),
                    name,
                    content,
                    ttl,
                    proxied,
                },
            }),
            _ => Transition::Reprompt(self, "This choice is not expected right now.".into()),
        }
    }
}
