//! Wire protocol between the wearable and the phone-side host.
//!
//! Messages travel as string-keyed dictionaries. This module classifies an
//! inbound dictionary into exactly one of the four message kinds, or a
//! `DecodeError`; nothing downstream of this boundary touches raw keys.
//!
//! A snapshot is a single message kind regardless of whether it arrives as
//! a reply to a state query or as an unsolicited broadcast. There is no
//! field distinguishing the two cases on the wire.

use serde_json::{Map, Value};
use thiserror::Error;

/// Raw wire payload: a string-keyed dictionary.
pub type Payload = Map<String, Value>;

/// Key carrying the request verb on wearable-to-host messages.
const KEY_REQUEST: &str = "request";
/// Key carrying the synchronized flag on snapshots.
const KEY_ENABLED: &str = "isSystemEnabled";
/// Keys of the SOS acknowledgement.
const KEY_ACCEPTED: &str = "accepted";
const KEY_DETAIL: &str = "detail";

const VERB_SYSTEM_STATE: &str = "systemState";
const VERB_SOS: &str = "sos";

// ============================================================================
// Error Types
// ============================================================================

/// Errors from classifying an inbound dictionary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong type.
    #[error("field {0} has unexpected type")]
    FieldType(&'static str),

    /// The dictionary matches none of the known message shapes.
    #[error("unrecognized message shape")]
    UnrecognizedShape,

    /// The message decoded, but is not the kind expected in this context.
    #[error("unexpected message kind: {0}")]
    UnexpectedKind(&'static str),
}

// ============================================================================
// Message Kinds
// ============================================================================

/// Acknowledgement returned by the host for an SOS command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Whether the host accepted the command.
    pub accepted: bool,
    /// Free-form host-side detail, informational only.
    pub detail: String,
}

/// The messages exchanged over the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Wearable asks the host for the current flag value.
    RequestSystemState,
    /// Host reports the current flag value, as a reply or a broadcast.
    SystemStateSnapshot { is_system_enabled: bool },
    /// Wearable issues the one-shot SOS command.
    TriggerSos,
    /// Host acknowledges an SOS command.
    Ack(Ack),
}

impl Message {
    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::RequestSystemState => "requestSystemState",
            Message::SystemStateSnapshot { .. } => "systemStateSnapshot",
            Message::TriggerSos => "triggerSos",
            Message::Ack(_) => "ack",
        }
    }

    /// Encode into the wire dictionary shape.
    pub fn encode(&self) -> Payload {
        let mut map = Payload::new();
        match self {
            Message::RequestSystemState => {
                map.insert(KEY_REQUEST.into(), Value::String(VERB_SYSTEM_STATE.into()));
            }
            Message::SystemStateSnapshot { is_system_enabled } => {
                map.insert(KEY_ENABLED.into(), Value::Bool(*is_system_enabled));
            }
            Message::TriggerSos => {
                map.insert(KEY_REQUEST.into(), Value::String(VERB_SOS.into()));
            }
            Message::Ack(ack) => {
                map.insert(KEY_ACCEPTED.into(), Value::Bool(ack.accepted));
                map.insert(KEY_DETAIL.into(), Value::String(ack.detail.clone()));
            }
        }
        map
    }

    /// Classify an inbound dictionary into exactly one message kind.
    ///
    /// The classifier is exhaustive over the known shapes; anything else is
    /// a `DecodeError` and never reaches the state machine.
    pub fn decode(payload: &Payload) -> Result<Message, DecodeError> {
        if let Some(verb) = payload.get(KEY_REQUEST) {
            let verb = verb
                .as_str()
                .ok_or(DecodeError::FieldType(KEY_REQUEST))?;
            return match verb {
                VERB_SYSTEM_STATE => Ok(Message::RequestSystemState),
                VERB_SOS => Ok(Message::TriggerSos),
                _ => Err(DecodeError::UnrecognizedShape),
            };
        }

        if let Some(value) = payload.get(KEY_ENABLED) {
            let is_system_enabled = value
                .as_bool()
                .ok_or(DecodeError::FieldType(KEY_ENABLED))?;
            return Ok(Message::SystemStateSnapshot { is_system_enabled });
        }

        if let Some(value) = payload.get(KEY_ACCEPTED) {
            let accepted = value
                .as_bool()
                .ok_or(DecodeError::FieldType(KEY_ACCEPTED))?;
            let detail = match payload.get(KEY_DETAIL) {
                Some(detail) => detail
                    .as_str()
                    .ok_or(DecodeError::FieldType(KEY_DETAIL))?
                    .to_string(),
                None => String::new(),
            };
            return Ok(Message::Ack(Ack { accepted, detail }));
        }

        Err(DecodeError::UnrecognizedShape)
    }
}

// ============================================================================
// Tests
// ============================================================================
