//! Wire formats shared by both transports.
//!
//! - Queue messages carry the bare entry envelope
//!   `{"createdAtEpochMs", "type", "data", "metadata"}`.
//! - The notification channel carries a [`Notification`]: either the fixed
//!   start marker `{"marker":"start"}` or an immediate request
//!   `{"marker":"immediate","entry":{..}}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskrail_core::TaskEntry;

/// Exact encoding of [`Notification::Start`].
pub const START_MARKER: &str = r#"{"marker":"start"}"#;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode_entry(entry: &TaskEntry) -> Result<String, CodecError> {
    serde_json::to_string(entry).map_err(CodecError::Encode)
}

pub fn decode_entry(body: &str) -> Result<TaskEntry, CodecError> {
    serde_json::from_str(body).map_err(CodecError::Decode)
}

/// Message on the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum Notification {
    /// Wake idle consumers; carries no entry.
    Start,
    /// Process the wrapped entry now, outside the ordered queue.
    Immediate { entry: TaskEntry },
}

impl Notification {
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    pub fn decode(body: &str) -> Result<Self, CodecError> {
        serde_json::from_str(body).map_err(CodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_marker_is_stable() {
        assert_eq!(Notification::Start.encode().unwrap(), START_MARKER);
        assert_eq!(Notification::decode(START_MARKER).unwrap(), Notification::Start);
    }

    #[test]
    fn immediate_wraps_the_envelope() {
        let entry = TaskEntry::with_created_at(7, "Echo", json!({"msg": "hi"}), json!({}));
        let body = Notification::Immediate { entry: entry.clone() }.encode().unwrap();

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["marker"], "immediate");
        assert_eq!(value["entry"]["type"], "Echo");
        assert_eq!(
            Notification::decode(&body).unwrap(),
            Notification::Immediate { entry }
        );
    }

    #[test]
    fn a_bare_envelope_is_not_a_notification() {
        let body = encode_entry(&TaskEntry::new("Echo", json!({}), json!({}))).unwrap();
        assert!(Notification::decode(&body).is_err());
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(decode_entry("{not json"), Err(CodecError::Decode(_))));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn json_leaf() -> impl Strategy<Value = serde_json::Value> {
            prop_oneof![
                Just(serde_json::Value::Null),
                any::<bool>().prop_map(serde_json::Value::from),
                any::<i64>().prop_map(serde_json::Value::from),
                "[a-zA-Z0-9 ]{0,12}".prop_map(serde_json::Value::from),
            ]
        }

        fn json_value() -> impl Strategy<Value = serde_json::Value> {
            json_leaf().prop_recursive(3, 16, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
                    prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                        .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            /// Property: entry → envelope → entry is the identity.
            #[test]
            fn envelope_round_trip(
                created in any::<i64>(),
                task_type in "[A-Za-z][A-Za-z0-9.]{0,20}",
                data in json_value(),
                metadata in json_value(),
            ) {
                let entry = TaskEntry::with_created_at(created, task_type, data, metadata);
                let decoded = decode_entry(&encode_entry(&entry).unwrap()).unwrap();
                prop_assert_eq!(decoded, entry);
            }
        }
    }
}
