//! Progress record and the wire shapes built around it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `type` field of every message envelope
pub const MESSAGE_TYPE: &str = "sudoku-progress";

/// Flat, transport-ready snapshot of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub session_id: String,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
    pub game_state: GameState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_digits: String,
    pub initial_digits: String,
    /// Milliseconds of solving time
    pub elapsed_time: u64,
    pub is_paused: bool,
    pub is_complete: bool,
    pub hints_used: usize,
    pub pencil_marks: PencilMarks,
    pub completed_digits: Vec<u8>,
    pub has_errors: bool,
    pub mode: String,
    pub difficulty_level: Option<String>,
    /// Only present on the terminal record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<u64>,
    /// Only present on the terminal record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_result: Option<FinalResult>,
}

/// Sparse candidate marks keyed by cell index
///
/// A cell only has an entry when it carries at least one mark of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PencilMarks {
    pub inner: BTreeMap<usize, Vec<u8>>,
    pub outer: BTreeMap<usize, Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalResult {
    Solved,
    Incomplete,
}

impl FinalResult {
    pub fn from_solved(solved: bool) -> Self {
        if solved { Self::Solved } else { Self::Incomplete }
    }
}

/// POST body for the network transport: the record plus `immediate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPayload {
    #[serde(flatten)]
    pub record: ProgressRecord,
    pub immediate: bool,
}

impl NetworkPayload {
    pub fn new(record: ProgressRecord, immediate: bool) -> Self {
        Self { record, immediate }
    }
}

/// Envelope posted to embedding contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub immediate: bool,
    pub data: ProgressRecord,
}

impl MessageEnvelope {
    pub fn new(record: ProgressRecord, immediate: bool) -> Self {
        Self {
            kind: MESSAGE_TYPE.to_string(),
            immediate,
            data: record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> ProgressRecord {
        let mut inner = BTreeMap::new();
        inner.insert(3, vec![1, 4]);
        ProgressRecord {
            session_id: "sess-1".to_string(),
            timestamp: 1_700_000_000_000,
            game_state: GameState {
                current_digits: "5300".to_string(),
                initial_digits: "5300".to_string(),
                elapsed_time: 1500,
                pencil_marks: PencilMarks {
                    inner,
                    outer: BTreeMap::new(),
                },
                completed_digits: vec![5],
                mode: "solve".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_network_payload_flattens_record() {
        let payload = NetworkPayload::new(sample_record(), true);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["sessionId"], "sess-1");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert_eq!(value["immediate"], true);
        assert_eq!(value["gameState"]["currentDigits"], "5300");
        assert_eq!(value["gameState"]["elapsedTime"], 1500);
        assert_eq!(value["gameState"]["hintsUsed"], 0);
        assert_eq!(value["gameState"]["pencilMarks"]["inner"], json!({"3": [1, 4]}));
        assert_eq!(value["gameState"]["pencilMarks"]["outer"], json!({}));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_completion_fields_omitted_until_set() {
        let mut record = sample_record();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["gameState"].get("completionTime").is_none());
        assert!(value["gameState"].get("finalResult").is_none());

        record.game_state.completion_time = Some(90_000);
        record.game_state.final_result = Some(FinalResult::Solved);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["gameState"]["completionTime"], 90_000);
        assert_eq!(value["gameState"]["finalResult"], "solved");
    }

    #[test]
    fn test_message_envelope_shape() {
        let envelope = MessageEnvelope::new(sample_record(), false);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["type"], MESSAGE_TYPE);
        assert_eq!(value["immediate"], false);
        assert_eq!(value["data"]["sessionId"], "sess-1");
        assert!(value["data"].get("immediate").is_none());

        let parsed: MessageEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_final_result_from_solved() {
        assert_eq!(FinalResult::from_solved(true), FinalResult::Solved);
        assert_eq!(FinalResult::from_solved(false), FinalResult::Incomplete);
        assert_eq!(serde_json::to_string(&FinalResult::Incomplete).unwrap(), r#""incomplete""#);
    }
}
