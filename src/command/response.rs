//! The JSON envelope every command answers with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Failure;

/// `{"sessionId": ..., "status": 0, "value": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub session_id: Option<String>,
    pub status: u32,
    pub value: Value,
}

impl CommandResponse {
    pub fn success(session_id: Option<String>, value: Value) -> Self {
        Self {
            session_id,
            status: 0,
            value,
        }
    }

    pub fn failure(session_id: Option<String>, failure: &Failure) -> Self {
        Self {
            session_id,
            status: failure.status,
            value: failure.to_value(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
