use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::AttemptState;

pub const STORAGE_KEY: &str = "loginAttempts";

/// Stored layout of an [`AttemptState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub is_blocked: bool,
    pub attempts: u32,
    pub block_until: Option<i64>,
}

pub fn storage_key(client: &str) -> String {
    format!("{}:{}", STORAGE_KEY, client)
}

impl From<&AttemptState> for AttemptRecord {
    fn from(state: &AttemptState) -> Self {
        AttemptRecord {
            is_blocked: state.blocked_until.is_some(),
            attempts: state.attempt_count,
            block_until: state.blocked_until.map(|t| t.timestamp_millis()),
        }
    }
}

impl AttemptRecord {
    /// Returns `None` when the flag and the timestamp disagree or the
    /// timestamp is out of range.
    pub fn into_state(self) -> Option<AttemptState> {
        let blocked_until = match (self.is_blocked, self.block_until) {
            (true, Some(ms)) => Some(DateTime::<Utc>::from_timestamp_millis(ms)?),
            (true, None) => return None,
            (false, _) => None,
        };
        Some(AttemptState {
            attempt_count: self.attempts,
            blocked_until,
        })
    }
}

pub fn encode(state: &AttemptState) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&AttemptRecord::from(state))?)
}

pub fn decode(raw: &str) -> anyhow::Result<AttemptState> {
    let record: AttemptRecord = serde_json::from_str(raw)?;
    record
        .into_state()
        .ok_or_else(|| anyhow::anyhow!("inconsistent attempt record: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_names() {
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 12, 15, 0).unwrap();
        let state = AttemptState {
            attempt_count: 5,
            blocked_until: Some(until),
        };
        let value: serde_json::Value = serde_json::from_str(&encode(&state).unwrap()).unwrap();
        assert_eq!(value["isBlocked"], true);
        assert_eq!(value["attempts"], 5);
        assert_eq!(value["blockUntil"], until.timestamp_millis());
    }

    #[test]
    fn test_decode_open_record() {
        let state = decode(r#"{"isBlocked":false,"attempts":3,"blockUntil":null}"#).unwrap();
        assert_eq!(state.attempt_count, 3);
        assert!(state.blocked_until.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"attempts":"many"}"#).is_err());
        assert!(decode(r#"{"isBlocked":true,"attempts":5,"blockUntil":null}"#).is_err());
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("127.0.0.1"), "loginAttempts:127.0.0.1");
    }
}
