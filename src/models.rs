use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PredictionLabel {
    Cancer,
    #[serde(rename = "Non-cancer")]
    NonCancer,
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionLabel::Cancer => f.write_str("Cancer"),
            PredictionLabel::NonCancer => f.write_str("Non-cancer"),
        }
    }
}

/// One persisted classification. Created once, never mutated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: Uuid,
    pub result: PredictionLabel,
    pub suggestion: String,
    /// Serialized as RFC 3339 in UTC, millisecond precision
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(result: PredictionLabel, suggestion: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            result,
            suggestion: suggestion.into(),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: Option<&'static str>, data: T) -> Self {
        Self {
            status: "success",
            message,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailResponse {
    pub status: &'static str,
    pub message: String,
}

impl FailResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = PredictionRecord::new(PredictionLabel::NonCancer, "No cancer detected.");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["result"], json!("Non-cancer"));
        assert_eq!(value["suggestion"], json!("No cancer detected."));
        let created_at = value["createdAt"].as_str().unwrap();
        assert!(created_at.ends_with('Z'));
        assert_eq!(created_at.parse::<DateTime<Utc>>().unwrap(), record.created_at);
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn timestamp_survives_a_json_round_trip() {
        let record = PredictionRecord::new(PredictionLabel::Cancer, "x");
        let raw = serde_json::to_string(&record).unwrap();
        let back: PredictionRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.created_at, record.created_at);
        assert_eq!(record.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn new_records_get_distinct_ids() {
        let a = PredictionRecord::new(PredictionLabel::Cancer, "x");
        let b = PredictionRecord::new(PredictionLabel::Cancer, "x");
        assert_ne!(a.id, b.id);
    }
}
