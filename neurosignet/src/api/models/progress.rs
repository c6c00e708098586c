use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Frames a client may send on `/ws/progress`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start the progress sequence for `task_id`. The id is opaque and echoed back verbatim,
    /// whatever its JSON type.
    SubscribeProgress { task_id: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Processing,
}

/// Frames the server sends on `/ws/progress`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ProgressUpdate {
        task_id: Value,
        /// Percentage, 0 to 100
        progress: u8,
        status: ProgressStatus,
    },
    /// The previous client frame could not be understood
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let subscribe: ClientMessage = serde_json::from_value(json!({"type": "subscribe_progress", "task_id": "abc"})).unwrap();
        assert_eq!(subscribe, ClientMessage::SubscribeProgress { task_id: json!("abc") });

        let update = ServerMessage::ProgressUpdate {
            task_id: json!("abc"),
            progress: 40,
            status: ProgressStatus::Processing,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"type": "progress_update", "task_id": "abc", "progress": 40, "status": "processing"})
        );
    }

    #[test]
    fn test_task_id_of_any_type() {
        let numeric: ClientMessage = serde_json::from_value(json!({"type": "subscribe_progress", "task_id": 42})).unwrap();
        assert_eq!(numeric, ClientMessage::SubscribeProgress { task_id: json!(42) });

        let nested: ClientMessage =
            serde_json::from_value(json!({"type": "subscribe_progress", "task_id": {"batch": 7}})).unwrap();
        assert_eq!(nested, ClientMessage::SubscribeProgress { task_id: json!({"batch": 7}) });
    }

    #[test]
    fn test_rejects_unknown_type_and_missing_task() {
        assert!(serde_json::from_value::<ClientMessage>(json!({"type": "unsubscribe", "task_id": "abc"})).is_err());
        assert!(serde_json::from_value::<ClientMessage>(json!({"type": "subscribe_progress"})).is_err());
    }
}
