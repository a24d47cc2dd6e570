//! Chat channel boundary: webhook bodies in, push messages out.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::types::Task;

pub trait ChatPusher {
    /// Push a plain text message to one recipient
    fn push_text(&self, to: &str, text: &str) -> Result<()>;
}

/// A text message received through the webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMessage {
    pub user_id: Option<String>,
    pub reply_token: Option<String>,
    pub text: String,
}

/// Connectivity checks arrive as `{"destination": ..., "events": []}` and
/// must be acknowledged without any further processing.
pub fn is_verification_ping(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("events").and_then(Value::as_array).map(Vec::is_empty))
        .unwrap_or(false)
}

/// Text message events from a webhook body, in delivery order.
///
/// Other event kinds are skipped.
pub fn text_messages(body: &str) -> Result<Vec<TextMessage>> {
    let value: Value = serde_json::from_str(body)?;
    let events = value
        .get("events")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let str_at = |event: &Value, pointer: &str| {
        event.pointer(pointer).and_then(Value::as_str).map(str::to_string)
    };

    Ok(events
        .iter()
        .filter(|e| e.get("type").and_then(Value::as_str) == Some("message"))
        .filter(|e| e.pointer("/message/type").and_then(Value::as_str) == Some("text"))
        .filter_map(|e| {
            Some(TextMessage {
                user_id: str_at(e, "/source/userId"),
                reply_token: str_at(e, "/replyToken"),
                text: str_at(e, "/message/text")?,
            })
        })
        .collect())
}

/// Confirmation text sent back after a task was registered
pub fn registration_reply(task: &Task) -> String {
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "未設定".to_string());
    let mut reply = format!("タスク登録しました：{}\n期限: {due}", task.title);
    if let Some(url) = &task.page_url {
        reply.push_str(&format!("\n{url}"));
    }
    reply
}

/// Push API request body
pub fn push_payload(to: &str, text: &str) -> Value {
    json!({
        "to": to,
        "messages": [{ "type": "text", "text": text }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::types::Priority;
    use chrono::NaiveDate;

    #[test]
    fn test_verification_ping() {
        assert!(is_verification_ping(r#"{"destination": "U1", "events": []}"#));
        assert!(!is_verification_ping(r#"{"destination": "U1", "events": [{}]}"#));
        assert!(!is_verification_ping("not json"));
        assert!(!is_verification_ping(r#"{"destination": "U1"}"#));
    }

    #[test]
    fn test_text_messages() {
        let body = r#"{
            "destination": "U0",
            "events": [
                {"type": "follow", "source": {"userId": "U1"}},
                {"type": "message", "replyToken": "r1",
                 "source": {"userId": "U1"},
                 "message": {"type": "text", "text": "明日までにES出す"}},
                {"type": "message", "replyToken": "r2",
                 "source": {"userId": "U1"},
                 "message": {"type": "sticker"}}
            ]
        }"#;
        let messages = text_messages(body).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "明日までにES出す");
        assert_eq!(messages[0].reply_token.as_deref(), Some("r1"));
        assert_eq!(messages[0].user_id.as_deref(), Some("U1"));
    }

    #[test]
    fn test_text_messages_rejects_non_json() {
        assert!(matches!(text_messages("<xml/>"), Err(AppError::Json(_))));
        assert!(text_messages("{}").unwrap().is_empty());
    }

    #[test]
    fn test_registration_reply() {
        let mut task = Task {
            title: "ES出す".to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 6, 11),
            priority: Priority::High,
            notes: None,
            category: None,
            source: "line".to_string(),
            user_id: None,
            page_id: Some("p1".to_string()),
            page_url: Some("https://example.invalid/p1".to_string()),
        };
        assert_eq!(
            registration_reply(&task),
            "タスク登録しました：ES出す\n期限: 2025-06-11\nhttps://example.invalid/p1"
        );
        task.due_date = None;
        task.page_url = None;
        assert_eq!(registration_reply(&task), "タスク登録しました：ES出す\n期限: 未設定");
    }

    #[test]
    fn test_push_payload() {
        let payload = push_payload("U1", "hello");
        assert_eq!(payload["to"], "U1");
        assert_eq!(payload["messages"][0]["type"], "text");
        assert_eq!(payload["messages"][0]["text"], "hello");
    }
}
