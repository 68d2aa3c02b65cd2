//! Event callback payloads (schema 2.0)

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// Body of a `POST` to the callback endpoint
///
/// URL verification handshakes carry only `challenge`; message events carry
/// `header` and `event`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub header: EventHeader,
    #[serde(default)]
    pub event: Option<MessageEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventHeader {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    /// Verification token configured for the app
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    /// `user` or `app`
    #[serde(default)]
    pub sender_type: Option<String>,
}

impl Sender {
    pub fn is_app(&self) -> bool {
        self.sender_type.as_deref() == Some("app")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub chat_id: String,
    /// `p2p` or `group`
    #[serde(default)]
    pub chat_type: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
    /// JSON-encoded body, e.g. `{"text":"hello"}`
    #[serde(default)]
    pub content: String,
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl Message {
    pub fn is_group(&self) -> bool {
        self.chat_type.as_deref() == Some("group")
    }

    /// Trimmed text body; empty for non-text or malformed content
    pub fn text(&self) -> String {
        serde_json::from_str::<Value>(&self.content)
            .ok()
            .and_then(|body| body.get("text").and_then(Value::as_str).map(str::to_string))
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    /// Age relative to `now_ms`; `None` when the creation time is unknown
    pub fn age(&self, now_ms: i64) -> Option<Duration> {
        let created_ms: i64 = self.create_time.as_deref()?.trim().parse().ok()?;
        Some(Duration::from_millis(now_ms.saturating_sub(created_ms).max(0) as u64))
    }

    /// True when one of the mentions is `open_id`
    pub fn mentions_open_id(&self, open_id: &str) -> bool {
        self.mentions.iter().any(|m| m.open_id() == Some(open_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mention {
    /// Placeholder in the text, e.g. `@_user_1`
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub id: MentionId,
    #[serde(default)]
    pub name: String,
}

impl Mention {
    pub fn open_id(&self) -> Option<&str> {
        self.id.open_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MentionId {
    #[serde(default)]
    pub open_id: Option<String>,
}

/// Replace mention placeholders with `@name`
///
/// The bot's own mention is removed so `@bot /help` reads as `/help`.
pub fn resolve_mentions(text: &str, mentions: &[Mention], bot_open_id: Option<&str>) -> String {
    let mut resolved = text.to_string();
    for mention in mentions.iter().filter(|m| !m.key.is_empty()) {
        let is_bot = bot_open_id.is_some() && mention.open_id() == bot_open_id;
        let replacement = if is_bot {
            String::new()
        } else {
            format!("@{}", mention.name)
        };
        resolved = resolved.replace(&mention.key, &replacement);
    }
    resolved.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_message() -> Message {
        serde_json::from_value(json!({
            "message_id": "om_1",
            "chat_id": "oc_1",
            "chat_type": "group",
            "message_type": "text",
            "content": "{\"text\":\"@_user_1 ask @_user_2 about it \"}",
            "create_time": "1700000000000",
            "mentions": [
                {"key": "@_user_1", "id": {"open_id": "ou_bot"}, "name": "Bridge"},
                {"key": "@_user_2", "id": {"open_id": "ou_tom"}, "name": "Tom"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_message_event() {
        let payload: CallbackPayload = serde_json::from_value(json!({
            "schema": "2.0",
            "header": {"event_id": "ev_1", "token": "vt", "event_type": "im.message.receive_v1"},
            "event": {
                "sender": {"sender_id": {"open_id": "ou_tom"}, "sender_type": "user"},
                "message": {"message_id": "om_1", "chat_id": "oc_1", "chat_type": "p2p",
                            "message_type": "text", "content": "{\"text\":\"hi\"}"}
            }
        }))
        .unwrap();

        assert_eq!(payload.header.token.as_deref(), Some("vt"));
        let event = payload.event.unwrap();
        assert!(!event.sender.is_app());
        let message = event.message.unwrap();
        assert_eq!(message.text(), "hi");
        assert!(!message.is_group());
    }

    #[test]
    fn test_parse_challenge() {
        let payload: CallbackPayload =
            serde_json::from_value(json!({"challenge": "abc", "token": "vt", "type": "url_verification"}))
                .unwrap();
        assert_eq!(payload.challenge.as_deref(), Some("abc"));
        assert!(payload.event.is_none());
    }

    #[test]
    fn test_text_of_non_text_content() {
        let message = Message {
            content: "{\"image_key\":\"img_1\"}".to_string(),
            ..Default::default()
        };
        assert_eq!(message.text(), "");

        let broken = Message {
            content: "not json".to_string(),
            ..Default::default()
        };
        assert_eq!(broken.text(), "");
    }

    #[test]
    fn test_resolve_mentions() {
        let message = group_message();
        let text = message.text();
        assert_eq!(
            resolve_mentions(&text, &message.mentions, Some("ou_bot")),
            "ask @Tom about it"
        );
        assert_eq!(
            resolve_mentions(&text, &message.mentions, None),
            "@Bridge ask @Tom about it"
        );
    }

    #[test]
    fn test_mentions_open_id() {
        let message = group_message();
        assert!(message.mentions_open_id("ou_bot"));
        assert!(!message.mentions_open_id("ou_other"));
    }

    #[test]
    fn test_age() {
        let message = group_message();
        assert_eq!(message.age(1_700_000_300_000), Some(Duration::from_secs(300)));
        assert_eq!(message.age(1_699_999_000_000), Some(Duration::ZERO));
        assert_eq!(Message::default().age(0), None);
    }
}
