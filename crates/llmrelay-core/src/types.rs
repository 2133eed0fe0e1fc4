//! Core types — chat messages, the OpenAI chat-completions wire format, and
//! the `/api/chat` request/reply shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────
// Messages (OpenAI chat completions format)
// ─────────────────────────────────────────────

/// A chat message in the OpenAI format: a `{role, content}` pair.
///
/// Roles and content shapes are not restricted. Entries arriving in a
/// request's history (`developer`, `tool`, multi-part content, extra keys
/// such as `name`) are forwarded upstream unchanged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    fn text(role: &str, content: String) -> Self {
        Message {
            role: role.to_string(),
            content: Some(Value::String(content)),
            extra: Map::new(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content.into())
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content.into())
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text("assistant", content.into())
    }

    /// Plain-text content, if the content is a string.
    pub fn content(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }
}

// ─────────────────────────────────────────────
// Chat completion wire format
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
}

/// Raw chat completion response from an OpenAI-compatible API.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage statistics from the LLM.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// HTTP boundary
// ─────────────────────────────────────────────

/// Inbound body of `POST /api/chat`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub open_router_api_key: Option<String>,
    #[serde(default)]
    pub open_router_model_name: Option<String>,
}

impl ChatRequest {
    /// History followed by the new user turn.
    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = self.history;
        messages.push(Message::user(self.message));
        messages
    }
}

/// Outbound body of `POST /api/chat`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatReply {
    Response { response: String },
    Error { error: String },
}

impl ChatReply {
    pub fn response(text: impl Into<String>) -> Self {
        ChatReply::Response {
            response: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        ChatReply::Error { error: text.into() }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::system("You are helpful.")).unwrap();
        assert_eq!(json, json!({ "role": "system", "content": "You are helpful." }));

        let json = serde_json::to_value(Message::assistant("Hi")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_message_keeps_extra_keys() {
        let raw = json!({
            "role": "user",
            "content": "hello",
            "name": "viewer42"
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content(), Some("hello"));
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_message_accepts_any_role_and_content_shape() {
        let entries = json!([
            { "role": "developer", "content": "be terse" },
            { "role": "tool", "content": "42", "tool_call_id": "call_1" },
            { "role": "user", "content": [{ "type": "text", "text": "hi" }] },
            { "role": "assistant", "content": null }
        ]);
        let messages: Vec<Message> = serde_json::from_value(entries).unwrap();
        assert_eq!(messages[0].role, "developer");
        assert_eq!(messages[1].extra["tool_call_id"], "call_1");
        assert!(messages[2].content().is_none());
        assert!(messages[2].content.as_ref().unwrap().is_array());
        assert!(messages[3].content.is_none());
    }

    #[test]
    fn test_completion_request_body() {
        let messages = vec![Message::user("hi")];
        let body = ChatCompletionRequest {
            model: "gpt-x",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({ "model": "gpt-x", "messages": [{ "role": "user", "content": "hi" }] })
        );
    }

    #[test]
    fn test_completion_response_tolerates_missing_fields() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null } }]
        }))
        .unwrap();
        let choices = resp.choices.unwrap();
        assert!(choices[0].message.as_ref().unwrap().content.is_none());

        let resp: ChatCompletionResponse = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert!(resp.choices.is_none());
    }

    #[test]
    fn test_chat_request_camel_case() {
        let req: ChatRequest = serde_json::from_value(json!({
            "message": "hi",
            "openRouterApiKey": "k1",
            "openRouterModelName": null
        }))
        .unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.history.is_empty());
        assert_eq!(req.open_router_api_key.as_deref(), Some("k1"));
        assert!(req.open_router_model_name.is_none());
    }

    #[test]
    fn test_chat_request_into_messages_appends_user_turn() {
        let req = ChatRequest {
            message: "and now?".into(),
            history: vec![Message::user("hello"), Message::assistant("hi there")],
            ..Default::default()
        };
        let messages = req.into_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], Message::user("and now?"));
    }

    #[test]
    fn test_chat_reply_shapes() {
        assert_eq!(
            serde_json::to_value(ChatReply::response("hello")).unwrap(),
            json!({ "response": "hello" })
        );
        assert_eq!(
            serde_json::to_value(ChatReply::error("boom")).unwrap(),
            json!({ "error": "boom" })
        );
    }
}
