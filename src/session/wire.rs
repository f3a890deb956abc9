//! Request and response bodies of the chat analysis endpoints

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Body POSTed to `/image` or `/llm`
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    /// Present on turns that carry the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<&'a str>,
    /// Transcript so far, ending with the newest user message
    pub chat: &'a [ChatMessage],
}

/// Successful reply; the server's transcript is authoritative
#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(rename = "chatArray")]
    pub chat_array: Vec<ChatMessage>,
}

impl ChatReply {
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_image() {
        let chat = vec![ChatMessage::user("Any abnormalities?")];
        let value = serde_json::to_value(ChatRequest {
            image_base64: None,
            chat: &chat,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"chat": [{"type": "user", "text": "Any abnormalities?"}]})
        );
    }

    #[test]
    fn test_request_includes_image() {
        let chat = vec![ChatMessage::user("")];
        let value = serde_json::to_value(ChatRequest {
            image_base64: Some("AAAA"),
            chat: &chat,
        })
        .unwrap();
        assert_eq!(value["image_base64"], "AAAA");
        assert_eq!(value["chat"][0]["type"], "user");
    }

    #[test]
    fn test_reply_parses_chat_array() {
        let reply = ChatReply::from_value(serde_json::json!({
            "chatArray": [
                {"type": "user", "text": ""},
                {"type": "ai", "text": "Findings: none"}
            ]
        }))
        .unwrap();
        assert_eq!(reply.chat_array.len(), 2);
        assert!(reply.chat_array[1].is_assistant());
    }

    #[test]
    fn test_reply_without_chat_array_is_rejected() {
        let result = ChatReply::from_value(serde_json::json!({"generated_text": "x"}));
        assert!(result.is_err());
    }
}
