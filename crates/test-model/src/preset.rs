use lingua_model::{ProviderName, ToolCall, WireReply};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A canned reply for one exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetReply {
    /// The HTTP status to answer with.
    pub status: u16,
    /// The JSON body.
    pub body: Value,
    /// If set, the exchange fails at the transport level in the first
    /// `failures` attempts. `Some(0)` means it always fails.
    pub failures: Option<u64>,
}

impl PresetReply {
    /// Creates a `200 OK` reply with the given body.
    #[inline]
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            failures: None,
        }
    }

    /// Creates a reply with an arbitrary status.
    #[inline]
    pub fn with_status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            failures: None,
        }
    }

    /// Sets failure times before a successful reply. `0` means the
    /// exchange will always fail.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// A successful text answer in `provider`'s wire format.
    pub fn text(provider: ProviderName, text: &str) -> Self {
        let body = match provider {
            ProviderName::Anthropic => json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "model": provider.default_model(),
                "content": [{ "type": "text", "text": text }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 10, "output_tokens": 5 }
            }),
            ProviderName::OpenAI | ProviderName::Grok => json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "model": provider.default_model(),
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": text },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
            }),
            ProviderName::Google => json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 5
                },
                "modelVersion": provider.default_model()
            }),
        };
        Self::ok(body)
    }

    /// A successful answer requesting one tool call.
    pub fn tool_call(provider: ProviderName, call: &ToolCall) -> Self {
        let body = match provider {
            ProviderName::Anthropic => json!({
                "content": [{
                    "type": "tool_use",
                    "id": call.id,
                    "name": call.name,
                    "input": call.arguments
                }],
                "stop_reason": "tool_use",
                "usage": { "input_tokens": 10, "output_tokens": 5 }
            }),
            ProviderName::OpenAI | ProviderName::Grok => json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string()
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
            }),
            ProviderName::Google => json!({
                "candidates": [{
                    "content": { "parts": [{
                        "functionCall": {
                            "id": call.id,
                            "name": call.name,
                            "args": call.arguments
                        }
                    }]},
                    "finishReason": "STOP"
                }]
            }),
        };
        Self::ok(body)
    }

    /// An error reply in `provider`'s error envelope.
    pub fn api_error(provider: ProviderName, status: u16, message: &str) -> Self {
        let body = match provider {
            ProviderName::Anthropic => json!({
                "type": "error",
                "error": { "type": "api_error", "message": message }
            }),
            ProviderName::OpenAI | ProviderName::Grok => json!({
                "error": { "message": message, "type": "invalid_request_error" }
            }),
            ProviderName::Google => json!({
                "error": { "code": status, "message": message, "status": "INVALID_ARGUMENT" }
            }),
        };
        Self::with_status(status, body)
    }

    /// A successful file upload.
    pub fn file(provider: ProviderName, id: &str, filename: &str, bytes: u64) -> Self {
        let body = match provider {
            ProviderName::Anthropic => json!({
                "id": id,
                "type": "file",
                "filename": filename,
                "size_bytes": bytes,
                "created_at": "2025-04-14T12:00:00Z"
            }),
            ProviderName::OpenAI | ProviderName::Grok => json!({
                "id": id,
                "object": "file",
                "bytes": bytes,
                "created_at": 1_744_632_000,
                "filename": filename
            }),
            ProviderName::Google => json!({
                "file": {
                    "name": id,
                    "displayName": filename,
                    "sizeBytes": bytes.to_string(),
                    "createTime": "2025-04-14T12:00:00Z",
                    "uri": format!("https://generativelanguage.googleapis.com/v1beta/{id}")
                }
            }),
        };
        Self::ok(body)
    }

    pub(crate) fn to_reply(&self) -> WireReply {
        WireReply::new(self.status, self.body.to_string())
    }
}
