use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The arguments to pass to the tool.
    pub arguments: Value,
}

/// Token accounting for one exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Prompt tokens.
    pub input: u64,
    /// Completion tokens, including reasoning tokens where reported.
    pub output: u64,
}

impl Tokens {
    /// Returns the sum of input and output tokens.
    #[inline]
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// The reason a model response has finished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// The model finished generating text.
    #[default]
    Stop,
    /// The token limit was hit.
    Length,
    /// The model needs to call a tool.
    ToolCalls,
    /// The provider filtered the content.
    ContentFilter,
    /// Any other vendor-specific reason.
    Other(String),
}

/// The canonical result of one exchange.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// The primary textual answer. For structured output this is the JSON
    /// object serialized as text.
    pub text: String,
    /// Token usage.
    pub tokens: Tokens,
    /// Tool calls requested by the model, in order.
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// The model that answered, as reported by the provider.
    pub model: Option<String>,
    /// The provider's reply body, kept for diagnostics.
    pub raw: Value,
}

impl Response {
    /// Deserializes the text as JSON, for structured output replies.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.text)
            .map_err(|err| Error::schema("Text", err.to_string()))
    }

    /// Fails if the response carries neither text nor tool calls.
    ///
    /// Adapters call this last so that an empty success never reaches the
    /// caller.
    pub fn ensure_content(self, operation: &str) -> Result<Self> {
        if self.text.is_empty() && self.tool_calls.is_empty() {
            return Err(Error::decode(
                operation,
                "reply has neither text nor tool calls",
            ));
        }
        Ok(self)
    }
}
