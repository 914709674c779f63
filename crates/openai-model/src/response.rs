use chrono::{DateTime, Utc};
use lingua_model::{
    Error, File, FileUpload, FinishReason, ProviderName, Response, Result,
    Tokens, ToolCall, WireReply, decode_json,
};
use serde_json::Value;

use crate::proto::{ChatCompletion, FileObject};

pub fn parse_chat_completion(reply: &WireReply) -> Result<Response> {
    let raw: Value = decode_json("parse", reply)?;
    let completion: ChatCompletion = serde_json::from_value(raw.clone())
        .map_err(|err| Error::decode("parse", err.to_string()))?;

    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::decode("parse", "reply has no choices"));
    };
    trace!("finish reason: {:?}", choice.finish_reason);

    let message = choice.message;
    let refused = message.content.is_none() && message.refusal.is_some();
    let text = message.content.or(message.refusal).unwrap_or_default();

    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: parse_arguments(&call.function.arguments),
        })
        .collect();

    let finish_reason = if refused {
        FinishReason::ContentFilter
    } else {
        map_finish_reason(choice.finish_reason.as_deref())
    };
    let usage = completion.usage.unwrap_or_default();

    Response {
        text,
        tokens: Tokens {
            input: usage.prompt_tokens,
            output: usage.completion_tokens,
        },
        tool_calls,
        finish_reason,
        model: completion.model,
        raw,
    }
    .ensure_content("parse")
}

/// Arguments arrive as a JSON document inside a string. Models sometimes
/// emit broken JSON there, which is kept verbatim as a string value.
fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(arguments).unwrap_or_else(|err| {
        warn!("tool call arguments are not valid JSON: {err}");
        Value::String(arguments.to_owned())
    })
}

fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(other) => FinishReason::Other(other.to_owned()),
    }
}

pub fn parse_file_object(
    provider: ProviderName,
    reply: &WireReply,
    upload: &FileUpload,
) -> Result<File> {
    let object: FileObject = decode_json("upload", reply)?;
    let created_at = object
        .created_at
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);
    Ok(File {
        id: object.id,
        provider,
        filename: object.filename.unwrap_or_else(|| upload.filename.clone()),
        bytes: if object.bytes > 0 {
            object.bytes
        } else {
            upload.data.len() as u64
        },
        mime_type: upload.mime_type.clone(),
        uri: None,
        created_at,
    })
}
