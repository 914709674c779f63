use chrono::{DateTime, Utc};
use lingua_model::{
    Error, File, FileUpload, FinishReason, ProviderName, Response, Result,
    Tokens, ToolCall, WireReply, decode_json,
};
use serde_json::Value;

use crate::proto::{GenerateContentResponse, UploadedFile};

pub fn parse_generate_content(reply: &WireReply) -> Result<Response> {
    let raw: Value = decode_json("parse", reply)?;
    let generated: GenerateContentResponse = serde_json::from_value(raw.clone())
        .map_err(|err| Error::decode("parse", err.to_string()))?;

    let usage = generated.usage_metadata.unwrap_or_default();
    let tokens = Tokens {
        input: usage.prompt_token_count,
        output: usage.candidates_token_count + usage.thoughts_token_count,
    };

    let Some(candidate) = generated.candidates.into_iter().next() else {
        // A blocked prompt yields no candidates at all.
        let reason = generated
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "reply has no candidates".to_owned());
        return Err(Error::decode("parse", format!("prompt blocked: {reason}")));
    };
    trace!("finish reason: {:?}", candidate.finish_reason);

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let parts = candidate.content.unwrap_or_default().parts;
    for part in parts {
        if let Some(call) = part.function_call {
            // Older models don't assign call ids.
            let id = call
                .id
                .unwrap_or_else(|| format!("call_{}", tool_calls.len()));
            tool_calls.push(ToolCall {
                id,
                name: call.name,
                arguments: call.args,
            });
            continue;
        }
        if part.thought {
            continue;
        }
        if let Some(chunk) = part.text {
            text.push_str(&chunk);
        }
    }

    let finish_reason = if tool_calls.is_empty() {
        map_finish_reason(candidate.finish_reason.as_deref())
    } else {
        FinishReason::ToolCalls
    };

    Response {
        text,
        tokens,
        tool_calls,
        finish_reason,
        model: generated.model_version,
        raw,
    }
    .ensure_content("parse")
}

fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY")
        | Some("RECITATION")
        | Some("BLOCKLIST")
        | Some("PROHIBITED_CONTENT")
        | Some("SPII") => FinishReason::ContentFilter,
        Some(other) => FinishReason::Other(other.to_owned()),
    }
}

pub fn parse_uploaded_file(
    reply: &WireReply,
    upload: &FileUpload,
) -> Result<File> {
    let uploaded: UploadedFile = decode_json("upload", reply)?;
    let file = uploaded.file;
    let created_at = file
        .create_time
        .as_deref()
        .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let bytes = file
        .size_bytes
        .as_deref()
        .and_then(|size| size.parse().ok())
        .unwrap_or(upload.data.len() as u64);
    Ok(File {
        id: file.name,
        provider: ProviderName::Google,
        filename: file
            .display_name
            .unwrap_or_else(|| upload.filename.clone()),
        bytes,
        mime_type: file.mime_type.unwrap_or_else(|| upload.mime_type.clone()),
        uri: file.uri,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use lingua_model::ErrorKind;
    use serde_json::json;

    use super::*;

    fn reply(body: Value) -> WireReply {
        WireReply::new(200, body.to_string())
    }

    #[test]
    fn test_parse_text() {
        let resp = parse_generate_content(&reply(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Adding two and two.", "thought": true },
                        { "text": "2 + 2 " },
                        { "text": "= 4" }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 8,
                "candidatesTokenCount": 6,
                "thoughtsTokenCount": 20,
                "totalTokenCount": 34
            },
            "modelVersion": "gemini-2.5-flash"
        })))
        .unwrap();
        assert_eq!(resp.text, "2 + 2 = 4");
        assert_eq!(resp.tokens, Tokens { input: 8, output: 26 });
        assert_eq!(resp.finish_reason, FinishReason::Stop);
        assert_eq!(resp.model.as_deref(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn test_parse_function_calls() {
        let resp = parse_generate_content(&reply(json!({
            "candidates": [{
                "content": { "parts": [
                    { "functionCall": { "name": "get_weather", "args": { "city": "Paris" } } },
                    { "functionCall": { "name": "get_time", "args": {} } }
                ]},
                "finishReason": "STOP"
            }]
        })))
        .unwrap();
        assert_eq!(resp.finish_reason, FinishReason::ToolCalls);
        assert_eq!(resp.tool_calls.len(), 2);
        assert_eq!(resp.tool_calls[0].id, "call_0");
        assert_eq!(resp.tool_calls[0].arguments, json!({ "city": "Paris" }));
        assert_eq!(resp.tool_calls[1].id, "call_1");
        assert_eq!(resp.tool_calls[1].name, "get_time");
    }

    #[test]
    fn test_blocked_prompt() {
        let err = parse_generate_content(&reply(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_uploaded_file() {
        let upload = FileUpload::from_bytes("notes.txt", b"hello".to_vec());
        let file = parse_uploaded_file(
            &reply(json!({
                "file": {
                    "name": "files/abc-123",
                    "mimeType": "text/plain",
                    "sizeBytes": "5",
                    "createTime": "2025-06-01T08:30:00.123456Z",
                    "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
                    "state": "ACTIVE"
                }
            })),
            &upload,
        )
        .unwrap();
        assert_eq!(file.id, "files/abc-123");
        assert_eq!(file.provider, ProviderName::Google);
        assert_eq!(file.filename, "notes.txt");
        assert_eq!(file.bytes, 5);
        assert_eq!(
            file.uri.as_deref(),
            Some("https://generativelanguage.googleapis.com/v1beta/files/abc-123")
        );
    }
}
