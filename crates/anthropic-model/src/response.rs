use chrono::{DateTime, Utc};
use lingua_model::{
    Error, File, FileUpload, FinishReason, ProviderName, Response, Result,
    Tokens, ToolCall, WireReply, decode_json,
};
use serde_json::Value;

use crate::proto::{ApiResponse, FileMetadata, JSON_TOOL_NAME, ResponseBlock};

pub fn parse_message(reply: &WireReply) -> Result<Response> {
    let raw: Value = decode_json("parse", reply)?;
    let message: ApiResponse = serde_json::from_value(raw.clone())
        .map_err(|err| Error::decode("parse", err.to_string()))?;
    trace!("stop reason: {:?}", message.stop_reason);

    let mut text = String::new();
    let mut structured = None;
    let mut tool_calls = Vec::new();
    for block in message.content {
        match block {
            ResponseBlock::Text { text: chunk } => text.push_str(&chunk),
            ResponseBlock::ToolUse { name, input, .. }
                if name == JSON_TOOL_NAME =>
            {
                structured = Some(input);
            }
            ResponseBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                });
            }
            // Thinking blocks are not surfaced.
            ResponseBlock::Other => {}
        }
    }

    // The forced tool's input is the structured answer.
    let finish_reason = match structured {
        Some(input) => {
            text = serde_json::to_string(&input)
                .map_err(|err| Error::request("parse", err))?;
            FinishReason::Stop
        }
        None => map_stop_reason(message.stop_reason.as_deref()),
    };

    Response {
        text,
        tokens: Tokens {
            input: message.usage.input_tokens,
            output: message.usage.output_tokens,
        },
        tool_calls,
        finish_reason,
        model: message.model,
        raw,
    }
    .ensure_content("parse")
}

fn map_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolCalls,
        Some("refusal") => FinishReason::ContentFilter,
        Some(other) => FinishReason::Other(other.to_owned()),
    }
}

pub fn parse_file_metadata(
    reply: &WireReply,
    upload: &FileUpload,
) -> Result<File> {
    let metadata: FileMetadata = decode_json("upload", reply)?;
    let created_at = metadata
        .created_at
        .as_deref()
        .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    Ok(File {
        id: metadata.id,
        provider: ProviderName::Anthropic,
        filename: metadata.filename.unwrap_or_else(|| upload.filename.clone()),
        bytes: if metadata.size_bytes > 0 {
            metadata.size_bytes
        } else {
            upload.data.len() as u64
        },
        mime_type: metadata
            .mime_type
            .unwrap_or_else(|| upload.mime_type.clone()),
        uri: None,
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
        let resp = parse_message(&reply(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                { "type": "thinking", "thinking": "Simple sum.", "signature": "x" },
                { "type": "text", "text": "4" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 3 }
        })))
        .unwrap();
        assert_eq!(resp.text, "4");
        assert_eq!(resp.tokens, Tokens { input: 10, output: 3 });
        assert_eq!(resp.finish_reason, FinishReason::Stop);
        assert_eq!(resp.model.as_deref(), Some("claude-sonnet-4-20250514"));
    }

    #[test]
    fn test_parse_structured_output() {
        let resp = parse_message(&reply(json!({
            "content": [{
                "type": "tool_use",
                "id": "toolu_01",
                "name": "json_output",
                "input": { "name": "Diana", "age": 35 }
            }],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 40, "output_tokens": 20 }
        })))
        .unwrap();
        assert!(resp.tool_calls.is_empty());
        assert_eq!(resp.finish_reason, FinishReason::Stop);
        let value: Value = resp.json().unwrap();
        assert_eq!(value, json!({ "name": "Diana", "age": 35 }));
    }

    #[test]
    fn test_parse_tool_use() {
        let resp = parse_message(&reply(json!({
            "content": [
                { "type": "text", "text": "Let me check." },
                {
                    "type": "tool_use",
                    "id": "toolu_02",
                    "name": "get_weather",
                    "input": { "city": "Paris" }
                }
            ],
            "stop_reason": "tool_use"
        })))
        .unwrap();
        assert_eq!(resp.text, "Let me check.");
        assert_eq!(resp.finish_reason, FinishReason::ToolCalls);
        assert_eq!(
            resp.tool_calls,
            vec![ToolCall {
                id: "toolu_02".to_owned(),
                name: "get_weather".to_owned(),
                arguments: json!({ "city": "Paris" }),
            }]
        );
    }

    #[test]
    fn test_parse_empty_content() {
        let err = parse_message(&reply(json!({
            "content": [],
            "stop_reason": "max_tokens"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }

    #[test]
    fn test_parse_file_metadata() {
        let upload = FileUpload::from_bytes("report.pdf", b"%PDF-1.4".to_vec());
        let file = parse_file_metadata(
            &reply(json!({
                "id": "file_011CNha8iCJcU1wXNR6q4V8w",
                "type": "file",
                "filename": "report.pdf",
                "mime_type": "application/pdf",
                "size_bytes": 8,
                "created_at": "2025-04-14T12:00:00Z",
                "downloadable": false
            })),
            &upload,
        )
        .unwrap();
        assert_eq!(file.id, "file_011CNha8iCJcU1wXNR6q4V8w");
        assert_eq!(file.provider, ProviderName::Anthropic);
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.bytes, 8);
        assert_eq!(file.created_at.to_rfc3339(), "2025-04-14T12:00:00+00:00");
    }
}
