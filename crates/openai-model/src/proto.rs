use lingua_model::{
    File, Image, ImageSource, ProviderName, Request, Result, Role, Target,
    Tool as ModelTool, Turn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::strict_schema;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FunctionToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionToolCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub refusal: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub bytes: u64,
    pub created_at: Option<i64>,
    pub filename: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FileRef {
    file_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    File { file: FileRef },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum Message {
    System { content: String },
    User { content: Content },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &Request,
    target: &Target<'_>,
) -> Result<ChatCompletionRequest> {
    let mut messages = Vec::with_capacity(req.history.len() + 2);
    if let Some(system) = &req.system {
        messages.push(Message::System {
            content: system.clone(),
        });
    }
    messages.extend(req.history.iter().map(create_history_message));
    messages.push(Message::User {
        content: create_content(&req.user, &req.images, &req.files),
    });

    let response_format = req.schema_value()?.map(|schema| ResponseFormat {
        r#type: "json_schema",
        json_schema: JsonSchemaFormat {
            name: "response",
            strict: true,
            schema: strict_schema(schema),
        },
    });

    // Grok still spells the limit the legacy way.
    let (max_completion_tokens, max_tokens) = match target.name {
        ProviderName::Grok => (None, req.options.max_tokens),
        _ => (req.options.max_tokens, None),
    };

    let options = &req.options;
    Ok(ChatCompletionRequest {
        model: target.model.to_owned(),
        messages,
        tools: req.tools.iter().map(create_tool).collect(),
        response_format,
        temperature: options.temperature,
        top_p: options.top_p,
        max_completion_tokens,
        max_tokens,
        stop: options.stop_sequences_for(target.name).to_vec(),
        seed: options.seed,
        presence_penalty: options.presence_penalty,
        frequency_penalty: options.frequency_penalty,
    })
}

fn create_history_message(turn: &Turn) -> Message {
    match turn.role {
        Role::User => Message::User {
            content: create_content(&turn.text, &turn.images, &turn.files),
        },
        Role::Assistant => Message::Assistant {
            content: turn.replay_text(),
        },
    }
}

fn create_content(text: &str, images: &[Image], files: &[File]) -> Content {
    if images.is_empty() && files.is_empty() {
        return Content::Text(text.to_owned());
    }
    let mut parts = vec![ContentPart::Text {
        text: text.to_owned(),
    }];
    parts.extend(images.iter().map(|image| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: image_url(image),
        },
    }));
    parts.extend(files.iter().map(|file| ContentPart::File {
        file: FileRef {
            file_id: file.id.clone(),
        },
    }));
    Content::Parts(parts)
}

fn image_url(image: &Image) -> String {
    match &image.source {
        ImageSource::Url(url) => url.clone(),
        ImageSource::Inline(_) => format!(
            "data:{};base64,{}",
            image.mime_type,
            image.source.base64().unwrap_or_default()
        ),
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lingua_model::{OptionSet, Provider};
    use serde_json::json;

    use super::*;

    fn render(req: &Request, provider: &Provider) -> Value {
        let target = Target::resolve(provider).unwrap();
        serde_json::to_value(create_request(req, &target).unwrap()).unwrap()
    }

    #[test]
    fn test_create_request() {
        let request = Request::new("Hello")
            .with_system("You are a helpful assistant.")
            .with_tool(ModelTool {
                name: "shell".to_owned(),
                description: "Runs shell commands.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "cmd": { "type": "string" } }
                }),
            })
            .with_options(OptionSet::new().with_temperature(0.2).with_seed(3));
        let provider =
            Provider::new(ProviderName::OpenAI, "xxx").with_model("custom");
        let expected = json!({
            "model": "custom",
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "Hello" }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": "shell",
                    "description": "Runs shell commands.",
                    "parameters": {
                        "type": "object",
                        "properties": { "cmd": { "type": "string" } }
                    }
                }
            }],
            "temperature": 0.2,
            "seed": 3
        });
        assert_eq!(render(&request, &provider), expected);
    }

    #[test]
    fn test_schema_envelope() {
        let request = Request::new("Extract: Diana is 35.").with_schema(
            r#"{"type":"object","properties":{"name":{"type":"string"},"age":{"type":"integer"}}}"#,
        );
        let provider = Provider::new(ProviderName::OpenAI, "xxx");
        let body = render(&request, &provider);
        assert_eq!(
            body["response_format"],
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "age": { "type": "integer" }
                        },
                        "required": ["age", "name"],
                        "additionalProperties": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_attachments_and_history() {
        let file = File {
            id: "file-123".to_owned(),
            provider: ProviderName::OpenAI,
            filename: "a.pdf".to_owned(),
            bytes: 4,
            mime_type: "application/pdf".to_owned(),
            uri: None,
            created_at: Utc::now(),
        };
        let request = Request::new("And this one?")
            .with_history(vec![Turn::user("Hi"), Turn::assistant("Hello!")])
            .with_image(Image::from_bytes(b"abc".to_vec(), "image/png"))
            .with_file(file);
        let provider = Provider::new(ProviderName::OpenAI, "xxx");
        let body = render(&request, &provider);
        assert_eq!(
            body["messages"],
            json!([
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello!" },
                { "role": "user", "content": [
                    { "type": "text", "text": "And this one?" },
                    { "type": "image_url",
                      "image_url": { "url": "data:image/png;base64,YWJj" } },
                    { "type": "file", "file": { "file_id": "file-123" } }
                ]}
            ])
        );
    }

    #[test]
    fn test_max_tokens_spelling() {
        let request = Request::new("Hi").with_options(
            OptionSet::new()
                .with_max_tokens(64)
                .with_stop_sequences(["1", "2", "3", "4", "5"]),
        );
        let openai = render(&request, &Provider::new(ProviderName::OpenAI, "k"));
        assert_eq!(openai["max_completion_tokens"], json!(64));
        assert!(openai.get("max_tokens").is_none());
        assert_eq!(openai["stop"].as_array().unwrap().len(), 4);

        let grok = render(&request, &Provider::new(ProviderName::Grok, "k"));
        assert_eq!(grok["max_tokens"], json!(64));
        assert_eq!(grok["model"], json!("grok-3"));
    }
}
