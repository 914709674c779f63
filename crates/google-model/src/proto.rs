use lingua_model::{
    File, Image, ImageSource, ProviderName, Request, Result, Role, Turn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
    FileData(FileData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

/// Parameters travel as plain JSON Schema, the same dialect as
/// `responseJsonSchema`, so `$defs` and `$ref` survive.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    parameters_json_schema: Value,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_output_tokens.is_none()
            && self.stop_sequences.is_empty()
            && self.seed.is_none()
            && self.presence_penalty.is_none()
            && self.frequency_penalty.is_none()
            && self.response_mime_type.is_none()
            && self.response_json_schema.is_none()
            && self.thinking_config.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub model_version: Option<String>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub thoughts_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub name: String,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    /// Int64 values are encoded as strings in this API.
    pub size_bytes: Option<String>,
    pub create_time: Option<String>,
    pub uri: Option<String>,
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &Request) -> Result<GenerateContentRequest> {
    let mut contents: Vec<Content> =
        req.history.iter().map(create_history_content).collect();
    contents.push(Content {
        role: Some("user"),
        parts: create_parts(&req.user, &req.images, &req.files),
    });

    let system_instruction = req.system.as_ref().map(|system| Content {
        role: None,
        parts: vec![Part::Text(system.clone())],
    });

    let tools = if req.tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTool {
            function_declarations: req
                .tools
                .iter()
                .map(|tool| FunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters_json_schema: tool.parameters.clone(),
                })
                .collect(),
        }]
    };

    let options = &req.options;
    let schema = req.schema_value()?;
    let generation_config = GenerationConfig {
        temperature: options.temperature,
        top_p: options.top_p,
        top_k: options.top_k,
        max_output_tokens: options.max_tokens,
        stop_sequences: options.stop_sequences_for(ProviderName::Google).to_vec(),
        seed: options.seed,
        presence_penalty: options.presence_penalty,
        frequency_penalty: options.frequency_penalty,
        response_mime_type: schema.as_ref().map(|_| "application/json"),
        response_json_schema: schema,
        thinking_config: options.thinking_budget.map(|budget| ThinkingConfig {
            thinking_budget: budget,
        }),
    };

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
        tools,
        generation_config,
    })
}

fn create_history_content(turn: &Turn) -> Content {
    match turn.role {
        Role::User => Content {
            role: Some("user"),
            parts: create_parts(&turn.text, &turn.images, &turn.files),
        },
        Role::Assistant => Content {
            role: Some("model"),
            parts: vec![Part::Text(turn.replay_text())],
        },
    }
}

fn create_parts(text: &str, images: &[Image], files: &[File]) -> Vec<Part> {
    let mut parts = Vec::with_capacity(images.len() + files.len() + 1);
    parts.push(Part::Text(text.to_owned()));
    parts.extend(images.iter().map(create_image_part));
    parts.extend(files.iter().map(|file| {
        Part::FileData(FileData {
            mime_type: file.mime_type.clone(),
            file_uri: file.uri.clone().unwrap_or_else(|| file.id.clone()),
        })
    }));
    parts
}

fn create_image_part(image: &Image) -> Part {
    match &image.source {
        ImageSource::Url(url) => Part::FileData(FileData {
            mime_type: image.mime_type.clone(),
            file_uri: url.clone(),
        }),
        ImageSource::Inline(_) => Part::InlineData(InlineData {
            mime_type: image.mime_type.clone(),
            data: image.source.base64().unwrap_or_default(),
        }),
    }
}
