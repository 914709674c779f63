use lingua_model::capability::ANTHROPIC_DEFAULT_MAX_TOKENS;
use lingua_model::{
    Error, File, Image, ImageSource, OptionKey, ProviderName, Request, Result,
    Role, Target, Turn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The forced tool that carries structured output.
pub const JSON_TOOL_NAME: &str = "json_output";

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Debug, Serialize)]
pub struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<Thinking>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: Source },
    Document { source: Source },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Source {
    Base64 { media_type: String, data: String },
    Url { url: String },
    File { file_id: String },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct Thinking {
    #[serde(rename = "type")]
    thinking_type: &'static str,
    budget_tokens: u32,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    pub created_at: Option<String>,
}

// -----------
// Conversions
// -----------

pub fn create_request(req: &Request, target: &Target<'_>) -> Result<ApiRequest> {
    let options = &req.options;
    let max_tokens = options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS);
    let schema = req.schema_value()?;

    let thinking = match options.thinking_budget {
        Some(budget) => {
            check_thinking(req, budget, max_tokens, schema.is_some())?;
            Some(Thinking {
                thinking_type: "enabled",
                budget_tokens: budget,
            })
        }
        None => None,
    };

    let mut tools: Vec<ApiTool> = req
        .tools
        .iter()
        .map(|tool| ApiTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.parameters.clone(),
        })
        .collect();
    let mut tool_choice = None;
    if let Some(schema) = schema {
        if req.tools.iter().any(|tool| tool.name == JSON_TOOL_NAME) {
            return Err(Error::validation(
                "Tools",
                format!("`{JSON_TOOL_NAME}` is reserved for structured output"),
            ));
        }
        tools.push(ApiTool {
            name: JSON_TOOL_NAME.to_owned(),
            description: "Respond with a JSON object matching this schema."
                .to_owned(),
            input_schema: schema,
        });
        tool_choice = Some(ToolChoice {
            choice_type: "tool",
            name: JSON_TOOL_NAME,
        });
    }

    let mut messages: Vec<ApiMessage> =
        req.history.iter().map(create_history_message).collect();
    messages.push(ApiMessage {
        role: "user",
        content: create_content(&req.user, &req.images, &req.files),
    });

    Ok(ApiRequest {
        model: target.model.to_owned(),
        max_tokens,
        messages,
        system: req.system.clone(),
        tools,
        tool_choice,
        temperature: options.temperature,
        top_p: options.top_p,
        top_k: options.top_k,
        stop_sequences: options.stop_sequences_for(ProviderName::Anthropic).to_vec(),
        thinking,
    })
}

/// Cross-field rules for extended thinking that the per-option bounds
/// can't express.
fn check_thinking(
    req: &Request,
    budget: u32,
    max_tokens: u32,
    structured: bool,
) -> Result<()> {
    let field = OptionKey::ThinkingBudget.name();
    if budget >= max_tokens {
        return Err(Error::validation(
            field,
            format!("budget {budget} must be below max tokens {max_tokens}"),
        ));
    }
    if structured {
        return Err(Error::validation(
            field,
            "extended thinking cannot be combined with structured output",
        ));
    }
    if req.options.temperature.is_some() {
        return Err(Error::validation(
            OptionKey::Temperature.name(),
            "temperature cannot be set while extended thinking is enabled",
        ));
    }
    if req.options.top_k.is_some() {
        return Err(Error::validation(
            OptionKey::TopK.name(),
            "top-k cannot be set while extended thinking is enabled",
        ));
    }
    Ok(())
}

fn create_history_message(turn: &Turn) -> ApiMessage {
    match turn.role {
        Role::User => ApiMessage {
            role: "user",
            content: create_content(&turn.text, &turn.images, &turn.files),
        },
        Role::Assistant => ApiMessage {
            role: "assistant",
            content: MessageContent::Text(turn.replay_text()),
        },
    }
}

fn create_content(text: &str, images: &[Image], files: &[File]) -> MessageContent {
    if images.is_empty() && files.is_empty() {
        return MessageContent::Text(text.to_owned());
    }
    // Attachments go first, the prompt that refers to them last.
    let mut blocks = Vec::with_capacity(images.len() + files.len() + 1);
    blocks.extend(images.iter().map(|image| ContentBlock::Image {
        source: image_source(image),
    }));
    blocks.extend(files.iter().map(|file| {
        let source = Source::File {
            file_id: file.id.clone(),
        };
        // Uploaded images are referenced as images, everything else as a
        // document.
        if file.mime_type.starts_with("image/") {
            ContentBlock::Image { source }
        } else {
            ContentBlock::Document { source }
        }
    }));
    blocks.push(ContentBlock::Text {
        text: text.to_owned(),
    });
    MessageContent::Blocks(blocks)
}

fn image_source(image: &Image) -> Source {
    match &image.source {
        ImageSource::Url(url) => Source::Url { url: url.clone() },
        ImageSource::Inline(_) => Source::Base64 {
            media_type: image.mime_type.clone(),
            data: image.source.base64().unwrap_or_default(),
        },
    }
}

/// Returns `true` if any file is referenced, which requires the files beta.
pub fn uses_files(req: &Request) -> bool {
    !req.files.is_empty() || req.history.iter().any(|turn| !turn.files.is_empty())
}
