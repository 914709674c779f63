use std::collections::HashSet;

use bytes::Bytes;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, File, OptionSet, ProviderName, Result, ToolCall};

/// Where the bytes of an image come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// A URL the provider fetches itself.
    Url(String),
    /// Raw bytes sent inline.
    Inline(Bytes),
}

/// An image attached to a user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Image {
    /// The image content.
    pub source: ImageSource,
    /// The media type, e.g. `image/png`.
    pub mime_type: String,
}

impl Image {
    /// Creates an image referenced by URL. The media type is guessed from
    /// the URL path.
    pub fn from_url<S: Into<String>>(url: S) -> Self {
        let url = url.into();
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let mime_type = mime_guess::from_path(path)
            .first()
            .filter(|m| m.type_() == mime::IMAGE)
            .map(|m| m.essence_str().to_owned())
            .unwrap_or_else(|| mime::IMAGE_JPEG.to_string());
        Self {
            source: ImageSource::Url(url),
            mime_type,
        }
    }

    /// Creates an inline image.
    pub fn from_bytes<B: Into<Bytes>, S: Into<String>>(
        data: B,
        mime_type: S,
    ) -> Self {
        Self {
            source: ImageSource::Inline(data.into()),
            mime_type: mime_type.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        let Ok(mime) = self.mime_type.parse::<mime::Mime>() else {
            return Err(Error::validation(
                "Images",
                format!("invalid media type `{}`", self.mime_type),
            ));
        };
        if mime.type_() != mime::IMAGE {
            return Err(Error::validation(
                "Images",
                format!("`{}` is not an image type", self.mime_type),
            ));
        }
        match &self.source {
            ImageSource::Url(url) if url.trim().is_empty() => {
                Err(Error::validation("Images", "image URL is empty"))
            }
            ImageSource::Inline(data) if data.is_empty() => {
                Err(Error::validation("Images", "inline image is empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Describes a tool that can be called by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool, as a JSON schema object.
    pub parameters: Value,
}

impl Tool {
    /// Creates a tool definition whose parameters are derived from `T`.
    pub fn for_input<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: schema_value_for::<T>(),
        }
    }
}

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side.
    User,
    /// The model side.
    Assistant,
}

/// One past turn of a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    /// Who produced it.
    pub role: Role,
    /// The text content.
    pub text: String,
    /// Images attached to a user turn.
    pub images: Vec<Image>,
    /// Files attached to a user turn.
    pub files: Vec<File>,
    /// Tool calls emitted by an assistant turn.
    pub tool_calls: Vec<ToolCall>,
}

impl Turn {
    /// Creates a text-only user turn.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, text.into())
    }

    /// Creates a text-only assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Assistant, text.into())
    }

    fn new(role: Role, text: String) -> Self {
        Self {
            role,
            text,
            images: vec![],
            files: vec![],
            tool_calls: vec![],
        }
    }

    /// Returns the text to replay for this turn. Assistant turns that only
    /// called tools are replayed as the JSON of their calls, since the
    /// caller never fed tool results back.
    pub fn replay_text(&self) -> String {
        if !self.text.is_empty() || self.tool_calls.is_empty() {
            return self.text.clone();
        }
        serde_json::to_string(&self.tool_calls).unwrap_or_default()
    }
}

/// One prompt turn in canonical form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    /// Optional system instruction.
    pub system: Option<String>,
    /// The primary user content. Must not be empty.
    pub user: String,
    /// Images attached to the user content.
    pub images: Vec<Image>,
    /// Previously uploaded files attached to the user content.
    pub files: Vec<File>,
    /// A JSON schema, as text, constraining the reply.
    pub schema: Option<String>,
    /// Tools the model may call.
    pub tools: Vec<Tool>,
    /// Generation settings.
    pub options: OptionSet,
    /// Earlier turns, oldest first.
    pub history: Vec<Turn>,
}

impl Request {
    /// Creates a request with the given user content.
    #[inline]
    pub fn new<S: Into<String>>(user: S) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    /// Sets the system instruction.
    #[inline]
    pub fn with_system<S: Into<String>>(mut self, system: S) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Attaches an image.
    #[inline]
    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    /// Attaches an uploaded file.
    #[inline]
    pub fn with_file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    /// Requests structured output conforming to `schema`.
    #[inline]
    pub fn with_schema<S: Into<String>>(mut self, schema: S) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Requests structured output conforming to the schema of `T`.
    pub fn with_schema_for<T: JsonSchema>(mut self) -> Self {
        self.schema = Some(schema_value_for::<T>().to_string());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the generation settings.
    #[inline]
    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    /// Sets the earlier turns of the conversation.
    #[inline]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Parses the schema, if any.
    ///
    /// An empty schema string counts as no schema.
    pub fn schema_value(&self) -> Result<Option<Value>> {
        let Some(schema) = self.schema.as_deref() else {
            return Ok(None);
        };
        if schema.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(schema)
            .map_err(|err| Error::schema("Schema", err.to_string()))?;
        if !value.is_object() {
            return Err(Error::schema("Schema", "schema must be a JSON object"));
        }
        Ok(Some(value))
    }

    /// Checks the local preconditions for sending this request to
    /// `provider`. Option support is checked separately by
    /// [`OptionSet::validate`].
    pub fn validate(&self, provider: ProviderName) -> Result<()> {
        if self.user.trim().is_empty() {
            return Err(Error::validation("User", "must not be empty"));
        }
        self.schema_value()?;

        for image in self.images.iter().chain(
            self.history.iter().flat_map(|turn| turn.images.iter()),
        ) {
            image.validate()?;
        }
        for file in self
            .files
            .iter()
            .chain(self.history.iter().flat_map(|turn| turn.files.iter()))
        {
            file.ensure_owned_by(provider)?;
        }

        let mut names = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(Error::validation("Tools", "tool name is empty"));
            }
            if !names.insert(tool.name.as_str()) {
                return Err(Error::validation(
                    "Tools",
                    format!("duplicate tool `{}`", tool.name),
                ));
            }
            if !tool.parameters.is_object() {
                return Err(Error::schema(
                    format!("Tools.{}.parameters", tool.name),
                    "parameters must be a JSON schema object",
                ));
            }
        }
        Ok(())
    }
}

fn schema_value_for<T: JsonSchema>() -> Value {
    let mut value = schema_for!(T).to_value();
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
    }
    value
}
