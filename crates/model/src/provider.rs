use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifies one of the supported vendors.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API.
    #[serde(rename = "openai")]
    OpenAI,
    /// Google Gemini API.
    Google,
    /// xAI Grok API.
    Grok,
}

impl ProviderName {
    /// All known providers, in a stable order.
    pub const ALL: [ProviderName; 4] = [
        ProviderName::Anthropic,
        ProviderName::OpenAI,
        ProviderName::Google,
        ProviderName::Grok,
    ];

    /// Returns the lowercase identifier of this provider.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "anthropic",
            ProviderName::OpenAI => "openai",
            ProviderName::Google => "google",
            ProviderName::Grok => "grok",
        }
    }

    /// Returns the model used when the caller doesn't pick one.
    #[inline]
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "claude-sonnet-4-20250514",
            ProviderName::OpenAI => "gpt-4.1-mini",
            ProviderName::Google => "gemini-2.5-flash",
            ProviderName::Grok => "grok-3",
        }
    }

    /// Returns the vendor's public endpoint root.
    #[inline]
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderName::Anthropic => "https://api.anthropic.com",
            ProviderName::OpenAI => "https://api.openai.com/v1",
            ProviderName::Google => "https://generativelanguage.googleapis.com",
            ProviderName::Grok => "https://api.x.ai/v1",
        }
    }
}

impl Display for ProviderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderName::Anthropic),
            "openai" | "chatgpt" => Ok(ProviderName::OpenAI),
            "google" | "gemini" => Ok(ProviderName::Google),
            "grok" | "xai" => Ok(ProviderName::Grok),
            _ => Err(Error::validation(
                "Name",
                format!("unsupported provider `{s}`"),
            )),
        }
    }
}

/// A provider selection: which vendor to call and how to reach it.
///
/// This is an immutable value. Build it once and reuse it across calls, or
/// build a fresh one per call, both are fine.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Provider {
    name: String,
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl Provider {
    /// Creates a provider for a known vendor.
    #[inline]
    pub fn new<K: Into<String>>(name: ProviderName, api_key: K) -> Self {
        Self::named(name.as_str(), api_key)
    }

    /// Creates a provider from a raw vendor identifier.
    ///
    /// Unknown identifiers are accepted here and rejected when a request is
    /// attempted.
    #[inline]
    pub fn named<N: Into<String>, K: Into<String>>(name: N, api_key: K) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            model: None,
            base_url: None,
        }
    }

    /// Overrides the default model.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Points the provider at a compatible self-hosted or proxy endpoint.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Returns the raw vendor identifier.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the vendor identifier against the known set.
    #[inline]
    pub fn kind(&self) -> Result<ProviderName> {
        self.name.parse()
    }

    /// Returns the API key.
    #[inline]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the model to call: the override if set, otherwise the
    /// vendor's default. Unknown vendors have no default.
    pub fn model(&self) -> Option<&str> {
        match &self.model {
            Some(model) => Some(model),
            None => self.kind().ok().map(ProviderName::default_model),
        }
    }

    /// Returns the endpoint root without a trailing slash.
    pub fn base_url(&self) -> Option<&str> {
        match &self.base_url {
            Some(url) => Some(url.trim_end_matches('/')),
            None => self.kind().ok().map(ProviderName::default_base_url),
        }
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
