//! One API for prompting Anthropic, OpenAI, Google and Grok models.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library: build a [`Provider`] and a [`Request`], then
//! call [`prompt`], or keep a conversation going with an [`Agent`].
//!
//! ```no_run
//! use lingua::{Context, HttpTransport, Provider, ProviderName, Request};
//! use lingua::{TransportConfig, prompt};
//!
//! # async fn run() -> lingua::Result<()> {
//! let transport = HttpTransport::new(&TransportConfig::default())?;
//! let provider = Provider::new(ProviderName::Anthropic, "sk-ant-...");
//! let resp = prompt(
//!     &Context::background(),
//!     &transport,
//!     &provider,
//!     &Request::new("2+2?"),
//! )
//! .await?;
//! println!("{}", resp.text);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[cfg(feature = "cli")]
pub mod settings;

pub use lingua_core::{
    Agent, AgentBuilder, Attachment, Context, Conversation, HttpTransport,
    SharedAgent, TransportConfig, TransportConfigBuilder, Window, prompt,
    upload_file,
};
pub use lingua_model::{
    Error, ErrorKind, File, FileUpload, FinishReason, Image, OptionSet,
    Provider, ProviderName, Request, RequestFailure, Response, Result, Role,
    Tokens, Tool, ToolCall, Turn,
};

/// Re-exports of [`lingua_core`] crate.
pub mod core {
    pub use lingua_core::*;
}

/// Re-exports of [`lingua_model`] crate.
pub mod model {
    pub use lingua_model::*;
}
