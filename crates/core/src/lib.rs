//! Core logic including the dispatcher, the stateful agent, call contexts
//! and the HTTP transport.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
mod context;
pub mod conversation;
mod dispatcher;
mod http;

pub use agent::{Agent, AgentBuilder, Attachment, SharedAgent};
pub use context::Context;
pub use conversation::{Conversation, Window};
pub use dispatcher::{adapter_for, prompt, upload_file};
pub use http::{HttpTransport, TransportConfig, TransportConfigBuilder};
