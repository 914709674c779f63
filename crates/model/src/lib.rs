//! The canonical request/response contract shared by every provider.
//!
//! This crate establishes a vendor-neutral protocol for prompting large
//! language models: a [`Request`] goes in, a [`Response`] comes out, and
//! [`Error`] tells apart local validation failures from vendor rejections
//! and transport trouble. Adapter crates implement [`ProviderAdapter`] to
//! translate that contract into one vendor's wire format.
//!
//! Types in this crate perform no I/O, the exchange itself goes through a
//! caller-supplied [`Transport`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod adapter;
pub mod capability;
mod error;
mod file;
mod options;
mod provider;
mod request;
mod response;
mod transport;

pub use adapter::*;
pub use capability::{Capability, Limits, OptionKey, Overflow, capability};
pub use error::*;
pub use file::*;
pub use options::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use transport::*;
