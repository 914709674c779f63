use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Error, File, FileUpload, ImageSource, Provider, ProviderName,
    RequestFailure, Request, Response, Result, Transport, WireReply,
    WireRequest,
};

/// A provider with every default resolved, as seen by an adapter.
#[derive(Clone, Copy, Debug)]
pub struct Target<'a> {
    /// The vendor.
    pub name: ProviderName,
    /// The API key.
    pub api_key: &'a str,
    /// The model to call.
    pub model: &'a str,
    /// The endpoint root, without a trailing slash.
    pub base_url: &'a str,
}

impl<'a> Target<'a> {
    /// Resolves `provider`, failing for unknown vendors.
    pub fn resolve(provider: &'a Provider) -> Result<Self> {
        let name = provider.kind()?;
        let (Some(model), Some(base_url)) =
            (provider.model(), provider.base_url())
        else {
            return Err(Error::validation(
                "Name",
                format!("unsupported provider `{}`", provider.name()),
            ));
        };
        if model.trim().is_empty() {
            return Err(Error::validation("Model", "model name is empty"));
        }
        Ok(Self {
            name,
            api_key: provider.api_key(),
            model,
            base_url,
        })
    }

    /// Joins `path` onto the base URL.
    #[inline]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Translates canonical requests and replies to and from one vendor's wire
/// format.
///
/// Adapters are stateless: every call gets what it needs through its
/// arguments, so one instance serves any number of concurrent calls.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// The vendor this adapter speaks to.
    fn name(&self) -> ProviderName;

    /// Renders a chat request into the vendor's payload and headers.
    fn render(&self, target: &Target<'_>, request: &Request)
    -> Result<WireRequest>;

    /// Parses a chat reply. `endpoint` identifies the call in errors.
    fn parse(&self, endpoint: &str, reply: &WireReply) -> Result<Response>;

    /// Renders a file upload.
    fn render_upload(
        &self,
        target: &Target<'_>,
        upload: &FileUpload,
    ) -> Result<WireRequest>;

    /// Parses the reply to a file upload.
    fn parse_upload(
        &self,
        endpoint: &str,
        reply: &WireReply,
        upload: &FileUpload,
    ) -> Result<File>;

    /// Performs the exchange. Transport failures become request errors,
    /// HTTP error statuses are left for `parse`.
    async fn dispatch(
        &self,
        transport: &dyn Transport,
        request: WireRequest,
    ) -> Result<WireReply> {
        trace!("dispatching to {}", request.endpoint());
        transport
            .send(request)
            .await
            .map_err(|err| {
                Error::request("dispatch", RequestFailure::Transport(err))
            })
    }

    /// Fragments of a 400 error message that point at the structured-output
    /// schema, e.g. the request field the schema travels in.
    fn schema_markers(&self) -> &'static [&'static str] {
        &[]
    }

    /// Maps an HTTP error status to an [`Error::Api`].
    fn check_status(&self, endpoint: &str, reply: &WireReply) -> Result<()> {
        if reply.is_success() {
            return Ok(());
        }
        Err(Error::Api {
            provider: self.name(),
            status: reply.status,
            message: error_message(&reply.body),
            endpoint: endpoint.to_owned(),
        })
    }
}

/// Extracts a human-readable message from a vendor error body.
///
/// Vendors disagree on the envelope (`{"error": {"message": ..}}`,
/// `{"error": ".."}`, `{"message": ..}`), all of them are tried before
/// falling back to the raw text.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let candidates = [
            value.pointer("/error/message"),
            value.get("error").filter(|v| v.is_string()),
            value.get("message"),
            value.pointer("/0/error/message"),
        ];
        if let Some(message) =
            candidates.into_iter().flatten().find_map(Value::as_str)
        {
            return message.to_owned();
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "no error details".to_owned();
    }
    text.chars().take(512).collect()
}

/// Turns a 400 rejection whose message names one of `markers` into an
/// [`Error::Schema`]. Any other error is returned unchanged.
pub fn schema_rejection(err: Error, markers: &[&str]) -> Error {
    match err {
        Error::Api {
            status: 400,
            message,
            ..
        } if markers.iter().any(|marker| message.contains(marker)) => {
            Error::schema("Schema", message)
        }
        err => err,
    }
}

/// Decodes a JSON reply body.
pub fn decode_json<T: DeserializeOwned>(
    operation: &str,
    reply: &WireReply,
) -> Result<T> {
    serde_json::from_slice(&reply.body)
        .map_err(|err| Error::decode(operation, err.to_string()))
}

impl ImageSource {
    /// Returns inline bytes as standard base64, or `None` for URLs.
    pub fn base64(&self) -> Option<String> {
        match self {
            ImageSource::Inline(data) => Some(STANDARD.encode(data)),
            ImageSource::Url(_) => None,
        }
    }
}
