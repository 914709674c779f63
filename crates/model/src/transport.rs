use std::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::BoxError;

/// Headers whose values are never printed.
const SECRET_HEADERS: [&str; 3] = ["authorization", "x-api-key", "x-goog-api-key"];

/// A fully rendered HTTP request, ready to be sent with `POST`.
#[derive(Clone, PartialEq)]
pub struct WireRequest {
    /// The absolute URL, including any query string.
    pub url: String,
    /// Extra headers. `Content-Type` is derived from the body.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: WireBody,
}

impl WireRequest {
    /// Creates a JSON request.
    #[inline]
    pub fn json<S: Into<String>>(url: S, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: vec![],
            body: WireBody::Json(body),
        }
    }

    /// Creates a request with the given body.
    #[inline]
    pub fn with_body<S: Into<String>>(url: S, body: WireBody) -> Self {
        Self {
            url: url.into(),
            headers: vec![],
            body,
        }
    }

    /// Appends a header.
    #[inline]
    pub fn header<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the value of the first header named `name`, ignoring case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the URL without its query string, used to identify the
    /// endpoint in errors.
    pub fn endpoint(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// Returns the JSON body, if this is a JSON request.
    #[inline]
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            WireBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl Debug for WireRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let secret = SECRET_HEADERS
                    .iter()
                    .any(|s| k.eq_ignore_ascii_case(s));
                (k.as_str(), if secret { "<redacted>" } else { v.as_str() })
            })
            .collect();
        f.debug_struct("WireRequest")
            .field("url", &self.endpoint())
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// The body of a [`WireRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum WireBody {
    /// A JSON document.
    Json(Value),
    /// A `multipart/form-data` form.
    Multipart(Vec<FormPart>),
    /// Raw bytes with an explicit content type.
    Raw {
        /// The `Content-Type` header value.
        content_type: String,
        /// The bytes.
        data: Bytes,
    },
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub enum FormPart {
    /// A text field.
    Text {
        /// The field name.
        name: String,
        /// The field value.
        value: String,
    },
    /// A file field.
    File {
        /// The field name.
        name: String,
        /// The filename reported to the server.
        filename: String,
        /// The media type of the content.
        mime_type: String,
        /// The content.
        data: Bytes,
    },
}

/// The raw HTTP reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireReply {
    /// The HTTP status code.
    pub status: u16,
    /// The body bytes.
    pub body: Bytes,
}

impl WireReply {
    /// Creates a reply.
    #[inline]
    pub fn new<B: Into<Bytes>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for statuses below 400.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Performs one request/response exchange.
///
/// Implementations hold whatever connection state they need, the core
/// only ever calls [`Transport::send`]. A transport must not retry on its
/// own: failures are surfaced to the caller, who owns retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and waits for the complete reply.
    ///
    /// HTTP error statuses are not transport failures, they are returned
    /// as a normal [`WireReply`].
    async fn send(&self, request: WireRequest) -> Result<WireReply, BoxError>;
}
