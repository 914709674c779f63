use std::error::Error as StdError;

use thiserror::Error;

use crate::ProviderName;

/// A boxed error from a lower layer, typically the HTTP client.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A specialized `Result` type for this crate and the adapters.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The kind of error that occurred.
///
/// Each kind maps to exactly one variant of [`Error`], callers can branch
/// on it without matching the variant fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The vendor rejected or failed the request.
    Api,
    /// A local precondition failed before any network I/O.
    Validation,
    /// Building or transmitting the request failed below the application
    /// layer.
    Request,
    /// A structured-output schema could not be used.
    Schema,
}

/// The error type for every operation of the provider abstraction.
#[derive(Debug, Error)]
pub enum Error {
    /// The vendor answered with an HTTP status >= 400.
    #[error("{provider} API error ({status}) at {endpoint}: {message}")]
    Api {
        /// The provider that answered.
        provider: ProviderName,
        /// The HTTP status code, preserved verbatim.
        status: u16,
        /// The message extracted from the vendor's error body.
        message: String,
        /// The endpoint that was called, without query parameters.
        endpoint: String,
    },
    /// A local precondition failed.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending field or option setter.
        field: String,
        /// What is wrong with it.
        message: String,
    },
    /// The request could not be built, sent or decoded.
    #[error("{operation} failed: {source}")]
    Request {
        /// The operation that failed, e.g. `dispatch` or `upload`.
        operation: String,
        /// The underlying cause.
        #[source]
        source: RequestFailure,
    },
    /// The structured-output schema is malformed or was rejected.
    #[error("schema error in {field}: {message}")]
    Schema {
        /// The schema location.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// The cause of an [`Error::Request`].
#[derive(Debug, Error)]
pub enum RequestFailure {
    /// The caller cancelled the call while it was outstanding.
    #[error("request cancelled")]
    Cancelled,
    /// The caller's deadline expired while the call was outstanding.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The payload could not be serialized.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    /// A local file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The transport failed to complete the exchange.
    #[error(transparent)]
    Transport(BoxError),
    /// A successful reply could not be decoded.
    #[error("malformed reply: {0}")]
    Decode(String),
}

impl Error {
    /// Creates a validation error.
    #[inline]
    pub fn validation(
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a schema error.
    #[inline]
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a request error.
    #[inline]
    pub fn request(
        operation: impl Into<String>,
        source: impl Into<RequestFailure>,
    ) -> Self {
        Self::Request {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Creates a request error for a reply that could not be decoded.
    #[inline]
    pub fn decode(
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::request(operation, RequestFailure::Decode(message.into()))
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api { .. } => ErrorKind::Api,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Request { .. } => ErrorKind::Request,
            Error::Schema { .. } => ErrorKind::Schema,
        }
    }

    /// Returns the field name carried by validation and schema errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } | Error::Schema { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    /// Returns the HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the call was abandoned because of cancellation or
    /// an expired deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Request {
                source: RequestFailure::Cancelled
                    | RequestFailure::DeadlineExceeded,
                ..
            }
        )
    }
}
