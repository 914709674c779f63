//! The HTTP transport.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use lingua_model::{
    BoxError, Error, FormPart, RequestFailure, Result, Transport, WireBody,
    WireReply, WireRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, header};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for [`TransportConfig`].
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct TransportConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    proxy: Option<String>,
    log_bodies: bool,
}

impl TransportConfigBuilder {
    /// Creates a builder with every setting at its default.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overall timeout of one exchange.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout for establishing a connection.
    #[inline]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Routes every exchange through a proxy. The URL may carry
    /// credentials.
    #[inline]
    pub fn with_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Logs request and reply bodies at `debug` level.
    #[inline]
    pub fn with_log_bodies(mut self, log_bodies: bool) -> Self {
        self.log_bodies = log_bodies;
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| {
                concat!("lingua/", env!("CARGO_PKG_VERSION")).to_owned()
            }),
            proxy: self.proxy,
            log_bodies: self.log_bodies,
        }
    }
}

impl Debug for TransportConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfigBuilder")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.proxy.as_ref().map(|_| "<redacted>"))
            .field("log_bodies", &self.log_bodies)
            .finish()
    }
}

/// Configuration for [`HttpTransport`].
///
/// This is the only place process-wide HTTP settings live. The dispatcher
/// never sees it, only the transport built from it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TransportConfig {
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) proxy: Option<String>,
    pub(crate) log_bodies: bool,
}

impl Default for TransportConfig {
    #[inline]
    fn default() -> Self {
        TransportConfigBuilder::new().build()
    }
}

impl Debug for TransportConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.proxy.as_ref().map(|_| "<redacted>"))
            .field("log_bodies", &self.log_bodies)
            .finish()
    }
}

/// A [`Transport`] over HTTPS, backed by a pooled `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    log_bodies: bool,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str());
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|err| build_error(err.into()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|err| build_error(err.into()))?;
        Ok(Self {
            client,
            log_bodies: config.log_bodies,
        })
    }
}

fn build_error(err: BoxError) -> Error {
    Error::request("build transport", RequestFailure::Transport(err))
}

fn create_form(parts: Vec<FormPart>) -> Result<Form, BoxError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                filename,
                mime_type,
                data,
            } => {
                let part = Part::bytes(data.to_vec())
                    .file_name(filename)
                    .mime_str(&mime_type)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<WireReply, BoxError> {
        let WireRequest { url, headers, body } = request;
        trace!("POST {url}");

        let mut builder = self.client.post(&url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder = match body {
            WireBody::Json(value) => {
                if self.log_bodies {
                    debug!("request body: {value}");
                }
                builder.json(&value)
            }
            WireBody::Multipart(parts) => {
                if self.log_bodies {
                    debug!("request body: multipart form with {} parts", parts.len());
                }
                builder.multipart(create_form(parts)?)
            }
            WireBody::Raw { content_type, data } => {
                if self.log_bodies {
                    debug!("request body: {} bytes of {content_type}", data.len());
                }
                builder.header(header::CONTENT_TYPE, content_type).body(data)
            }
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        if self.log_bodies {
            debug!("reply body ({status}): {}", String::from_utf8_lossy(&body));
        }
        Ok(WireReply { status, body })
    }
}
