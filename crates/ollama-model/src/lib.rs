//! A model provider for a locally hosted Ollama server.
//!
//! Besides the [`ModelProvider`] implementation backed by `/api/chat`,
//! [`OllamaProvider`] exposes the handful of management calls the demo
//! programs need: a connection check, model listing and pulling, plain
//! text generation and JSON-mode questions.

#[macro_use]
extern crate tracing;

mod api;
mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::fs;
use std::sync::Arc;

use local_agent_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Certificate, Client, Response, StatusCode, header};

pub use api::DEFAULT_JSON_SYSTEM_MESSAGE;
pub use config::{
    DEFAULT_HOST, DEFAULT_MODEL, OllamaConfig, OllamaConfigBuilder,
};
use io::{Chunks, NdJson};
pub use proto::{ModelInfo, PullProgress};
pub use response::OllamaResponse;

/// Error type for [`OllamaProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() || err.is_timeout() {
            ErrorKind::Connection
        } else if err.is_decode() {
            ErrorKind::InvalidResponse
        } else {
            ErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Ollama model provider.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` with the given configuration.
    ///
    /// A CA bundle that cannot be loaded is reported and skipped, the
    /// client then trusts the default roots only.
    pub fn new(config: OllamaConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(path) = &config.ca_bundle {
            match fs::read(path)
                .map_err(|err| err.to_string())
                .and_then(|pem| {
                    Certificate::from_pem(&pem).map_err(|err| err.to_string())
                }) {
                Ok(cert) => {
                    debug!("trusting extra roots from {}", path.display());
                    builder = builder.add_root_certificate(cert);
                }
                Err(err) => {
                    warn!("ignoring CA bundle {}: {err}", path.display());
                }
            }
        }
        let client = builder.build().unwrap_or_else(|err| {
            warn!("falling back to a default HTTP client: {err}");
            Client::new()
        });

        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

impl ModelProvider for OllamaProvider {
    type Error = Error;
    type Response = OllamaResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let chat_req = proto::create_chat_request(req, &self.config);
        let resp_fut = self
            .client
            .post(self.config.endpoint("/api/chat"))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&chat_req)
            .send();

        async move {
            let resp = check_response(resp_fut.await).await?;
            Ok(OllamaResponse::from_lines(NdJson::new(
                Chunks::from_response(resp),
            )))
        }
    }
}

/// Turns transport failures, error statuses and unexpected content types
/// into [`Error`]s.
async fn check_response(
    resp: Result<Response, reqwest::Error>,
) -> Result<Response, Error> {
    let resp = resp.map_err(Error::from_reqwest)?;

    let status = resp.status();
    if !status.is_success() {
        let kind = if status == StatusCode::TOO_MANY_REQUESTS {
            ErrorKind::RateLimitExceeded
        } else {
            ErrorKind::Other
        };
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(ToOwned::to_owned))
            .unwrap_or(body);
        return Err(Error::new(format!("HTTP {status}: {detail}"), kind));
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let is_valid_content_type = content_type
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| {
            let subtype = m.subtype().as_str();
            subtype == "x-ndjson" || subtype == "json"
        })
        .unwrap_or(false);
    if !is_valid_content_type {
        return Err(Error::new(
            format!("Unexpected content type: {content_type:?}"),
            ErrorKind::InvalidResponse,
        ));
    }

    Ok(resp)
}
