//! Resource fetching for the style engine.
//!
//! The engine never blocks on the network. It hands a [`FetchRequest`] to a
//! [`ResourceFetcher`] and is told about the outcome later, when the embedder
//! feeds the completed [`FetchResponse`] back in. [`HttpFetcher`] is the
//! stock implementation: it performs blocking HTTP GETs (or decodes `data:`
//! URLs in-process) and parks the results until [`HttpFetcher::drain_completed`]
//! is called from the document's task loop.
//!
//! [Fetch Standard](https://fetch.spec.whatwg.org/)

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Wombat/0.1";

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// [§ 2.2.5 Requests](https://fetch.spec.whatwg.org/#concept-request-destination)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// `"font"`
    Font,
    /// `"style"`
    Style,
}

/// [§ 2.2.5 Requests](https://fetch.spec.whatwg.org/#concept-request-mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// `"cors"`
    Cors,
    /// `"no-cors"`
    NoCors,
}

/// A request issued by the engine. `token` is echoed back with the response
/// so the engine can route it to whoever asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Opaque routing token chosen by the requester.
    pub token: u64,
    /// Absolute URL to fetch.
    pub url: String,
    /// Request destination.
    pub destination: Destination,
    /// Request mode.
    pub mode: RequestMode,
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final URL.
    pub url: String,
    /// Essence of the `Content-Type` header, if the server sent one.
    pub mime_type: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

/// Reasons a fetch can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The `data:` URL was malformed or used an encoding we don't decode.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    /// The transport failed before a response arrived.
    #[error("request failed: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(u16),
}

/// A completed fetch, ready to be fed back into the engine.
#[derive(Debug)]
pub struct CompletedFetch {
    /// The token from the originating [`FetchRequest`].
    pub token: u64,
    /// The outcome.
    pub result: Result<FetchResponse, FetchError>,
}

/// The fetch collaborator. Implementations must not call back into the
/// style engine synchronously.
pub trait ResourceFetcher {
    /// Start fetching `request`. Fire-and-forget.
    fn fetch(&self, request: FetchRequest);

    /// Abort an outstanding fetch. Default is a no-op.
    fn cancel(&self, _token: u64) {}
}

/// A parsed `data:` URL that can be decoded into raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    /// The media type, e.g. `font/woff2`. Empty when omitted.
    pub mime_type: &'a str,
    /// Whether the payload is base64.
    pub base64: bool,
    /// The payload after the comma.
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a `data:` URL into its parts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidDataUrl`] if the URL has no `data:`
    /// prefix or no comma.
    pub fn parse(raw: &'a str) -> Result<Self, FetchError> {
        let rest = raw
            .strip_prefix("data:")
            .ok_or_else(|| FetchError::InvalidDataUrl("missing data: scheme".to_string()))?;
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| FetchError::InvalidDataUrl("missing comma".to_string()))?;
        let (mime_type, base64) = metadata
            .strip_suffix(";base64")
            .map_or((metadata, false), |mime| (mime, true));
        Ok(Self {
            mime_type: mime_type.split(';').next().unwrap_or_default().trim(),
            base64,
            payload,
        })
    }

    /// Decode the payload.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidDataUrl`] if base64 decoding fails or the
    /// payload is percent-encoded with invalid escapes.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        if self.base64 {
            return base64::engine::general_purpose::STANDARD
                .decode(self.payload.trim())
                .map_err(|e| FetchError::InvalidDataUrl(format!("base64 decode error: {e}")));
        }
        percent_decode(self.payload)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| FetchError::InvalidDataUrl(format!("bad escape at {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Blocking HTTP fetcher that queues its results.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    completed: Mutex<VecDeque<CompletedFetch>>,
}

impl HttpFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every completed fetch, oldest first.
    pub fn drain_completed(&self) -> Vec<CompletedFetch> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    fn perform(request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if request.url.starts_with("data:") {
            let data_url = DataUrl::parse(&request.url)?;
            return Ok(FetchResponse {
                url: request.url.clone(),
                mime_type: (!data_url.mime_type.is_empty()).then(|| data_url.mime_type.to_string()),
                body: data_url.decode()?,
            });
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;

        let mut builder = client.get(&request.url).header("User-Agent", USER_AGENT);
        if request.mode == RequestMode::Cors {
            builder = builder.header("Sec-Fetch-Mode", "cors");
        }
        if request.destination == Destination::Font {
            builder = builder.header("Sec-Fetch-Dest", "font");
        }
        let response = builder
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase());
        let url = response.url().to_string();
        let body = response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Network(format!("failed to read response body: {e}")))?;
        Ok(FetchResponse {
            url,
            mime_type,
            body,
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, request: FetchRequest) {
        log::debug!(target: "wombat::fetch", "fetching {}", request.url);
        let result = Self::perform(&request);
        if let Err(error) = &result {
            log::warn!(target: "wombat::fetch", "fetch of {} failed: {error}", request.url);
        }
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(CompletedFetch {
                token: request.token,
                result,
            });
    }
}
