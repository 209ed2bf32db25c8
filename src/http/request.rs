use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;

use crate::http::headers::{is_token, Headers};
use crate::http::parser::RequestHead;
use crate::http::response::Origin;

/// HTTP request methods.
///
/// The common methods get their own variants; any other valid token is
/// carried through as [`Method::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Method {
    /// GET - Retrieve a resource
    #[default]
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other method token, e.g. `TRACE` or `PROPFIND`
    Other(String),
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Returns `None` only when `s` is not a valid method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use fetchlet::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("TRACE"), Some(Method::Other("TRACE".to_string())));
    /// assert_eq!(Method::from_str("G T"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            other if is_token(other) => Some(Method::Other(other.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reading a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("connection closed before the request body was fully received")]
    Interrupted,
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("request body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Progress of a transaction's body as seen by its accessors.
#[derive(Debug, Clone)]
pub enum BodyState {
    Pending,
    Complete(Bytes),
    TooLarge(usize),
}

pub type BodySender = watch::Sender<BodyState>;
pub type BodyReceiver = watch::Receiver<BodyState>;

pub fn body_channel() -> (BodySender, BodyReceiver) {
    watch::channel(BodyState::Pending)
}

fn settled(body: Bytes) -> BodyReceiver {
    // The sender is dropped straight away; receivers still observe the value.
    watch::channel(BodyState::Complete(body)).1
}

/// Normalized request handed to endpoint handlers.
///
/// A fresh `Request` is built for every transaction and is never reused.
/// The body accessors [`Request::text`] and [`Request::json`] wait until the
/// connection has received the whole body.
#[derive(Debug, Clone)]
pub struct Request {
    pub headers: Headers,
    /// Raw request target, including any query string.
    pub path: String,
    pub method: Method,
    pub version: String,
    /// Handle to the transaction this request arrived on. `None` for
    /// requests built by hand.
    pub origin: Option<Origin>,
    body: BodyReceiver,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            headers: Headers::new(),
            path: String::new(),
            method: Method::GET,
            version: "HTTP/1.1".to_string(),
            origin: None,
            body: settled(Bytes::new()),
        }
    }
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills this request in from a parsed head and the transaction it
    /// belongs to.
    pub fn translate(&mut self, head: RequestHead, origin: Origin, body: BodyReceiver) {
        self.origin = Some(origin);
        self.headers.populate(head.headers, true);
        self.path = head.path;
        self.method = head.method;
        self.version = head.version;
        self.body = body;
    }

    /// Resolves to the full body as text once it has been received.
    pub async fn text(&self) -> Result<String, BodyError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolves to the body parsed as JSON once it has been received.
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        let mut rx = self.body.clone();
        loop {
            if let Some(result) = Self::poll_body(&mut rx) {
                return result;
            }
            if rx.changed().await.is_err() {
                // Sender is gone; a final value may still have landed.
                return Self::poll_body(&mut rx).unwrap_or(Err(BodyError::Interrupted));
            }
        }
    }

    fn poll_body(rx: &mut BodyReceiver) -> Option<Result<Bytes, BodyError>> {
        match &*rx.borrow_and_update() {
            BodyState::Pending => None,
            BodyState::Complete(bytes) => Some(Ok(bytes.clone())),
            BodyState::TooLarge(limit) => Some(Err(BodyError::TooLarge(*limit))),
        }
    }

    pub fn header(&self, key: &str) -> Option<String> {
        self.headers.get_str(key)
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless the client sent
    /// `Connection: close`; HTTP/1.0 needs an explicit `keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let tokens = self.header("Connection").unwrap_or_default().to_ascii_lowercase();
        let has = |token: &str| tokens.split(',').any(|t| t.trim() == token);

        if has("close") {
            false
        } else if self.version == "HTTP/1.0" {
            has("keep-alive")
        } else {
            true
        }
    }
}

/// Builder for requests that do not come off a socket.
///
/// Built requests carry no origin, so responding to them performs no I/O.
#[derive(Default)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    headers: Headers,
    body: Bytes,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.headers.set(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request {
            headers: self.headers,
            path: self.path,
            method: self.method,
            version: "HTTP/1.1".to_string(),
            origin: None,
            body: settled(self.body),
        }
    }
}
