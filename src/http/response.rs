use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::http::headers::{HeaderError, Headers};
use crate::http::request::Request;

/// Numeric HTTP status code.
///
/// Handlers may use any code; the well-known ones get their standard
/// reason phrase on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);

    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fetchlet::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the standard reason phrase, or an empty string for codes
    /// without one.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            413 => "Payload Too Large",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status and headers supplied alongside a response body.
#[derive(Debug, Clone, Default)]
pub struct ResponseInit {
    /// `None` or `0` means 200.
    pub status: Option<u16>,
    pub headers: Headers,
}

impl ResponseInit {
    pub fn new(status: u16) -> Self {
        Self {
            status: Some(status),
            headers: Headers::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.headers.set(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }
}

/// Immutable description of a response: status, headers and body.
///
/// Building one performs no I/O. It reaches the client only when emitted
/// on the transaction it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: String,
}

impl Response {
    pub fn new(body: impl Into<String>, init: ResponseInit) -> Self {
        let status = match init.status {
            Some(code) if code != 0 => StatusCode(code),
            _ => StatusCode::OK,
        };

        Self {
            status,
            headers: init.headers,
            body: body.into(),
        }
    }

    /// Sends this response on the transaction `request` arrived on.
    ///
    /// Requests without an origin make this a no-op.
    pub fn emit(self, request: &Request) -> Result<(), EmitError> {
        match &request.origin {
            Some(origin) => origin.emit(self),
            None => Ok(()),
        }
    }

    /// The fixed reply for paths with no registered handler.
    pub fn not_found(path: &str) -> Self {
        Self::plain(StatusCode::NOT_FOUND, format!("404: Not Found! ({path})"))
    }

    pub fn bad_request() -> Self {
        Self::plain(StatusCode::BAD_REQUEST, "400: Bad Request")
    }

    /// Sent for request features the server does not handle, such as
    /// chunked request bodies.
    pub fn not_implemented() -> Self {
        Self::plain(StatusCode::NOT_IMPLEMENTED, "501: Not Implemented")
    }

    pub fn internal_error() -> Self {
        Self::plain(StatusCode::INTERNAL_SERVER_ERROR, "500: Internal Server Error")
    }

    fn plain(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(
            body,
            ResponseInit::new(status.as_u16()).header("Content-Type", "text/plain"),
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("a response was already sent for this request")]
    AlreadySent,
    #[error("the connection for this request is gone")]
    Closed,
    #[error(transparent)]
    InvalidHeader(#[from] HeaderError),
}

/// Write-once handle to the transaction a request arrived on.
///
/// Clones share the same slot, so only the first emit across all clones
/// reaches the connection.
#[derive(Clone)]
pub struct Origin {
    slot: Arc<Mutex<Option<oneshot::Sender<Response>>>>,
}

impl Origin {
    /// Creates an origin and the receiver the connection waits on.
    pub fn channel() -> (Origin, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        let origin = Origin {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (origin, rx)
    }

    /// Hands `response` to the connection. Responses with headers that
    /// cannot be written are refused and leave the slot unused.
    pub fn emit(&self, response: Response) -> Result<(), EmitError> {
        response.headers.validate()?;

        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(EmitError::AlreadySent)?;

        sender.send(response).map_err(|_| EmitError::Closed)
    }

    pub fn is_sent(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Origin")
            .field("sent", &self.is_sent())
            .finish()
    }
}

/// Response constructor bound to one request.
///
/// Handlers receive this next to their [`Request`] and use it to answer
/// without passing the request back in.
#[derive(Debug, Clone)]
pub struct Responder {
    origin: Option<Origin>,
}

impl Responder {
    pub fn new(request: &Request) -> Self {
        Self {
            origin: request.origin.clone(),
        }
    }

    /// Builds a response from `body` and `init` and emits it.
    pub fn send(&self, body: impl Into<String>, init: ResponseInit) -> Result<(), EmitError> {
        self.respond(Response::new(body, init))
    }

    pub fn respond(&self, response: Response) -> Result<(), EmitError> {
        match &self.origin {
            Some(origin) => origin.emit(response),
            None => Ok(()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.origin.as_ref().is_some_and(Origin::is_sent)
    }
}
