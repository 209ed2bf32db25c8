use crate::http::headers::is_token;
use crate::http::request::Method;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("request method is not a valid token")]
    InvalidMethod,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("unsupported Transfer-Encoding {0:?}")]
    UnsupportedTransferEncoding(String),
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("incomplete request head")]
    Incomplete,
}

/// Request line and headers of one transaction, as read off the wire.
///
/// The body is not part of the head; the connection drains it separately
/// so handlers can start before it has fully arrived.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub version: String,
    /// Header lines in arrival order.
    pub headers: Vec<(String, String)>,
    pub content_length: usize,
}

impl RequestHead {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a request head from the front of `buf`.
///
/// Returns the head and the number of bytes it occupied, including the
/// blank line. `max_head` bounds how far we scan for the terminator.
pub fn parse_request_head(buf: &[u8], max_head: usize) -> Result<(RequestHead, usize), ParseError> {
    let headers_end = match find_headers_end(buf) {
        Some(end) if end + 4 <= max_head => end,
        Some(_) => return Err(ParseError::HeadTooLarge(max_head)),
        None if buf.len() > max_head => return Err(ParseError::HeadTooLarge(max_head)),
        None => return Err(ParseError::Incomplete),
    };

    let headers_str = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() || !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    // Headers
    let mut headers = Vec::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        let key = key.trim();
        if !is_token(key) {
            return Err(ParseError::InvalidHeader);
        }

        headers.push((key.to_string(), value.trim().to_string()));
    }

    let mut head = RequestHead {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        content_length: 0,
    };

    // Bodies are only framed by Content-Length.
    if let Some(coding) = head.header("Transfer-Encoding") {
        return Err(ParseError::UnsupportedTransferEncoding(coding.to_string()));
    }

    head.content_length = head
        .header("Content-Length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    Ok((head, headers_end + 4))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
