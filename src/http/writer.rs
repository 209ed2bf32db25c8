use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders the status line, collapsed headers and body.
///
/// `Content-Length` is filled in unless the handler set one, and
/// `Connection: close` is added when the connection will not be reused.
/// Replies to `HEAD` pass `head_only` and carry no body, though
/// `Content-Length` still reports the body the `GET` would have sent.
pub fn serialize_response(resp: &Response, keep_alive: bool, head_only: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    let mut headers = resp.headers.collapse();
    if !resp.headers.contains("Content-Length") {
        headers.push(("Content-Length".to_string(), resp.body.len().to_string()));
    }
    if !keep_alive && !resp.headers.contains("Connection") {
        headers.push(("Connection".to_string(), "close".to_string()));
    }

    for (k, v) in &headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if !head_only {
        buf.extend_from_slice(resp.body.as_bytes());
    }

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response, keep_alive: bool, head_only: bool) -> Self {
        Self {
            buffer: serialize_response(response, keep_alive, head_only),
            written: 0,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
