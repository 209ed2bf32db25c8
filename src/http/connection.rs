use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::http::parser::{parse_request_head, ParseError, RequestHead};
use crate::http::request::{body_channel, BodySender, BodyState, Method, Request};
use crate::http::response::{Origin, Response};
use crate::http::writer::ResponseWriter;
use crate::routing::Dispatcher;

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    dispatcher: Arc<Dispatcher>,
    max_head_bytes: usize,
    max_body_bytes: usize,
    /// Body still owed to a handler that answered before it arrived.
    pending_body: Option<(usize, BodySender)>,
}

pub enum ConnectionState {
    Reading,
    Processing(RequestHead),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, dispatcher: Arc<Dispatcher>, config: &Config) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            dispatcher,
            max_head_bytes: config.max_head_bytes,
            max_body_bytes: config.max_body_bytes,
            pending_body: None,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_head().await {
                        Ok(Some(head)) => ConnectionState::Processing(head),
                        Ok(None) => ConnectionState::Closed,
                        Err(e) => match e.downcast_ref::<ParseError>() {
                            Some(ParseError::UnsupportedTransferEncoding(coding)) => {
                                warn!(%coding, "Rejecting request with unsupported transfer coding");
                                let writer = ResponseWriter::new(&Response::not_implemented(), false, false);
                                ConnectionState::Writing(writer, false)
                            }
                            Some(_) => {
                                warn!(error = %e, "Rejecting malformed request");
                                let writer = ResponseWriter::new(&Response::bad_request(), false, false);
                                ConnectionState::Writing(writer, false)
                            }
                            None => return Err(e),
                        },
                    };
                }

                ConnectionState::Processing(head) => {
                    let head_only = head.method == Method::HEAD;
                    let (response, keep_alive) = self.process(head).await?;

                    let writer = ResponseWriter::new(&response, keep_alive, head_only);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(mut writer, mut keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    // The handler may still be waiting on its body.
                    if let Some((len, tx)) = self.pending_body.take() {
                        if let Err(e) = self.drain_body(len, &tx).await {
                            debug!(error = %e, "Body not received after response");
                            keep_alive = false;
                        }
                    }

                    if keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    }
                }

                ConnectionState::Closed => {
                    // Peer may already be gone.
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Runs one transaction: dispatches the request while the body is
    /// drained and returns as soon as the handler has responded.
    ///
    /// A body that has not fully arrived by then is left in
    /// `pending_body` and finished after the response is written.
    async fn process(&mut self, head: RequestHead) -> anyhow::Result<(Response, bool)> {
        let (origin, mut sent) = Origin::channel();
        let (body_tx, body_rx) = body_channel();
        let content_length = head.content_length;

        let mut request = Request::new();
        request.translate(head, origin, body_rx);

        // An unread body would be taken for the next request.
        let keep_alive = request.keep_alive() && content_length <= self.max_body_bytes;
        let method = request.method.clone();
        let path = request.path.clone();

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(request).await;
            debug!(outcome = ?outcome, "Dispatch finished");
        });

        let mut drained = false;
        let received = {
            let drain = self.drain_body(content_length, &body_tx);
            tokio::pin!(drain);

            loop {
                tokio::select! {
                    biased;
                    received = &mut sent => break received,
                    result = &mut drain, if !drained => {
                        result?;
                        drained = true;
                    }
                }
            }
        };

        if !drained {
            self.pending_body = Some((content_length, body_tx));
        }

        // Every origin clone was dropped without a send.
        let response = received.unwrap_or_else(|_| {
            error!(%method, %path, "No response was produced for request");
            Response::internal_error()
        });

        debug!(
            %method,
            %path,
            status = response.status.as_u16(),
            "Request handled"
        );

        Ok((response, keep_alive))
    }

    pub async fn read_head(&mut self) -> anyhow::Result<Option<RequestHead>> {
        loop {
            // Try parsing whatever we already have
            match parse_request_head(&self.buffer, self.max_head_bytes) {
                Ok((head, consumed)) => {
                    // Remove consumed bytes
                    self.buffer.advance(consumed);
                    return Ok(Some(head));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Err(e.into()),
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if !self.buffer.is_empty() {
                    debug!(pending = self.buffer.len(), "Client closed mid-request");
                }
                return Ok(None);
            }
        }
    }

    /// Reads `len` body bytes and publishes them to the request.
    ///
    /// Bodies over the limit are left unread and reported as too large.
    /// Safe to cancel and call again: received bytes stay in the buffer.
    async fn drain_body(&mut self, len: usize, tx: &BodySender) -> anyhow::Result<()> {
        if len > self.max_body_bytes {
            warn!(len, limit = self.max_body_bytes, "Request body too large");
            tx.send_replace(BodyState::TooLarge(self.max_body_bytes));
            return Ok(());
        }

        while self.buffer.len() < len {
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                anyhow::bail!("connection closed before request body was complete");
            }
        }

        let body = self.buffer.split_to(len).freeze();
        tx.send_replace(BodyState::Complete(body));
        Ok(())
    }
}
