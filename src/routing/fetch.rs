use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::Responder;

pub type FetchFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Shared handle to a registered handler.
pub type Handler = Arc<dyn Fetch>;

/// An endpoint handler.
///
/// Receives the request and a [`Responder`] bound to it, and is expected to
/// answer through the responder exactly once. Any async closure of the
/// right shape implements this.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, request: Request, response: Responder) -> FetchFuture;
}

impl<F, Fut> Fetch for F
where
    F: Fn(Request, Responder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn fetch(&self, request: Request, response: Responder) -> FetchFuture {
        Box::pin(self(request, response))
    }
}
