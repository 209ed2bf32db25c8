//! Per-transaction dispatch.
//!
//! The dispatcher owns a frozen routing table. For each request it resolves
//! the path, hands the request and a bound [`Responder`] to the matching
//! handler, and makes sure a response goes out even when the handler fails.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::http::request::Request;
use crate::http::response::{Responder, Response};
use crate::routing::fetch::Handler;
use crate::routing::table::{Route, RoutingTable};

/// How a dispatched request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A handler ran and sent its own response.
    Handled,
    /// No handler matched; the fixed 404 was sent.
    NotFound,
    /// The handler failed or never answered; a 500 was sent if possible.
    Fault,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RoutingTable>,
}

impl Dispatcher {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub async fn dispatch(&self, request: Request) -> Outcome {
        let route = self.table.resolve(&request.path);

        debug!(
            method = %request.method,
            path = %request.path,
            route = route.kind(),
            "Resolved route"
        );

        match route {
            Route::Exact(handler) | Route::Wildcard(handler) => self.invoke(handler, request).await,
            Route::NotFound => {
                if let Err(e) = Response::not_found(&request.path).emit(&request) {
                    warn!(path = %request.path, error = %e, "Failed to send 404 response");
                }
                Outcome::NotFound
            }
        }
    }

    async fn invoke(&self, handler: Handler, request: Request) -> Outcome {
        let origin = request.origin.clone();
        let method = request.method.clone();
        let path = request.path.clone();
        let responder = Responder::new(&request);

        // Run on its own task so a panicking handler only loses its own
        // transaction.
        let fault = match tokio::spawn(handler.fetch(request, responder)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(%method, %path, error = %e, "Handler returned an error");
                Some(e.to_string())
            }
            Err(e) => {
                error!(%method, %path, error = %e, "Handler panicked");
                Some(e.to_string())
            }
        };

        let Some(origin) = origin else {
            return if fault.is_some() { Outcome::Fault } else { Outcome::Handled };
        };

        if origin.is_sent() {
            if fault.is_some() {
                warn!(%method, %path, "Handler failed after responding");
            }
            return Outcome::Handled;
        }

        if fault.is_none() {
            warn!(%method, %path, "Handler finished without sending a response");
        }

        if let Err(e) = origin.emit(Response::internal_error()) {
            warn!(%method, %path, error = %e, "Failed to send 500 response");
        }

        Outcome::Fault
    }
}
