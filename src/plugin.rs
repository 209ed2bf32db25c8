//! Endpoint registration.
//!
//! Code that declares handlers never touches the routing table. It hands
//! `(path, handler)` pairs to an [`EndpointRegistry`], and whoever owns the
//! table binds the registry's callback to the actual insertion.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::http::request::Request;
use crate::http::response::Responder;
use crate::routing::fetch::Handler;

/// One handler bound to one path, or to the wildcard key `"all"`.
#[derive(Clone)]
pub struct Endpoint {
    pub endpoint: String,
    pub fetch: Handler,
}

impl Endpoint {
    pub fn new<F, Fut>(endpoint: impl Into<String>, fetch: F) -> Self
    where
        F: Fn(Request, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_handler(endpoint, Arc::new(fetch))
    }

    pub fn from_handler(endpoint: impl Into<String>, fetch: Handler) -> Self {
        Self {
            endpoint: endpoint.into(),
            fetch,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

type OnRegister<'a> = Box<dyn FnMut(&str, Handler) + 'a>;

/// Forwards endpoint registrations to a single bound callback.
#[derive(Default)]
pub struct EndpointRegistry<'a> {
    on_register: Option<OnRegister<'a>>,
}

impl<'a> EndpointRegistry<'a> {
    pub fn new() -> Self {
        Self { on_register: None }
    }

    /// Binds the callback that receives registrations. A later bind
    /// replaces the earlier one.
    pub fn bind_on_register(&mut self, callback: impl FnMut(&str, Handler) + 'a) {
        self.on_register = Some(Box::new(callback));
    }

    pub fn is_bound(&self) -> bool {
        self.on_register.is_some()
    }

    /// Passes `(path, handler)` to the bound callback. Without one the
    /// registration is dropped.
    pub fn register_endpoint(&mut self, path: &str, handler: Handler) {
        match self.on_register.as_mut() {
            Some(callback) => callback(path, handler),
            None => warn!(path, "Dropping endpoint registration: no callback bound"),
        }
    }

    pub fn register<F, Fut>(&mut self, path: &str, fetch: F)
    where
        F: Fn(Request, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_endpoint(path, Arc::new(fetch));
    }
}

/// A bundle of endpoints that registers itself.
pub trait Plugin {
    fn register(&self, registry: &mut EndpointRegistry<'_>);
}

impl Plugin for Endpoint {
    fn register(&self, registry: &mut EndpointRegistry<'_>) {
        registry.register_endpoint(&self.endpoint, self.fetch.clone());
    }
}
