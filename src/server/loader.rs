//! Public entry point for applications.
//!
//! # Example
//!
//! ```no_run
//! use fetchlet::{Endpoint, Loader, ResponseInit};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut loader = Loader::new();
//!
//!     loader.bind(Endpoint::new("/", |_req, res| async move {
//!         res.send("Hello, world!", ResponseInit::new(200).header("Content-Type", "text/plain"))?;
//!         Ok::<_, anyhow::Error>(())
//!     }));
//!
//!     loader.start(8080).await
//! }
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::plugin::{Endpoint, EndpointRegistry, Plugin};
use crate::routing::{Dispatcher, RoutingTable};
use crate::server::listener;

/// Collects endpoint registrations, then serves them.
///
/// Registration happens on `&mut self` before [`Loader::start`] or
/// [`Loader::serve`], which consume the loader and freeze the table.
#[derive(Debug, Default)]
pub struct Loader {
    config: Config,
    table: RoutingTable,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            table: RoutingTable::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers one handler for one path, or for `"all"`.
    pub fn bind(&mut self, endpoint: Endpoint) -> &mut Self {
        self.plugin(&endpoint)
    }

    /// Lets `plugin` register its endpoints into this loader's table.
    pub fn plugin(&mut self, plugin: &dyn Plugin) -> &mut Self {
        let table = &mut self.table;
        let mut registry = EndpointRegistry::new();
        registry.bind_on_register(|path, handler| {
            info!(path, "Registered endpoint");
            table.insert(path, handler);
        });

        plugin.register(&mut registry);
        drop(registry);
        self
    }

    /// Freezes the routing table into a dispatcher.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.table)
    }

    /// Binds `0.0.0.0:<port>` (or the configured host) and serves forever.
    pub async fn start(self, port: u16) -> anyhow::Result<()> {
        let config = self.config.clone().with_port(port);
        let listener = TcpListener::bind(&config.listen_addr).await?;
        Self { config, ..self }.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let config = Arc::new(self.config.clone());
        let dispatcher = Arc::new(self.into_dispatcher());
        listener::run(listener, dispatcher, config).await
    }
}
