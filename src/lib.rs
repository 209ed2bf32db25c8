//! Fetchlet - Fetch-style endpoints over a minimal HTTP/1.1 server
//!
//! Core library for routing, request translation and response emission.

pub mod config;
pub mod http;
pub mod plugin;
pub mod routing;
pub mod server;

pub use config::Config;
pub use http::{Headers, Method, Request, Responder, Response, ResponseInit, StatusCode};
pub use plugin::{Endpoint, EndpointRegistry, Plugin};
pub use routing::WILDCARD;
pub use server::Loader;
