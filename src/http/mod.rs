//! HTTP protocol implementation.
//!
//! This module implements a small HTTP/1.1 server that exposes a Fetch-style
//! request/response pair to endpoint handlers.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`parser`**: Parses request heads from byte buffers
//! - **`headers`**: Ordered, comma-aware header container
//! - **`request`**: The normalized request handed to handlers, with lazy body accessors
//! - **`response`**: Response descriptors and the write-once transaction handle
//! - **`writer`**: Serializes and writes responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a complete request head
//!        └──────┬──────┘
//!               │ Head received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Dispatch to a handler while the body drains
//!        └──────┬───────────┘
//!               │ Handler responded (or 404 / 500)
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send the single response
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use headers::{HeaderValue, Headers};
pub use request::{BodyError, Method, Request};
pub use response::{EmitError, Responder, Response, ResponseInit, StatusCode};
