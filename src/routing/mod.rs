//! Endpoint routing and dispatch.

pub mod dispatcher;
pub mod fetch;
pub mod table;

pub use dispatcher::{Dispatcher, Outcome};
pub use fetch::{Fetch, FetchFuture, Handler};
pub use table::{Route, RoutingTable, WILDCARD};
