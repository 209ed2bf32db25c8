//! Listener and the public server façade.

pub mod listener;
pub mod loader;

pub use loader::Loader;
