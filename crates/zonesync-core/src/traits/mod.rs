//! Core traits
//!
//! - [`ProviderTransport`]: Single-record calls against a provider API

pub mod transport;

pub use transport::{ProviderTransport, TransportFactory};
