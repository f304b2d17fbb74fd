//! HTTP transport module
//!
//! Provides the transport the request executor dispatches through.

mod client;

pub use client::{HttpClient, HttpRequest, HttpResponse, Transport, TransportError};
