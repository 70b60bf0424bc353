//! Transports: the layer that actually moves bytes.
//!
//! The fetch pipeline decides *which* request to issue; a `Transport` issues
//! it. Timeouts and cancellation belong to the transport, and whatever error
//! it raises is propagated unchanged.

mod client;
mod local;

use async_trait::async_trait;

use crate::error_handling::TransportError;
use crate::http::{WebRequest, WebResponse};

pub use client::ReqwestTransport;

/// Issues a single request without following redirects.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns whatever the server answered, redirects included.
    async fn fetch(&self, request: &WebRequest) -> Result<WebResponse, TransportError>;
}
