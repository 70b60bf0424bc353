//! HTTP request and response model.
//!
//! This module defines the request descriptor handed to transports, the
//! response returned by them, and the default-header strategy applied to
//! every outbound request.

mod headers;
mod request;
mod response;

pub use headers::{BrowserHeaders, DefaultHeaders};
pub use request::{EncodingType, ProxySpec, WebRequest};
pub use response::{PageType, WebResponse};
