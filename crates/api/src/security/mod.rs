//! Response hardening for every route served by the platform

mod headers;

pub use headers::{security_headers_middleware, SECURITY_HEADERS};
