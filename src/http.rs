//! Minimal HTTP request/response abstraction the dispatch core consumes.
//!
//! The host container owns the real connection handling; this module only
//! models what the core needs: a request exposing URL, method, parameter
//! lookup with override semantics, locale hints, and a typed attribute
//! store, plus a response the core populates with a status and payload.

pub mod extensions;
pub mod request;
pub mod response;

pub use extensions::{AuthState, Extensions};
pub use request::{Request, RequestBuilder};
pub use response::Response;
