//! Resource references and the request lifecycle.
//!
//! A [`ResourceReference`] is a URI bound to a transport: immutable, cheap
//! to clone and safe to share. Verb calls produce a fresh [`Request`] each
//! time; sending one either yields a typed [`ContentResponse`] or fails with
//! the whole error body buffered for later inspection.

pub mod reference;
pub mod request;
pub mod response;

pub use reference::ResourceReference;
pub use request::Request;
pub use response::{ContentResponse, ErrorResponse, ResponseParts};
