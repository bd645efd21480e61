//! Collaborator contracts and the HTTP backend implementation.

pub mod http;
pub mod traits;

pub use http::HttpApi;
pub use traits::*;
