//! Grow coach core — roadmap generation, the coaching conversation, and
//! the mission verification gate.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod progress;
pub mod roadmap;
pub mod session;

pub use error::{Error, Result};
