//! Chat session engine — message log, turn mediation, and the completion
//! signal protocol.

pub mod engine;
pub mod log;
pub mod model;
pub mod signal;

pub use engine::{ChatEngine, TurnOutcome};
pub use log::ChatLog;
pub use model::{ChatMessage, Role};
pub use signal::{MISSION_COMPLETE, ParsedReply, parse_coach_reply};
