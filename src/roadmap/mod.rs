//! Curriculum model, validation, and the generation contract.

pub mod generate;
pub mod model;
pub mod validate;

pub use generate::{Frequency, GenerationRequest, Generator, Level};
pub use model::{CurriculumWeek, Mission, Roadmap, RoadmapSummary};
pub use validate::{force_uncompleted, validate_structure, validate_value};
