//! Roadmap generation contract.
//!
//! Wraps the generation collaborator and enforces the obligations the
//! collaborator itself cannot be trusted with: request sanity, shape
//! validation, and the every-mission-starts-uncompleted rewrite.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::traits::{Attachment, GenerationApi};
use crate::error::GenerationError;

use super::model::Roadmap;
use super::validate;

/// Self-assessed starting level of the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{s}")
    }
}

/// Weekly study cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every weekday.
    Daily,
    /// Three sessions per week.
    ThreeDaysWeekly,
    /// Weekends only.
    Weekends,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::ThreeDaysWeekly => "three_days_weekly",
            Self::Weekends => "weekends",
        };
        write!(f, "{s}")
    }
}

/// Everything the generation collaborator needs to produce a curriculum.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub goal: String,
    pub level: Level,
    /// Total duration in weeks, 1 through 52.
    pub duration_weeks: u8,
    pub frequency: Frequency,
    /// Optional document (syllabus, job posting, ...) the curriculum should
    /// be grounded in.
    pub reference_document: Option<Attachment>,
}

impl GenerationRequest {
    pub fn new(
        goal: impl Into<String>,
        level: Level,
        duration_weeks: u8,
        frequency: Frequency,
    ) -> Self {
        Self {
            goal: goal.into(),
            level,
            duration_weeks,
            frequency,
            reference_document: None,
        }
    }

    /// Builder: attach a reference document.
    pub fn with_reference_document(mut self, attachment: Attachment) -> Self {
        self.reference_document = Some(attachment);
        self
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.goal.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "the learning goal must not be empty".to_string(),
            ));
        }
        if !(1..=52).contains(&self.duration_weeks) {
            return Err(GenerationError::InvalidRequest(format!(
                "duration must be between 1 and 52 weeks, got {}",
                self.duration_weeks
            )));
        }
        Ok(())
    }
}

/// Runs the generation contract over a collaborator.
///
/// Retrying with identical inputs is safe: the collaborator may produce a
/// different but equally valid roadmap, and nothing here deduplicates.
pub struct Generator {
    api: Arc<dyn GenerationApi>,
}

impl Generator {
    pub fn new(api: Arc<dyn GenerationApi>) -> Self {
        Self { api }
    }

    /// Generate and validate a roadmap. Never returns a partial curriculum:
    /// any malformed output or transport failure surfaces as a user-safe
    /// [`GenerationError`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Roadmap, GenerationError> {
        request.check()?;
        info!(
            goal = %request.goal,
            level = %request.level,
            duration_weeks = request.duration_weeks,
            "Generating roadmap"
        );

        let payload = self.api.generate(request).await?;
        let roadmap = validate::validate_value(payload).map_err(|e| {
            warn!(error = %e, "Generation collaborator returned a malformed curriculum");
            e
        })?;

        let (_, total) = roadmap.mission_counts();
        info!(
            title = %roadmap.project_title,
            weeks = roadmap.curriculum.len(),
            missions = total,
            "Roadmap generated"
        );
        Ok(roadmap)
    }
}
