//! Error types for the coach core.

/// Top-level error type for the coach core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Roadmap error: {0}")]
    Roadmap(#[from] RoadmapError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("No active roadmap session")]
    NoSession,
}

/// Structural invariants of a curriculum.
///
/// Raised when AI-produced (or stored) roadmap data fails the shape checks
/// in `roadmap::validate`, or when a derivation is asked about an empty
/// curriculum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoadmapError {
    #[error("Curriculum does not match the expected shape: {0}")]
    Shape(String),

    #[error("Project title is missing")]
    MissingProjectTitle,

    #[error("Curriculum has no weeks")]
    EmptyCurriculum,

    #[error("Week numbers must start at 1 (found {found})")]
    InvalidWeekNumber { found: u32 },

    #[error("Week numbering is not contiguous: expected week {expected}, found {found}")]
    NonContiguousWeeks { expected: u32, found: u32 },

    #[error("Week {week} has no missions")]
    EmptyWeek { week: u32 },

    #[error("Week {week} contains a mission without an id")]
    MissionMissingId { week: u32 },

    #[error("Mission {id} in week {week} has no title")]
    MissionMissingTitle { week: u32, id: String },
}

/// Roadmap generation failures. Messages are safe to show to the user.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("The coach produced an unusable roadmap: {0}")]
    InvalidOutput(#[from] RoadmapError),

    #[error("Roadmap generation failed: {0}")]
    Transport(#[from] ApiError),
}

/// Failures while mediating a coach turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("A coach reply is still pending; wait for it before sending again")]
    TurnInFlight,

    #[error("Nothing to send")]
    EmptyTurn,

    #[error("The active roadmap has no id yet; reload it before chatting")]
    MissingRoadmapId,

    #[error("The session was reset before the coach replied")]
    SessionReset,

    #[error("The coach did not answer: {0}")]
    Transport(#[from] ApiError),
}

/// Rejected or failed mission-progression actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error(
        "This mission has not been verified yet. Discuss your proof of work \
         with the coach and pass verification before checking it off"
    )]
    NotVerified,

    #[error("No mission at week index {week_index}, mission index {mission_index}")]
    UnknownMission {
        week_index: usize,
        mission_index: usize,
    },

    #[error("Saving completed mission {mission_id} failed: {reason}")]
    CommitFailed { mission_id: String, reason: String },
}

/// Transport-level failures talking to the remote backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Server returned {status} from {endpoint}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("Could not decode the response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Result type alias for the coach core.
pub type Result<T> = std::result::Result<T, Error>;
