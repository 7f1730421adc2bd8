use thiserror::Error;

/// Errors that reject an exercise before any scheduling happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("exercise duration is {duration} days but {configured} day configs were given")]
    DayCountMismatch { duration: u32, configured: usize },

    #[error("day numbers must be unique and ascending (day {day} follows day {previous})")]
    DayOrder { previous: u32, day: u32 },

    #[error("day {day}: total_waves must be at least 1")]
    NoWaves { day: u32 },

    #[error("day {day}: MASCAL is set but no MASCAL etiology was given")]
    MissingEtiology { day: u32 },

    #[error("day {day}: {count} patients exceeds the per-day limit of {max}")]
    TooManyPatients { day: u32, count: u32, max: u32 },

    #[error("day {day}: {count} waves exceeds the per-day limit of {max}")]
    TooManyWaves { day: u32, count: u32, max: u32 },
}

/// Failures of a single Narrative Generator call. Never surfaced past case acquisition.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("narrative service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("narrative request timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed case payload: {0}")]
    Malformed(String),

    #[error("narrative generation unavailable")]
    Unavailable,
}
