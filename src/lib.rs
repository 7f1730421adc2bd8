//! Role 2 exercise builder: casualty case generation and master event list
//! scheduling for multi-day medical training exercises.
//!
//! The pipeline runs config -> case mix plan -> narrative acquisition (with
//! local fallback) -> global shuffle -> wave timing and evaluator assignment.
//! See [`schedule::generate_exercise`].

pub mod case;
pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod narrative;
pub mod schedule;
pub mod web;

pub use case::{Case, CasePayload, Phase, TriageCategory};
pub use config::{DayConfig, EvacStatus, ExerciseConfig};
pub use error::{ConfigError, NarrativeError};
pub use narrative::{CaseRequest, NarrativeBackend, NarrativeGenerator, OfflineNarrative};
pub use schedule::{generate_exercise, ExerciseSchedule, ScheduleEntry};
