use std::fmt;

use chrono::NaiveTime;
use serde::{Serialize, Serializer};

use crate::case::TriageCategory;

/// Case reference used for drill entries.
pub const DRILL_CASE_REF: &str = "DRILL";

/// Evaluator label for drills that stop all clinical activity.
pub const ALL_HANDS: &str = "All Hands";

/// How a casualty reaches the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Medevac,
    Ground,
    WalkIn,
    Litter,
    /// Drills have no transport.
    NotApplicable,
}

impl Route {
    /// Walk-in patients arrive unannounced.
    pub fn needs_notification(self) -> bool {
        matches!(self, Route::Medevac | Route::Ground | Route::Litter)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Route::Medevac => "MEDEVAC",
            Route::Ground => "Ground",
            Route::WalkIn => "Walk-in",
            Route::Litter => "Litter",
            Route::NotApplicable => "N/A",
        };
        f.write_str(text)
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the master event list.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub day: u32,
    /// Wave index within the day; `None` for drills.
    pub wave: Option<u32>,
    #[serde(serialize_with = "hhmm::serialize")]
    pub arrival: NaiveTime,
    #[serde(serialize_with = "hhmm::serialize_option")]
    pub notification: Option<NaiveTime>,
    pub route: Route,
    pub triage: Option<TriageCategory>,
    pub mechanism: String,
    pub description: String,
    pub evaluator: String,
    pub case_ref: String,
}

impl ScheduleEntry {
    pub fn is_drill(&self) -> bool {
        self.case_ref == DRILL_CASE_REF
    }

    pub fn arrival_hhmm(&self) -> String {
        hhmm::format(self.arrival)
    }

    pub fn notification_hhmm(&self) -> String {
        self.notification
            .map(hhmm::format)
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn triage_label(&self) -> String {
        self.triage
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// HHMM rendering of clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn format(time: NaiveTime) -> String {
        time.format("%H%M").to_string()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*time))
    }

    pub fn serialize_option<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_str(&format(*t)),
            None => serializer.serialize_str("N/A"),
        }
    }
}
