use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on casualties for one day, MASCAL surge included.
pub const MAX_PATIENTS_PER_DAY: u32 = 10_000;
/// Upper bound on waves for one day.
pub const MAX_WAVES_PER_DAY: u32 = 48;

/// Full multi-day exercise configuration as submitted by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub exercise_name: String,
    pub duration: u32,
    #[serde(default)]
    pub supported_unit: String,
    pub environment: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub threat_level: String,
    #[serde(default)]
    pub selected_mets: Vec<String>,
    #[serde(default)]
    pub selected_spaces: Vec<String>,
    /// Specialist role name -> available headcount.
    #[serde(default)]
    pub specialists: HashMap<String, u32>,
    pub days: Vec<DayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    pub day: u32,
    pub tactical_setting: String,
    pub total_patients: u32,
    pub total_waves: u32,
    #[serde(default)]
    pub night_ops: bool,
    #[serde(default)]
    pub mascal: bool,
    #[serde(default)]
    pub cbrn: bool,
    #[serde(default)]
    pub detainee_ops: bool,
    #[serde(default)]
    pub mascal_etiology: Option<String>,
    #[serde(default)]
    pub mascal_patients: Option<u32>,
    #[serde(default)]
    pub evac_status: EvacStatus,
}

/// Evacuation posture for a day, forwarded to the narrative context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvacStatus {
    #[default]
    Open,
    Limited,
    Denied,
}

impl fmt::Display for EvacStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EvacStatus::Open => "Evac Open",
            EvacStatus::Limited => "Evac Limited (PCC Required)",
            EvacStatus::Denied => "Evac Denied (Full PCC Hold)",
        };
        f.write_str(text)
    }
}

impl ExerciseConfig {
    /// Loads an exercise configuration from a JSON file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates an exercise configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: ExerciseConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the structural invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days.len() != self.duration as usize {
            return Err(ConfigError::DayCountMismatch {
                duration: self.duration,
                configured: self.days.len(),
            });
        }

        let mut previous: Option<u32> = None;
        for day in &self.days {
            if let Some(prev) = previous {
                if day.day <= prev {
                    return Err(ConfigError::DayOrder {
                        previous: prev,
                        day: day.day,
                    });
                }
            }
            previous = Some(day.day);
            day.validate()?;
        }

        Ok(())
    }

    /// Total number of casualties planned across all days.
    pub fn total_patients(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.total_patients)).sum()
    }
}

impl DayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_waves == 0 {
            return Err(ConfigError::NoWaves { day: self.day });
        }
        if self.total_waves > MAX_WAVES_PER_DAY {
            return Err(ConfigError::TooManyWaves {
                day: self.day,
                count: self.total_waves,
                max: MAX_WAVES_PER_DAY,
            });
        }
        for count in std::iter::once(self.total_patients).chain(self.mascal_patients) {
            if count > MAX_PATIENTS_PER_DAY {
                return Err(ConfigError::TooManyPatients {
                    day: self.day,
                    count,
                    max: MAX_PATIENTS_PER_DAY,
                });
            }
        }
        let has_etiology = self
            .mascal_etiology
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false);
        if self.mascal && !has_etiology {
            return Err(ConfigError::MissingEtiology { day: self.day });
        }
        Ok(())
    }
}
