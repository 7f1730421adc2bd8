//! Case mix planning: how many trauma vs DNBI cases each day gets and which
//! catalog entries they are drawn from.

use rand::Rng;
use serde::Serialize;

use crate::catalog::{self, GENERIC_DNBI, GENERIC_TRAUMA};
use crate::config::{DayConfig, EvacStatus, ExerciseConfig};

/// One planned case, before content is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseSlot {
    pub day: u32,
    pub descriptor: String,
    /// Mechanism context passed to the narrative generator.
    pub mechanism: String,
    pub is_trauma: bool,
}

/// Trauma share in percent: 85 for MASCAL or high-intensity days, 50 otherwise.
pub fn trauma_percent(day: &DayConfig) -> u32 {
    if day.mascal || catalog::is_high_intensity(&day.tactical_setting) {
        85
    } else {
        50
    }
}

/// Returns `(num_trauma, num_dnbi)`; the two always sum to `total_patients`.
pub fn split_case_mix(day: &DayConfig) -> (u32, u32) {
    let total = u64::from(day.total_patients);
    let num_trauma = (total * u64::from(trauma_percent(day)) / 100) as u32;
    (num_trauma, day.total_patients - num_trauma)
}

fn pick<R: Rng + ?Sized>(list: &[&str], rng: &mut R) -> String {
    list[rng.gen_range(0..list.len())].to_string()
}

fn trauma_mechanism(day: &DayConfig) -> String {
    let mut mechanism = match (&day.mascal_etiology, day.mascal) {
        (Some(etiology), true) => format!("MASCAL: {} during {}", etiology, day.tactical_setting),
        _ => day.tactical_setting.clone(),
    };
    append_day_context(&mut mechanism, day);
    mechanism
}

fn dnbi_mechanism(day: &DayConfig, environment: &str) -> String {
    let mut mechanism = format!("DNBI ({})", environment);
    append_day_context(&mut mechanism, day);
    mechanism
}

fn append_day_context(mechanism: &mut String, day: &DayConfig) {
    if day.evac_status != EvacStatus::Open {
        mechanism.push_str(&format!("; {}", day.evac_status));
    }
    if day.detainee_ops {
        mechanism.push_str("; detainee operations");
    }
}

/// Plans the case slots for one day.
pub fn plan_day<R: Rng + ?Sized>(day: &DayConfig, environment: &str, rng: &mut R) -> Vec<CaseSlot> {
    let (num_trauma, num_dnbi) = split_case_mix(day);

    let trauma_pool: &[&str] = match (&day.mascal_etiology, day.mascal) {
        (Some(etiology), true) => catalog::mascal_injuries(etiology).unwrap_or(GENERIC_TRAUMA),
        _ => GENERIC_TRAUMA,
    };
    let dnbi_pool: Vec<&str> = catalog::environment_dnbi(environment)
        .iter()
        .chain(GENERIC_DNBI.iter())
        .copied()
        .collect();

    let trauma_mechanism = trauma_mechanism(day);
    let dnbi_mechanism = dnbi_mechanism(day, environment);

    let mut slots = Vec::with_capacity(day.total_patients as usize);
    for _ in 0..num_trauma {
        slots.push(CaseSlot {
            day: day.day,
            descriptor: pick(trauma_pool, rng),
            mechanism: trauma_mechanism.clone(),
            is_trauma: true,
        });
    }
    for _ in 0..num_dnbi {
        slots.push(CaseSlot {
            day: day.day,
            descriptor: pick(&dnbi_pool, rng),
            mechanism: dnbi_mechanism.clone(),
            is_trauma: false,
        });
    }
    slots
}

/// Plans every day of the exercise in order.
pub fn plan_exercise<R: Rng + ?Sized>(config: &ExerciseConfig, rng: &mut R) -> Vec<CaseSlot> {
    config
        .days
        .iter()
        .flat_map(|day| plan_day(day, &config.environment, rng))
        .collect()
}
