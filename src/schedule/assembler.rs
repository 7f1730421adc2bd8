//! Schedule assembly: the full exercise pipeline.
//!
//! Days, waves and patients are walked in order; each patient slot takes the
//! next case from the shuffled pool. Evaluator counts persist across days.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::acquisition::acquire_cases;
use super::case_mix::plan_exercise;
use super::evaluators::{assign_evaluator, AssignmentState, StaffingTable, UNASSIGNED};
use super::types::{truncate_chars, Route, ScheduleEntry, ALL_HANDS, DRILL_CASE_REF};
use super::waves::{cbrn_drill_time, choose_route, notification_time, patient_arrival, plan_waves};
use crate::case::{Case, CaseSource, Phase};
use crate::config::{DayConfig, ExerciseConfig};
use crate::error::ConfigError;
use crate::narrative::NarrativeGenerator;

pub const MECHANISM_WIDTH: usize = 50;
pub const DESCRIPTION_WIDTH: usize = 80;

/// Per-day outcome of assembly.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub day: u32,
    pub planned_patients: u32,
    pub scheduled_patients: u32,
    pub drills: u32,
    /// The case pool ran out before every wave slot was filled.
    pub underrun: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    pub days: Vec<DaySummary>,
    pub total_cases: usize,
    pub fallback_cases: usize,
    /// Cases left in the pool after the last day's waves were filled.
    pub unscheduled_cases: usize,
    /// Cases whose keyword classification calls for surgery.
    pub surgical_cases: usize,
    pub unassigned: usize,
    /// Assignments that went to surgical-track roles.
    pub surgical_track_assignments: u32,
    /// Assignments per specialist role.
    pub evaluator_load: BTreeMap<String, u32>,
}

/// Result of one exercise generation run.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSchedule {
    pub exercise_name: String,
    pub environment: String,
    pub duration: u32,
    /// Cases in final scheduling order.
    pub cases: Vec<Case>,
    pub entries: Vec<ScheduleEntry>,
    pub summary: ScheduleSummary,
}

fn drill_entry(day: &DayConfig) -> ScheduleEntry {
    ScheduleEntry {
        day: day.day,
        wave: None,
        arrival: cbrn_drill_time(day.night_ops),
        notification: None,
        route: Route::NotApplicable,
        triage: None,
        mechanism: "CBRN Drill".to_string(),
        description: "All clinical activity paused for 1 hour for CBRN decontamination drill"
            .to_string(),
        evaluator: ALL_HANDS.to_string(),
        case_ref: DRILL_CASE_REF.to_string(),
    }
}

/// Shuffles the pool and labels cases in their final order.
pub fn shuffle_cases<R: Rng + ?Sized>(cases: &mut [Case], rng: &mut R) {
    cases.shuffle(rng);
    for (i, case) in cases.iter_mut().enumerate() {
        case.case_ref = format!("Case {:03}", i + 1);
    }
}

/// Lays the (already shuffled) case pool onto the exercise timeline.
///
/// `state` carries evaluator counts across days and must be fresh per run.
pub fn assemble_schedule<R: Rng + ?Sized>(
    config: &ExerciseConfig,
    cases: &[Case],
    staffing: &StaffingTable,
    state: &mut AssignmentState,
    rng: &mut R,
) -> (Vec<ScheduleEntry>, Vec<DaySummary>) {
    let mut pool = cases.iter();
    let mut entries = Vec::new();
    let mut summaries = Vec::with_capacity(config.days.len());

    for day in &config.days {
        let mut summary = DaySummary {
            day: day.day,
            planned_patients: 0,
            scheduled_patients: 0,
            drills: 0,
            underrun: false,
        };

        if day.cbrn {
            entries.push(drill_entry(day));
            summary.drills += 1;
        }

        let waves = plan_waves(day);
        summary.planned_patients = waves.iter().map(|w| w.patients).sum();

        'waves: for wave in &waves {
            for patient in 0..wave.patients {
                let Some(case) = pool.next() else {
                    warn!(
                        day = day.day,
                        wave = wave.index,
                        scheduled = summary.scheduled_patients,
                        planned = summary.planned_patients,
                        "case pool exhausted, truncating day"
                    );
                    summary.underrun = true;
                    break 'waves;
                };

                let arrival = patient_arrival(wave, patient, wave.patients);
                let route = choose_route(day.mascal, rng);
                let evaluator =
                    assign_evaluator(&case.required_phases, case.triage(), staffing, state);

                debug!(
                    day = day.day,
                    wave = wave.index,
                    case = %case.case_ref,
                    evaluator = %evaluator,
                    "scheduled case"
                );

                entries.push(ScheduleEntry {
                    day: day.day,
                    wave: Some(wave.index),
                    arrival,
                    notification: notification_time(arrival, route),
                    route,
                    triage: Some(case.triage()),
                    mechanism: truncate_chars(&case.payload.mechanism, MECHANISM_WIDTH),
                    description: truncate_chars(&case.payload.description, DESCRIPTION_WIDTH),
                    evaluator,
                    case_ref: case.case_ref.clone(),
                });
                summary.scheduled_patients += 1;
            }
        }

        info!(
            day = day.day,
            waves = waves.len(),
            scheduled = summary.scheduled_patients,
            "day assembled"
        );
        summaries.push(summary);
    }

    let leftover = pool.len();
    if leftover > 0 {
        warn!(
            unscheduled = leftover,
            total = cases.len(),
            "wave slots filled before the case pool was used up"
        );
    }

    (entries, summaries)
}

/// Runs the whole pipeline: validate, plan, acquire, shuffle, assemble.
///
/// Only configuration errors are returned; narrative failures fall back to
/// local cases and staffing gaps show up as "Unassigned".
pub async fn generate_exercise<G, R>(
    config: &ExerciseConfig,
    generator: &G,
    rng: &mut R,
) -> Result<ExerciseSchedule, ConfigError>
where
    G: NarrativeGenerator,
    R: Rng + ?Sized,
{
    config.validate()?;
    info!(
        exercise = %config.exercise_name,
        days = config.days.len(),
        patients = config.total_patients(),
        "generating exercise"
    );

    let slots = plan_exercise(config, rng);
    let mut cases = acquire_cases(&slots, generator, &config.environment, &config.region, rng).await;
    shuffle_cases(&mut cases, rng);

    let staffing = StaffingTable::from_names(&config.specialists);
    let mut state = AssignmentState::new();
    let (entries, days) = assemble_schedule(config, &cases, &staffing, &mut state, rng);

    let scheduled: usize = days.iter().map(|d| d.scheduled_patients as usize).sum();
    let summary = ScheduleSummary {
        days,
        total_cases: cases.len(),
        fallback_cases: cases
            .iter()
            .filter(|c| c.source == CaseSource::Fallback)
            .count(),
        unscheduled_cases: cases.len().saturating_sub(scheduled),
        surgical_cases: cases.iter().filter(|c| c.requires(Phase::Surgery)).count(),
        unassigned: entries.iter().filter(|e| e.evaluator == UNASSIGNED).count(),
        surgical_track_assignments: state.surgical_track_total(),
        evaluator_load: state.by_name().into_iter().collect(),
    };

    info!(
        entries = entries.len(),
        fallback = summary.fallback_cases,
        unassigned = summary.unassigned,
        unscheduled = summary.unscheduled_cases,
        "exercise schedule complete"
    );

    Ok(ExerciseSchedule {
        exercise_name: config.exercise_name.clone(),
        environment: config.environment.clone(),
        duration: config.duration,
        cases,
        entries,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{fallback_payload, TriageCategory};
    use crate::config::tests::{day, exercise};
    use crate::narrative::OfflineNarrative;
    use crate::schedule::evaluators::SpecialistRole;
    use chrono::NaiveTime;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pool(n: usize, rng: &mut ChaCha8Rng) -> Vec<Case> {
        let mut cases: Vec<Case> = (0..n)
            .map(|_| {
                let payload = fallback_payload("Acute appendicitis", "DNBI", false, rng);
                Case::new("Acute appendicitis", "DNBI", false, CaseSource::Fallback, payload)
            })
            .collect();
        shuffle_cases(&mut cases, rng);
        cases
    }

    #[test]
    fn test_entries_follow_wave_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = exercise(vec![day(1, 10, 2)]);
        let cases = pool(10, &mut rng);
        let staffing = StaffingTable::default().with_role(SpecialistRole::IcuNurse, 2);
        let mut state = AssignmentState::new();

        let (entries, days) = assemble_schedule(&config, &cases, &staffing, &mut state, &mut rng);
        assert_eq!(entries.len(), 10);
        assert_eq!(days[0].scheduled_patients, 10);
        assert!(!days[0].underrun);
        assert_eq!(entries[0].arrival, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert_eq!(entries[5].arrival, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(entries[0].case_ref, "Case 001");
        assert_eq!(entries[9].case_ref, "Case 010");
        assert_eq!(entries[0].evaluator, "ICU RN 1");
        assert_eq!(entries[2].evaluator, "ICU RN 1");
        assert_eq!(entries[0].triage, Some(TriageCategory::T3));
    }

    #[test]
    fn test_pool_underrun_truncates_day() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let config = exercise(vec![day(1, 4, 2), day(2, 4, 1)]);
        let cases = pool(5, &mut rng);
        let mut state = AssignmentState::new();

        let (entries, days) =
            assemble_schedule(&config, &cases, &StaffingTable::default(), &mut state, &mut rng);
        assert_eq!(entries.len(), 5);
        assert!(!days[0].underrun);
        assert_eq!(days[1].scheduled_patients, 1);
        assert!(days[1].underrun);
        assert!(entries.iter().all(|e| e.evaluator == UNASSIGNED));
    }

    #[test]
    fn test_cbrn_drill_entry() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut d = day(1, 2, 1);
        d.cbrn = true;
        d.night_ops = true;
        let config = exercise(vec![d]);
        let cases = pool(2, &mut rng);
        let mut state = AssignmentState::new();

        let (entries, days) =
            assemble_schedule(&config, &cases, &StaffingTable::default(), &mut state, &mut rng);
        assert_eq!(entries.len(), 3);
        assert_eq!(days[0].drills, 1);
        let drill = &entries[0];
        assert!(drill.is_drill());
        assert_eq!(drill.arrival_hhmm(), "2100");
        assert_eq!(drill.route, Route::NotApplicable);
        assert_eq!(drill.evaluator, ALL_HANDS);
        assert_eq!(drill.notification, None);
    }

    #[test]
    fn test_counters_persist_across_days() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let config = exercise(vec![day(1, 2, 1), day(2, 1, 1)]);
        let cases = pool(3, &mut rng);
        let staffing = StaffingTable::default().with_role(SpecialistRole::IcuNurse, 2);
        let mut state = AssignmentState::new();

        let (entries, _) = assemble_schedule(&config, &cases, &staffing, &mut state, &mut rng);
        let labels: Vec<&str> = entries.iter().map(|e| e.evaluator.as_str()).collect();
        assert_eq!(labels, vec!["ICU RN 1", "ICU RN 2", "ICU RN 1"]);
    }

    #[test]
    fn test_notification_only_for_transported_routes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = exercise(vec![day(1, 30, 3)]);
        let cases = pool(30, &mut rng);
        let mut state = AssignmentState::new();

        let (entries, _) =
            assemble_schedule(&config, &cases, &StaffingTable::default(), &mut state, &mut rng);
        for entry in &entries {
            assert_eq!(entry.notification.is_some(), entry.route != Route::WalkIn);
        }
    }

    #[test]
    fn test_text_columns_are_truncated() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut cases = pool(1, &mut rng);
        cases[0].payload.mechanism = "m".repeat(120);
        cases[0].payload.description = "d".repeat(120);
        let config = exercise(vec![day(1, 1, 1)]);
        let mut state = AssignmentState::new();

        let (entries, _) =
            assemble_schedule(&config, &cases, &StaffingTable::default(), &mut state, &mut rng);
        assert_eq!(entries[0].mechanism.len(), MECHANISM_WIDTH);
        assert_eq!(entries[0].description.len(), DESCRIPTION_WIDTH);
    }

    #[tokio::test]
    async fn test_generate_exercise_rejects_invalid_config() {
        let config = exercise(vec![day(1, 5, 0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = generate_exercise(&config, &OfflineNarrative, &mut rng).await;
        assert!(matches!(result, Err(ConfigError::NoWaves { day: 1 })));
    }

    #[tokio::test]
    async fn test_generate_exercise_is_seed_deterministic() {
        let mut config = exercise(vec![day(1, 10, 2), day(2, 6, 3)]);
        config.specialists.insert("ER Nurse".to_string(), 2);
        config.specialists.insert("General Surgeon".to_string(), 1);

        let a = generate_exercise(&config, &OfflineNarrative, &mut ChaCha8Rng::seed_from_u64(8))
            .await
            .unwrap();
        let b = generate_exercise(&config, &OfflineNarrative, &mut ChaCha8Rng::seed_from_u64(8))
            .await
            .unwrap();

        assert_eq!(a.entries.len(), 16);
        assert_eq!(a.summary.total_cases, 16);
        assert_eq!(a.summary.fallback_cases, 16);
        let key = |s: &ExerciseSchedule| -> Vec<(String, String, String)> {
            s.entries
                .iter()
                .map(|e| (e.case_ref.clone(), e.route.to_string(), e.evaluator.clone()))
                .collect()
        };
        assert_eq!(key(&a), key(&b));
    }

    #[test]
    fn test_surplus_cases_left_in_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = exercise(vec![day(1, 4, 2)]);
        let cases = pool(6, &mut rng);
        let mut state = AssignmentState::new();

        let (entries, days) =
            assemble_schedule(&config, &cases, &StaffingTable::default(), &mut state, &mut rng);
        assert_eq!(entries.len(), 4);
        assert_eq!(days[0].scheduled_patients, 4);
        assert!(!days[0].underrun);
        assert_eq!(entries[3].case_ref, "Case 004");
    }

    #[tokio::test]
    async fn test_small_mascal_surge_reports_unscheduled_cases() {
        // waves split 5/5, the surge replaces wave 0 with a single patient
        let mut d = day(1, 10, 2);
        d.mascal = true;
        d.mascal_etiology = Some("IED".to_string());
        d.mascal_patients = Some(1);
        let mut config = exercise(vec![d]);
        config.specialists.insert("General Surgeon".to_string(), 2);
        config.specialists.insert("ER Nurse".to_string(), 1);

        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let schedule = generate_exercise(&config, &OfflineNarrative, &mut rng).await.unwrap();

        assert_eq!(schedule.summary.total_cases, 10);
        assert_eq!(schedule.summary.days[0].planned_patients, 6);
        assert_eq!(schedule.entries.len(), 6);
        assert_eq!(schedule.summary.unscheduled_cases, 4);
    }

    #[tokio::test]
    async fn test_summary_counts_surgical_cases() {
        let mut config = exercise(vec![day(1, 12, 3)]);
        config.specialists.insert("General Surgeon".to_string(), 1);
        config.specialists.insert("ICU Nurse".to_string(), 1);
        config.specialists.insert("Emergency Medicine".to_string(), 1);

        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let schedule = generate_exercise(&config, &OfflineNarrative, &mut rng).await.unwrap();

        let surgical = schedule
            .cases
            .iter()
            .filter(|c| c.requires(Phase::Surgery))
            .count();
        assert_eq!(schedule.summary.surgical_cases, surgical);
        // every surgical case lands on General Surgery while it is staffed
        assert_eq!(
            schedule.summary.surgical_track_assignments as usize,
            surgical
                + schedule
                    .entries
                    .iter()
                    .filter(|e| e.evaluator.starts_with("EM "))
                    .count()
        );
        assert_eq!(schedule.summary.unscheduled_cases, 0);
    }
}
