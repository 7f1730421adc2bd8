use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::case::Phase;
use crate::config::ExerciseConfig;
use crate::schedule::{ExerciseSchedule, ScheduleEntry};

/// MSEL column headers, in export order.
pub const MSEL_HEADERS: [&str; 9] = [
    "Day",
    "Arrival",
    "Pre-Notification",
    "Route",
    "Triage",
    "Mechanism",
    "Description",
    "Evaluator",
    "Case",
];

fn msel_record(entry: &ScheduleEntry) -> [String; 9] {
    [
        entry.day.to_string(),
        entry.arrival_hhmm(),
        entry.notification_hhmm(),
        entry.route.to_string(),
        entry.triage_label(),
        entry.mechanism.clone(),
        entry.description.clone(),
        entry.evaluator.clone(),
        entry.case_ref.clone(),
    ]
}

/// Writes the master event list as CSV to any writer.
pub fn write_msel<W: Write>(entries: &[ScheduleEntry], writer: W) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(MSEL_HEADERS)?;
    for entry in entries {
        wtr.write_record(msel_record(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Renders the master event list to CSV bytes.
pub fn msel_to_bytes(entries: &[ScheduleEntry]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    write_msel(entries, &mut buffer)?;
    Ok(buffer)
}

/// Writes the master event list to a CSV file.
pub fn write_msel_to_file<P: AsRef<Path>>(
    entries: &[ScheduleEntry],
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    write_msel(entries, file)?;
    Ok(())
}

/// Prints the schedule day by day in a readable format
pub fn print_exercise_schedule(config: &ExerciseConfig, schedule: &ExerciseSchedule) {
    println!("\n=== {} ({} days, {}) ===", schedule.exercise_name, schedule.duration, schedule.environment);
    println!(
        "Cases generated: {} ({} fallback, {} surgical)",
        schedule.summary.total_cases, schedule.summary.fallback_cases, schedule.summary.surgical_cases
    );

    for day in &config.days {
        let mut flags = Vec::new();
        if day.night_ops {
            flags.push("NIGHT OPS".to_string());
        }
        if day.mascal {
            flags.push(format!("MASCAL ({})", day.mascal_etiology.as_deref().unwrap_or("unknown")));
        }
        if day.cbrn {
            flags.push("CBRN".to_string());
        }
        if day.detainee_ops {
            flags.push("DETAINEE OPS".to_string());
        }

        println!(
            "\n--- Day {}: {} | {} patients / {} waves | {} {}",
            day.day,
            day.tactical_setting,
            day.total_patients,
            day.total_waves,
            day.evac_status,
            flags.join(" ")
        );

        for entry in schedule.entries.iter().filter(|e| e.day == day.day) {
            let surgical = schedule
                .cases
                .iter()
                .find(|c| c.case_ref == entry.case_ref)
                .is_some_and(|c| c.requires(Phase::Surgery));
            println!(
                "  {} {} (notify {:>4}) {:<8} {:<3} {:<10} {:<14} {}",
                if surgical { "S" } else { " " },
                entry.arrival_hhmm(),
                entry.notification_hhmm(),
                entry.route.to_string(),
                entry.triage_label(),
                entry.case_ref,
                entry.evaluator,
                entry.description
            );
        }

        if let Some(summary) = schedule.summary.days.iter().find(|d| d.day == day.day) {
            if summary.underrun {
                println!(
                    "  ⚠️  Case pool exhausted: {} of {} patients scheduled",
                    summary.scheduled_patients, summary.planned_patients
                );
            }
        }
    }

    if schedule.summary.unassigned > 0 {
        println!("\n⚠️  Unassigned cases: {}", schedule.summary.unassigned);
    }
    if schedule.summary.unscheduled_cases > 0 {
        println!(
            "\n⚠️  Cases left unscheduled after the last day: {}",
            schedule.summary.unscheduled_cases
        );
    }

    println!(
        "\nEvaluator load ({} on the surgical track):",
        schedule.summary.surgical_track_assignments
    );
    for (role, count) in &schedule.summary.evaluator_load {
        println!("  {}: {}", role, count);
    }
}
