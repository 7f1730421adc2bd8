//! Wave timing: when each wave and each patient arrives during a day.
//!
//! All clock arithmetic is modulo 24 hours on `NaiveTime`, so night waves
//! past midnight and notification times before midnight wrap the same way.

use chrono::{NaiveTime, TimeDelta};
use rand::Rng;

use super::types::Route;
use crate::config::DayConfig;

pub const DAY_START_HOUR: u32 = 7;
pub const NIGHT_START_HOUR: u32 = 19;
pub const WINDOW_SPAN_HOURS: u32 = 12;
pub const WAVE_WINDOW_MINUTES: u32 = 60;
pub const SURGE_WINDOW_MINUTES: u32 = 45;
pub const NOTIFICATION_LEAD_MINUTES: i64 = 30;
pub const CBRN_DAY_HOUR: u32 = 9;
pub const CBRN_NIGHT_HOUR: u32 = 21;

const DAY_ROUTES: [Route; 3] = [Route::Medevac, Route::Ground, Route::WalkIn];
const MASCAL_ROUTES: [Route; 3] = [Route::Medevac, Route::Ground, Route::Litter];

/// Timing plan for one wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavePlan {
    pub index: u32,
    pub start: NaiveTime,
    pub patients: u32,
    /// MASCAL surge wave: patients arrive in a compressed window.
    pub surge: bool,
}

/// Converts minutes since midnight to a clock time, wrapping at 24 hours.
pub fn clock(minutes: u32) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::minutes(i64::from(minutes % (24 * 60)))
}

/// Hour at which a wave starts, before wrapping to the 24-hour clock.
pub fn wave_hour(index: u32, num_waves: u32, night_ops: bool) -> u32 {
    let start = if night_ops { NIGHT_START_HOUR } else { DAY_START_HOUR };
    let interval = f64::from(WINDOW_SPAN_HOURS) / f64::from(num_waves + 1);
    start + (interval * f64::from(index + 1)).round() as u32
}

/// Splits a day's patients evenly across waves; the remainder goes to the earliest waves.
pub fn wave_patient_counts(total_patients: u32, num_waves: u32) -> Vec<u32> {
    if num_waves == 0 {
        return Vec::new();
    }
    let base = total_patients / num_waves;
    let remainder = total_patients % num_waves;
    (0..num_waves)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Plans every wave of a day.
pub fn plan_waves(day: &DayConfig) -> Vec<WavePlan> {
    wave_patient_counts(day.total_patients, day.total_waves)
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let index = i as u32;
            let surge = day.mascal && index == 0;
            let patients = match day.mascal_patients {
                Some(mascal_count) if surge => mascal_count,
                _ => count,
            };
            WavePlan {
                index,
                start: clock(wave_hour(index, day.total_waves, day.night_ops) * 60),
                patients,
                surge,
            }
        })
        .collect()
}

/// Arrival time of patient `patient` (0-based) out of `in_wave` patients.
pub fn patient_arrival(wave: &WavePlan, patient: u32, in_wave: u32) -> NaiveTime {
    if in_wave == 0 {
        return wave.start;
    }
    let window = if wave.surge {
        SURGE_WINDOW_MINUTES
    } else {
        WAVE_WINDOW_MINUTES
    };
    let offset = patient * window / in_wave;
    wave.start + TimeDelta::minutes(i64::from(offset))
}

/// Transport pre-notification time: 30 minutes before arrival, none for walk-ins.
pub fn notification_time(arrival: NaiveTime, route: Route) -> Option<NaiveTime> {
    route
        .needs_notification()
        .then(|| arrival - TimeDelta::minutes(NOTIFICATION_LEAD_MINUTES))
}

/// Picks a transport route; walk-ins are excluded on MASCAL days.
pub fn choose_route<R: Rng + ?Sized>(mascal: bool, rng: &mut R) -> Route {
    let routes = if mascal { &MASCAL_ROUTES } else { &DAY_ROUTES };
    routes[rng.gen_range(0..routes.len())]
}

/// Start of the fixed CBRN drill.
pub fn cbrn_drill_time(night_ops: bool) -> NaiveTime {
    let hour = if night_ops { CBRN_NIGHT_HOUR } else { CBRN_DAY_HOUR };
    clock(hour * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::day;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_even_split_two_waves() {
        let waves = plan_waves(&day(1, 10, 2));
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].patients, 5);
        assert_eq!(waves[1].patients, 5);
        assert_eq!(waves[0].start, hm(11, 0));
        assert_eq!(waves[1].start, hm(15, 0));
    }

    #[test]
    fn test_remainder_goes_to_earliest_waves() {
        let counts = wave_patient_counts(11, 4);
        assert_eq!(counts, vec![3, 3, 3, 2]);
        assert_eq!(counts.iter().sum::<u32>(), 11);

        for total in 0..40 {
            for waves in 1..8 {
                let counts = wave_patient_counts(total, waves);
                assert_eq!(counts.iter().sum::<u32>(), total);
                let remainder = (total % waves) as usize;
                assert!(counts[..remainder].iter().all(|c| *c == total / waves + 1));
                assert!(counts[remainder..].iter().all(|c| *c == total / waves));
            }
        }
    }

    #[test]
    fn test_night_waves_wrap_past_midnight() {
        let mut d = day(1, 6, 3);
        d.night_ops = true;
        let waves = plan_waves(&d);
        // interval 3h from 19:00: 22:00, 01:00, 04:00
        assert_eq!(waves[0].start, hm(22, 0));
        assert_eq!(waves[1].start, hm(1, 0));
        assert_eq!(waves[2].start, hm(4, 0));
    }

    #[test]
    fn test_mascal_override_on_first_wave() {
        let mut d = day(1, 10, 2);
        d.mascal = true;
        d.mascal_etiology = Some("IED".to_string());
        d.mascal_patients = Some(6);

        let waves = plan_waves(&d);
        assert_eq!(waves[0].patients, 6);
        assert!(waves[0].surge);
        assert_eq!(waves[1].patients, 5);
        assert!(!waves[1].surge);
    }

    #[test]
    fn test_patient_offsets_within_window() {
        let wave = WavePlan {
            index: 0,
            start: hm(11, 0),
            patients: 4,
            surge: false,
        };
        let arrivals: Vec<_> = (0..4).map(|p| patient_arrival(&wave, p, 4)).collect();
        assert_eq!(arrivals, vec![hm(11, 0), hm(11, 15), hm(11, 30), hm(11, 45)]);

        let surge = WavePlan { surge: true, ..wave };
        assert_eq!(patient_arrival(&surge, 2, 3), hm(11, 30));
        assert_eq!(patient_arrival(&surge, 1, 3), hm(11, 15));
    }

    #[test]
    fn test_notification_wraps_before_midnight() {
        assert_eq!(
            notification_time(hm(0, 10), Route::Medevac),
            Some(hm(23, 40))
        );
        assert_eq!(notification_time(hm(11, 45), Route::Ground), Some(hm(11, 15)));
        assert_eq!(notification_time(hm(11, 45), Route::WalkIn), None);
    }

    #[test]
    fn test_notification_is_thirty_minutes_before_arrival() {
        for minutes in (0..24 * 60).step_by(7) {
            let arrival = clock(minutes);
            let notice = notification_time(arrival, Route::Litter).unwrap();
            let back = notice + TimeDelta::minutes(30);
            assert_eq!(back, arrival);
        }
    }

    #[test]
    fn test_timing_is_repeatable() {
        let mut d = day(2, 17, 3);
        d.night_ops = true;
        assert_eq!(plan_waves(&d), plan_waves(&d));
    }

    #[test]
    fn test_mascal_routes_exclude_walk_in() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            assert_ne!(choose_route(true, &mut rng), Route::WalkIn);
        }
        let seen_walk_in = (0..200).any(|_| choose_route(false, &mut rng) == Route::WalkIn);
        assert!(seen_walk_in);
    }

    #[test]
    fn test_cbrn_drill_time() {
        assert_eq!(cbrn_drill_time(false), hm(9, 0));
        assert_eq!(cbrn_drill_time(true), hm(21, 0));
    }
}
