//! Reduces raw check-ins, assignments and academic snapshots into the five
//! burnout factors. Each factor is independent and lands in [0, 100]; sparse
//! history yields 0 rather than an error.

use chrono::{DateTime, Duration, Utc};

use crate::models::{AcademicSnapshot, Assignment, BurnoutFactors, CheckIn, Priority};
use crate::window::{clamp_score, mean_of, RecencyWindow};

pub const RECENT_CHECK_INS: usize = 7;
pub const SLEEP_DEFICIT_CEILING_HOURS: f64 = 3.0;
pub const DEADLINE_HORIZON_DAYS: i64 = 7;
pub const DEADLINES_FOR_FULL_DENSITY: f64 = 5.0;
pub const HIGH_PRIORITY_BOOST: f64 = 10.0;
pub const ATTENDANCE_BASELINE_SNAPSHOTS: usize = 3;
pub const ATTENDANCE_DROP_CEILING: f64 = 20.0;
pub const ENERGY_RECENT_CHECK_INS: usize = 3;
pub const ENERGY_BASELINE_CHECK_INS: usize = 4;
pub const ENERGY_DROP_CEILING: f64 = 5.0;

pub fn sleep_deficit(check_ins: &[CheckIn], ideal_sleep_hours: f64) -> f64 {
    let window = RecencyWindow::new(check_ins);
    let Some(avg_sleep) = mean_of(window.most_recent(RECENT_CHECK_INS), |c| c.sleep_hours) else {
        return 0.0;
    };

    let deficit = ideal_sleep_hours - avg_sleep;
    clamp_score(deficit / SLEEP_DEFICIT_CEILING_HOURS * 100.0)
}

pub fn stress_trend(check_ins: &[CheckIn]) -> f64 {
    let window = RecencyWindow::new(check_ins);
    mean_of(window.most_recent(RECENT_CHECK_INS), |c| c.stress_level as f64)
        .map(|avg_stress| clamp_score(avg_stress / 10.0 * 100.0))
        .unwrap_or(0.0)
}

/// Incomplete assignments due within `[as_of, as_of + 7 days]`.
pub fn upcoming_deadlines(assignments: &[Assignment], as_of: DateTime<Utc>) -> Vec<&Assignment> {
    let horizon = as_of + Duration::days(DEADLINE_HORIZON_DAYS);
    assignments
        .iter()
        .filter(|a| !a.completed && a.due_date >= as_of && a.due_date <= horizon)
        .collect()
}

pub fn deadline_density(assignments: &[Assignment], as_of: DateTime<Utc>) -> f64 {
    let upcoming = upcoming_deadlines(assignments, as_of);
    let density = clamp_score(upcoming.len() as f64 / DEADLINES_FOR_FULL_DENSITY * 100.0);
    let high_priority = upcoming
        .iter()
        .filter(|a| a.priority == Priority::High)
        .count();

    clamp_score(density + high_priority as f64 * HIGH_PRIORITY_BOOST)
}

pub fn attendance_drop(snapshots: &[AcademicSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }

    let window = RecencyWindow::new(snapshots);
    let Some(current) = window.latest().map(|s| s.attendance_percent) else {
        return 0.0;
    };
    let Some(baseline) = mean_of(window.prior_window(ATTENDANCE_BASELINE_SNAPSHOTS, 1), |s| {
        s.attendance_percent
    }) else {
        return 0.0;
    };

    clamp_score((baseline - current) / ATTENDANCE_DROP_CEILING * 100.0)
}

pub fn activity_change(check_ins: &[CheckIn]) -> f64 {
    let window = RecencyWindow::new(check_ins);
    if window.len() < ENERGY_RECENT_CHECK_INS + ENERGY_BASELINE_CHECK_INS {
        return 0.0;
    }

    let recent = mean_of(window.most_recent(ENERGY_RECENT_CHECK_INS), |c| {
        c.energy_level as f64
    });
    let baseline = mean_of(
        window.prior_window(ENERGY_BASELINE_CHECK_INS, ENERGY_RECENT_CHECK_INS),
        |c| c.energy_level as f64,
    );

    match (recent, baseline) {
        (Some(recent), Some(baseline)) => {
            clamp_score((baseline - recent) / ENERGY_DROP_CEILING * 100.0)
        }
        _ => 0.0,
    }
}

pub fn extract_factors(
    check_ins: &[CheckIn],
    assignments: &[Assignment],
    snapshots: &[AcademicSnapshot],
    ideal_sleep_hours: f64,
    as_of: DateTime<Utc>,
) -> BurnoutFactors {
    BurnoutFactors {
        sleep_deficit: sleep_deficit(check_ins, ideal_sleep_hours),
        stress_trend: stress_trend(check_ins),
        deadline_density: deadline_density(assignments, as_of),
        attendance_drop: attendance_drop(snapshots),
        activity_change: activity_change(check_ins),
    }
}
