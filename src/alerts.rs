//! Predictive alerts.
//!
//! This is a fixed rule table, not a forecast model: each rule compares the
//! latest week of check-ins with the week before it (plus the stored burnout
//! score and upcoming deadlines) and either fires one alert or stays silent.
//! Rules are evaluated independently, so a single run yields 0 to 4 alerts.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{AlertSeverity, AlertType, Assignment, CheckIn, PredictiveAlert};
use crate::window::{mean_of, RecencyWindow};

pub const MIN_CHECK_INS: usize = 7;
pub const TREND_WINDOW: usize = 7;

const SLEEP_DROP_HOURS: f64 = 1.0;
const SLEEP_CRISIS_HOURS: f64 = 6.0;
const SLEEP_CRITICAL_HOURS: f64 = 5.0;
const BURNOUT_WARNING_SCORE: u8 = 60;
const BURNOUT_CRITICAL_SCORE: u8 = 75;
const STRESS_SPIKE_LEVEL: f64 = 7.0;
const STRESS_SPIKE_DEADLINES: usize = 3;
const STRESS_SPIKE_HORIZON_DAYS: i64 = 7;
const LOW_MOOD_LEVEL: f64 = 5.0;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy)]
pub struct AlertInputs<'a> {
    /// Recent check-ins; only the 14 newest are read.
    pub check_ins: &'a [CheckIn],
    pub assignments: &'a [Assignment],
    /// Most recent persisted composite score, if any.
    pub latest_score: Option<u8>,
}

/// Generation is one-shot per dismissal cycle: only when the student has no
/// active alerts and at least a week of check-ins.
pub fn should_generate(active_alerts: usize, check_in_count: usize) -> bool {
    active_alerts == 0 && check_in_count >= MIN_CHECK_INS
}

/// Aggregates the rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSnapshot {
    pub recent_sleep: f64,
    pub older_sleep: f64,
    pub recent_stress: f64,
    pub recent_mood: f64,
    pub latest_score: Option<u8>,
    pub deadlines_this_week: usize,
}

impl TrendSnapshot {
    pub fn from_inputs(inputs: &AlertInputs<'_>, as_of: DateTime<Utc>) -> Option<Self> {
        let window = RecencyWindow::new(inputs.check_ins);
        if window.is_empty() {
            return None;
        }
        let recent = window.most_recent(TREND_WINDOW);
        let older = window.prior_window(TREND_WINDOW, TREND_WINDOW);

        let recent_sleep = mean_of(recent, |c| c.sleep_hours)?;
        let recent_stress = mean_of(recent, |c| c.stress_level as f64)?;
        let recent_mood = mean_of(recent, |c| c.mood as f64)?;
        // without an older week there is no trend to compare against
        let older_sleep = mean_of(older, |c| c.sleep_hours).unwrap_or(recent_sleep);

        Some(TrendSnapshot {
            recent_sleep,
            older_sleep,
            recent_stress,
            recent_mood,
            latest_score: inputs.latest_score,
            deadlines_this_week: deadlines_in_days(inputs.assignments, as_of),
        })
    }
}

/// Whole days until `due`, rounded up at millisecond precision.
fn days_until(due: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    let millis = (due - as_of).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}

/// Incomplete assignments whose whole-day countdown is 1 to 7.
fn deadlines_in_days(assignments: &[Assignment], as_of: DateTime<Utc>) -> usize {
    assignments
        .iter()
        .filter(|a| !a.completed)
        .filter(|a| (1..=STRESS_SPIKE_HORIZON_DAYS).contains(&days_until(a.due_date, as_of)))
        .count()
}

pub struct AlertRule {
    pub name: &'static str,
    pub evaluate: fn(&TrendSnapshot) -> Option<PredictiveAlert>,
}

pub const RULES: [AlertRule; 4] = [
    AlertRule {
        name: "sleep_crisis",
        evaluate: sleep_crisis,
    },
    AlertRule {
        name: "burnout_warning",
        evaluate: burnout_warning,
    },
    AlertRule {
        name: "stress_spike",
        evaluate: stress_spike,
    },
    AlertRule {
        name: "mood_decline",
        evaluate: mood_decline,
    },
];

fn sleep_crisis(trend: &TrendSnapshot) -> Option<PredictiveAlert> {
    let declining = trend.recent_sleep < trend.older_sleep - SLEEP_DROP_HOURS;
    if !declining || trend.recent_sleep >= SLEEP_CRISIS_HOURS {
        return None;
    }

    let severity = if trend.recent_sleep < SLEEP_CRITICAL_HOURS {
        AlertSeverity::Critical
    } else {
        AlertSeverity::High
    };
    Some(PredictiveAlert {
        alert_type: AlertType::SleepCrisis,
        severity,
        prediction: format!(
            "Your sleep has dropped from {:.1}h to {:.1}h a night; at this pace you risk sleep deprivation by next week.",
            trend.older_sleep, trend.recent_sleep
        ),
        recommendation: "Prioritize 7-8 hours of sleep tonight. Set a bedtime alarm and avoid screens 30 minutes before bed.".to_string(),
        days_ahead: 3,
    })
}

fn burnout_warning(trend: &TrendSnapshot) -> Option<PredictiveAlert> {
    let score = trend.latest_score.filter(|s| *s > BURNOUT_WARNING_SCORE)?;
    let severity = if score > BURNOUT_CRITICAL_SCORE {
        AlertSeverity::Critical
    } else {
        AlertSeverity::High
    };
    Some(PredictiveAlert {
        alert_type: AlertType::BurnoutWarning,
        severity,
        prediction: format!(
            "Your burnout score is {score}/100; on this trend you may reach critical levels within 5-7 days."
        ),
        recommendation: "Book a counselor session now. Take a mental health day if you can and keep up daily self-care.".to_string(),
        days_ahead: 5,
    })
}

fn stress_spike(trend: &TrendSnapshot) -> Option<PredictiveAlert> {
    if trend.recent_stress <= STRESS_SPIKE_LEVEL || trend.deadlines_this_week < STRESS_SPIKE_DEADLINES {
        return None;
    }

    Some(PredictiveAlert {
        alert_type: AlertType::StressSpike,
        severity: AlertSeverity::High,
        prediction: format!(
            "You have {} deadlines in the next week with stress averaging {:.1}/10. Stress will likely intensify.",
            trend.deadlines_this_week, trend.recent_stress
        ),
        recommendation: "Work in focused Pomodoro blocks and split each task into smaller pieces. Start the earliest deadline today.".to_string(),
        days_ahead: 2,
    })
}

fn mood_decline(trend: &TrendSnapshot) -> Option<PredictiveAlert> {
    if trend.recent_mood >= LOW_MOOD_LEVEL || trend.recent_mood >= trend.recent_stress {
        return None;
    }

    // low mood is reported as an early burnout warning
    Some(PredictiveAlert {
        alert_type: AlertType::BurnoutWarning,
        severity: AlertSeverity::Medium,
        prediction: format!(
            "Your mood has averaged {:.1}/10 this week, below your stress level of {:.1}/10. This could affect your coursework.",
            trend.recent_mood, trend.recent_stress
        ),
        recommendation: "Try a breathing exercise, reach out to a friend, and consider talking to a counselor.".to_string(),
        days_ahead: 4,
    })
}

/// Evaluates every rule. Gating is the caller's job, see [`should_generate`].
pub fn generate_alerts(inputs: &AlertInputs<'_>, as_of: DateTime<Utc>) -> Vec<PredictiveAlert> {
    let Some(trend) = TrendSnapshot::from_inputs(inputs, as_of) else {
        return Vec::new();
    };

    RULES
        .iter()
        .filter_map(|rule| {
            let alert = (rule.evaluate)(&trend);
            if alert.is_some() {
                debug!(rule = rule.name, "predictive rule fired");
            }
            alert
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
    }

    fn check_in(days_ago: i64, mood: i32, sleep_hours: f64, stress_level: i32) -> CheckIn {
        CheckIn {
            date: as_of().date_naive() - Duration::days(days_ago),
            mood,
            sleep_hours,
            stress_level,
            energy_level: 5,
        }
    }

    /// Seven recent days followed by seven older days.
    fn fortnight(recent_sleep: f64, older_sleep: f64) -> Vec<CheckIn> {
        (0..14)
            .map(|d| {
                let sleep = if d < 7 { recent_sleep } else { older_sleep };
                check_in(d, 7, sleep, 4)
            })
            .collect()
    }

    fn due_in(duration: Duration) -> Assignment {
        Assignment {
            title: "Lab report".to_string(),
            due_date: as_of() + duration,
            priority: Priority::Medium,
            completed: false,
        }
    }

    fn run(check_ins: &[CheckIn], assignments: &[Assignment], latest_score: Option<u8>) -> Vec<PredictiveAlert> {
        generate_alerts(
            &AlertInputs {
                check_ins,
                assignments,
                latest_score,
            },
            as_of(),
        )
    }

    fn types(alerts: &[PredictiveAlert]) -> Vec<AlertType> {
        alerts.iter().map(|a| a.alert_type).collect()
    }

    #[test]
    fn gating_requires_a_week_and_no_active_alerts() {
        assert!(should_generate(0, 7));
        assert!(!should_generate(0, 6));
        assert!(!should_generate(1, 14));
    }

    #[test]
    fn sleep_crisis_at_five_hours_is_high() {
        let alerts = run(&fortnight(5.0, 7.5), &[], None);
        assert_eq!(types(&alerts), vec![AlertType::SleepCrisis]);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].days_ahead, 3);
    }

    #[test]
    fn sleep_crisis_below_five_hours_is_critical() {
        let alerts = run(&fortnight(4.99, 7.5), &[], None);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn steady_short_sleep_is_not_a_crisis() {
        assert!(run(&fortnight(5.5, 6.0), &[], None).is_empty());
    }

    #[test]
    fn missing_older_week_suppresses_sleep_crisis() {
        let check_ins: Vec<CheckIn> = (0..7).map(|d| check_in(d, 7, 3.0, 4)).collect();
        assert!(run(&check_ins, &[], None).is_empty());
    }

    #[test]
    fn burnout_warning_follows_stored_score() {
        let check_ins = fortnight(7.5, 7.5);
        assert!(run(&check_ins, &[], Some(60)).is_empty());

        let high = run(&check_ins, &[], Some(61));
        assert_eq!(types(&high), vec![AlertType::BurnoutWarning]);
        assert_eq!(high[0].severity, AlertSeverity::High);
        assert_eq!(high[0].days_ahead, 5);

        assert_eq!(run(&check_ins, &[], Some(75))[0].severity, AlertSeverity::High);
        assert_eq!(run(&check_ins, &[], Some(76))[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn stress_spike_needs_three_deadlines_within_the_week() {
        let check_ins: Vec<CheckIn> = (0..7).map(|d| check_in(d, 8, 7.5, 8)).collect();
        let mut assignments = vec![
            due_in(Duration::hours(20)),
            due_in(Duration::days(3)),
            due_in(Duration::days(8)),
        ];
        assert!(run(&check_ins, &assignments, None).is_empty());

        assignments.push(due_in(Duration::days(7)));
        let alerts = run(&check_ins, &assignments, None);
        assert_eq!(types(&alerts), vec![AlertType::StressSpike]);
        assert_eq!(alerts[0].days_ahead, 2);
        assert!(alerts[0].prediction.contains("3 deadlines"));
    }

    #[test]
    fn stress_spike_ignores_overdue_and_completed_work() {
        let check_ins: Vec<CheckIn> = (0..7).map(|d| check_in(d, 8, 7.5, 9)).collect();
        let mut done = due_in(Duration::days(2));
        done.completed = true;
        let assignments = vec![
            due_in(Duration::hours(-3)),
            due_in(Duration::zero()),
            done,
            due_in(Duration::days(1)),
            due_in(Duration::days(2)),
        ];
        assert!(run(&check_ins, &assignments, None).is_empty());
    }

    #[test]
    fn mood_decline_requires_mood_below_stress() {
        let low_mood: Vec<CheckIn> = (0..7).map(|d| check_in(d, 3, 7.5, 6)).collect();
        let alerts = run(&low_mood, &[], None);
        assert_eq!(types(&alerts), vec![AlertType::BurnoutWarning]);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert!(alerts[0].prediction.contains("mood has averaged 3.0/10"));
        assert_eq!(alerts[0].days_ahead, 4);

        let calm: Vec<CheckIn> = (0..7).map(|d| check_in(d, 3, 7.5, 2)).collect();
        assert!(run(&calm, &[], None).is_empty());
    }

    #[test]
    fn all_rules_can_fire_together() {
        let mut check_ins: Vec<CheckIn> = (0..7).map(|d| check_in(d, 2, 4.0, 9)).collect();
        check_ins.extend((7..14).map(|d| check_in(d, 7, 8.0, 4)));
        let assignments: Vec<Assignment> =
            (1..=3).map(|d| due_in(Duration::days(d))).collect();

        let alerts = run(&check_ins, &assignments, Some(80));
        assert_eq!(
            types(&alerts),
            vec![
                AlertType::SleepCrisis,
                AlertType::BurnoutWarning,
                AlertType::StressSpike,
                AlertType::BurnoutWarning,
            ]
        );
        let severities: Vec<AlertSeverity> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![
                AlertSeverity::Critical,
                AlertSeverity::Critical,
                AlertSeverity::High,
                AlertSeverity::Medium,
            ]
        );
    }

    #[test]
    fn day_count_rounds_up_sub_second_remainders() {
        let just_after_now: Vec<Assignment> =
            (0..3).map(|_| due_in(Duration::milliseconds(500))).collect();
        assert_eq!(deadlines_in_days(&just_after_now, as_of()), 3);

        let just_past_a_week: Vec<Assignment> = (0..3)
            .map(|_| due_in(Duration::days(7) + Duration::milliseconds(500)))
            .collect();
        assert_eq!(deadlines_in_days(&just_past_a_week, as_of()), 0);

        assert_eq!(days_until(as_of() + Duration::days(7), as_of()), 7);
        assert_eq!(days_until(as_of() - Duration::milliseconds(500), as_of()), 0);
    }

    #[test]
    fn stress_spike_counts_work_due_within_the_first_second() {
        let check_ins: Vec<CheckIn> = (0..7).map(|d| check_in(d, 8, 7.5, 8)).collect();
        let assignments: Vec<Assignment> =
            (0..3).map(|_| due_in(Duration::milliseconds(500))).collect();
        assert_eq!(
            types(&run(&check_ins, &assignments, None)),
            vec![AlertType::StressSpike]
        );
    }

    #[test]
    fn older_week_is_read_without_a_date_cutoff() {
        // sparse history: fourteen check-ins, one every four days
        let check_ins: Vec<CheckIn> = (0..14)
            .map(|i| check_in(i * 4, 7, if i < 7 { 4.5 } else { 8.0 }, 4))
            .collect();
        let alerts = run(&check_ins, &[], None);
        assert_eq!(types(&alerts), vec![AlertType::SleepCrisis]);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn no_check_ins_means_no_alerts() {
        assert!(run(&[], &[], Some(90)).is_empty());
    }
}
