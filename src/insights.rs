use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};

use crate::models::{CheckIn, MoodInsights, MoodTrend};
use crate::window::{mean_of, RecencyWindow};

pub const INSIGHT_WINDOW: usize = 30;
const TREND_WINDOW: usize = 7;
const TREND_BAND: f64 = 1.0;

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mood_insights(check_ins: &[CheckIn]) -> MoodInsights {
    let window = RecencyWindow::new(check_ins);
    let records = window.most_recent(INSIGHT_WINDOW);

    let avg_mood = mean_of(records, |c| c.mood as f64).unwrap_or(0.0);
    let avg_sleep = mean_of(records, |c| c.sleep_hours).unwrap_or(0.0);
    let avg_stress = mean_of(records, |c| c.stress_level as f64).unwrap_or(0.0);
    let avg_energy = mean_of(records, |c| c.energy_level as f64).unwrap_or(0.0);

    let recent_mood = mean_of(window.most_recent(TREND_WINDOW), |c| c.mood as f64);
    let older_mood = mean_of(window.prior_window(TREND_WINDOW, TREND_WINDOW), |c| c.mood as f64);
    let mood_trend = match (recent_mood, older_mood) {
        (Some(recent), Some(older)) if recent > older + TREND_BAND => MoodTrend::Improving,
        (Some(recent), Some(older)) if recent < older - TREND_BAND => MoodTrend::Declining,
        _ => MoodTrend::Stable,
    };

    // keyed Monday-first so ties resolve the same way every run
    let mut by_day: BTreeMap<u32, (Weekday, f64, usize)> = BTreeMap::new();
    for check_in in records {
        let weekday = check_in.date.weekday();
        let entry = by_day
            .entry(weekday.num_days_from_monday())
            .or_insert((weekday, 0.0, 0));
        entry.1 += check_in.mood as f64;
        entry.2 += 1;
    }

    let mut best: Option<(Weekday, f64)> = None;
    let mut worst: Option<(Weekday, f64)> = None;
    for (weekday, total, count) in by_day.into_values() {
        let avg = total / count as f64;
        if best.map_or(true, |(_, high)| avg > high) {
            best = Some((weekday, avg));
        }
        if worst.map_or(true, |(_, low)| avg < low) {
            worst = Some((weekday, avg));
        }
    }

    let top_stressor = if avg_stress > 7.0 {
        Some("High academic pressure")
    } else if !records.is_empty() && avg_sleep < 6.0 {
        Some("Sleep deprivation")
    } else if !records.is_empty() && avg_energy < 4.0 {
        Some("Low energy levels")
    } else {
        None
    };

    MoodInsights {
        avg_mood: one_decimal(avg_mood),
        avg_sleep: one_decimal(avg_sleep),
        avg_stress: one_decimal(avg_stress),
        avg_energy: one_decimal(avg_energy),
        mood_trend,
        top_stressor: top_stressor.map(str::to_string),
        best_day_of_week: best.map(|(day, _)| day),
        worst_day_of_week: worst.map(|(day, _)| day),
    }
}
