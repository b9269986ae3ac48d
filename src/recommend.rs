use crate::models::{BurnoutResult, CheckIn, Recommendation, RecommendationKind};
use crate::window::RecencyWindow;

pub const MAX_RECOMMENDATIONS: usize = 5;

const SLEEP_DEFICIT_TRIGGER: f64 = 50.0;
const STRESS_TREND_TRIGGER: f64 = 70.0;
const DEADLINE_DENSITY_TRIGGER: f64 = 60.0;
const LOW_ENERGY_LEVEL: i32 = 4;

fn recommendation(kind: RecommendationKind, title: &str, description: &str) -> Recommendation {
    Recommendation {
        kind,
        title: title.to_string(),
        description: description.to_string(),
    }
}

/// Rule-based suggestions for a freshly computed score. The Pomodoro break
/// reminder is always included.
pub fn recommend(result: &BurnoutResult, check_ins: &[CheckIn]) -> Vec<Recommendation> {
    let factors = &result.factors;
    let mut recommendations = Vec::new();

    if factors.sleep_deficit > SLEEP_DEFICIT_TRIGGER {
        recommendations.push(recommendation(
            RecommendationKind::RestPlan,
            "Prioritize Sleep Tonight",
            "Your sleep deficit is elevated. Aim for at least 7-8 hours tonight. Set a bedtime alarm and avoid screens 1 hour before bed.",
        ));
    }

    if factors.stress_trend > STRESS_TREND_TRIGGER {
        recommendations.push(recommendation(
            RecommendationKind::WellnessTip,
            "Try the 5-4-3-2-1 Grounding Technique",
            "When stress builds, name 5 things you see, 4 you can touch, 3 you hear, 2 you smell and 1 you taste.",
        ));
    }

    if factors.deadline_density > DEADLINE_DENSITY_TRIGGER {
        recommendations.push(recommendation(
            RecommendationKind::StudyPacing,
            "Break Down Large Assignments",
            "Several deadlines are close together. Split each assignment into smaller tasks spread over several days instead of cramming.",
        ));
    }

    let low_energy = RecencyWindow::new(check_ins)
        .latest()
        .is_some_and(|c| c.energy_level < LOW_ENERGY_LEVEL);
    if low_energy {
        recommendations.push(recommendation(
            RecommendationKind::ActivitySuggestion,
            "Take a 10-Minute Walk",
            "Your energy is low today. A short walk outdoors can lift energy and focus.",
        ));
    }

    recommendations.push(recommendation(
        RecommendationKind::BreakReminder,
        "Use the Pomodoro Technique",
        "Work for 25 minutes, then take a 5-minute break. After 4 cycles, take a longer 15-30 minute break.",
    ));

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BurnoutFactors, RiskLevel};
    use chrono::NaiveDate;

    fn result_with(factors: BurnoutFactors) -> BurnoutResult {
        BurnoutResult {
            score: 0,
            risk_level: RiskLevel::Low,
            factors,
        }
    }

    fn check_in(day: u32, energy_level: i32) -> CheckIn {
        CheckIn {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            mood: 5,
            sleep_hours: 7.0,
            stress_level: 5,
            energy_level,
        }
    }

    fn kinds(recommendations: &[Recommendation]) -> Vec<RecommendationKind> {
        recommendations.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn calm_student_gets_only_break_reminder() {
        let recs = recommend(&result_with(BurnoutFactors::default()), &[]);
        assert_eq!(kinds(&recs), vec![RecommendationKind::BreakReminder]);
    }

    #[test]
    fn every_rule_fires_in_order() {
        let factors = BurnoutFactors {
            sleep_deficit: 80.0,
            stress_trend: 90.0,
            deadline_density: 100.0,
            attendance_drop: 0.0,
            activity_change: 0.0,
        };
        let check_ins = vec![check_in(1, 9), check_in(2, 2)];
        let recs = recommend(&result_with(factors), &check_ins);
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::RestPlan,
                RecommendationKind::WellnessTip,
                RecommendationKind::StudyPacing,
                RecommendationKind::ActivitySuggestion,
                RecommendationKind::BreakReminder,
            ]
        );
    }

    #[test]
    fn energy_rule_reads_the_newest_check_in() {
        let check_ins = vec![check_in(2, 8), check_in(1, 1)];
        let recs = recommend(&result_with(BurnoutFactors::default()), &check_ins);
        assert!(!kinds(&recs).contains(&RecommendationKind::ActivitySuggestion));
    }

    #[test]
    fn thresholds_are_strict() {
        let factors = BurnoutFactors {
            sleep_deficit: 50.0,
            stress_trend: 70.0,
            deadline_density: 60.0,
            ..BurnoutFactors::default()
        };
        let recs = recommend(&result_with(factors), &[]);
        assert_eq!(recs.len(), 1);
    }
}
