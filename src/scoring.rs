//! Composite burnout score and risk classification.
//!
//! Weights and thresholds live in a [`ScoringConfig`] value that callers pass
//! in. `ScoringConfig::default()` is the production configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    AcademicSnapshot, Assignment, BurnoutFactors, BurnoutResult, CheckIn, RiskLevel,
};
use crate::signals;
use crate::window::clamp_score;

pub const IDEAL_SLEEP_HOURS: f64 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub sleep_deficit: f64,
    pub stress_trend: f64,
    pub deadline_density: f64,
    pub attendance_drop: f64,
    pub activity_change: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            sleep_deficit: 0.25,
            stress_trend: 0.30,
            deadline_density: 0.20,
            attendance_drop: 0.15,
            activity_change: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.sleep_deficit
            + self.stress_trend
            + self.deadline_density
            + self.attendance_drop
            + self.activity_change
    }
}

/// Lower bounds (inclusive) of each risk band above LOW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub moderate: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            moderate: 25.0,
            high: 50.0,
            critical: 75.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub thresholds: RiskThresholds,
    pub ideal_sleep_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weights: FactorWeights::default(),
            thresholds: RiskThresholds::default(),
            ideal_sleep_hours: IDEAL_SLEEP_HOURS,
        }
    }
}

/// Everything the scoring core reads for one student.
#[derive(Debug, Clone, Default)]
pub struct ScoringInputs {
    pub check_ins: Vec<CheckIn>,
    pub assignments: Vec<Assignment>,
    pub snapshots: Vec<AcademicSnapshot>,
}

/// Weighted sum of the factors, unrounded and clamped to [0, 100].
pub fn compose_score(factors: &BurnoutFactors, weights: &FactorWeights) -> f64 {
    clamp_score(
        factors.sleep_deficit * weights.sleep_deficit
            + factors.stress_trend * weights.stress_trend
            + factors.deadline_density * weights.deadline_density
            + factors.attendance_drop * weights.attendance_drop
            + factors.activity_change * weights.activity_change,
    )
}

pub fn classify(score: f64, thresholds: &RiskThresholds) -> RiskLevel {
    if score >= thresholds.critical {
        RiskLevel::Critical
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.moderate {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

pub fn finalize(factors: BurnoutFactors, config: &ScoringConfig) -> BurnoutResult {
    let composite = compose_score(&factors, &config.weights);
    let score = composite.round() as u8;
    // classify the reported integer so score and band never disagree
    let risk_level = classify(f64::from(score), &config.thresholds);

    BurnoutResult {
        score,
        risk_level,
        factors,
    }
}

pub fn calculate_burnout(
    inputs: &ScoringInputs,
    config: &ScoringConfig,
    as_of: DateTime<Utc>,
) -> BurnoutResult {
    let factors = signals::extract_factors(
        &inputs.check_ins,
        &inputs.assignments,
        &inputs.snapshots,
        config.ideal_sleep_hours,
        as_of,
    );
    let result = finalize(factors, config);
    debug!(
        score = result.score,
        risk = %result.risk_level,
        sleep_deficit = factors.sleep_deficit,
        stress_trend = factors.stress_trend,
        deadline_density = factors.deadline_density,
        attendance_drop = factors.attendance_drop,
        activity_change = factors.activity_change,
        "burnout score computed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn stressed_profile() -> BurnoutFactors {
        BurnoutFactors {
            sleep_deficit: 100.0,
            stress_trend: 80.0,
            deadline_density: 70.0,
            attendance_drop: 35.0,
            activity_change: 60.0,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((FactorWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stressed_profile_scores_high() {
        let result = finalize(stressed_profile(), &ScoringConfig::default());
        assert_eq!(result.score, 74);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.factors, stressed_profile());
    }

    #[test]
    fn thresholds_are_exact_at_boundaries() {
        let thresholds = RiskThresholds::default();
        let cases = [
            (75.0, RiskLevel::Critical),
            (74.0, RiskLevel::High),
            (50.0, RiskLevel::High),
            (49.0, RiskLevel::Moderate),
            (25.0, RiskLevel::Moderate),
            (24.0, RiskLevel::Low),
            (0.0, RiskLevel::Low),
            (100.0, RiskLevel::Critical),
        ];
        for (score, expected) in cases {
            assert_eq!(classify(score, &thresholds), expected, "score {score}");
        }
    }

    #[test]
    fn empty_inputs_score_zero_and_low() {
        let as_of = Utc.with_ymd_and_hms(2026, 3, 20, 9, 0, 0).unwrap();
        let result = calculate_burnout(&ScoringInputs::default(), &ScoringConfig::default(), as_of);
        assert_eq!(
            result,
            BurnoutResult {
                score: 0,
                risk_level: RiskLevel::Low,
                factors: BurnoutFactors::default(),
            }
        );
    }

    #[test]
    fn overridden_weights_do_not_leak_into_defaults() {
        let mut config = ScoringConfig::default();
        config.weights = FactorWeights {
            sleep_deficit: 1.0,
            stress_trend: 0.0,
            deadline_density: 0.0,
            attendance_drop: 0.0,
            activity_change: 0.0,
        };
        assert_eq!(finalize(stressed_profile(), &config).score, 100);
        assert_eq!(finalize(stressed_profile(), &ScoringConfig::default()).score, 74);
    }

    fn arb_factors() -> impl Strategy<Value = BurnoutFactors> {
        (
            0.0f64..=100.0,
            0.0f64..=100.0,
            0.0f64..=100.0,
            0.0f64..=100.0,
            0.0f64..=100.0,
        )
            .prop_map(|(a, b, c, d, e)| BurnoutFactors {
                sleep_deficit: a,
                stress_trend: b,
                deadline_density: c,
                attendance_drop: d,
                activity_change: e,
            })
    }

    proptest! {
        #[test]
        fn score_is_rounded_weighted_sum(factors in arb_factors()) {
            let result = finalize(factors, &ScoringConfig::default());
            let expected = factors.sleep_deficit * 0.25
                + factors.stress_trend * 0.30
                + factors.deadline_density * 0.20
                + factors.attendance_drop * 0.15
                + factors.activity_change * 0.10;
            prop_assert!(result.score <= 100);
            prop_assert!((f64::from(result.score) - expected).abs() <= 0.5 + 1e-9);
        }

        #[test]
        fn risk_is_monotonic_in_score(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let thresholds = RiskThresholds::default();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(low, &thresholds) <= classify(high, &thresholds));
        }
    }
}
