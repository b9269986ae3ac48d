use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{
    BurnoutResult, MoodInsights, Recommendation, RiskLevel, StoredAlert, StudentRecord,
    StudentRisk,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskLevelSummary {
    pub risk_level: RiskLevel,
    pub count: usize,
    pub avg_score: f64,
}

pub fn summarize_by_risk(rows: &[StudentRisk]) -> Vec<RiskLevelSummary> {
    let mut map: HashMap<RiskLevel, (usize, u32)> = HashMap::new();

    for row in rows {
        let entry = map.entry(row.result.risk_level).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u32::from(row.result.score);
    }

    let mut summaries: Vec<RiskLevelSummary> = map
        .into_iter()
        .map(|(risk_level, (count, total_score))| RiskLevelSummary {
            risk_level,
            count,
            avg_score: if count == 0 {
                0.0
            } else {
                total_score as f64 / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
    summaries
}

/// Drops LOW-risk rows; counselors only triage MODERATE and above.
pub fn at_risk(rows: Vec<StudentRisk>) -> Vec<StudentRisk> {
    rows.into_iter()
        .filter(|row| row.result.risk_level >= RiskLevel::Moderate)
        .collect()
}

/// One active alert, led by the id `dismiss --alert-id` takes.
pub fn alert_line(stored: &StoredAlert) -> String {
    let alert = &stored.alert;
    format!(
        "- {} [{}] {} raised {}, in ~{} days: {} {}",
        stored.id,
        alert.severity.as_str(),
        alert.alert_type.as_str(),
        stored.created_at.date_naive(),
        alert.days_ahead,
        alert.prediction,
        alert.recommendation
    )
}

/// Highest score first; ties by name.
pub fn rank_students(rows: &mut [StudentRisk]) {
    rows.sort_by(|a, b| {
        b.result
            .score
            .cmp(&a.result.score)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
}

fn write_factors(output: &mut String, result: &BurnoutResult) {
    let factors = &result.factors;
    for (label, value) in [
        ("Sleep deficit", factors.sleep_deficit),
        ("Stress trend", factors.stress_trend),
        ("Deadline density", factors.deadline_density),
        ("Attendance drop", factors.attendance_drop),
        ("Activity change", factors.activity_change),
    ] {
        let _ = writeln!(output, "- {label}: {value:.1}");
    }
}

pub fn build_student_report(
    student: &StudentRecord,
    as_of: NaiveDate,
    result: &BurnoutResult,
    alerts: &[StoredAlert],
    recommendations: &[Recommendation],
    insights: &MoodInsights,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Wellness Report: {}", student.full_name);
    let _ = writeln!(output, "Generated for {} ({}) on {}", student.email, student.cohort, as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Burnout Score");
    let _ = writeln!(output, "Score {}/100, risk {}", result.score, result.risk_level);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Factors");
    write_factors(&mut output, result);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Mood Insights");
    let _ = writeln!(
        output,
        "- Averages: mood {:.1}, sleep {:.1}h, stress {:.1}, energy {:.1}",
        insights.avg_mood, insights.avg_sleep, insights.avg_stress, insights.avg_energy
    );
    let _ = writeln!(output, "- Mood trend: {:?}", insights.mood_trend);
    if let (Some(best), Some(worst)) = (insights.best_day_of_week, insights.worst_day_of_week) {
        let _ = writeln!(output, "- Best day: {best}, toughest day: {worst}");
    }
    if let Some(stressor) = &insights.top_stressor {
        let _ = writeln!(output, "- Top stressor: {stressor}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Predictive Alerts");
    if alerts.is_empty() {
        let _ = writeln!(output, "No active alerts.");
    } else {
        for stored in alerts {
            let _ = writeln!(output, "{}", alert_line(stored));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    for recommendation in recommendations {
        let _ = writeln!(
            output,
            "- {}: {}",
            recommendation.title, recommendation.description
        );
    }

    output
}

/// Counselor view. Callers pass only students who consented to sharing.
pub fn build_cohort_report(cohort: Option<&str>, as_of: NaiveDate, rows: &[StudentRisk]) -> String {
    let summaries = summarize_by_risk(rows);
    let mut ranked = rows.to_vec();
    rank_students(&mut ranked);

    let mut output = String::new();
    let cohort_label = cohort.unwrap_or("all cohorts");

    let _ = writeln!(output, "# Cohort Burnout Report");
    let _ = writeln!(output, "Generated for {} on {}", cohort_label, as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No consenting students in this cohort.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg score {:.1})",
                summary.risk_level, summary.count, summary.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if ranked.is_empty() {
        let _ = writeln!(output, "No scores computed.");
    } else {
        for row in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) score {} {} with {} active alerts",
                row.student_name,
                row.student_email,
                row.cohort,
                row.result.score,
                row.result.risk_level,
                row.active_alerts
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertSeverity, AlertType, BurnoutFactors, MoodTrend, PredictiveAlert};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn risk_row(name: &str, score: u8, risk_level: RiskLevel) -> StudentRisk {
        StudentRisk {
            student_name: name.to_string(),
            student_email: format!("{}@campus.edu", name.to_lowercase()),
            cohort: "2026".to_string(),
            result: BurnoutResult {
                score,
                risk_level,
                factors: BurnoutFactors::default(),
            },
            active_alerts: 0,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()
    }

    fn stored_alert() -> StoredAlert {
        StoredAlert {
            id: Uuid::parse_str("6a1f0c2e-93b4-4d7a-8e25-0f4c9b7d1a33").unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 19, 8, 30, 0).unwrap(),
            alert: PredictiveAlert {
                alert_type: AlertType::SleepCrisis,
                severity: AlertSeverity::High,
                prediction: "Sleep is sliding.".to_string(),
                recommendation: "Go to bed earlier.".to_string(),
                days_ahead: 3,
            },
        }
    }

    #[test]
    fn alert_line_leads_with_the_dismissable_id() {
        assert_eq!(
            alert_line(&stored_alert()),
            "- 6a1f0c2e-93b4-4d7a-8e25-0f4c9b7d1a33 [HIGH] SLEEP_CRISIS raised 2026-03-19, \
             in ~3 days: Sleep is sliding. Go to bed earlier."
        );
    }

    #[test]
    fn at_risk_drops_low_rows() {
        let rows = vec![
            risk_row("Avery", 24, RiskLevel::Low),
            risk_row("Jules", 25, RiskLevel::Moderate),
            risk_row("Kiara", 80, RiskLevel::Critical),
        ];
        let names: Vec<String> = at_risk(rows).into_iter().map(|r| r.student_name).collect();
        assert_eq!(names, vec!["Jules".to_string(), "Kiara".to_string()]);
    }

    #[test]
    fn summaries_group_by_risk_level_highest_first() {
        let rows = vec![
            risk_row("Avery", 20, RiskLevel::Low),
            risk_row("Jules", 70, RiskLevel::High),
            risk_row("Kiara", 60, RiskLevel::High),
        ];
        let summaries = summarize_by_risk(&rows);
        assert_eq!(
            summaries,
            vec![
                RiskLevelSummary {
                    risk_level: RiskLevel::High,
                    count: 2,
                    avg_score: 65.0,
                },
                RiskLevelSummary {
                    risk_level: RiskLevel::Low,
                    count: 1,
                    avg_score: 20.0,
                },
            ]
        );
    }

    #[test]
    fn cohort_report_ranks_by_score() {
        let rows = vec![
            risk_row("Avery", 20, RiskLevel::Low),
            risk_row("Jules", 80, RiskLevel::Critical),
        ];
        let report = build_cohort_report(Some("2026"), day(), &rows);
        let jules = report.find("Jules").unwrap();
        let avery = report.rfind("Avery").unwrap();
        assert!(jules < avery);
        assert!(report.contains("Generated for 2026 on 2026-03-20"));
    }

    #[test]
    fn empty_cohort_report_says_so() {
        let report = build_cohort_report(None, day(), &[]);
        assert!(report.contains("all cohorts"));
        assert!(report.contains("No consenting students"));
    }

    #[test]
    fn student_report_lists_factors_and_alerts() {
        let student = StudentRecord {
            id: Uuid::new_v4(),
            full_name: "Jules Moreno".to_string(),
            email: "jules.moreno@campus.edu".to_string(),
            cohort: "2026".to_string(),
            shares_data: true,
        };
        let result = BurnoutResult {
            score: 74,
            risk_level: RiskLevel::High,
            factors: BurnoutFactors {
                sleep_deficit: 100.0,
                stress_trend: 80.0,
                deadline_density: 70.0,
                attendance_drop: 35.0,
                activity_change: 60.0,
            },
        };
        let insights = MoodInsights {
            avg_mood: 4.2,
            avg_sleep: 5.1,
            avg_stress: 8.0,
            avg_energy: 4.0,
            mood_trend: MoodTrend::Declining,
            top_stressor: Some("High academic pressure".to_string()),
            best_day_of_week: None,
            worst_day_of_week: None,
        };

        let report = build_student_report(&student, day(), &result, &[], &[], &insights);
        assert!(report.contains("Score 74/100, risk HIGH"));
        let with_alert =
            build_student_report(&student, day(), &result, &[stored_alert()], &[], &insights);
        assert!(with_alert.contains("6a1f0c2e-93b4-4d7a-8e25-0f4c9b7d1a33 [HIGH]"));
        assert!(report.contains("- Attendance drop: 35.0"));
        assert!(report.contains("No active alerts."));
        assert!(report.contains("Top stressor: High academic pressure"));
    }
}
