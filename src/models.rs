use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// One self-reported daily wellness sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub date: NaiveDate,
    pub mood: i32,
    pub sleep_hours: f64,
    pub stress_level: i32,
    pub energy_level: i32,
}

impl CheckIn {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_scale("mood", self.mood)?;
        check_scale("stress_level", self.stress_level)?;
        check_scale("energy_level", self.energy_level)?;
        if !(0.0..=24.0).contains(&self.sleep_hours) {
            return Err(ValidationError::SleepHours(self.sleep_hours));
        }
        Ok(())
    }
}

fn check_scale(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if (1..=10).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfScale { field, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(ValidationError::UnknownVariant {
                kind: "priority",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub completed: bool,
}

/// Periodic academic standing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicSnapshot {
    pub date: NaiveDate,
    pub attendance_percent: f64,
}

impl AcademicSnapshot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if (0.0..=100.0).contains(&self.attendance_percent) {
            Ok(())
        } else {
            Err(ValidationError::Attendance(self.attendance_percent))
        }
    }
}

/// Per-factor decomposition of the composite score, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BurnoutFactors {
    pub sleep_deficit: f64,
    pub stress_trend: f64,
    pub deadline_density: f64,
    pub attendance_drop: f64,
    pub activity_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(RiskLevel::Low),
            "MODERATE" => Ok(RiskLevel::Moderate),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            _ => Err(ValidationError::UnknownVariant {
                kind: "risk level",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnoutResult {
    pub score: u8,
    pub risk_level: RiskLevel,
    pub factors: BurnoutFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    SleepCrisis,
    BurnoutWarning,
    StressSpike,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::SleepCrisis => "SLEEP_CRISIS",
            AlertType::BurnoutWarning => "BURNOUT_WARNING",
            AlertType::StressSpike => "STRESS_SPIKE",
        }
    }
}

impl FromStr for AlertType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SLEEP_CRISIS" => Ok(AlertType::SleepCrisis),
            "BURNOUT_WARNING" => Ok(AlertType::BurnoutWarning),
            "STRESS_SPIKE" => Ok(AlertType::StressSpike),
            _ => Err(ValidationError::UnknownVariant {
                kind: "alert type",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(AlertSeverity::Low),
            "MEDIUM" => Ok(AlertSeverity::Medium),
            "HIGH" => Ok(AlertSeverity::High),
            "CRITICAL" => Ok(AlertSeverity::Critical),
            _ => Err(ValidationError::UnknownVariant {
                kind: "alert severity",
                value: value.to_string(),
            }),
        }
    }
}

/// A forward-looking, rule-triggered warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveAlert {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub prediction: String,
    pub recommendation: String,
    pub days_ahead: i32,
}

/// An active alert as read back from the store; `id` is what dismissal takes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAlert {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub alert: PredictiveAlert,
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub cohort: String,
    pub shares_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    RestPlan,
    StudyPacing,
    BreakReminder,
    WellnessTip,
    ActivitySuggestion,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::RestPlan => "REST_PLAN",
            RecommendationKind::StudyPacing => "STUDY_PACING",
            RecommendationKind::BreakReminder => "BREAK_REMINDER",
            RecommendationKind::WellnessTip => "WELLNESS_TIP",
            RecommendationKind::ActivitySuggestion => "ACTIVITY_SUGGESTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoodTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodInsights {
    pub avg_mood: f64,
    pub avg_sleep: f64,
    pub avg_stress: f64,
    pub avg_energy: f64,
    pub mood_trend: MoodTrend,
    pub top_stressor: Option<String>,
    pub best_day_of_week: Option<chrono::Weekday>,
    pub worst_day_of_week: Option<chrono::Weekday>,
}

/// One row of the counselor cohort view.
#[derive(Debug, Clone)]
pub struct StudentRisk {
    pub student_name: String,
    pub student_email: String,
    pub cohort: String,
    pub result: BurnoutResult,
    pub active_alerts: usize,
}
