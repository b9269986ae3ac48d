use std::path::PathBuf;

use anyhow::Context;
use burnout_watch::db::{self, ImportKind};
use burnout_watch::models::{BurnoutResult, StoredAlert, StudentRecord, StudentRisk};
use burnout_watch::{alerts, insights, recommend, report, scoring};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "burnout-watch")]
#[command(about = "Burnout scoring and early alerts for student wellness check-ins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import check-ins, assignments or academic snapshots from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute and store a student's burnout score
    Score {
        #[arg(long)]
        email: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show active predictive alerts, generating new ones when none are active
    Alerts {
        #[arg(long)]
        email: String,
    },
    /// Dismiss an active alert
    Dismiss {
        #[arg(long)]
        alert_id: Uuid,
    },
    /// Summarize mood, sleep and stress over the last 30 check-ins
    Insights {
        #[arg(long)]
        email: String,
    },
    /// Write a markdown wellness report for one student
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Rank consenting students at MODERATE risk or above by their latest stored score
    Cohort {
        #[arg(long)]
        cohort: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Also write the cohort view as markdown
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

async fn score_student(
    pool: &PgPool,
    student: &StudentRecord,
    as_of: DateTime<Utc>,
) -> anyhow::Result<(BurnoutResult, scoring::ScoringInputs)> {
    let inputs = db::fetch_scoring_inputs(pool, student.id, as_of).await?;
    let result = scoring::calculate_burnout(&inputs, &scoring::ScoringConfig::default(), as_of);
    db::record_score(pool, student.id, &result, as_of).await?;
    info!(
        student = %student.email,
        score = result.score,
        risk = %result.risk_level,
        "burnout score recorded"
    );
    Ok((result, inputs))
}

/// Active alerts for the student, generating a fresh batch when none are active.
async fn refresh_alerts(
    pool: &PgPool,
    student: &StudentRecord,
    as_of: DateTime<Utc>,
) -> anyhow::Result<Vec<StoredAlert>> {
    let active = db::fetch_active_alerts(pool, student.id).await?;
    // the 14 newest check-ins, however old
    let check_ins = db::fetch_check_ins(pool, student.id, None, db::ALERT_CHECK_INS).await?;

    if !alerts::should_generate(active.len(), check_ins.len()) {
        return Ok(active);
    }

    let assignments = db::fetch_assignments(pool, student.id).await?;
    let latest_score = db::latest_score(pool, student.id).await?;
    let generated = alerts::generate_alerts(
        &alerts::AlertInputs {
            check_ins: &check_ins,
            assignments: &assignments,
            latest_score,
        },
        as_of,
    );
    if generated.is_empty() {
        return Ok(Vec::new());
    }

    db::insert_alerts(pool, student.id, &generated, as_of).await?;
    info!(student = %student.email, count = generated.len(), "predictive alerts created");
    db::fetch_active_alerts(pool, student.id).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let now = Utc::now();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let inserted = db::import_csv(&pool, kind, &csv).await?;
            println!("Imported {inserted} rows from {}.", csv.display());
        }
        Commands::Score { email, json } => {
            let student = db::find_student(&pool, &email).await?;
            let (result, _) = score_student(&pool, &student, now).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} score {} ({})",
                    student.full_name, result.score, result.risk_level
                );
                let factors = &result.factors;
                println!("  sleep deficit     {:>6.1}", factors.sleep_deficit);
                println!("  stress trend      {:>6.1}", factors.stress_trend);
                println!("  deadline density  {:>6.1}", factors.deadline_density);
                println!("  attendance drop   {:>6.1}", factors.attendance_drop);
                println!("  activity change   {:>6.1}", factors.activity_change);
            }
        }
        Commands::Alerts { email } => {
            let student = db::find_student(&pool, &email).await?;
            let active = refresh_alerts(&pool, &student, now).await?;

            if active.is_empty() {
                println!("No active alerts for {}.", student.full_name);
                return Ok(());
            }

            for stored in &active {
                println!("{}", report::alert_line(stored));
            }
        }
        Commands::Dismiss { alert_id } => {
            if db::dismiss_alert(&pool, alert_id).await? {
                println!("Alert {alert_id} dismissed.");
            } else {
                println!("No active alert with id {alert_id}.");
            }
        }
        Commands::Insights { email } => {
            let student = db::find_student(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(
                &pool,
                student.id,
                Some(db::history_cutoff(now)),
                db::MAX_CHECK_INS,
            )
            .await?;
            let summary = insights::mood_insights(&check_ins);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Report { email, out } => {
            let student = db::find_student(&pool, &email).await?;
            let (result, inputs) = score_student(&pool, &student, now).await?;
            let active = refresh_alerts(&pool, &student, now).await?;
            let recommendations = recommend::recommend(&result, &inputs.check_ins);
            let summary = insights::mood_insights(&inputs.check_ins);
            let markdown = report::build_student_report(
                &student,
                now.date_naive(),
                &result,
                &active,
                &recommendations,
                &summary,
            );
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Cohort { cohort, limit, out } => {
            let students = db::list_consenting_students(&pool, cohort.as_deref()).await?;
            let mut rows = Vec::with_capacity(students.len());
            for student in &students {
                let Some(result) = db::latest_result(&pool, student.id).await? else {
                    continue;
                };
                let active_alerts = db::fetch_active_alerts(&pool, student.id).await?.len();
                rows.push(StudentRisk {
                    student_name: student.full_name.clone(),
                    student_email: student.email.clone(),
                    cohort: student.cohort.clone(),
                    result,
                    active_alerts,
                });
            }

            let mut rows = report::at_risk(rows);
            if rows.is_empty() {
                println!("No consenting students at MODERATE risk or above.");
                return Ok(());
            }

            if let Some(path) = out {
                let markdown = report::build_cohort_report(cohort.as_deref(), now.date_naive(), &rows);
                std::fs::write(&path, markdown)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Cohort report written to {}.", path.display());
            }

            report::rank_students(&mut rows);
            println!("Top students by burnout risk:");
            for row in rows.iter().take(limit) {
                println!(
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
    }

    Ok(())
}
