//! Burnout scoring for student wellness check-ins.
//!
//! The pure core is [`signals`], [`scoring`] and [`alerts`]; [`db`] and
//! [`report`] are the Postgres store and markdown output used by the CLI.

pub mod alerts;
pub mod db;
pub mod error;
pub mod insights;
pub mod models;
pub mod recommend;
pub mod report;
pub mod scoring;
pub mod signals;
pub mod window;

pub use alerts::{generate_alerts, should_generate, AlertInputs};
pub use error::ValidationError;
pub use scoring::{calculate_burnout, ScoringConfig, ScoringInputs};
