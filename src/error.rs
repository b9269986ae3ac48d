use thiserror::Error;

/// Rejected input at the import boundary. The scoring core itself never
/// produces these; it only clamps its outputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be on the 1-10 scale, got {value}")]
    OutOfScale { field: &'static str, value: i32 },

    #[error("sleep hours must be between 0 and 24, got {0}")]
    SleepHours(f64),

    #[error("attendance percent must be between 0 and 100, got {0}")]
    Attendance(f64),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
