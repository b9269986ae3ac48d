//! Numeric helpers shared by the signal extractor and the alert rules.
//!
//! Every factor works on "the most recent N records", so instead of slicing
//! caller-supplied lists by index we sort once into a [`RecencyWindow`] and
//! ask it for named windows.

use chrono::NaiveDate;

use crate::models::{AcademicSnapshot, CheckIn};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Clamp to [0, 100]. NaN collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for CheckIn {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for AcademicSnapshot {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Borrowed view of records ordered most recent first.
#[derive(Debug, Clone)]
pub struct RecencyWindow<'a, T> {
    records: Vec<&'a T>,
}

impl<'a, T: Dated> RecencyWindow<'a, T> {
    pub fn new(records: &'a [T]) -> Self {
        let mut records: Vec<&'a T> = records.iter().collect();
        // stable sort keeps caller order for same-day records
        records.sort_by(|a, b| b.date().cmp(&a.date()));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&'a T> {
        self.records.first().copied()
    }

    /// Up to `n` newest records.
    pub fn most_recent(&self, n: usize) -> &[&'a T] {
        self.prior_window(n, 0)
    }

    /// Up to `n` records after skipping the `offset` newest ones.
    pub fn prior_window(&self, n: usize, offset: usize) -> &[&'a T] {
        let start = offset.min(self.records.len());
        let end = offset.saturating_add(n).min(self.records.len());
        &self.records[start..end]
    }
}

/// Mean of one field over a window of borrowed records.
pub fn mean_of<T, F>(records: &[&T], field: F) -> Option<f64>
where
    F: Fn(&T) -> f64,
{
    mean(records.iter().map(|record| field(*record)))
}
