//! Pipeline metrics recorded through the `metrics` facade.
//!
//! No exporter is installed by the binary, so these are no-ops unless an
//! embedding application registers a recorder.

use std::fmt;

/// All metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RowsLoaded,
    RecordTierAttempts,
    RecordTierFailures,
    JoinMatchedRows,
    JoinUnmatchedRows,
    RowsWritten,
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RowsLoaded => "pipeline_rows_loaded_total",
            MetricName::RecordTierAttempts => "pipeline_record_tier_attempts_total",
            MetricName::RecordTierFailures => "pipeline_record_tier_failures_total",
            MetricName::JoinMatchedRows => "pipeline_join_matched_rows_total",
            MetricName::JoinUnmatchedRows => "pipeline_join_unmatched_rows_total",
            MetricName::RowsWritten => "pipeline_rows_written_total",
            MetricName::RunDuration => "pipeline_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod loaders {
    use super::MetricName;

    pub fn rows_loaded(source: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::RowsLoaded.as_str(), "source" => source)
            .increment(rows as u64);
    }

    pub fn tier_attempt(tier: &'static str) {
        ::metrics::counter!(MetricName::RecordTierAttempts.as_str(), "tier" => tier).increment(1);
    }

    pub fn tier_failure(tier: &'static str) {
        ::metrics::counter!(MetricName::RecordTierFailures.as_str(), "tier" => tier).increment(1);
    }
}

pub mod join {
    use super::MetricName;

    pub fn rows(key: &'static str, matched: usize, unmatched: usize) {
        ::metrics::counter!(MetricName::JoinMatchedRows.as_str(), "key" => key)
            .increment(matched as u64);
        ::metrics::counter!(MetricName::JoinUnmatchedRows.as_str(), "key" => key)
            .increment(unmatched as u64);
    }
}

pub mod run {
    use super::MetricName;

    pub fn completed(rows_written: usize, duration_secs: f64) {
        ::metrics::counter!(MetricName::RowsWritten.as_str()).increment(rows_written as u64);
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(duration_secs);
    }
}
