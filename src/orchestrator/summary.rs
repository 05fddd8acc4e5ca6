//! Summary report generation utilities.

use crate::assemble::LinkageStats;
use crate::export::SummaryContext;

/// Builder for SummaryContext to simplify summary creation.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    pub source_a_path: String,
    pub source_b_path: String,
    pub out_path: String,
    pub stats: LinkageStats,
    pub cascade_ms: u64,
    pub started_utc: chrono::DateTime<chrono::Utc>,
    pub ended_utc: chrono::DateTime<chrono::Utc>,
}

impl Default for SummaryBuilder {
    fn default() -> Self {
        let now = chrono::Utc::now();
        Self {
            source_a_path: String::new(),
            source_b_path: String::new(),
            out_path: String::new(),
            stats: LinkageStats::default(),
            cascade_ms: 0,
            started_utc: now,
            ended_utc: now,
        }
    }
}

impl SummaryBuilder {
    pub fn new(source_a_path: &str, source_b_path: &str, out_path: &str) -> Self {
        Self {
            source_a_path: source_a_path.to_string(),
            source_b_path: source_b_path.to_string(),
            out_path: out_path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_stats(mut self, stats: LinkageStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_cascade_ms(mut self, ms: u64) -> Self {
        self.cascade_ms = ms;
        self
    }

    /// Set run timestamps.
    pub fn with_timestamps(
        mut self,
        started: chrono::DateTime<chrono::Utc>,
        ended: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn build(self) -> SummaryContext {
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        SummaryContext {
            source_a_path: self.source_a_path,
            source_b_path: self.source_b_path,
            out_path: self.out_path,
            stats: self.stats,
            cascade_ms: self.cascade_ms,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
        }
    }
}
