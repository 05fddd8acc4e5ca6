pub mod csv_export;
pub mod xlsx_export;

use crate::assemble::LinkageStats;
use crate::error::ExportError;
use crate::matching::cascade::PassStatus;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Everything the summary writers report about one run.
#[derive(Debug, Clone)]
pub struct SummaryContext {
    pub source_a_path: String,
    pub source_b_path: String,
    pub out_path: String,
    pub stats: LinkageStats,
    pub cascade_ms: u64,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
}

impl SummaryContext {
    /// Key/value rows shared by the CSV and XLSX summaries.
    pub fn rows(&self) -> Vec<(String, String)> {
        let s = &self.stats;
        let mut rows: Vec<(String, String)> = vec![
            (format!("Source A ({})", s.label_a), self.source_a_path.clone()),
            (format!("Source B ({})", s.label_b), self.source_b_path.clone()),
            (format!("Total records ({})", s.label_a), s.source_a_total.to_string()),
            (format!("Total records ({})", s.label_b), s.source_b_total.to_string()),
        ];
        for p in &s.passes {
            let key = format!("Pass {} ({})", p.pass.number(), p.pass.label());
            match &p.status {
                PassStatus::Completed => {
                    rows.push((key, p.pairs.to_string()));
                    rows.push((
                        format!("Pass {} records ({} / {})", p.pass.number(), s.label_a, s.label_b),
                        format!("{} / {}", p.source_a_records, p.source_b_records),
                    ));
                    rows.push((
                        format!("Pass {} many-to-many key groups", p.pass.number()),
                        p.many_to_many_groups.to_string(),
                    ));
                }
                status => rows.push((key, status.to_string())),
            }
        }
        rows.push((format!("Only in {}", s.label_a), s.source_a_only.to_string()));
        rows.push((format!("Only in {}", s.label_b), s.source_b_only.to_string()));
        rows.push(("Total unified rows".into(), s.total_rows.to_string()));
        rows.push(("Output".into(), self.out_path.clone()));
        rows.push((
            "Started (UTC)".into(),
            self.started_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
        ));
        rows.push((
            "Ended (UTC)".into(),
            self.ended_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
        ));
        rows.push(("Duration".into(), fmt_duration(self.duration_secs)));
        rows.push(("Cascade (ms)".into(), self.cascade_ms.to_string()));
        rows
    }
}

// HH:MM:SS; hours may exceed 23
fn fmt_duration(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub(crate) fn ensure_parent_dir(path: &str) -> Result<(), ExportError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rows_cover_passes_and_residuals() {
        let table = test_support::sample_table();
        let now = Utc::now();
        let ctx = SummaryContext {
            source_a_path: "a.csv".into(),
            source_b_path: "b.csv".into(),
            out_path: "out.csv".into(),
            stats: table.stats,
            cascade_ms: 3,
            started_utc: now,
            ended_utc: now,
            duration_secs: 3725.4,
        };
        let rows = ctx.rows();
        let get = |k: &str| rows.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("Pass 1 (all_fields)"), Some("1"));
        assert_eq!(get("Pass 2 (street_house)"), Some("0"));
        assert_eq!(get("Only in citywalls"), Some("1"));
        assert_eq!(get("Only in opendata"), Some("1"));
        assert_eq!(get("Total unified rows"), Some("3"));
        assert_eq!(get("Duration"), Some("01:02:05"));
        assert_eq!(get("Pass 1 many-to-many key groups"), Some("0"));
    }
}
