//! Orchestrator module: high-level workflow coordination.
//!
//! A run loads both sources, prepares and normalizes them, runs the cascade,
//! assembles the unified table and writes it out in the configured formats.

pub mod summary;

use anyhow::{Context, Result};
use log::info;

use crate::assemble::{AssembleOptions, UnifiedTable, assemble};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::export::SummaryContext;
use crate::export::csv_export::{export_summary_csv, export_unified_csv};
use crate::export::xlsx_export::export_unified_xlsx;
use crate::input::load_csv_source;
use crate::matching::cascade::run_cascade;
use crate::models::RawTable;
use crate::normalize::normalize_source;
use crate::prepare::prepare_source;
use summary::SummaryBuilder;

/// Unified table plus the cascade wall time in milliseconds.
#[derive(Debug, Clone)]
pub struct Linkage {
    pub table: UnifiedTable,
    pub cascade_ms: u64,
}

/// Link two already-loaded tables. Only parser-profile compilation can fail.
pub fn link_tables(raw_a: RawTable, raw_b: RawTable, cfg: &AppConfig) -> Result<Linkage, ConfigError> {
    let parser_a = cfg.source_a.parser.compile()?;
    let parser_b = cfg.source_b.parser.compile()?;

    let a = prepare_source(raw_a, &cfg.source_a.columns, &parser_a);
    let b = prepare_source(raw_b, &cfg.source_b.columns, &parser_b);

    let norm_a = normalize_source(&a);
    let norm_b = normalize_source(&b);
    let cascade = run_cascade(&norm_a, &norm_b, &cfg.matching);

    let table = assemble(
        &a,
        &b,
        &cascade,
        &AssembleOptions {
            source_a_json: cfg.export.source_a_json,
        },
    );
    info!("Linkage statistics:\n{}", table.stats);
    Ok(Linkage {
        table,
        cascade_ms: cascade.total_duration_ms,
    })
}

// "out.csv" with format xlsx becomes "out.xlsx"; both formats share the stem
fn with_extension(path: &str, ext: &str) -> String {
    std::path::Path::new(path)
        .with_extension(ext)
        .to_string_lossy()
        .into_owned()
}

/// Full pipeline: load, link, export.
pub fn run(cfg: &AppConfig) -> Result<SummaryContext> {
    let started = chrono::Utc::now();
    cfg.validate()?;

    let raw_a = load_csv_source(&cfg.source_a)
        .with_context(|| format!("loading source '{}'", cfg.source_a.label))?;
    let raw_b = load_csv_source(&cfg.source_b)
        .with_context(|| format!("loading source '{}'", cfg.source_b.label))?;

    let linkage = link_tables(raw_a, raw_b, cfg)?;
    let out_path = &cfg.export.out_path;

    let builder = SummaryBuilder::new(&cfg.source_a.path, &cfg.source_b.path, out_path)
        .with_cascade_ms(linkage.cascade_ms)
        .with_stats(linkage.table.stats.clone());

    let fmt = cfg.export.format.as_str();
    if fmt == "csv" || fmt == "both" {
        let path = with_extension(out_path, "csv");
        export_unified_csv(&linkage.table, &path)
            .with_context(|| format!("writing {}", path))?;
    }
    if fmt == "xlsx" || fmt == "both" {
        let path = with_extension(out_path, "xlsx");
        let ctx = builder
            .clone()
            .with_timestamps(started, chrono::Utc::now())
            .build();
        export_unified_xlsx(&linkage.table, &path, &ctx)
            .with_context(|| format!("writing {}", path))?;
    }

    let summary = builder.with_timestamps(started, chrono::Utc::now()).build();
    if let Some(path) = cfg.export.summary_path.as_deref() {
        export_summary_csv(path, &summary).with_context(|| format!("writing {}", path))?;
    }
    info!(
        "Run complete: {} unified rows in {:.2}s",
        summary.stats.total_rows, summary.duration_secs
    );
    Ok(summary)
}
