use crate::assemble::UnifiedTable;
use crate::error::ExportError;
use crate::export::{SummaryContext, ensure_parent_dir};
use csv::WriterBuilder;
use std::fs::File;
use std::io::BufWriter;

/// Write the unified table; nulls become empty cells.
pub fn export_unified_csv(table: &UnifiedTable, path: &str) -> Result<(), ExportError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut w = WriterBuilder::new().from_writer(buf_writer);

    w.write_record(table.header())?;
    for rec in &table.records {
        let row = table.row(rec);
        w.write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }
    w.flush()?;
    log::info!("Wrote {} rows to {}", table.records.len(), path);
    Ok(())
}

pub fn export_summary_csv(path: &str, ctx: &SummaryContext) -> Result<(), ExportError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)?;
    let mut w = WriterBuilder::new().from_writer(BufWriter::new(file));
    w.write_record(["Key", "Value"])?;
    for (k, v) in ctx.rows() {
        w.write_record([k.as_str(), v.as_str()])?;
    }
    w.flush()?;
    Ok(())
}
