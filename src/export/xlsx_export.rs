use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::assemble::UnifiedTable;
use crate::error::ExportError;
use crate::export::{SummaryContext, ensure_parent_dir};

fn header_format() -> Format {
    Format::new().set_bold().set_align(FormatAlign::Center)
}

fn write_combined_sheet(ws: &mut Worksheet, table: &UnifiedTable) -> Result<(), ExportError> {
    let hfmt = header_format();
    for (c, h) in table.header().iter().enumerate() {
        ws.write_string_with_format(0, c as u16, h, &hfmt)?;
    }
    for (i, rec) in table.records.iter().enumerate() {
        let row = (i as u32) + 1;
        for (c, value) in table.row(rec).iter().enumerate() {
            // nulls stay blank cells
            if let Some(v) = value.as_deref() {
                ws.write_string(row, c as u16, v)?;
            }
        }
    }
    Ok(())
}

fn write_summary_sheet(ws: &mut Worksheet, ctx: &SummaryContext) -> Result<(), ExportError> {
    let hfmt = header_format();
    ws.write_string_with_format(0, 0, "Summary", &hfmt)?;
    let mut row: u32 = 2;
    for (k, v) in ctx.rows() {
        ws.write_string(row, 0, &k)?;
        ws.write_string(row, 1, &v)?;
        row += 1;
    }
    Ok(())
}

/// Workbook with a "combined" sheet holding the unified table and a "summary" sheet.
pub fn export_unified_xlsx(
    table: &UnifiedTable,
    out_path: &str,
    summary: &SummaryContext,
) -> Result<(), ExportError> {
    ensure_parent_dir(out_path)?;
    let mut workbook = Workbook::new();

    let combined = workbook.add_worksheet();
    combined.set_name("combined")?;
    write_combined_sheet(combined, table)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name("summary")?;
    write_summary_sheet(sheet, summary)?;

    workbook.save(out_path)?;
    log::info!("Wrote {} rows to {}", table.records.len(), out_path);
    Ok(())
}
