use std::io::Write;
use std::path::Path;

use crate::model::Row;

pub const PAGE_SIZE: usize = 50;

/// How many page numbers the compact pager shows at once
pub const PAGER_WIDTH: usize = 5;

pub const EXPORT_FILE_NAME: &str = "whatsapp-validation-results.csv";

pub const EXPORT_HEADERS: [&str; 3] = ["Number", "Status", "Error"];

/// One page of rows, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<'a> {
    pub rows: &'a [Row],
    pub page_number: usize,
    pub page_count: usize,
    /// 1-based position of `rows[0]` in the full list
    pub first_row_number: usize,
    /// Page numbers for the pager, ascending
    pub window: Vec<usize>,
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slice out page `page_number` (1-based).
///
/// Pages outside `[1, page_count]` come back empty; clamping is up to the caller.
pub fn page(rows: &[Row], page_size: usize, page_number: usize) -> PageView<'_> {
    let pages = page_count(rows.len(), page_size);
    let start = page_number
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(rows.len());
    let end = if page_number == 0 {
        start
    } else {
        start.saturating_add(page_size).min(rows.len())
    };

    PageView {
        rows: &rows[start..end],
        page_number,
        page_count: pages,
        first_row_number: start + 1,
        window: page_window(page_number, pages),
    }
}

/// Up to `PAGER_WIDTH` page numbers around `current`.
///
/// The first pages show `1..=5`, the last pages show the final five, anything
/// in between is centred on `current`.
pub fn page_window(current: usize, page_count: usize) -> Vec<usize> {
    if page_count <= PAGER_WIDTH {
        return (1..=page_count).collect();
    }

    let half = PAGER_WIDTH / 2;
    let start = if current <= half + 1 {
        1
    } else if current + half >= page_count {
        page_count - PAGER_WIDTH + 1
    } else {
        current - half
    };

    (start..start + PAGER_WIDTH).collect()
}

/// Label written to the export for a row
pub fn export_status(row: &Row) -> &'static str {
    if row.status == Some(true) {
        "Valid"
    } else {
        "Invalid"
    }
}

/// Write every row as a Number/Status/Error table, in row order.
pub fn export<W: Write>(rows: &[Row], writer: W) -> Result<(), csv::Error> {
    // Configure CSV writer to quote fields when necessary (e.g., when they contain commas)
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADERS)?;
    for row in rows {
        wtr.write_record([
            row.number.as_str(),
            export_status(row),
            row.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export into `dir`, under the fixed export file name. Returns the written path.
pub fn export_to_path(rows: &[Row], dir: &Path) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join(EXPORT_FILE_NAME);
    let file = std::fs::File::create(&path)?;
    export(rows, file)?;
    Ok(path)
}
