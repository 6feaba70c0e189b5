use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use thiserror::Error;

use crate::MAX_ROWS;
use crate::model::Row;
use crate::utils::{LogCategory, write_error_to_log};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("The file contains {0} phone numbers, the maximum per upload is {max}", max = MAX_ROWS)]
    TooManyRows(usize),

    #[error("Unable to read the uploaded file: {0}")]
    EmptyOrMalformed(String),

    #[error("Unsupported file type '{0}', expected one of: csv, xls, xlsx")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Tabular formats accepted on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    /// Any workbook format the spreadsheet reader detects on its own (xls, xlsx, xlsm, xlsb, ods)
    Workbook,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(FileKind::Workbook),
            _ => Err(IngestError::UnsupportedFormat(extension)),
        }
    }
}

/// Read a file from disk and extract its phone numbers.
pub fn ingest_file(path: impl AsRef<Path>) -> Result<Vec<Row>, IngestError> {
    let path = path.as_ref();
    let kind = FileKind::from_path(path)?;
    let bytes = std::fs::read(path)?;
    ingest(&bytes, kind)
}

/// Extract the first column of the first sheet as phone numbers.
///
/// The first row is a header and is dropped. Rows whose first cell is missing
/// or blank are skipped. Fails with `TooManyRows` when more than `MAX_ROWS`
/// numbers survive.
pub fn ingest(bytes: &[u8], kind: FileKind) -> Result<Vec<Row>, IngestError> {
    let numbers = match kind {
        FileKind::Csv => read_csv_first_column(bytes)?,
        FileKind::Workbook => read_workbook_first_column(bytes)?,
    };

    if numbers.len() > MAX_ROWS {
        let error = IngestError::TooManyRows(numbers.len());
        write_error_to_log(LogCategory::UploadRejected, &error.to_string());
        return Err(error);
    }

    Ok(numbers.into_iter().map(Row::new).collect())
}

fn read_csv_first_column(bytes: &[u8]) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    // Only the first field is decoded, other columns may hold any encoding
    let mut numbers = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| IngestError::EmptyOrMalformed(e.to_string()))?;
        if let Some(number) = record
            .get(0)
            .and_then(|field| non_blank(&String::from_utf8_lossy(field)))
        {
            numbers.push(number);
        }
    }

    Ok(numbers)
}

fn read_workbook_first_column(bytes: &[u8]) -> Result<Vec<String>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::EmptyOrMalformed(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(IngestError::EmptyOrMalformed(e.to_string())),
        None => {
            return Err(IngestError::EmptyOrMalformed(
                "the workbook has no sheets".to_string(),
            ));
        }
    };

    let numbers = range
        .rows()
        .skip(1)
        .filter_map(|row| row.first().and_then(cell_to_text))
        .collect();

    Ok(numbers)
}

/// Render a cell the way a user typed it. Numeric cells lose the `.0` a
/// spreadsheet adds to whole numbers.
fn cell_to_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    };
    non_blank(&text)
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|row| row.number.as_str()).collect()
    }

    #[test]
    fn test_csv_header_is_skipped() {
        let rows = ingest(b"Phone Number\n+15550001\n+15550002\n", FileKind::Csv).unwrap();
        assert_eq!(numbers(&rows), vec!["+15550001", "+15550002"]);
    }

    #[test]
    fn test_csv_values_are_trimmed_and_blanks_skipped() {
        let csv = "Number,Name\n  4915112345  ,Ann\n,Bob\n   ,Carl\n447700900123,Dee\n";
        let rows = ingest(csv.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(numbers(&rows), vec!["4915112345", "447700900123"]);
        assert!(rows.iter().all(|row| row.status.is_none() && !row.is_processing));
    }

    #[test]
    fn test_csv_non_utf8_outside_first_column_is_ignored() {
        // Windows-1252 "José" in the second column
        let csv = b"Number,Name\n+15550001,Jos\xe9\n+15550002,Ann\n";
        let rows = ingest(csv, FileKind::Csv).unwrap();
        assert_eq!(numbers(&rows), vec!["+15550001", "+15550002"]);
    }

    #[test]
    fn test_csv_non_utf8_in_first_column_is_decoded_lossily() {
        let rows = ingest(b"Number\n+1555\xa00001\n", FileKind::Csv).unwrap();
        assert_eq!(numbers(&rows), vec!["+1555\u{fffd}0001"]);
    }

    #[test]
    fn test_csv_only_first_column_is_read() {
        let rows = ingest(b"a,b\n1,2\n3,4\n", FileKind::Csv).unwrap();
        assert_eq!(numbers(&rows), vec!["1", "3"]);
    }

    #[test]
    fn test_csv_with_only_header_yields_nothing() {
        let rows = ingest(b"Number\n", FileKind::Csv).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_exactly_max_rows_is_accepted() {
        let mut csv = String::from("Number\n");
        for i in 0..MAX_ROWS {
            csv.push_str(&format!("{}\n", 1_000_000 + i));
        }
        let rows = ingest(csv.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(rows.len(), MAX_ROWS);
    }

    #[test]
    fn test_more_than_max_rows_is_rejected_with_count() {
        let mut csv = String::from("Number\n");
        for i in 0..MAX_ROWS + 7 {
            csv.push_str(&format!("{i}\n"));
        }
        let result = ingest(csv.as_bytes(), FileKind::Csv);
        assert!(matches!(result, Err(IngestError::TooManyRows(n)) if n == MAX_ROWS + 7));
    }

    #[test]
    fn test_blank_rows_do_not_count_towards_the_cap() {
        let mut csv = String::from("Number\n");
        for i in 0..MAX_ROWS {
            csv.push_str(&format!("{i}\n ,x\n"));
        }
        let rows = ingest(csv.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(rows.len(), MAX_ROWS);
    }

    #[test]
    fn test_garbage_workbook_is_malformed() {
        let result = ingest(b"definitely not a spreadsheet", FileKind::Workbook);
        assert!(matches!(result, Err(IngestError::EmptyOrMalformed(_))));
    }

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.csv")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("a.XLSX")).unwrap(), FileKind::Workbook);
        assert_eq!(FileKind::from_path(Path::new("a.xls")).unwrap(), FileKind::Workbook);
        assert!(matches!(
            FileKind::from_path(Path::new("a.txt")),
            Err(IngestError::UnsupportedFormat(ext)) if ext == "txt"
        ));
        assert!(FileKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_cell_to_text_drops_float_suffix() {
        assert_eq!(cell_to_text(&Data::Float(15551234567.0)), Some("15551234567".to_string()));
        assert_eq!(cell_to_text(&Data::Float(1.5)), Some("1.5".to_string()));
        assert_eq!(cell_to_text(&Data::Int(42)), Some("42".to_string()));
        assert_eq!(cell_to_text(&Data::String("  +44 7700  ".to_string())), Some("+44 7700".to_string()));
        assert_eq!(cell_to_text(&Data::String("   ".to_string())), None);
        assert_eq!(cell_to_text(&Data::Empty), None);
    }
}
