use crate::error::ImportError;
use crate::record::{format_date, parse_date};
use calamine::{Data, DataType, Ods, Range, Reader, Xlsx};
use csv::ReaderBuilder;
use std::ffi::OsStr;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
    Ods,
}

impl UploadFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, ImportError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(UploadFormat::Csv),
            Some("xlsx") => Ok(UploadFormat::Xlsx),
            Some("ods") => Ok(UploadFormat::Ods),
            _ => Err(ImportError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// An uploaded table with every cell rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn parse(file_name: &str, bytes: &[u8]) -> Result<Self, ImportError> {
        let table = match UploadFormat::from_file_name(file_name)? {
            UploadFormat::Csv => Self::from_csv(bytes)?,
            UploadFormat::Xlsx => {
                let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
                Self::from_range(&first_sheet(workbook)?)
            }
            UploadFormat::Ods => {
                let workbook: Ods<_> = Ods::new(Cursor::new(bytes))?;
                Self::from_range(&first_sheet(workbook)?)
            }
        };

        if table.headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ImportError::MissingHeader);
        }
        Ok(table)
    }

    fn from_csv(bytes: &[u8]) -> Result<Self, ImportError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(sniff_delimiter(bytes))
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    fn from_range(range: &Range<Data>) -> Self {
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();

        Self {
            headers,
            rows: rows.collect(),
        }
    }
}

fn first_sheet<RS, W>(mut workbook: W) -> Result<Range<Data>, ImportError>
where
    RS: Read + Seek,
    W: Reader<RS>,
    ImportError: From<W::Error>,
{
    workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyWorkbook)?
        .map_err(ImportError::from)
}

/// Spreadsheet exports with a German locale separate fields with semicolons.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas { b';' } else { b',' }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => format_date(cell.as_date()),
        Data::DateTimeIso(s) => format_date(cell.as_date().or_else(|| parse_date(s))),
    }
}

/// Whole numbers such as postal codes come back from spreadsheets as floats; render
/// them without a fractional part.
fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_extension() {
        assert_eq!(UploadFormat::from_file_name("Liste.CSV").unwrap(), UploadFormat::Csv);
        assert_eq!(UploadFormat::from_file_name("a.b.xlsx").unwrap(), UploadFormat::Xlsx);
        assert_eq!(UploadFormat::from_file_name("export.ods").unwrap(), UploadFormat::Ods);
        assert!(matches!(
            UploadFormat::from_file_name("notes.txt"),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            UploadFormat::from_file_name("no_extension"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn csv_with_semicolons_and_ragged_rows() {
        let bytes = "Nummer;Straße;Ort\nA1;Heerstr. 12;Berlin\nA2\n".as_bytes();
        let table = SheetTable::parse("upload.csv", bytes).unwrap();

        assert_eq!(table.headers, vec!["Nummer", "Straße", "Ort"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["A1", "Heerstr. 12", "Berlin"]);
        assert_eq!(table.rows[1], vec!["A2"]);
    }

    #[test]
    fn comma_wins_ties() {
        assert_eq!(sniff_delimiter(b"a,b;c\n1,2;3"), b',');
        assert_eq!(sniff_delimiter(b"a;b;c,d"), b';');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn empty_csv_has_no_header() {
        assert!(matches!(
            SheetTable::parse("empty.csv", b""),
            Err(ImportError::MissingHeader)
        ));
    }

    #[test]
    fn invalid_utf8_csv_is_rejected() {
        let bytes = b"\xff\xfe\x00\x81garbage\n\x9f\x80";
        assert!(matches!(
            SheetTable::parse("upload.csv", bytes),
            Err(ImportError::Csv(_))
        ));
    }

    #[test]
    fn corrupt_workbooks_are_rejected() {
        assert!(matches!(
            SheetTable::parse("upload.xlsx", b"not a zip archive"),
            Err(ImportError::Xlsx(_))
        ));
        assert!(matches!(
            SheetTable::parse("upload.ods", b"not a zip archive"),
            Err(ImportError::Ods(_))
        ));
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_text(&Data::Float(10115.0)), "10115");
        assert_eq!(cell_text(&Data::Float(52.5123)), "52.5123");
        assert_eq!(cell_text(&Data::Int(2019)), "2019");
        assert_eq!(cell_text(&Data::String("Wall AG".into())), "Wall AG");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(
            cell_text(&Data::DateTimeIso("2023-02-01T00:00:00".into())),
            "2023-02-01"
        );
    }
}
