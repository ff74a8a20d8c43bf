//! # Spreadsheet Reader
//!
//! Reads the first worksheet of an xlsx/xls/xlsb/ods workbook with
//! `calamine`. Cells are rendered to their display string; empty cells
//! become `""`. Date cells render as `YYYY-MM-DD`, with ` HH:MM:SS`
//! appended when they carry a time of day.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use chrono::Timelike;

use super::errors::{ParseError, ParseResult};
use super::table::ParsedTable;

/// Parse the first worksheet of a workbook held in memory.
pub fn parse_spreadsheet(content: &[u8]) -> ParseResult<ParsedTable> {
    let cursor = Cursor::new(content.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ParseError::malformed("spreadsheet", e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ParseError::malformed("spreadsheet", e))?,
        None => return Err(ParseError::EmptyContent),
    };

    // The range starts at the first used cell. Leading blank columns are
    // restored so column positions match the sheet.
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let grid = range.rows().map(|row| {
        let mut values = vec![String::new(); leading];
        values.extend(row.iter().map(render_cell));
        values
    });

    ParsedTable::from_grid(grid)
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(dt) => render_datetime(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => e.to_string(),
    }
}

fn render_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            return format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
        }
    } else if let Some(value) = dt.as_datetime() {
        // Serials below one day are times without a date.
        if dt.as_f64() < 1.0 {
            return value.format("%H:%M:%S").to_string();
        }
        if value.num_seconds_from_midnight() == 0 {
            return value.format("%Y-%m-%d").to_string();
        }
        return value.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    dt.as_f64().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime as XlsxDateTime, Format, Workbook, Worksheet, XlsxError};

    fn workbook(build: impl FnOnce(&mut Worksheet) -> Result<(), XlsxError>) -> Vec<u8> {
        let mut workbook = Workbook::new();
        build(workbook.add_worksheet()).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    fn sales_sheet(sheet: &mut Worksheet) -> Result<(), XlsxError> {
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, "Region")?;
        sheet.write_string(0, 1, "Amount")?;
        sheet.write_string(0, 2, "Date")?;
        sheet.write_string(1, 0, "West")?;
        sheet.write_number(1, 1, 100)?;
        sheet.write_datetime_with_format(1, 2, &XlsxDateTime::from_ymd(2024, 1, 15)?, &date_format)?;
        sheet.write_string(2, 0, "East")?;
        Ok(())
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = parse_spreadsheet(b"definitely not a workbook");
        assert!(matches!(result, Err(ParseError::Malformed { format: "spreadsheet", .. })));
    }

    #[test]
    fn test_render_cells() {
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::String("West".into())), "West");
        assert_eq!(render_cell(&Data::Int(100)), "100");
        assert_eq!(render_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(render_cell(&Data::Bool(true)), "true");
        assert_eq!(
            render_cell(&Data::DateTimeIso("2024-01-15T10:00:00".into())),
            "2024-01-15T10:00:00"
        );
        assert_eq!(render_cell(&Data::DurationIso("PT1H".into())), "PT1H");
    }

    #[test]
    fn test_workbook_header_and_padding() {
        let table = parse_spreadsheet(&workbook(sales_sheet)).unwrap();
        assert_eq!(table.columns(), ["Region", "Amount", "Date"]);
        assert_eq!(
            table.rows(),
            [vec!["West", "100", "2024-01-15"], vec!["East", "", ""]]
        );
    }

    #[test]
    fn test_datetime_keeps_time_of_day() {
        let content = workbook(|sheet| {
            let format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
            sheet.write_string(0, 0, "At")?;
            let at = XlsxDateTime::from_ymd(2024, 1, 15)?.and_hms(18, 0, 0)?;
            sheet.write_datetime_with_format(1, 0, &at, &format)?;
            Ok(())
        });
        let table = parse_spreadsheet(&content).unwrap();
        assert_eq!(table.rows(), [vec!["2024-01-15 18:00:00"]]);
    }

    #[test]
    fn test_leading_blank_column_kept() {
        let content = workbook(|sheet| {
            sheet.write_string(0, 1, "Region")?;
            sheet.write_string(0, 2, "Amount")?;
            sheet.write_string(1, 1, "West")?;
            sheet.write_number(1, 2, 7)?;
            Ok(())
        });
        let table = parse_spreadsheet(&content).unwrap();
        assert_eq!(table.columns(), ["", "Region", "Amount"]);
        assert_eq!(table.rows(), [vec!["", "West", "7"]]);
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        let content = workbook(|sheet| {
            sheet.write_string(0, 0, "Region")?;
            sheet.write_string(0, 1, "Amount")?;
            Ok(())
        });
        let table = parse_spreadsheet(&content).unwrap();
        assert_eq!(table.columns(), ["Region", "Amount"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_sheet_is_empty_content() {
        let content = workbook(|_| Ok(()));
        assert_eq!(parse_spreadsheet(&content), Err(ParseError::EmptyContent));
    }
}
