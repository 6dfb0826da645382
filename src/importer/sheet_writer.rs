// ==========================================
// 课程学分导入工具 - 工作表写出实现
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 格式: bordered 行的每个单元格加细边框；背景色按行写出
// ==========================================

use crate::domain::sheet::{Sheet, SheetRow};
use crate::domain::types::CellValue;
use crate::importer::credit_importer_trait::SheetWriter;
use crate::importer::error::{ImportError, ImportResult};
use chrono::Datelike;
use csv::WriterBuilder;
use rust_xlsxwriter::{Color, ExcelDateTime, Format, FormatBorder, Workbook, Worksheet};
use std::path::Path;
use tracing::{debug, warn};

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd";

// ==========================================
// CSV Writer 实现
// ==========================================
pub struct CsvSheetWriter;

impl SheetWriter for CsvSheetWriter {
    fn write_sheets(&self, sheets: &[&Sheet], file_path: &Path) -> ImportResult<()> {
        let sheet = sheets
            .first()
            .ok_or_else(|| ImportError::InternalError("没有可写出的工作表".to_string()))?;
        if sheets.len() > 1 {
            debug!(ignored = sheets.len() - 1, "CSV 只写出第一张工作表");
        }

        let width = sheet.width();
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(file_path)?;

        for row in sheet.rows() {
            let mut fields: Vec<String> = row.cells.iter().map(|c| c.as_text()).collect();
            fields.resize(width, String::new());
            writer.write_record(&fields)?;
        }
        writer.flush()?;

        debug!(path = %file_path.display(), rows = sheet.last_row(), "CSV 写出完成");
        Ok(())
    }
}

// ==========================================
// Excel Writer 实现
// ==========================================
pub struct ExcelSheetWriter;

impl SheetWriter for ExcelSheetWriter {
    fn write_sheets(&self, sheets: &[&Sheet], file_path: &Path) -> ImportResult<()> {
        if sheets.is_empty() {
            return Err(ImportError::InternalError("没有可写出的工作表".to_string()));
        }

        let mut workbook = Workbook::new();
        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sanitize_sheet_name(sheet.name()))?;
            write_worksheet(worksheet, sheet)?;
        }

        workbook.save(file_path)?;
        debug!(path = %file_path.display(), sheets = sheets.len(), "Excel 写出完成");
        Ok(())
    }
}

/// Excel 工作表名不允许 []:*?/\ 且最长 31 个字符
pub(crate) fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            other => other,
        })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn row_format(row: &SheetRow) -> Format {
    let mut format = Format::new();
    if row.format.bordered {
        format = format.set_border(FormatBorder::Thin);
    }
    if let Some(color) = row.format.background.as_deref().and_then(parse_hex_color) {
        format = format.set_background_color(color);
    }
    format
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        warn!(value, "无法识别的背景色，忽略");
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(Color::RGB)
}

fn write_worksheet(worksheet: &mut Worksheet, sheet: &Sheet) -> ImportResult<()> {
    for (row_idx, row) in sheet.rows().iter().enumerate() {
        let r = row_idx as u32;
        let format = row_format(row);
        let date_format = format.clone().set_num_format(DATE_NUM_FORMAT);

        for (col_idx, cell) in row.cells.iter().enumerate() {
            let c = col_idx as u16;
            match cell {
                CellValue::Empty => {
                    if row.format.bordered || row.format.background.is_some() {
                        worksheet.write_blank(r, c, &format)?;
                    }
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean_with_format(r, c, *b, &format)?;
                }
                CellValue::Int(n) => {
                    worksheet.write_number_with_format(r, c, *n as f64, &format)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number_with_format(r, c, *f, &format)?;
                }
                CellValue::Text(s) | CellValue::Error(s) => {
                    worksheet.write_string_with_format(r, c, s, &format)?;
                }
                CellValue::Date(d) => {
                    let datetime =
                        ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
                    worksheet.write_datetime_with_format(r, c, &datetime, &date_format)?;
                }
            }
        }
    }
    Ok(())
}

// ==========================================
// 通用写出器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetWriter;

impl SheetWriter for UniversalSheetWriter {
    fn write_sheets(&self, sheets: &[&Sheet], file_path: &Path) -> ImportResult<()> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvSheetWriter.write_sheets(sheets, file_path),
            "xlsx" => ExcelSheetWriter.write_sheets(sheets, file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
