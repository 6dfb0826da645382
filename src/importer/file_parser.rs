// ==========================================
// 课程学分导入工具 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / CSV (.csv)
// 输出: Sheet（第 1 行为表头，完全空白的数据行跳过）
// ==========================================

use crate::domain::sheet::{Sheet, SheetRow};
use crate::domain::types::CellValue;
use crate::importer::credit_importer_trait::{DataCleaner as _, FileParser};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_writer::sanitize_sheet_name;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Days, NaiveDate};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 可作为工作簿读取的扩展名
pub(crate) fn is_workbook_path(path: &Path) -> bool {
    matches!(file_extension(path).as_str(), "xlsx" | "xls" | "xlsm" | "ods")
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::ResourceNotFound(format!(
            "文件不存在: {}",
            path.display()
        )));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path, sheet_name: &str) -> ImportResult<Sheet> {
        let path = file_path;

        // 检查文件存在
        ensure_exists(path)?;

        // 检查扩展名
        let ext = file_extension(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 表头作为第 1 行保留在 Sheet 中
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let cleaner = DataCleaner;
        let mut sheet = Sheet::new(sheet_name);
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<CellValue> = if row_idx == 0 {
                // 表头不做类型推断
                record.iter().map(|v| CellValue::from(v.trim())).collect()
            } else {
                record.iter().map(|v| cleaner.infer_cell(v)).collect()
            };
            let row = SheetRow::new(cells);

            // 跳过完全空白的数据行
            if row_idx > 0 && row.is_blank() {
                continue;
            }

            sheet.push_row(row);
        }

        debug!(sheet = sheet_name, rows = sheet.last_row(), "CSV 解析完成");
        Ok(sheet)
    }

    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Vec<Sheet>> {
        let name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string();
        Ok(vec![self.parse_sheet(file_path, &name)?])
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path, sheet_name: &str) -> ImportResult<Sheet> {
        let path = file_path;

        // 检查文件存在
        ensure_exists(path)?;

        // 检查扩展名
        let ext = file_extension(path);
        if !matches!(ext.as_str(), "xlsx" | "xls" | "xlsm" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;

        // 按名称查找工作表（兼容写出时替换过非法字符的名称）
        let sheet_names = workbook.sheet_names();
        let sanitized = sanitize_sheet_name(sheet_name);
        let actual_name = sheet_names
            .iter()
            .find(|n| n.as_str() == sheet_name)
            .or_else(|| sheet_names.iter().find(|n| **n == sanitized))
            .cloned()
            .ok_or_else(|| {
                ImportError::ResourceNotFound(format!(
                    "工作表不存在: {}（可用: {}）",
                    sheet_name,
                    sheet_names.join(", ")
                ))
            })?;

        let range = workbook.worksheet_range(&actual_name)?;

        let mut sheet = Sheet::new(sheet_name);
        for (row_idx, data_row) in range.rows().enumerate() {
            let row = SheetRow::new(data_row.iter().map(convert_cell).collect());

            // 跳过完全空白的数据行
            if row_idx > 0 && row.is_blank() {
                continue;
            }

            sheet.push_row(row);
        }

        debug!(sheet = sheet_name, rows = sheet.last_row(), "Excel 解析完成");
        Ok(sheet)
    }

    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Vec<Sheet>> {
        ensure_exists(file_path)?;
        if !is_workbook_path(file_path) {
            return Err(ImportError::UnsupportedFormat(file_extension(file_path)));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let mut sheet = Sheet::new(name.as_str());
            for row in anchored_rows(&range) {
                sheet.push_row(row);
            }
            sheets.push(sheet);
        }

        debug!(path = %file_path.display(), sheets = sheets.len(), "工作簿读取完成");
        Ok(sheets)
    }
}

/// 按 A1 定位的全部行（补齐已用区域之前的空行与空列）
fn anchored_rows(range: &Range<Data>) -> Vec<SheetRow> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let leading = vec![CellValue::Empty; start_col as usize];
    let mut rows: Vec<SheetRow> = (0..start_row).map(|_| SheetRow::new(Vec::new())).collect();
    rows.extend(range.rows().map(|data_row| {
        let mut cells = leading.clone();
        cells.extend(data_row.iter().map(convert_cell));
        SheetRow::new(cells)
    }));
    rows
}

/// calamine 单元格 → CellValue
///
/// 整数值的浮点数还原为整数；日期序列号转换为日期
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => {
            let date_part = s.split('T').next().unwrap_or(s);
            match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
                Ok(date) => CellValue::Date(date),
                Err(_) => CellValue::Text(s.clone()),
            }
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
    }
}

/// Excel 日期序列号（1900 日期系统）→ 日期
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_sheet(&self, file_path: &Path, sheet_name: &str) -> ImportResult<Sheet> {
        match file_extension(file_path).as_str() {
            "csv" => CsvParser.parse_sheet(file_path, sheet_name),
            "xlsx" | "xls" | "xlsm" | "ods" => ExcelParser.parse_sheet(file_path, sheet_name),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Vec<Sheet>> {
        match file_extension(file_path).as_str() {
            "csv" => CsvParser.parse_workbook(file_path),
            "xlsx" | "xls" | "xlsm" | "ods" => ExcelParser.parse_workbook(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
