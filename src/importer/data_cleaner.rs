// ==========================================
// 课程学分导入工具 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / 类型推断 / 整数与日期解析
// ==========================================

use crate::domain::types::{CellValue, FieldOutcome};
use crate::importer::credit_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;

// 支持的日期文本格式（按顺序尝试）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y", "%Y%m%d"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn infer_cell(&self, raw: &str) -> CellValue {
        let value = raw.trim();
        if value.is_empty() {
            return CellValue::Empty;
        }

        match value.to_uppercase().as_str() {
            "TRUE" => return CellValue::Bool(true),
            "FALSE" => return CellValue::Bool(false),
            _ => {}
        }

        // 前导零的编号（如 "00123"）保留为文本
        let has_leading_zero = {
            let digits = value.trim_start_matches('-');
            digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
        };

        if !has_leading_zero {
            if let Ok(n) = value.parse::<i64>() {
                return CellValue::Int(n);
            }
            if value.contains('.') {
                if let Ok(f) = value.parse::<f64>() {
                    if f.is_finite() {
                        return CellValue::Float(f);
                    }
                }
            }
        }

        // 8 位纯数字已在上面作为整数返回，这里只处理带分隔符的日期
        if value.contains('-') || value.contains('/') {
            if let Some(date) = self.parse_date(value) {
                return CellValue::Date(date);
            }
        }

        CellValue::Text(value.to_string())
    }

    fn is_approved(&self, value: &CellValue) -> bool {
        match value {
            CellValue::Bool(b) => *b,
            CellValue::Int(n) => *n != 0,
            CellValue::Float(f) => *f != 0.0 && !f.is_nan(),
            CellValue::Text(s) => {
                let normalized = s.trim().to_lowercase();
                !matches!(
                    normalized.as_str(),
                    "" | "false" | "0" | "no" | "n" | "off" | "unchecked"
                )
            }
            CellValue::Date(_) => true,
            CellValue::Empty | CellValue::Error(_) => false,
        }
    }

    fn parse_integer(&self, value: &CellValue) -> FieldOutcome<i64> {
        match value {
            CellValue::Empty => FieldOutcome::Blank,
            CellValue::Int(n) => FieldOutcome::value(*n),
            CellValue::Float(f) if f.is_finite() => FieldOutcome::value(f.trunc() as i64),
            CellValue::Text(s) if s.trim().is_empty() => FieldOutcome::Blank,
            CellValue::Text(s) => match parse_int_prefix(s) {
                Some(n) => FieldOutcome::value(n),
                None => FieldOutcome::Malformed { raw: s.clone() },
            },
            other => FieldOutcome::Malformed {
                raw: other.as_text(),
            },
        }
    }

    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    }
}

/// parseInt 语义: 跳过前导空白，可选符号，取连续前导数字，忽略其余字符
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
