// ==========================================
// 课程学分导入工具 - 领域类型定义
// ==========================================
// 单元格值 / 字段解析结果 / 导入策略枚举
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// 数值解析失败时写入单元格的错误标记（与表格软件保持一致）
pub const NUMERIC_ERROR_TOKEN: &str = "#NUM!";

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 表格区域中的单个单元格；Error 仅在宽松数值策略下出现
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Error(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 空单元格或纯空白文本
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 规范文本形式（用于去重键与 CSV 写出）
    ///
    /// - Int(123) 与 Text("123") 得到相同文本
    /// - 整数值的 Float 不带小数部分
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Int(n) => n.to_string(),
            CellValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Error(token) => token.clone(),
        }
    }

    // 排序分组: 数字 < 日期 < 文本 < 布尔 < 错误 < 空
    fn sort_rank(&self) -> u8 {
        match self {
            CellValue::Int(_) | CellValue::Float(_) => 0,
            CellValue::Date(_) => 1,
            CellValue::Text(s) if s.trim().is_empty() => 5,
            CellValue::Text(_) => 2,
            CellValue::Bool(_) => 3,
            CellValue::Error(_) => 4,
            CellValue::Empty => 5,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// 升序比较（整列排序使用）
    ///
    /// 文本按不区分大小写比较，空单元格始终排在最后
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        let rank = self.sort_rank().cmp(&other.sort_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => compare_text_ci(a, b),
            (CellValue::Error(a), CellValue::Error(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// 不区分大小写的文本比较（按字母排序，重音不影响主次序）
///
/// 主键: 分解后去掉附加符号的小写形式（"Émile" 与 "emile" 同列于 E）
/// 次键: 小写形式；两者都相等时返回 Equal，由稳定排序保持原有顺序
pub fn compare_text_ci(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

fn collation_key(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

// ==========================================
// 字段解析结果 (Field Outcome)
// ==========================================
// 替代"把错误值直接写进单元格"的隐式行为：
// 解析成功/空白/格式错误三种情况显式区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome<T> {
    Value { value: T },
    Blank,
    Malformed { raw: String },
}

impl<T> FieldOutcome<T> {
    pub fn value(value: T) -> Self {
        FieldOutcome::Value { value }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldOutcome::Malformed { .. })
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            FieldOutcome::Value { value } => Some(value),
            _ => None,
        }
    }
}

impl FieldOutcome<i64> {
    /// 转为目标表单元格；格式错误写入错误标记
    pub fn to_cell(&self) -> CellValue {
        match self {
            FieldOutcome::Value { value } => CellValue::Int(*value),
            FieldOutcome::Blank => CellValue::Empty,
            FieldOutcome::Malformed { .. } => CellValue::Error(NUMERIC_ERROR_TOKEN.to_string()),
        }
    }
}

// ==========================================
// 批内去重策略 (Batch Dedup Policy)
// ==========================================
// SnapshotOnly: 只与运行开始时目标表快照比较（保留原有行为）
// SnapshotAndBatch: 同时丢弃本批次内后出现的重复键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchDedupPolicy {
    #[default]
    SnapshotOnly,
    SnapshotAndBatch,
}

// ==========================================
// 数值字段策略 (Numeric Policy)
// ==========================================
// Permissive: 格式错误写入错误标记并继续
// Reject: 格式错误中止整次导入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    #[default]
    Permissive,
    Reject,
}

// ==========================================
// 列定位方式 (Column Resolution)
// ==========================================
// ByHeader: 按表头名称（含别名）定位，读取时一次性校验
// Positional: 按固定列位置定位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnResolution {
    #[default]
    ByHeader,
    Positional,
}

// ==========================================
// 通知方式 (Notifier Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    #[default]
    Noop,
    Log,
    Outbox,
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierKind::Noop => write!(f, "noop"),
            NotifierKind::Log => write!(f, "log"),
            NotifierKind::Outbox => write!(f, "outbox"),
        }
    }
}
