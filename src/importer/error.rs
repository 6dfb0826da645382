// ==========================================
// 课程学分导入工具 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::sheet::SheetError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 资源相关错误 =====
    #[error("资源不存在: {0}")]
    ResourceNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsm/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件写出失败: {0}")]
    WriteError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构与数据错误 =====
    #[error("表结构不匹配 (工作表 {sheet}): {message}")]
    SchemaMismatch { sheet: String, message: String },

    #[error("字段格式错误 (行 {row}, 字段 {field}): {value}")]
    MalformedField {
        row: usize,
        field: String,
        value: String,
    },

    #[error("去重键重复 (行 {row}): 学号 {student_id}, 课程 {course_name}")]
    DuplicateKeyViolation {
        row: usize,
        student_id: String,
        course_name: String,
    },

    #[error("工作表操作失败: {0}")]
    SheetError(#[from] SheetError),

    // ===== 配置错误 =====
    #[error("配置读取失败 ({path}): {message}")]
    ConfigReadError { path: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通知错误 =====
    #[error("通知发送失败: {0}")]
    NotifyError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<rust_xlsxwriter::XlsxError>
impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::WriteError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InternalError(format!("JSON 序列化失败: {}", err))
    }
}

impl ImportError {
    /// 是否属于"整次导入中止"类错误（资源缺失/结构不匹配）
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            ImportError::ResourceNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::SchemaMismatch { .. }
        )
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
