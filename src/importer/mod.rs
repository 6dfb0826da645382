// ==========================================
// 课程学分导入工具 - 导入层
// ==========================================
// 职责: 源表已审批行 → 目标表新行
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod credit_importer_impl;
pub mod credit_importer_trait;
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod sheet_writer;

// 重导出核心类型
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use credit_importer_impl::CreditImporterImpl;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use dq_validator::DqValidator as DqValidatorImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMap, ColumnSpec, FieldMapper, DESTINATION_COLUMNS, SOURCE_COLUMNS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use sheet_writer::{CsvSheetWriter, ExcelSheetWriter, UniversalSheetWriter};

// 重导出 Trait 接口
pub use credit_importer_trait::{
    ConflictHandler, CreditImporter, DataCleaner, DqValidator, FileParser, ImportRequest,
    SheetWriter,
};
