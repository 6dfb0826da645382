// ==========================================
// 课程学分导入工具 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、工作表模型
// 红线: 不含文件读写逻辑,不含导入流程逻辑
// ==========================================

pub mod credit;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use credit::{
    DedupKey, DestinationRecord, DqLevel, DqReport, DqSummary, ExistingCredit, FieldIssue,
    ImportPlan, ImportSummary, IssueKind, SourceRecord,
};
pub use sheet::{RowFormat, Sheet, SheetError, SheetRow};
pub use types::{
    BatchDedupPolicy, CellValue, ColumnResolution, FieldOutcome, NotifierKind, NumericPolicy,
    NUMERIC_ERROR_TOKEN,
};
