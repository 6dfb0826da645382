// ==========================================
// 课程学分导入工具 - 核心库
// ==========================================
// 功能: 已审批的课程完成记录 → 已完成学分汇总表
// 流程: 过滤 → 去重 → 转换 → 插入 → 排序编号 → 通知
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 表格与记录
pub mod domain;

// 导入层 - 导入流程
pub mod importer;

// 通知层 - 辅导员通知
pub mod notify;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BatchDedupPolicy, CellValue, ColumnResolution, FieldOutcome, NotifierKind, NumericPolicy,
};

// 领域实体
pub use domain::{
    DedupKey, DestinationRecord, DqReport, ExistingCredit, FieldIssue, ImportPlan, ImportSummary,
    Sheet, SheetRow, SourceRecord,
};

// 导入
pub use importer::{CreditImporter, CreditImporterImpl, ImportError, ImportRequest, ImportResult};

// 配置
pub use config::{ConfigManager, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "credit-importer";
