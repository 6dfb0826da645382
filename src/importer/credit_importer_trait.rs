// ==========================================
// 课程学分导入工具 - 导入接口 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::credit::{
    DedupKey, DestinationRecord, DqReport, ExistingCredit, FieldIssue, ImportPlan, ImportSummary,
    SourceRecord,
};
use crate::domain::sheet::Sheet;
use crate::domain::types::{CellValue, FieldOutcome};
use crate::importer::error::ImportResult;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

// ==========================================
// ImportRequest - 文件级导入请求
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub output_path: Option<PathBuf>,       // None = 覆盖目标文件
    pub source_sheet: Option<String>,       // None = 使用配置中的工作表名
    pub destination_sheet: Option<String>,
    pub dry_run: bool,
}

// ==========================================
// CreditImporter Trait
// ==========================================
// 用途: 学分导入主接口
// 实现者: CreditImporterImpl
pub trait CreditImporter {
    /// 生成导入计划（步骤 1-4: 过滤 → 去重 → 转换 → 排序）
    ///
    /// 不修改目标表；存在 Error 级 DQ 问题时返回错误
    fn plan(&self, source: &Sheet, destination: &Sheet) -> ImportResult<ImportPlan>;

    /// 执行导入计划（步骤 5-6: 插入 → 按学号排序 → 重新编号）
    ///
    /// # 返回
    /// - Ok(usize): 插入行数
    fn apply(&self, plan: &ImportPlan, destination: &mut Sheet) -> ImportResult<usize>;

    /// 完整导入（步骤 1-7），内存中的两张表
    fn import_new_credits(
        &self,
        source: &Sheet,
        destination: &mut Sheet,
    ) -> ImportResult<ImportSummary>;

    /// 只做解码与校验，返回 DQ 报告（不因 Error 级问题中止）
    fn validate(&self, source: &Sheet, destination: &Sheet) -> ImportResult<DqReport>;

    /// 文件级导入: 读取 → 导入 → 写出 → 通知
    fn run_files(&self, request: &ImportRequest) -> ImportResult<ImportSummary>;

    /// 文件级校验: 读取 → 校验（不写出、不通知）
    fn validate_files(&self, request: &ImportRequest) -> ImportResult<DqReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 读取指定工作表为 Sheet（第 1 行为表头）
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet_name: 工作表名（CSV 文件只有一张表，名称仅用于标识）
    ///
    /// # 返回
    /// - Err(ResourceNotFound): 文件或工作表不存在
    fn parse_sheet(&self, file_path: &Path, sheet_name: &str) -> ImportResult<Sheet>;

    /// 按原顺序读取文件中的全部工作表（保留实际名称与空白行）
    ///
    /// CSV 文件只有一张表，以文件名（不含扩展名）命名
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Vec<Sheet>>;
}

// ==========================================
// SheetWriter Trait
// ==========================================
// 用途: 工作表写出接口
// 实现者: CsvSheetWriter, ExcelSheetWriter, UniversalSheetWriter
pub trait SheetWriter: Send + Sync {
    /// 写出一组工作表；第一张为主表
    ///
    /// CSV 只能容纳一张表，其余工作表忽略
    fn write_sheets(&self, sheets: &[&Sheet], file_path: &Path) -> ImportResult<()>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与类型推断
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（TRIM + 可选 UPPER）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// 从 CSV 原始文本推断单元格类型
    fn infer_cell(&self, raw: &str) -> CellValue;

    /// 审批勾选是否为真
    fn is_approved(&self, value: &CellValue) -> bool;

    /// 按表格软件 parseInt 语义解析整数
    ///
    /// # 返回
    /// - Value: 解析成功
    /// - Blank: 空单元格
    /// - Malformed: 没有可解析的前导数字
    fn parse_integer(&self, value: &CellValue) -> FieldOutcome<i64>;

    /// 解析日期文本（YYYY-MM-DD / MM/DD/YYYY / YYYYMMDD 等）
    fn parse_date(&self, value: &str) -> Option<NaiveDate>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 去重键冲突检测
// 实现者: ConflictHandler
pub trait ConflictHandler: Send + Sync {
    /// 是否与运行开始时的目标表快照重复（线性扫描）
    fn is_snapshot_duplicate(&self, key: &DedupKey, snapshot: &[ExistingCredit]) -> bool;

    /// 检测目标表快照中已存在的重复键
    ///
    /// # 返回
    /// - Vec<(行号, 去重键)>: 不包括第一次出现
    fn detect_preexisting_duplicates(&self, snapshot: &[ExistingCredit]) -> Vec<(usize, DedupKey)>;

    /// 检测本批次内重复键
    ///
    /// # 参数
    /// - keys: (源表行号, 去重键)，按源表顺序
    ///
    /// # 返回
    /// - Vec<usize>: 应丢弃的源表行号（不包括第一次出现）
    fn detect_batch_duplicates(&self, keys: &[(usize, DedupKey)]) -> Vec<usize>;
}

// ==========================================
// DqValidator Trait
// ==========================================
// 用途: 数据质量校验 + 按问题类型决定中止/继续
// 实现者: DqValidator
pub trait DqValidator: Send + Sync {
    /// 校验源表记录（日期列等）
    fn validate_source(&self, record: &SourceRecord, sheet: &str) -> Vec<FieldIssue>;

    /// 校验转换后的目标记录（数值字段）
    fn validate_record(&self, record: &DestinationRecord, sheet: &str) -> Vec<FieldIssue>;

    /// 目标表已有重复键 → DQ 问题
    fn validate_preexisting(&self, duplicates: &[(usize, DedupKey)], sheet: &str)
        -> Vec<FieldIssue>;

    /// 存在 Error 级问题时返回对应错误
    fn enforce(&self, issues: &[FieldIssue]) -> ImportResult<()>;

    /// 生成 DQ 报告
    fn generate_dq_report(&self, run_id: String, issues: Vec<FieldIssue>) -> DqReport;
}
