// ==========================================
// 课程学分导入工具 - 学分领域模型
// ==========================================
// 源表: 课程完成审批记录（Fall/Spring CR-CA Data）
// 目标表: 已完成学分汇总（Completed Credits）
// ==========================================

use crate::domain::types::{CellValue, FieldOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// SourceRecord - 源表记录
// ==========================================
// 生命周期: 仅在单次导入内，只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub approved: bool,                 // 审批勾选（A 列）
    pub student_name: String,           // 学生姓名
    pub student_id: CellValue,          // 学生编号（保留原始类型，写回时不改变）
    pub course_name: String,            // 课程名称
    pub course_number: CellValue,       // 课程编号（整数样式）
    pub course_start_date: CellValue,   // 开课日期
    pub course_end_date: CellValue,     // 结课日期（= 学分获得日期）
    pub course_grade: CellValue,        // 课程成绩（数值样式）
    pub hours_on_course: CellValue,     // 课程学时
    pub reference_url: String,          // 证明链接
    pub teacher_of_record: String,      // 记录教师

    pub row_number: usize, // 源表行号（1 起始，含表头）
}

impl SourceRecord {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.student_id, &self.course_name)
    }
}

// ==========================================
// ExistingCredit - 目标表快照行
// ==========================================
// 运行开始时一次性读取；本次插入的行不会加入快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingCredit {
    pub row_number: usize,
    pub student_id: CellValue,
    pub course_name: String,
}

impl ExistingCredit {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.student_id, &self.course_name)
    }
}

// ==========================================
// DedupKey - 去重键
// ==========================================
// (学生编号规范文本, 小写课程名)，两端空白不参与比较
// 与写入目标表的课程名同一规则（TRIM），保证重复运行不再插入
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub student_id: String,
    pub course_name: String,
}

impl DedupKey {
    pub fn new(student_id: &CellValue, course_name: &str) -> Self {
        Self {
            student_id: student_id.as_text().trim().to_string(),
            course_name: course_name.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.student_id, self.course_name)
    }
}

// ==========================================
// DestinationRecord - 目标表记录
// ==========================================
// 列布局: A 序号 | B 姓名 | C 学号 | D 课程 | E 课程编号 | F 开课日期
//        G 学分日期 | H 平均成绩 | I 记录教师 | J 学时 | K 链接 | L 本校 | M 备注
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub index: Option<i64>,
    pub student_name: String,
    pub student_id: CellValue,
    pub course_name: String,
    pub course_id: FieldOutcome<i64>,
    pub course_start_date: CellValue,
    pub credit_date: CellValue,
    pub grade_average: FieldOutcome<i64>,
    pub teacher_of_record: String,
    pub hours_on_course: CellValue,
    pub reference_url: String,
    pub local_school: String,
    pub notes: String,

    pub source_row: usize, // 来源行号（用于 DQ 报告）
}

impl DestinationRecord {
    /// 从 B 列开始写入的 12 个单元格
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::from(self.student_name.as_str()),
            self.student_id.clone(),
            CellValue::from(self.course_name.as_str()),
            self.course_id.to_cell(),
            self.course_start_date.clone(),
            self.credit_date.clone(),
            self.grade_average.to_cell(),
            CellValue::from(self.teacher_of_record.as_str()),
            self.hours_on_course.clone(),
            CellValue::from(self.reference_url.as_str()),
            CellValue::from(self.local_school.as_str()),
            CellValue::from(self.notes.as_str()),
        ]
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.student_id, &self.course_name)
    }
}

// ==========================================
// 数据质量 (DQ)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Info,    // 仅提示
    Warning, // 继续导入，汇总中体现
    Error,   // 中止本次导入
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Info => write!(f, "INFO"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    MalformedField,        // 数值字段无法解析
    DuplicateKeyViolation, // 目标表中已存在重复去重键
    UnparsedDate,          // 日期列内容不是日期
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub row_number: usize,
    pub sheet: String,
    pub field: String,
    pub value: String,
    pub kind: IssueKind,
    pub level: DqLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<DedupKey>, // 去重键类问题携带
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqSummary {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqReport {
    pub run_id: String,
    pub summary: DqSummary,
    pub issues: Vec<FieldIssue>,
}

impl DqReport {
    pub fn has_errors(&self) -> bool {
        self.summary.error > 0
    }
}

// ==========================================
// ImportPlan - 导入计划（步骤 1-4 的结果，未修改目标表）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPlan {
    pub run_id: String,
    pub total_rows: usize,             // 源表数据行数
    pub unapproved: usize,             // 未勾选跳过
    pub duplicates: usize,             // 与快照重复跳过
    pub batch_duplicates: usize,       // 批内重复跳过（SnapshotAndBatch）
    pub preexisting_duplicates: usize, // 目标表已有的重复键数量
    pub records: Vec<DestinationRecord>, // 已按姓名排序的新行
    pub issues: Vec<FieldIssue>,
}

// ==========================================
// ImportSummary - 导入结果汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub run_id: String,
    pub dry_run: bool,
    pub total_rows: usize,
    pub unapproved: usize,
    pub duplicates: usize,
    pub batch_duplicates: usize,
    pub preexisting_duplicates: usize,
    pub planned: usize,  // 计划插入行数
    pub inserted: usize, // 实际插入行数（dry-run 为 0）
    pub notified: usize,
    pub notify_failures: usize,
    pub dq_report: DqReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
