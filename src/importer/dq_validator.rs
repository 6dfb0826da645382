// ==========================================
// 课程学分导入工具 - 数据质量校验器实现
// ==========================================
// 职责: 字段级校验 + 按问题类型决定中止/继续 + DQ 报告生成
// ==========================================
// MalformedField:        Permissive → WARNING（写入错误标记继续）
//                        Reject     → ERROR（中止）
// DuplicateKeyViolation: 默认 WARNING，可配置为 ERROR
// UnparsedDate:          INFO（原值照抄）
// ==========================================

use crate::domain::credit::{
    DedupKey, DestinationRecord, DqLevel, DqReport, DqSummary, FieldIssue, IssueKind, SourceRecord,
};
use crate::domain::types::{CellValue, FieldOutcome, NumericPolicy};
use crate::importer::credit_importer_trait::DqValidator as DqValidatorTrait;
use crate::importer::error::{ImportError, ImportResult};

pub struct DqValidator {
    numeric_policy: NumericPolicy,
    fail_on_preexisting_duplicates: bool,
}

impl DqValidator {
    pub fn new(numeric_policy: NumericPolicy, fail_on_preexisting_duplicates: bool) -> Self {
        Self {
            numeric_policy,
            fail_on_preexisting_duplicates,
        }
    }

    fn malformed_level(&self) -> DqLevel {
        match self.numeric_policy {
            NumericPolicy::Permissive => DqLevel::Warning,
            NumericPolicy::Reject => DqLevel::Error,
        }
    }

    fn check_numeric(
        &self,
        outcome: &FieldOutcome<i64>,
        field: &str,
        record: &DestinationRecord,
        sheet: &str,
    ) -> Option<FieldIssue> {
        match outcome {
            FieldOutcome::Malformed { raw } => Some(FieldIssue {
                row_number: record.source_row,
                sheet: sheet.to_string(),
                field: field.to_string(),
                value: raw.clone(),
                kind: IssueKind::MalformedField,
                level: self.malformed_level(),
                message: format!("无法解析为整数: {:?}", raw),
                key: None,
            }),
            _ => None,
        }
    }
}

impl DqValidatorTrait for DqValidator {
    fn validate_source(&self, record: &SourceRecord, sheet: &str) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("course_start_date", &record.course_start_date),
            ("course_end_date", &record.course_end_date),
        ] {
            if !value.is_blank() && !matches!(value, CellValue::Date(_)) {
                issues.push(FieldIssue {
                    row_number: record.row_number,
                    sheet: sheet.to_string(),
                    field: field.to_string(),
                    value: value.as_text(),
                    kind: IssueKind::UnparsedDate,
                    level: DqLevel::Info,
                    message: "日期列内容不是日期，按原值写入".to_string(),
                    key: None,
                });
            }
        }

        issues
    }

    fn validate_record(&self, record: &DestinationRecord, sheet: &str) -> Vec<FieldIssue> {
        [
            self.check_numeric(&record.course_id, "course_number", record, sheet),
            self.check_numeric(&record.grade_average, "course_grade", record, sheet),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn validate_preexisting(
        &self,
        duplicates: &[(usize, DedupKey)],
        sheet: &str,
    ) -> Vec<FieldIssue> {
        let level = if self.fail_on_preexisting_duplicates {
            DqLevel::Error
        } else {
            DqLevel::Warning
        };

        duplicates
            .iter()
            .map(|(row, key)| FieldIssue {
                row_number: *row,
                sheet: sheet.to_string(),
                field: "student_id,course_name".to_string(),
                value: key.to_string(),
                kind: IssueKind::DuplicateKeyViolation,
                level,
                message: "目标表中已存在相同学号与课程".to_string(),
                key: Some(key.clone()),
            })
            .collect()
    }

    fn enforce(&self, issues: &[FieldIssue]) -> ImportResult<()> {
        let Some(issue) = issues.iter().find(|i| i.level == DqLevel::Error) else {
            return Ok(());
        };

        Err(match issue.kind {
            IssueKind::DuplicateKeyViolation => {
                let key = issue.key.clone().unwrap_or_else(|| DedupKey {
                    student_id: issue.value.clone(),
                    course_name: String::new(),
                });
                ImportError::DuplicateKeyViolation {
                    row: issue.row_number,
                    student_id: key.student_id,
                    course_name: key.course_name,
                }
            }
            IssueKind::MalformedField | IssueKind::UnparsedDate => ImportError::MalformedField {
                row: issue.row_number,
                field: issue.field.clone(),
                value: issue.value.clone(),
            },
        })
    }

    fn generate_dq_report(&self, run_id: String, issues: Vec<FieldIssue>) -> DqReport {
        let count = |level: DqLevel| issues.iter().filter(|i| i.level == level).count();

        DqReport {
            run_id,
            summary: DqSummary {
                info: count(DqLevel::Info),
                warning: count(DqLevel::Warning),
                error: count(DqLevel::Error),
            },
            issues,
        }
    }
}
