// ==========================================
// 课程学分导入工具 - 字段映射器实现
// ==========================================
// 职责: 命名列 schema → 列位置解析（读取时一次性校验）
//       源表行 → SourceRecord / 目标表行 → ExistingCredit
// ==========================================

use crate::domain::credit::{ExistingCredit, SourceRecord};
use crate::domain::sheet::{Sheet, SheetRow};
use crate::domain::types::{CellValue, ColumnResolution};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ==========================================
// ColumnSpec - 列定义
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str], // 第一个别名作为默认表头
    pub position: usize,                  // 固定列位置（1 起始）
}

/// 源表列定义（A:T 区域）
pub const SOURCE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { field: "approved", aliases: &["Approved", "Approval", "Import"], position: 1 },
    ColumnSpec { field: "student_name", aliases: &["Student Name", "Name"], position: 6 },
    ColumnSpec { field: "student_id", aliases: &["Student ID", "Student Number", "ID"], position: 7 },
    ColumnSpec { field: "course_name", aliases: &["Course Name", "Course"], position: 8 },
    ColumnSpec { field: "course_number", aliases: &["Course No", "Course Number"], position: 10 },
    ColumnSpec {
        field: "course_start_date",
        aliases: &["Course Date Start", "Course Start Date", "Start Date"],
        position: 11,
    },
    ColumnSpec {
        field: "course_end_date",
        aliases: &["Course End Date", "Course Date End", "End Date"],
        position: 12,
    },
    ColumnSpec { field: "course_grade", aliases: &["Course Grade", "Grade"], position: 13 },
    ColumnSpec {
        field: "teacher_of_record",
        aliases: &["Teacher of Record", "Teacher"],
        position: 16,
    },
    ColumnSpec {
        field: "hours_on_course",
        aliases: &["Time on Course", "Hours on Course", "Hours"],
        position: 17,
    },
    ColumnSpec {
        field: "reference_url",
        aliases: &["LOC Link", "Reference URL", "URL", "Link"],
        position: 18,
    },
];

/// 目标表列定义（A:M 区域），写入顺序与位置固定
pub const DESTINATION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { field: "index", aliases: &["#", "No", "Index"], position: 1 },
    ColumnSpec { field: "student_name", aliases: &["Student Name", "Name"], position: 2 },
    ColumnSpec { field: "student_id", aliases: &["Student ID", "Student Number", "ID"], position: 3 },
    ColumnSpec { field: "course_name", aliases: &["Course Name", "Course"], position: 4 },
    ColumnSpec { field: "course_id", aliases: &["Course ID", "Course No", "Course Number"], position: 5 },
    ColumnSpec {
        field: "course_start_date",
        aliases: &["Course Date Start", "Course Start Date", "Start Date"],
        position: 6,
    },
    ColumnSpec {
        field: "credit_date",
        aliases: &["Course Date Credit Earned", "Credit Date", "Credit Earned"],
        position: 7,
    },
    ColumnSpec {
        field: "grade_average",
        aliases: &["Course Grade Average", "Grade Average", "Grade"],
        position: 8,
    },
    ColumnSpec {
        field: "teacher_of_record",
        aliases: &["Teacher of Record", "Teacher"],
        position: 9,
    },
    ColumnSpec {
        field: "hours_on_course",
        aliases: &["Hours on Course", "Time on Course", "Hours"],
        position: 10,
    },
    ColumnSpec { field: "reference_url", aliases: &["LOC Link", "Reference URL", "URL"], position: 11 },
    ColumnSpec { field: "local_school", aliases: &["LS", "Local School"], position: 12 },
    ColumnSpec { field: "notes", aliases: &["Notes", "Note"], position: 13 },
];

/// 目标表关键列位置（1 起始）
pub mod dest_cols {
    pub const INDEX: usize = 1;
    pub const STUDENT_ID: usize = 3;
}

/// 表头归一化: 小写 + 只保留字母数字（"Course No." == "course no"）
fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '#')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn matches_spec(header: &CellValue, spec: &ColumnSpec) -> bool {
    let normalized = normalize_header(&header.as_text());
    !normalized.is_empty() && spec.aliases.iter().any(|a| normalize_header(a) == normalized)
}

// ==========================================
// ColumnMap - 已解析的列位置（0 起始下标）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<&'static str, usize>,
}

impl ColumnMap {
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.positions.get(field).copied()
    }

    fn cell<'a>(&self, row: &'a SheetRow, field: &str) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        match self.index_of(field) {
            Some(idx) => row.cell(idx),
            None => &EMPTY,
        }
    }

    fn text(&self, row: &SheetRow, field: &str) -> String {
        self.cell(row, field).as_text()
    }
}

// ==========================================
// FieldMapper - 字段映射器
// ==========================================
pub struct FieldMapper {
    resolution: ColumnResolution,
}

impl FieldMapper {
    pub fn new(resolution: ColumnResolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> ColumnResolution {
        self.resolution
    }

    /// 解析源表列位置
    ///
    /// - ByHeader: 表头任意位置匹配别名，缺任一列即 SchemaMismatch
    /// - Positional: 使用固定列位置
    pub fn resolve_source(&self, sheet: &Sheet) -> ImportResult<ColumnMap> {
        match self.resolution {
            ColumnResolution::Positional => Ok(positional_map(SOURCE_COLUMNS)),
            ColumnResolution::ByHeader => {
                let header = sheet.header().ok_or_else(|| ImportError::SchemaMismatch {
                    sheet: sheet.name().to_string(),
                    message: "缺少表头行".to_string(),
                })?;

                let mut positions = HashMap::new();
                let mut missing = Vec::new();
                for spec in SOURCE_COLUMNS {
                    match header.cells.iter().position(|h| matches_spec(h, spec)) {
                        Some(idx) => {
                            positions.insert(spec.field, idx);
                        }
                        None => missing.push(spec.aliases[0]),
                    }
                }

                if !missing.is_empty() {
                    return Err(ImportError::SchemaMismatch {
                        sheet: sheet.name().to_string(),
                        message: format!("缺少列: {}", missing.join(", ")),
                    });
                }
                Ok(ColumnMap { positions })
            }
        }
    }

    /// 校验目标表列位置
    ///
    /// 目标表按固定位置写入，ByHeader 模式下要求每个表头出现在其固定位置
    pub fn resolve_destination(&self, sheet: &Sheet) -> ImportResult<ColumnMap> {
        if self.resolution == ColumnResolution::ByHeader {
            if let Some(header) = sheet.header() {
                let misplaced: Vec<String> = DESTINATION_COLUMNS
                    .iter()
                    .filter(|spec| !matches_spec(header.cell(spec.position - 1), spec))
                    .map(|spec| format!("{}(第 {} 列)", spec.aliases[0], spec.position))
                    .collect();

                if !misplaced.is_empty() {
                    return Err(ImportError::SchemaMismatch {
                        sheet: sheet.name().to_string(),
                        message: format!("表头与固定列布局不一致: {}", misplaced.join(", ")),
                    });
                }
            }
        }
        Ok(positional_map(DESTINATION_COLUMNS))
    }

    /// 目标表为空时使用的默认表头
    pub fn default_destination_header(&self) -> Vec<CellValue> {
        DESTINATION_COLUMNS
            .iter()
            .map(|spec| CellValue::text(spec.aliases[0]))
            .collect()
    }

    /// 源表行 → SourceRecord
    ///
    /// 审批标记在此保留原始单元格判断结果，由调用方传入判定函数
    pub fn map_source_row(
        &self,
        map: &ColumnMap,
        row: &SheetRow,
        row_number: usize,
        is_approved: impl Fn(&CellValue) -> bool,
    ) -> SourceRecord {
        SourceRecord {
            approved: is_approved(map.cell(row, "approved")),
            student_name: map.text(row, "student_name"),
            student_id: map.cell(row, "student_id").clone(),
            course_name: map.text(row, "course_name"),
            course_number: map.cell(row, "course_number").clone(),
            course_start_date: map.cell(row, "course_start_date").clone(),
            course_end_date: map.cell(row, "course_end_date").clone(),
            course_grade: map.cell(row, "course_grade").clone(),
            hours_on_course: map.cell(row, "hours_on_course").clone(),
            reference_url: map.text(row, "reference_url"),
            teacher_of_record: map.text(row, "teacher_of_record"),
            row_number,
        }
    }

    /// 目标表行 → ExistingCredit（快照）
    pub fn map_existing_row(&self, map: &ColumnMap, row: &SheetRow, row_number: usize) -> ExistingCredit {
        ExistingCredit {
            row_number,
            student_id: map.cell(row, "student_id").clone(),
            course_name: map.text(row, "course_name"),
        }
    }
}

fn positional_map(schema: &[ColumnSpec]) -> ColumnMap {
    ColumnMap {
        positions: schema.iter().map(|s| (s.field, s.position - 1)).collect(),
    }
}
