// ==========================================
// 课程学分导入工具 - 冲突处理器实现
// ==========================================
// 职责: 检测去重键冲突（快照 / 快照内 / 批次内）
// 去重键: (学号, 小写课程名)
// ==========================================

use crate::domain::credit::{DedupKey, ExistingCredit};
use crate::importer::credit_importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::{HashMap, HashSet};

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 与目标表快照逐行比较，命中即停
    fn is_snapshot_duplicate(&self, key: &DedupKey, snapshot: &[ExistingCredit]) -> bool {
        snapshot.iter().any(|existing| existing.dedup_key() == *key)
    }

    /// 检测快照内已存在的重复键
    ///
    /// # 返回
    /// - Vec<(行号, 去重键)>: 重复记录列表（不包括第一次出现）
    fn detect_preexisting_duplicates(&self, snapshot: &[ExistingCredit]) -> Vec<(usize, DedupKey)> {
        let mut first_occurrence: HashMap<DedupKey, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for existing in snapshot {
            let key = existing.dedup_key();
            // 学号与课程都为空的行不参与检测
            if key.student_id.is_empty() && key.course_name.is_empty() {
                continue;
            }
            if first_occurrence.contains_key(&key) {
                duplicates.push((existing.row_number, key));
            } else {
                first_occurrence.insert(key, existing.row_number);
            }
        }

        duplicates
    }

    /// 检测本批次内重复键
    fn detect_batch_duplicates(&self, keys: &[(usize, DedupKey)]) -> Vec<usize> {
        let mut seen: HashSet<&DedupKey> = HashSet::new();
        let mut duplicates = Vec::new();

        for (row, key) in keys {
            if !seen.insert(key) {
                duplicates.push(*row);
            }
        }

        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CellValue;

    fn existing(row_number: usize, student_id: &str, course: &str) -> ExistingCredit {
        ExistingCredit {
            row_number,
            student_id: CellValue::text(student_id),
            course_name: course.to_string(),
        }
    }

    #[test]
    fn test_snapshot_duplicate_case_insensitive_course() {
        let handler = ConflictHandler;
        let snapshot = vec![existing(2, "S123", "ECONOMICS FOR CR")];

        let key = DedupKey::new(&CellValue::text("S123"), "Economics for CR");
        assert!(handler.is_snapshot_duplicate(&key, &snapshot));

        let other = DedupKey::new(&CellValue::text("S124"), "Economics for CR");
        assert!(!handler.is_snapshot_duplicate(&other, &snapshot));
    }

    #[test]
    fn test_snapshot_duplicate_numeric_id() {
        let handler = ConflictHandler;
        let snapshot = vec![ExistingCredit {
            row_number: 2,
            student_id: CellValue::Int(123456),
            course_name: "algebra i".to_string(),
        }];

        let key = DedupKey::new(&CellValue::text("123456"), "ALGEBRA I");
        assert!(handler.is_snapshot_duplicate(&key, &snapshot));
    }

    #[test]
    fn test_detect_preexisting_duplicates() {
        let handler = ConflictHandler;
        let snapshot = vec![
            existing(2, "S1", "BIOLOGY"),
            existing(3, "S2", "BIOLOGY"),
            existing(4, "S1", "biology"), // 重复
            existing(5, "", ""),
            existing(6, "", ""),
        ];

        let duplicates = handler.detect_preexisting_duplicates(&snapshot);

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, 4);
        assert_eq!(duplicates[0].1.student_id, "S1");
    }

    #[test]
    fn test_detect_batch_duplicates() {
        let handler = ConflictHandler;
        let a = DedupKey::new(&CellValue::text("S1"), "Biology");
        let b = DedupKey::new(&CellValue::text("S2"), "Biology");
        let keys = vec![(2, a.clone()), (3, b), (7, a.clone()), (9, a)];

        assert_eq!(handler.detect_batch_duplicates(&keys), vec![7, 9]);
    }
}
