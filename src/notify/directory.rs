// ==========================================
// 课程学分导入工具 - 辅导员通讯录
// ==========================================
// 职责: 学生姓氏 → 负责辅导员（按姓氏首字母区间）
// 通讯录由配置注入，不使用全局状态
// ==========================================

use serde::{Deserialize, Serialize};

/// 姓氏区间（闭区间，按前缀比较，不区分大小写）
///
/// 例: ("D", "Ha") 覆盖 Davis / Hale，不覆盖 Hewgley
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastNameRange {
    pub from: String,
    pub to: String,
}

impl LastNameRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn contains(&self, last_name: &str) -> bool {
        let name = last_name.to_lowercase();
        let from = self.from.to_lowercase();
        let to = self.to.to_lowercase();

        prefix(&name, from.chars().count()) >= from && prefix(&name, to.chars().count()) <= to
    }
}

fn prefix(value: &str, len: usize) -> String {
    value.chars().take(len).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counselor {
    pub label: String,
    pub email: String,
    #[serde(default)]
    pub last_name_range: Option<LastNameRange>,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContact {
    pub label: String,
    pub email: String,
}

// ==========================================
// CounselorDirectory - 辅导员通讯录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounselorDirectory {
    #[serde(default)]
    pub counselors: Vec<Counselor>,
    #[serde(default)]
    pub fallback: Option<Counselor>, // 无区间匹配时使用（如年级主任）
    #[serde(default)]
    pub override_email: Option<String>, // 设置后所有通知发往同一地址（测试用）
}

impl CounselorDirectory {
    /// 默认通讯录: 五个姓氏区间 + 农学项目 + 主任兜底（地址为占位符）
    pub fn sample() -> Self {
        let counselor = |label: &str, from: &str, to: &str| Counselor {
            label: label.to_string(),
            email: "counselors@example.org".to_string(),
            last_name_range: Some(LastNameRange::new(from, to)),
        };

        Self {
            counselors: vec![
                counselor("(A-C) Counselor", "A", "C"),
                counselor("(D-Ha) Counselor", "D", "Ha"),
                counselor("(He-Mi) Counselor", "He", "Mi"),
                counselor("(Mo-R) Counselor", "Mo", "R"),
                counselor("(S-Z) Counselor", "S", "Z"),
                // 按项目而非姓氏分配，不参与姓氏解析
                Counselor {
                    label: "(ASTA-All Ag Students)".to_string(),
                    email: "counselors@example.org".to_string(),
                    last_name_range: None,
                },
            ],
            fallback: Some(Counselor {
                label: "(Head Counselor)".to_string(),
                email: "counselors@example.org".to_string(),
                last_name_range: None,
            }),
            override_email: None,
        }
    }

    /// 根据学生姓名解析辅导员
    ///
    /// # 返回
    /// - None: 无区间匹配且未配置兜底联系人
    pub fn resolve(&self, student_name: &str) -> Option<ResolvedContact> {
        let last_name = last_name_of(student_name);

        let counselor = self
            .counselors
            .iter()
            .find(|c| {
                c.last_name_range
                    .as_ref()
                    .is_some_and(|range| !last_name.is_empty() && range.contains(&last_name))
            })
            .or(self.fallback.as_ref())?;

        Some(ResolvedContact {
            label: counselor.label.clone(),
            email: self
                .override_email
                .clone()
                .unwrap_or_else(|| counselor.email.clone()),
        })
    }
}

/// 姓氏: "Doe, Jane" 取逗号前；"Jane Doe" 取最后一个词
pub fn last_name_of(student_name: &str) -> String {
    let name = student_name.trim();
    match name.split_once(',') {
        Some((last, _)) => last.trim().to_string(),
        None => name.split_whitespace().last().unwrap_or("").to_string(),
    }
}
