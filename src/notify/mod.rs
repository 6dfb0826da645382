// ==========================================
// 课程学分导入工具 - 通知层
// ==========================================
// 职责: 新插入的学分 → 通知负责辅导员
// 语义: 尽力而为，无重试，无送达确认
// ==========================================

pub mod directory;
pub mod notifier;

pub use directory::{Counselor, CounselorDirectory, LastNameRange, ResolvedContact};
pub use notifier::{
    build_notifier, LogNotifier, MessageComposer, NoopNotifier, NotificationMessage,
    OutboxNotifier,
};

use crate::importer::error::ImportResult;

// ==========================================
// Notifier Trait
// ==========================================
// 用途: 通知能力接口
// 实现者: NoopNotifier, LogNotifier, OutboxNotifier
pub trait Notifier: Send + Sync {
    /// 通知一条新完成的课程
    ///
    /// # 返回
    /// - Err(NotifyError): 调用方记录并计数，不中止导入
    fn notify(&self, student_name: &str, course_name: &str) -> ImportResult<()>;
}
