// ==========================================
// 课程学分导入工具 - 通知实现
// ==========================================
// Noop:   不做任何事（默认）
// Log:    每条通知一条 tracing info 日志
// Outbox: 每条通知追加一行 JSON 到发件箱文件，由外部邮件程序投递
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::types::NotifierKind;
use crate::importer::error::{ImportError, ImportResult};
use crate::notify::directory::CounselorDirectory;
use crate::notify::Notifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

// ==========================================
// NotificationMessage - 通知内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub to: String,
    pub counselor: String,
    pub subject: String,
    pub body: String,
    pub student_name: String,
    pub course_name: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// MessageComposer - 收件人解析 + 正文模板
// ==========================================
#[derive(Debug, Clone)]
pub struct MessageComposer {
    directory: CounselorDirectory,
    signature: String,
}

impl MessageComposer {
    pub fn new(directory: CounselorDirectory, signature: impl Into<String>) -> Self {
        Self {
            directory,
            signature: signature.into(),
        }
    }

    pub fn compose(&self, student_name: &str, course_name: &str) -> ImportResult<NotificationMessage> {
        let contact = self.directory.resolve(student_name).ok_or_else(|| {
            ImportError::NotifyError(format!("找不到负责辅导员: {}", student_name))
        })?;

        Ok(NotificationMessage {
            to: contact.email,
            counselor: contact.label,
            subject: format!("Course completed: {}", course_name),
            body: format!(
                "Good afternoon,\n\nWe are happy to report {} completed {}!\n\nThank you,\n{}",
                student_name, course_name, self.signature
            ),
            student_name: student_name.to_string(),
            course_name: course_name.to_string(),
            created_at: Utc::now(),
        })
    }
}

// ==========================================
// NoopNotifier
// ==========================================
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, student_name: &str, course_name: &str) -> ImportResult<()> {
        debug!(student_name, course_name, "通知已跳过 (noop)");
        Ok(())
    }
}

// ==========================================
// LogNotifier
// ==========================================
pub struct LogNotifier {
    composer: MessageComposer,
}

impl LogNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        Self { composer }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, student_name: &str, course_name: &str) -> ImportResult<()> {
        let message = self.composer.compose(student_name, course_name)?;
        info!(
            to = %message.to,
            counselor = %message.counselor,
            subject = %message.subject,
            "课程完成通知"
        );
        Ok(())
    }
}

// ==========================================
// OutboxNotifier - JSON Lines 发件箱
// ==========================================
pub struct OutboxNotifier {
    composer: MessageComposer,
    path: PathBuf,
    lock: Mutex<()>, // 串行化追加写
}

impl OutboxNotifier {
    pub fn new(composer: MessageComposer, path: impl Into<PathBuf>) -> Self {
        Self {
            composer,
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, student_name: &str, course_name: &str) -> ImportResult<()> {
        let message = self.composer.compose(student_name, course_name)?;
        let line = serde_json::to_string(&message)?;

        let _guard = self
            .lock
            .lock()
            .map_err(|e| ImportError::NotifyError(format!("锁获取失败: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ImportError::NotifyError(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| ImportError::NotifyError(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), to = %message.to, "通知已写入发件箱");
        Ok(())
    }
}

/// 按配置构造通知器
pub fn build_notifier<C: ImportConfigReader + ?Sized>(config: &C) -> ImportResult<Box<dyn Notifier>> {
    let composer = || MessageComposer::new(config.get_counselor_directory(), config.get_signature());

    Ok(match config.get_notifier_kind() {
        NotifierKind::Noop => Box::new(NoopNotifier),
        NotifierKind::Log => Box::new(LogNotifier::new(composer())),
        NotifierKind::Outbox => {
            let path = config.get_outbox_path().ok_or_else(|| ImportError::ConfigValueError {
                key: "outbox_path".to_string(),
                value: String::new(),
                message: "notifier = outbox 时必须配置发件箱路径".to_string(),
            })?;
            Box::new(OutboxNotifier::new(composer(), path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> MessageComposer {
        MessageComposer::new(CounselorDirectory::sample(), "Credit Recovery Office")
    }

    #[test]
    fn test_compose_message_template() {
        let message = composer().compose("JANE DOE", "ECONOMICS FOR CR").unwrap();

        assert_eq!(message.subject, "Course completed: ECONOMICS FOR CR");
        assert_eq!(
            message.body,
            "Good afternoon,\n\nWe are happy to report JANE DOE completed ECONOMICS FOR CR!\n\nThank you,\nCredit Recovery Office"
        );
        assert_eq!(message.counselor, "(D-Ha) Counselor");
    }

    #[test]
    fn test_compose_without_contact_fails() {
        let composer = MessageComposer::new(CounselorDirectory::default(), "x");
        let result = composer.compose("Jane Doe", "Biology");
        assert!(matches!(result, Err(ImportError::NotifyError(_))));
    }

    #[test]
    fn test_outbox_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let notifier = OutboxNotifier::new(composer(), &path);

        notifier.notify("JANE DOE", "BIOLOGY").unwrap();
        notifier.notify("NOAH GARZA", "ALGEBRA").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: NotificationMessage = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.student_name, "NOAH GARZA");
        assert_eq!(second.subject, "Course completed: ALGEBRA");
    }

    #[test]
    fn test_noop_notifier() {
        assert!(NoopNotifier.notify("a", "b").is_ok());
    }
}
