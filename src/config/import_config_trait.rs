// ==========================================
// 课程学分导入工具 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{BatchDedupPolicy, ColumnResolution, NotifierKind, NumericPolicy};
use crate::notify::CounselorDirectory;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（JSON 配置文件 + 默认值）
pub trait ImportConfigReader: Send + Sync {
    // ===== 工作表配置 =====

    /// 获取源表工作表名
    ///
    /// # 默认值
    /// - "Fall/Spring CR-CA Data"
    fn get_source_sheet(&self) -> String;

    /// 获取目标表工作表名
    ///
    /// # 默认值
    /// - "Completed Credits"
    fn get_destination_sheet(&self) -> String;

    /// 获取列解析方式
    ///
    /// # 返回
    /// - ColumnResolution::ByHeader: 按表头名称匹配
    /// - ColumnResolution::Positional: 按固定列位置
    ///
    /// # 默认值
    /// - BY_HEADER
    fn get_column_resolution(&self) -> ColumnResolution;

    // ===== 去重与数据质量 =====

    /// 获取批内去重策略
    ///
    /// # 默认值
    /// - SNAPSHOT_ONLY（只与运行开始时的目标表快照比较）
    fn get_batch_dedup_policy(&self) -> BatchDedupPolicy;

    /// 获取数值字段解析策略
    ///
    /// # 默认值
    /// - PERMISSIVE（写入错误标记，继续导入）
    fn get_numeric_policy(&self) -> NumericPolicy;

    /// 目标表已有重复键时是否中止
    ///
    /// # 默认值
    /// - false
    fn get_fail_on_preexisting_duplicates(&self) -> bool;

    // ===== 通知配置 =====

    /// 获取通知方式
    ///
    /// # 默认值
    /// - NOOP
    fn get_notifier_kind(&self) -> NotifierKind;

    /// 获取发件箱文件路径（notifier = outbox 时必填）
    fn get_outbox_path(&self) -> Option<PathBuf>;

    /// 获取辅导员通讯录
    fn get_counselor_directory(&self) -> CounselorDirectory;

    /// 获取通知落款
    ///
    /// # 默认值
    /// - "Credit Recovery Office"
    fn get_signature(&self) -> String;
}
