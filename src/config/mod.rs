// ==========================================
// 课程学分导入工具 - 配置层
// ==========================================
// 职责: 导入配置管理，支持配置文件 + 单项覆写
// 存储: JSON 文件
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_config_path, ConfigManager, ImportSettings};
pub use import_config_trait::ImportConfigReader;
