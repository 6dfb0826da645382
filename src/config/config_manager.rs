// ==========================================
// 课程学分导入工具 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、单项覆写
// 存储: JSON 配置文件（缺失的键使用默认值，未知键忽略）
// 查找顺序: 显式路径 → $CREDIT_IMPORTER_CONFIG → 用户配置目录 → 默认值
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::types::{BatchDedupPolicy, ColumnResolution, NotifierKind, NumericPolicy};
use crate::importer::error::{ImportError, ImportResult};
use crate::notify::CounselorDirectory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV_VAR: &str = "CREDIT_IMPORTER_CONFIG";
pub const DEFAULT_SOURCE_SHEET: &str = "Fall/Spring CR-CA Data";
pub const DEFAULT_DESTINATION_SHEET: &str = "Completed Credits";
pub const DEFAULT_SIGNATURE: &str = "Credit Recovery Office";

// ==========================================
// ImportSettings - 配置文件内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub source_sheet: String,
    pub destination_sheet: String,
    pub column_resolution: ColumnResolution,
    pub batch_dedup_policy: BatchDedupPolicy,
    pub numeric_policy: NumericPolicy,
    pub fail_on_preexisting_duplicates: bool,
    pub notifier: NotifierKind,
    pub outbox_path: Option<PathBuf>,
    pub counselors: CounselorDirectory,
    pub signature: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            source_sheet: DEFAULT_SOURCE_SHEET.to_string(),
            destination_sheet: DEFAULT_DESTINATION_SHEET.to_string(),
            column_resolution: ColumnResolution::default(),
            batch_dedup_policy: BatchDedupPolicy::default(),
            numeric_policy: NumericPolicy::default(),
            fail_on_preexisting_duplicates: false,
            notifier: NotifierKind::default(),
            outbox_path: None,
            counselors: CounselorDirectory::sample(),
            signature: DEFAULT_SIGNATURE.to_string(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    settings: ImportSettings,
    source: Option<PathBuf>, // 加载来源（None = 默认值）
}

impl ConfigManager {
    /// 使用默认配置
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: ImportSettings) -> Self {
        Self {
            settings,
            source: None,
        }
    }

    /// 从 JSON 文件加载
    ///
    /// # 返回
    /// - Err(ConfigReadError): 文件不可读或 JSON 格式错误
    pub fn load(path: &Path) -> ImportResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let settings: ImportSettings =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(path = %path.display(), "配置已加载");
        Ok(Self {
            settings,
            source: Some(path.to_path_buf()),
        })
    }

    /// 按查找顺序加载
    ///
    /// 环境变量指定的文件必须存在；用户配置目录下的文件可选
    pub fn load_default() -> ImportResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::load(Path::new(&path));
            }
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        debug!("未找到配置文件，使用默认配置");
        Ok(Self::new())
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 单项覆写（CLI `--set key=value`）
    ///
    /// # 返回
    /// - Err(ConfigValueError): 键未知或值无法解析
    pub fn set_value(&mut self, key: &str, value: &str) -> ImportResult<()> {
        let invalid = |message: &str| ImportError::ConfigValueError {
            key: key.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        };

        match key {
            config_keys::SOURCE_SHEET => self.settings.source_sheet = value.to_string(),
            config_keys::DESTINATION_SHEET => self.settings.destination_sheet = value.to_string(),
            config_keys::COLUMN_RESOLUTION => {
                self.settings.column_resolution = parse_enum(value).ok_or_else(|| {
                    invalid("可选值: by_header / positional")
                })?
            }
            config_keys::BATCH_DEDUP_POLICY => {
                self.settings.batch_dedup_policy = parse_enum(value).ok_or_else(|| {
                    invalid("可选值: snapshot_only / snapshot_and_batch")
                })?
            }
            config_keys::NUMERIC_POLICY => {
                self.settings.numeric_policy =
                    parse_enum(value).ok_or_else(|| invalid("可选值: permissive / reject"))?
            }
            config_keys::FAIL_ON_PREEXISTING_DUPLICATES => {
                self.settings.fail_on_preexisting_duplicates =
                    value.trim().parse::<bool>().map_err(|_| invalid("可选值: true / false"))?
            }
            config_keys::NOTIFIER => {
                self.settings.notifier =
                    parse_enum(value).ok_or_else(|| invalid("可选值: noop / log / outbox"))?
            }
            config_keys::OUTBOX_PATH => {
                self.settings.outbox_path = Some(PathBuf::from(value));
            }
            config_keys::OVERRIDE_EMAIL => {
                let email = value.trim();
                self.settings.counselors.override_email =
                    (!email.is_empty()).then(|| email.to_string());
            }
            config_keys::SIGNATURE => self.settings.signature = value.to_string(),
            _ => return Err(invalid("未知配置键")),
        }

        debug!(key, value, "配置项已覆写");
        Ok(())
    }
}

/// 用户配置目录下的默认配置文件
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("credit-importer").join("config.json"))
}

/// snake_case 字符串 → 策略枚举（复用 serde 定义）
fn parse_enum<T: serde::de::DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase())).ok()
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_source_sheet(&self) -> String {
        self.settings.source_sheet.clone()
    }

    fn get_destination_sheet(&self) -> String {
        self.settings.destination_sheet.clone()
    }

    fn get_column_resolution(&self) -> ColumnResolution {
        self.settings.column_resolution
    }

    fn get_batch_dedup_policy(&self) -> BatchDedupPolicy {
        self.settings.batch_dedup_policy
    }

    fn get_numeric_policy(&self) -> NumericPolicy {
        self.settings.numeric_policy
    }

    fn get_fail_on_preexisting_duplicates(&self) -> bool {
        self.settings.fail_on_preexisting_duplicates
    }

    fn get_notifier_kind(&self) -> NotifierKind {
        self.settings.notifier
    }

    fn get_outbox_path(&self) -> Option<PathBuf> {
        self.settings.outbox_path.clone()
    }

    fn get_counselor_directory(&self) -> CounselorDirectory {
        self.settings.counselors.clone()
    }

    fn get_signature(&self) -> String {
        self.settings.signature.clone()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 工作表
    pub const SOURCE_SHEET: &str = "source_sheet";
    pub const DESTINATION_SHEET: &str = "destination_sheet";
    pub const COLUMN_RESOLUTION: &str = "column_resolution";

    // 去重与数据质量
    pub const BATCH_DEDUP_POLICY: &str = "batch_dedup_policy";
    pub const NUMERIC_POLICY: &str = "numeric_policy";
    pub const FAIL_ON_PREEXISTING_DUPLICATES: &str = "fail_on_preexisting_duplicates";

    // 通知
    pub const NOTIFIER: &str = "notifier";
    pub const OUTBOX_PATH: &str = "outbox_path";
    pub const OVERRIDE_EMAIL: &str = "override_email";
    pub const SIGNATURE: &str = "signature";
}
