// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 语言环境变量
pub const LOCALE_ENV_VAR: &str = "CREDIT_IMPORTER_LOCALE";

/// 支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 从环境变量设置语言；未设置或不支持时保持默认
///
/// # 返回
/// - 生效的语言代码
pub fn init_from_env() -> String {
    if let Ok(value) = std::env::var(LOCALE_ENV_VAR) {
        let value = value.trim();
        match SUPPORTED_LOCALES
            .iter()
            .find(|l| l.eq_ignore_ascii_case(value))
        {
            Some(locale) => set_locale(locale),
            None => tracing::warn!(locale = value, "不支持的语言，使用默认语言"),
        }
    }
    current_locale()
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use credit_importer::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use credit_importer::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/test.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
