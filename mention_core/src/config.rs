//! `config`：控制器配置（可从 TOML 读取）。

use serde::Deserialize;
use thiserror::Error;

use crate::caret::DEFAULT_PLACEHOLDER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mention config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("trigger must not be whitespace")]
    WhitespaceTrigger,
}

/// 控制器配置。
///
/// ```toml
/// trigger = "#"
/// candidate_limit = 8
/// rank_by_weight = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MentionConfig {
    /// 触发符
    pub trigger: char,
    /// 候选数量上限；`None` 表示不限
    pub candidate_limit: Option<usize>,
    /// caret 定位时标记节点的占位字形
    pub placeholder: char,
    /// 是否按 key 去重
    pub dedup: bool,
    /// 是否按权重倒序
    pub rank_by_weight: bool,
}

impl Default for MentionConfig {
    fn default() -> Self {
        Self {
            trigger: '@',
            candidate_limit: None,
            placeholder: DEFAULT_PLACEHOLDER,
            dedup: false,
            rank_by_weight: false,
        }
    }
}

impl MentionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 空白触发符永远无法匹配（token 按空白切分），直接拒绝。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger.is_whitespace() {
            return Err(ConfigError::WhitespaceTrigger);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let c = MentionConfig::from_toml_str("candidate_limit = 5").unwrap();
        assert_eq!(c.trigger, '@');
        assert_eq!(c.candidate_limit, Some(5));
        assert_eq!(c.placeholder, '.');
    }

    #[test]
    fn custom_trigger_parses() {
        let c = MentionConfig::from_toml_str("trigger = \"#\"\nrank_by_weight = true").unwrap();
        assert_eq!(c.trigger, '#');
        assert!(c.rank_by_weight);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            MentionConfig::from_toml_str("trigger = \" \""),
            Err(ConfigError::WhitespaceTrigger)
        ));
        assert!(matches!(
            MentionConfig::from_toml_str("trigger = \"ab\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
