//! 人物提及
//!
//! 检测阶段产生的临时 `{name, hint}` 对，只用于驱动解析，从不直接持久化。

use serde::{Deserialize, Serialize};

/// 人物提及
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// 人物名称
    pub name: String,

    /// 消歧描述
    #[serde(default)]
    pub hint: String,
}

impl Mention {
    pub fn new(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint: hint.into(),
        }
    }
}

/// 清理检测结果：去除首尾空白，丢弃空名称，按 (name, hint) 去重并保留首次出现顺序
pub fn normalize_mentions(raw: Vec<Mention>) -> Vec<Mention> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter_map(|m| {
            let name = m.name.trim();
            if name.is_empty() {
                tracing::warn!(hint = %m.hint, "dropping mention with blank name");
                return None;
            }
            Some(Mention::new(name, m.hint.trim()))
        })
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mentions() {
        let raw = vec![
            Mention::new(" Samir ", "the baker"),
            Mention::new("", "nobody"),
            Mention::new("Samir", "the baker "),
            Mention::new("Samir", "the soldier"),
            Mention::new("Layla", ""),
        ];

        let mentions = normalize_mentions(raw);
        assert_eq!(
            mentions,
            vec![
                Mention::new("Samir", "the baker"),
                Mention::new("Samir", "the soldier"),
                Mention::new("Layla", ""),
            ]
        );
    }

    #[test]
    fn test_hint_defaults_when_absent() {
        let m: Mention = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert_eq!(m.hint, "");
    }
}
