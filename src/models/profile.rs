//! 人物画像数据模型
//!
//! 持久化形态为 `{id, name, profile: {...}}`：`id` 为主键，`name` 为二级索引，
//! 其余字段存放在 `profile` 文档中，每次更新都是整文档覆盖。

use serde::{Deserialize, Serialize};

/// 画像文档（持久化的 `profile` 部分）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDocument {
    /// 消歧描述（同名人物靠它区分）
    pub hint: String,

    /// 年龄
    pub age: String,

    /// 角色/身份
    pub role: String,

    /// 外貌特征（有序）
    pub physical_characteristics: Vec<String>,

    /// 性格描述
    pub personality: String,

    /// 经历事件（有序）
    pub events: Vec<String>,

    /// 人物关系，形如 "name: relation"
    pub relationships: Vec<String>,

    /// 别名
    pub aliases: Vec<String>,
}

impl ProfileDocument {
    /// 创建骨架文档：除 hint 外全部为空
    pub fn skeleton(hint: impl Into<String>) -> Self {
        Self {
            hint: hint.into(),
            ..Default::default()
        }
    }

    /// 是否仍是骨架（尚未被合并填充）
    pub fn is_skeleton(&self) -> bool {
        self.age.is_empty()
            && self.role.is_empty()
            && self.physical_characteristics.is_empty()
            && self.personality.is_empty()
            && self.events.is_empty()
            && self.relationships.is_empty()
            && self.aliases.is_empty()
    }
}

/// 存储记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// 记录唯一标识（创建后不可变）
    pub id: String,

    /// 人物名称（查找键）
    pub name: String,

    /// 画像文档
    pub profile: ProfileDocument,
}

/// 人物画像（扁平视图，供解析与合并使用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub hint: String,
    pub age: String,
    pub role: String,
    pub physical_characteristics: Vec<String>,
    pub personality: String,
    pub events: Vec<String>,
    pub relationships: Vec<String>,
    pub aliases: Vec<String>,
}

impl Profile {
    /// 创建骨架画像
    pub fn skeleton(id: impl Into<String>, name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hint: hint.into(),
            ..Default::default()
        }
    }

    /// 拆出持久化文档
    pub fn document(&self) -> ProfileDocument {
        ProfileDocument {
            hint: self.hint.clone(),
            age: self.age.clone(),
            role: self.role.clone(),
            physical_characteristics: self.physical_characteristics.clone(),
            personality: self.personality.clone(),
            events: self.events.clone(),
            relationships: self.relationships.clone(),
            aliases: self.aliases.clone(),
        }
    }

    /// 以 `name` 为准合并别名：不同于存储名的名称追加为别名（去重）
    pub fn fold_name_into_aliases(&mut self, stored_name: &str) {
        let returned = self.name.trim().to_string();
        self.name = stored_name.to_string();
        if !returned.is_empty() && returned != stored_name && !self.aliases.contains(&returned) {
            self.aliases.push(returned);
        }
    }
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        let ProfileRecord { id, name, profile } = record;
        Self {
            id,
            name,
            hint: profile.hint,
            age: profile.age,
            role: profile.role,
            physical_characteristics: profile.physical_characteristics,
            personality: profile.personality,
            events: profile.events,
            relationships: profile.relationships,
            aliases: profile.aliases,
        }
    }
}

impl From<&Profile> for ProfileRecord {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            profile: profile.document(),
        }
    }
}
