//! 实体解析服务
//!
//! 把检测到的人物提及映射到已存储的画像：按名称精确查找，命中多少返回多少；
//! 未命中时创建骨架记录。hint 不参与查找，同名人物的区分交给合并阶段。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::{Mention, Profile, ProfileDocument};
use crate::observability::RunStats;
use crate::storage::ProfileStore;

/// 实体解析服务 trait
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// 按名称查找候选画像（0、1 或多个）
    async fn resolve(&self, mention: &Mention) -> Result<Vec<Profile>>;

    /// 查找候选画像；没有候选时创建骨架记录并返回它
    async fn resolve_or_create(&self, mention: &Mention) -> Result<Vec<Profile>>;

    /// 解析一组提及，按 ID 去重并保持首次出现顺序
    async fn resolve_all(&self, mentions: &[Mention]) -> Result<Vec<Profile>> {
        let mut seen = HashSet::new();
        let mut working = Vec::new();
        for mention in mentions {
            for profile in self.resolve_or_create(mention).await? {
                if seen.insert(profile.id.clone()) {
                    working.push(profile);
                }
            }
        }
        Ok(working)
    }
}

/// 实体解析服务实现
pub struct EntityResolverImpl {
    store: Arc<dyn ProfileStore>,
    stats: RunStats,
}

impl EntityResolverImpl {
    /// 创建新的服务实例
    pub fn new(store: Arc<dyn ProfileStore>, stats: RunStats) -> Self {
        Self { store, stats }
    }
}

#[async_trait]
impl EntityResolver for EntityResolverImpl {
    async fn resolve(&self, mention: &Mention) -> Result<Vec<Profile>> {
        let records = self.store.find_by_name(&mention.name).await?;
        Ok(records.into_iter().map(Profile::from).collect())
    }

    async fn resolve_or_create(&self, mention: &Mention) -> Result<Vec<Profile>> {
        let candidates = self.resolve(mention).await?;
        if !candidates.is_empty() {
            debug!(name = %mention.name, candidates = candidates.len(), "mention resolved");
            return Ok(candidates);
        }

        let id = self
            .store
            .create(&mention.name, &ProfileDocument::skeleton(&mention.hint))
            .await?;
        self.stats.record_created();
        debug!(name = %mention.name, %id, "skeleton profile created");
        Ok(vec![Profile::skeleton(id, &mention.name, &mention.hint)])
    }
}

/// 创建实体解析服务
pub fn create_entity_resolver(store: Arc<dyn ProfileStore>, stats: RunStats) -> Box<dyn EntityResolver> {
    Box::new(EntityResolverImpl::new(store, stats))
}
