//! 带重试的存储装饰器
//!
//! 对任意 `ProfileStore` 的瞬时错误（忙、锁定）按有界退避重试。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ProfileDocument, ProfileRecord};
use crate::retry::RetryPolicy;
use crate::storage::repository::ProfileStore;

/// 带重试的存储
pub struct RetryingProfileStore {
    inner: Arc<dyn ProfileStore>,
    policy: RetryPolicy,
}

impl RetryingProfileStore {
    pub fn new(inner: Arc<dyn ProfileStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ProfileStore for RetryingProfileStore {
    async fn create(&self, name: &str, document: &ProfileDocument) -> Result<String> {
        self.policy
            .run("store.create", || self.inner.create(name, document))
            .await
    }

    async fn update(&self, id: &str, document: &ProfileDocument) -> Result<bool> {
        self.policy
            .run("store.update", || self.inner.update(id, document))
            .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ProfileRecord>> {
        self.policy
            .run("store.find_by_name", || self.inner.find_by_name(name))
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>> {
        self.policy.run("store.get", || self.inner.get(id)).await
    }

    async fn list_all(&self) -> Result<Vec<ProfileRecord>> {
        self.policy.run("store.list_all", || self.inner.list_all()).await
    }

    async fn clear(&self) -> Result<()> {
        self.policy.run("store.clear", || self.inner.clear()).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.policy.run("store.delete", || self.inner.delete(id)).await
    }

    async fn count(&self) -> Result<u64> {
        self.policy.run("store.count", || self.inner.count()).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
