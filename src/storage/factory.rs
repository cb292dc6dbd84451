//! 存储工厂模块
//!
//! 根据配置创建相应的画像存储实例。

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;
use crate::storage::memory::MemoryProfileStore;
use crate::storage::repository::ProfileStore;
use crate::storage::retrying::RetryingProfileStore;
use crate::storage::sqlite::SqliteProfileStore;

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建存储实例（已包裹重试装饰器）
    pub async fn create(config: &StoreConfig) -> Result<Arc<dyn ProfileStore>> {
        let raw: Arc<dyn ProfileStore> = match config.backend.as_str() {
            "sqlite" => Arc::new(SqliteProfileStore::open(
                &config.path,
                Duration::from_millis(config.busy_timeout_ms),
            )?),
            "memory" => Arc::new(MemoryProfileStore::new()),
            other => {
                return Err(AppError::Config(format!("未知的存储后端: {}", other)));
            }
        };

        let store: Arc<dyn ProfileStore> =
            Arc::new(RetryingProfileStore::new(raw, Self::retry_policy(config)));

        if config.reset_on_start {
            store.clear().await?;
        }

        info!(backend = %config.backend, reset = config.reset_on_start, "profile store ready");
        Ok(store)
    }

    /// 存储操作的重试策略
    pub fn retry_policy(config: &StoreConfig) -> RetryPolicy {
        RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
            Duration::from_millis(config.retry_max_delay_ms),
        )
    }
}
