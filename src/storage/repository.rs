//! 画像存储接口
//!
//! 存储层只负责键值持久化，不包含任何合并逻辑：每次 `update` 都是整文档覆盖。
//! 单写者假设：一次运行内不支持并发写入。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ProfileDocument, ProfileRecord};

/// 画像存储 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 创建记录，返回新分配的 ID
    async fn create(&self, name: &str, document: &ProfileDocument) -> Result<String>;

    /// 整文档覆盖更新；ID 不存在时返回 false
    async fn update(&self, id: &str, document: &ProfileDocument) -> Result<bool>;

    /// 按名称精确查找（插入顺序）
    async fn find_by_name(&self, name: &str) -> Result<Vec<ProfileRecord>>;

    /// 根据 ID 获取记录
    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>>;

    /// 列出全部记录（按 name、hint、插入顺序排序）
    async fn list_all(&self) -> Result<Vec<ProfileRecord>>;

    /// 清空存储
    async fn clear(&self) -> Result<()>;

    /// 删除记录
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 统计数量
    async fn count(&self) -> Result<u64>;

    /// 关闭存储；之后的操作返回错误
    async fn close(&self) -> Result<()>;
}

/// 已关闭存储的统一错误
pub(crate) fn closed_error() -> crate::error::AppError {
    crate::error::AppError::Database("store closed".into())
}
