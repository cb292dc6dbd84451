//! 存储层模块
//!
//! 提供画像持久化服务，支持 SQLite 与内存两种后端。

pub mod factory;
pub mod memory;
pub mod repository;
pub mod retrying;
pub mod sqlite;

pub use factory::StorageFactory;
pub use memory::MemoryProfileStore;
pub use repository::ProfileStore;
pub use retrying::RetryingProfileStore;
pub use sqlite::SqliteProfileStore;
