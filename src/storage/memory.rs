//! 内存画像存储
//!
//! 与 SQLite 存储语义一致，用于测试与试运行。

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ProfileDocument, ProfileRecord};
use crate::storage::repository::{ProfileStore, closed_error};

#[derive(Default)]
struct Inner {
    /// 按插入顺序保存
    records: Vec<ProfileRecord>,
    closed: bool,
}

/// 内存画像存储
#[derive(Default)]
pub struct MemoryProfileStore {
    inner: RwLock<Inner>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&[ProfileRecord]) -> T) -> Result<T> {
        let inner = self.inner.read();
        if inner.closed {
            return Err(closed_error());
        }
        Ok(f(&inner.records))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Vec<ProfileRecord>) -> T) -> Result<T> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(closed_error());
        }
        Ok(f(&mut inner.records))
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn create(&self, name: &str, document: &ProfileDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.write(|records| {
            records.push(ProfileRecord {
                id: id.clone(),
                name: name.to_string(),
                profile: document.clone(),
            })
        })?;
        Ok(id)
    }

    async fn update(&self, id: &str, document: &ProfileDocument) -> Result<bool> {
        self.write(|records| match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.profile = document.clone();
                true
            }
            None => false,
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ProfileRecord>> {
        self.read(|records| records.iter().filter(|r| r.name == name).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<ProfileRecord>> {
        self.read(|records| records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ProfileRecord>> {
        let mut all = self.read(|records| records.to_vec())?;
        // stable sort keeps insertion order for equal keys
        all.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.profile.hint.cmp(&b.profile.hint))
        });
        Ok(all)
    }

    async fn clear(&self) -> Result<()> {
        self.write(|records| records.clear())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.write(|records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            records.len() != before
        })
    }

    async fn count(&self) -> Result<u64> {
        self.read(|records| records.len() as u64)
    }

    async fn close(&self) -> Result<()> {
        self.inner.write().closed = true;
        Ok(())
    }
}
