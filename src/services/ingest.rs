//! 文档导入服务
//!
//! 一次运行的外层胶水：校验输入文件、预处理、切块、驱动状态机，
//! 并在成功或中止时关闭存储句柄。

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chunking::Chunker;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::observability::RunStats;
use crate::oracle::{OracleAdapter, OracleBackend, retry_policy};
use crate::retry::RetryPolicy;
use crate::services::pipeline::{PipelineController, RunReport};
use crate::services::resolver::create_entity_resolver;
use crate::storage::ProfileStore;
use crate::text::{GateVerdict, PreparedText, Preprocessor};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// 状态机运行到 END
    Completed(RunReport),
    /// 语言门拒绝了文档，未切块，未写入
    Rejected(GateVerdict),
}

/// 文档导入服务
pub struct DocumentIngestor {
    store: Arc<dyn ProfileStore>,
    backend: Arc<dyn OracleBackend>,
    preprocessor: Preprocessor,
    chunker: Chunker,
    retry: RetryPolicy,
}

impl DocumentIngestor {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        backend: Arc<dyn OracleBackend>,
        preprocessor: Preprocessor,
        chunker: Chunker,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            backend,
            preprocessor,
            chunker,
            retry,
        }
    }

    /// 按配置组装
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn ProfileStore>,
        backend: Arc<dyn OracleBackend>,
    ) -> Result<Self> {
        Ok(Self::new(
            store,
            backend,
            Preprocessor::from_config(&config.preprocess),
            Chunker::from_config(&config.chunking)?,
            retry_policy(&config.oracle),
        ))
    }

    /// 导入一个文件；无论成功、输入错误还是中止都会关闭存储
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<IngestOutcome> {
        let path = path.as_ref();
        let result = match read_input(path).await {
            Ok(raw) => {
                info!(path = %path.display(), chars = raw.chars().count(), "input loaded");
                self.ingest_text(&raw).await
            }
            Err(e) => Err(e),
        };
        let closed = self.store.close().await;
        if let Err(e) = &closed {
            warn!(error = %e, "failed to close store");
        }

        let outcome = result?;
        closed?;
        Ok(outcome)
    }

    /// 处理已读入内存的文档，不关闭存储
    pub async fn ingest_text(&self, raw: &str) -> Result<IngestOutcome> {
        let text = match self.preprocessor.prepare(raw) {
            PreparedText::Accepted(text) => text,
            PreparedText::Rejected(verdict) => return Ok(IngestOutcome::Rejected(verdict)),
        };

        let stats = RunStats::default();
        let oracle = OracleAdapter::new(self.backend.clone(), self.retry.clone(), stats.clone());
        let resolver = create_entity_resolver(self.store.clone(), stats.clone());
        let chunks = self.chunker.chunk(text);

        let controller = PipelineController::new(self.store.clone(), resolver, oracle, stats, chunks);
        controller.run().await.map(IngestOutcome::Completed)
    }
}

async fn read_input(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AppError::Input(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(AppError::Input(format!("{}: not a regular file", path.display())));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Input(format!("{}: {}", path.display(), e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Input(format!("{}: not UTF-8: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SimpleOracleBackend;
    use crate::storage::MemoryProfileStore;
    use std::io::Write;

    fn ingestor(store: Arc<dyn ProfileStore>) -> DocumentIngestor {
        DocumentIngestor::new(
            store,
            Arc::new(SimpleOracleBackend::new()),
            Preprocessor::passthrough(),
            Chunker::new(200, 20).unwrap(),
            RetryPolicy::none(),
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_input_error_and_closes_store() {
        let store = Arc::new(MemoryProfileStore::new());
        let err = ingestor(store.clone())
            .ingest_file("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        // the input error still releases the store
        assert!(matches!(store.count().await, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_directory_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingestor(Arc::new(MemoryProfileStore::new()))
            .ingest_file(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_input_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();
        let err = ingestor(Arc::new(MemoryProfileStore::new()))
            .ingest_file(file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
    }

    #[tokio::test]
    async fn test_completed_run_closes_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Samir, the old neighbor, knocked on the door. Layla opened it.").unwrap();

        let store = Arc::new(MemoryProfileStore::new());
        let outcome = ingestor(store.clone()).ingest_file(file.path()).await.unwrap();
        let IngestOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.stats.chunks_pulled, 1);
        assert_eq!(report.profiles.len(), 2);

        assert!(matches!(store.count().await, Err(AppError::Database(_))));
    }
}
