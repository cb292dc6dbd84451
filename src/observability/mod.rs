//! 可观测性模块
//!
//! 提供结构化日志初始化和运行统计计数器。

use crate::config::LoggingConfig;
use crate::error::{AppError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// ===== Run Statistics =====

/// 单次运行的统计计数器
#[derive(Clone, Default, Debug)]
pub struct RunStats {
    pub chunks_pulled: Arc<AtomicU64>,
    pub chunks_skipped: Arc<AtomicU64>,
    pub cycles_merged: Arc<AtomicU64>,
    pub profiles_created: Arc<AtomicU64>,
    pub profiles_committed: Arc<AtomicU64>,
    pub oracle_calls: Arc<AtomicU64>,
    pub retries: Arc<AtomicU64>,
}

/// 统计快照（可序列化）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatsSnapshot {
    pub chunks_pulled: u64,
    pub chunks_skipped: u64,
    pub cycles_merged: u64,
    pub profiles_created: u64,
    pub profiles_committed: u64,
    pub oracle_calls: u64,
    pub retries: u64,
}

impl RunStats {
    pub fn record_chunk(&self) {
        self.chunks_pulled.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skip(&self) {
        self.chunks_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_merge(&self) {
        self.cycles_merged.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_created(&self) {
        self.profiles_created.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_committed(&self, count: u64) {
        self.profiles_committed.fetch_add(count, Ordering::SeqCst);
    }

    pub fn record_oracle_call(&self) {
        self.oracle_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            chunks_pulled: self.chunks_pulled.load(Ordering::SeqCst),
            chunks_skipped: self.chunks_skipped.load(Ordering::SeqCst),
            cycles_merged: self.cycles_merged.load(Ordering::SeqCst),
            profiles_created: self.profiles_created.load(Ordering::SeqCst),
            profiles_committed: self.profiles_committed.load(Ordering::SeqCst),
            oracle_calls: self.oracle_calls.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
        }
    }
}

// ===== Structured Logging =====

/// 初始化结构化日志
///
/// `RUST_LOG` 优先于配置中的级别。配置了 `log_dir` 时额外写入按天滚动的日志文件，
/// 返回的 guard 必须在进程退出前保持存活。
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::Config(format!("日志级别无效: {}", e)))?;

    let (file_writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.structured {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()
    };

    result.map_err(|e| AppError::Internal(format!("日志初始化失败: {}", e)))?;
    Ok(guard)
}
