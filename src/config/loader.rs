use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "dramatis.toml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "DRAMATIS_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（低 → 高）：
    /// 1. 内置默认值
    /// 2. ./dramatis.toml
    /// 3. 环境变量（DRAMATIS_SECTION__KEY）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::figment(Path::new(DEFAULT_CONFIG_FILE)).extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(&path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.chunking.chunk_size == 0 {
            return Err(ConfigValidationError::InvalidChunkSize);
        }

        if config.chunking.chunk_overlap >= config.chunking.chunk_size {
            return Err(ConfigValidationError::OverlapTooLarge {
                overlap: config.chunking.chunk_overlap,
                size: config.chunking.chunk_size,
            });
        }

        match config.store.backend.as_str() {
            "memory" => {}
            "sqlite" => {
                if config.store.path.as_os_str().is_empty() {
                    return Err(ConfigValidationError::InvalidPath(
                        "store.path 不能为空".into(),
                    ));
                }
            }
            other => return Err(ConfigValidationError::UnknownStoreBackend(other.to_string())),
        }

        match config.oracle.backend.as_str() {
            "simple" => {}
            "http" => {
                if config.oracle.base_url.is_empty() {
                    return Err(ConfigValidationError::MissingOracleUrl);
                }
            }
            other => return Err(ConfigValidationError::UnknownOracleBackend(other.to_string())),
        }

        let threshold = config.preprocess.gate_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidGateThreshold(threshold));
        }

        // simple 后端只识别拉丁字母人名，门控只放行阿拉伯语文档
        if config.preprocess.language_gate && config.oracle.backend == "simple" {
            return Err(ConfigValidationError::GateWithSimpleOracle);
        }

        if config.store.retry_max_delay_ms < config.store.retry_base_delay_ms {
            return Err(ConfigValidationError::InvalidRetryDelay {
                base: config.store.retry_base_delay_ms,
                max: config.store.retry_max_delay_ms,
            });
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("分块大小无效，必须大于 0")]
    InvalidChunkSize,

    #[error("分块重叠 ({overlap}) 必须小于分块大小 ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("未知的存储后端: {0}")]
    UnknownStoreBackend(String),

    #[error("未知的 Oracle 后端: {0}")]
    UnknownOracleBackend(String),

    #[error("HTTP Oracle 地址未配置")]
    MissingOracleUrl,

    #[error("语言门控阈值无效: {0}")]
    InvalidGateThreshold(f64),

    #[error("语言门控不能与 simple Oracle 后端同时启用")]
    GateWithSimpleOracle,

    #[error("存储重试最大间隔 ({max}ms) 小于基础间隔 ({base}ms)")]
    InvalidRetryDelay { base: u64, max: u64 },

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

impl From<ConfigValidationError> for crate::error::AppError {
    fn from(e: ConfigValidationError) -> Self {
        crate::error::AppError::Config(e.to_string())
    }
}
