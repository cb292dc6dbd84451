use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 存储后端: "sqlite" 或 "memory"
    pub backend: String,
    /// SQLite 数据库文件路径（":memory:" 表示内存库）
    pub path: PathBuf,
    /// 运行开始前清空存储
    pub reset_on_start: bool,
    /// SQLite 忙等待超时（毫秒）
    pub busy_timeout_ms: u64,
    /// 瞬时错误最大重试次数
    pub max_retries: u32,
    /// 重试基础间隔（毫秒）
    pub retry_base_delay_ms: u64,
    /// 重试最大间隔（毫秒）
    pub retry_max_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            path: PathBuf::from("characters.db"),
            reset_on_start: false,
            busy_timeout_ms: 5_000,
            max_retries: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 800,
        }
    }
}

/// 分块配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// 单个分块的最大字符数
    pub chunk_size: usize,
    /// 相邻分块的重叠字符数
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5_000,
            chunk_overlap: 200,
        }
    }
}

/// Oracle（语义推理服务）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// 后端类型: "http" 或 "simple"
    pub backend: String,
    /// HTTP 服务地址
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 访问令牌
    pub api_key: Option<String>,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 瞬时错误最大重试次数
    pub max_retries: u32,
    /// 重试基础间隔（毫秒）
    pub retry_base_delay_ms: u64,
    /// 重试最大间隔（毫秒）
    pub retry_max_delay_ms: u64,
    /// 人物识别温度
    pub detect_temperature: f32,
    /// 摘要温度
    pub summary_temperature: f32,
    /// 画像合并温度
    pub merge_temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: "simple".into(),
            base_url: "http://localhost:8090".into(),
            model: "gemini-2.5-flash".into(),
            api_key: None,
            request_timeout: 120,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
            detect_temperature: 0.0,
            summary_temperature: 1.0,
            merge_temperature: 0.0,
        }
    }
}

/// 预处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// 启用语言门控（只接受阿拉伯语文档，需配合 http 后端）
    pub language_gate: bool,
    /// 门控阈值 (0.0-1.0]
    pub gate_threshold: f64,
    /// 去除书籍前置信息
    pub strip_front_matter: bool,
    /// 启用文本规范化
    pub normalize: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            language_gate: false,
            gate_threshold: 0.95,
            strip_front_matter: true,
            normalize: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".into(),
            structured: false,
            log_dir: None,
            file_prefix: "dramatis.log".into(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 存储配置
    pub store: StoreConfig,
    /// 分块配置
    pub chunking: ChunkingConfig,
    /// Oracle 配置
    pub oracle: OracleConfig,
    /// 预处理配置
    pub preprocess: PreprocessConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            store: StoreConfig::default(),
            chunking: ChunkingConfig::default(),
            oracle: OracleConfig::default(),
            preprocess: PreprocessConfig::default(),
            logging: LoggingConfig::default(),
            app_name: "dramatis".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config.oracle.backend = "http".into();
        config.preprocess.language_gate = true;
        config
    }

    /// 测试用配置：内存存储、离线 Oracle、关闭语言门控
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.environment = "test".into();
        config.store.backend = "memory".into();
        config.store.path = PathBuf::from(":memory:");
        config.store.retry_base_delay_ms = 1;
        config.store.retry_max_delay_ms = 5;
        config.oracle.backend = "simple".into();
        config.oracle.retry_base_delay_ms = 1;
        config.oracle.retry_max_delay_ms = 5;
        config.preprocess.language_gate = false;
        config
    }
}
