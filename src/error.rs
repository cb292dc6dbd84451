//! 错误处理模块
//!
//! 定义应用程序的错误类型，并区分可重试（瞬时）错误与致命错误。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 输入文件缺失或不可读
    #[error("输入错误: {0}")]
    Input(String),

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 连接错误（可重试）
    #[error("连接错误: {0}")]
    Connection(String),

    /// Oracle 调用失败（不可重试）
    #[error("Oracle 调用失败: {0}")]
    Oracle(String),

    /// Oracle 返回的内容无法解析（可重试）
    #[error("Oracle 响应格式错误: {0}")]
    MalformedResponse(String),

    /// 校验错误
    #[error("校验失败: {0}")]
    Validation(String),

    /// 速率限制（可重试）
    #[error("请求过于频繁，请稍后再试")]
    RateLimited,

    /// 超时错误（可重试）
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl AppError {
    /// 是否属于可重试的瞬时错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Connection(_)
                | AppError::Timeout(_)
                | AppError::RateLimited
                | AppError::MalformedResponse(_)
        )
    }

    /// 错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Input(_) => "INPUT_ERROR",
            AppError::Database(_) => "STORE_ERROR",
            AppError::Connection(_) => "SERVICE_UNAVAILABLE",
            AppError::Oracle(_) => "ORACLE_ERROR",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) | AppError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                AppError::Connection(e.to_string())
            }
            _ => AppError::Database(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_connect() {
            AppError::Connection(e.to_string())
        } else if e.is_decode() {
            AppError::MalformedResponse(e.to_string())
        } else {
            AppError::Oracle(e.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
