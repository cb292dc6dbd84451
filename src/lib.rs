//! Dramatis - 长篇叙事文本的增量人物画像构建器
//!
//! 按块读取长文档，维护滚动摘要，检测人物提及，解析到已存储的画像，
//! 并借助外部推理服务合并出新的画像版本。

pub mod chunking;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod oracle;
pub mod retry;
pub mod services;
pub mod storage;
pub mod text;
