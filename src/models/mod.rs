//! 核心数据模型模块
//!
//! 定义人物画像、存储记录与人物提及。

pub mod mention;
pub mod profile;

pub use mention::*;
pub use profile::*;
