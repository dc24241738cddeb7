//! 错误定义模块

use thiserror::Error;

/// 叫号系统统一错误类型
#[derive(Error, Debug)]
pub enum CallError {
    #[error("无效的受理号码: {0}")]
    InvalidNumber(String),

    #[error("无效的患者ID: {0}")]
    InvalidPatientId(String),

    #[error("受理号码已被使用: {0}")]
    DuplicateNumber(u32),

    #[error("未找到受理号码: {0}")]
    NotFound(u32),

    #[error("状态存储读写失败: {0}")]
    TransientStore(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 叫号系统统一结果类型
pub type Result<T> = std::result::Result<T, CallError>;
