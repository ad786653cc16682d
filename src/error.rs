//! 错误类型定义

use thiserror::Error;

/// 记录存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 告警发送错误
#[derive(Error, Debug)]
pub enum SendError {
    #[error("alert transport failed: {0}")]
    Transport(String),

    #[error("alert rejected with status {status}")]
    Rejected { status: u16 },

    #[error("alert sender not configured: {0}")]
    NotConfigured(String),
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 帧输入错误
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame source io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
