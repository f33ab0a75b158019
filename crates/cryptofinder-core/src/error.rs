//! 错误类型（thiserror）
use std::path::PathBuf;
use thiserror::Error;

/// 签名目录构建错误：只在启动期出现，出现即终止初始化
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("signature `{name}` has neither tokens nor a regex")]
    MissingPattern { name: String },

    #[error("signature `{name}` has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("signature name must not be empty")]
    EmptyName,

    #[error("signature `{name}` contains an empty token or anchor")]
    EmptyToken { name: String },

    #[error("signature `{name}` has score {score}, expected 0..=100")]
    ScoreOutOfRange { name: String, score: i64 },

    #[error("signature `{name}` is declared twice with different verdicts")]
    ConflictingVerdict { name: String },

    #[error("signature catalog is empty")]
    Empty,
}

/// 持久化协作方错误（可恢复，调用方决定如何提示）
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
