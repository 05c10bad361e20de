//! 历史模块错误类型

use std::path::Path;

use thiserror::Error;

/// 历史存取错误
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("历史文件 I/O 错误: {operation} ({path}) - {source}")]
    Io {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    pub fn io(operation: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }
}
