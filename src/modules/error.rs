//! 模块管理错误类型

use thiserror::Error;

use crate::command::spec::SpecError;

/// 模块注册/卸载及清单加载错误
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("模块 '{name}' 已注册")]
    AlreadyRegistered { name: String },

    #[error("命令规范无效: {0}")]
    Spec(#[from] SpecError),

    #[error("命令 '{command}' 参数 '{parameter}' 的缺省值与声明类型不符")]
    InvalidDefault { command: String, parameter: String },

    #[error("读取模块清单失败 ({path}): {source}")]
    ManifestIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("模块清单格式错误 ({path}): {source}")]
    ManifestFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
