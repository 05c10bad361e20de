/*!
 * 错误处理模块
 *
 * 基于 anyhow 的统一错误处理系统。命令体和 shell 循环使用 AppResult，
 * 领域错误（解析、模块、历史）各自用 thiserror 枚举定义，
 * 通过 context 转换为带上下文的 AppError。
 */

use anyhow::{anyhow, Result as AnyhowResult};

/// 统一的应用程序结果类型
pub type AppResult<T> = AnyhowResult<T>;

/// 统一的应用程序错误类型
pub type AppError = anyhow::Error;

/// 创建简单的应用程序错误
pub fn app_error(msg: impl Into<String>) -> AppError {
    anyhow!(msg.into())
}
