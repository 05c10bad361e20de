//! 工具模块
//!
//! 提供错误处理和日志系统等基础设施

pub mod error;
pub mod logging;

pub use error::*;
pub use logging::*;
