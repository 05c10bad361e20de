//! 模块（可加载命令单元）管理
//!
//! 一个模块是一组动态注册的命令的来源。模块通过显式的
//! `LoadableUnit::describe()` 插件接口声明命令组与命令元数据，
//! 注册表按来源记录每个模块贡献的规范集合，卸载时精确移除。

pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod registry;

pub use descriptor::*;
pub use error::*;
pub use manifest::*;
pub use registry::*;
