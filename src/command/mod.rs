//! 命令模型模块
//!
//! 定义命令的元数据（命令规范、参数规范）、可匹配的语法包装以及
//! 以竞技场（arena）方式组织的语法注册表：
//! - 扁平的 id → 规范表
//! - 名称 → id 列表的二级索引（重载共享同一名称）
//! - 模块 → id 列表的二级索引（用于按来源精确卸载）

pub mod spec;
pub mod store;
pub mod syntax;

pub use spec::*;
pub use store::*;
pub use syntax::*;
