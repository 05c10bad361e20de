//! OrbitSh - 可扩展的交互式命令 shell
//!
//! 核心能力：
//! - 引号感知的分词与 `$NAME` 变量替换
//! - 命令语法注册表（同名重载 + 按模块溯源）
//! - 参数/选项匹配与可配置的消歧策略
//! - 可加载命令模块（内存单元与 JSON 清单）
//! - 命令历史与召回（`history`、`!!`、`! n`）

pub mod command;
pub mod history;
pub mod modules;
pub mod parser;
pub mod shell;
pub mod utils;

pub use command::{
    CommandHandler, CommandSpecification, NameComparison, ParamValue, ParameterSpecification,
    SpecId, SyntaxRegistry, ValueType,
};
pub use history::CommandHistory;
pub use modules::{
    CommandDescriptor, DescriptorUnit, GroupDescriptor, JsonManifestUnit, LoadableUnit,
    ModuleRegistry, ParameterDescriptor,
};
pub use parser::{BoundCommand, DisambiguationPolicy, ParseResult, Resolver};
pub use shell::{CommandOutcome, Output, Shell, ShellConfig, ShellContext};
pub use utils::{AppError, AppResult};
