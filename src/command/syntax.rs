//! 命令语法
//!
//! 匹配器操作的单元：对单个命令规范的可匹配包装。
//! 同一名称下可注册多个语法（重载）。

use std::sync::Arc;

use crate::command::spec::CommandSpecification;
use crate::command::store::SpecId;

/// 命令语法（重载单元）
#[derive(Debug, Clone)]
pub struct CommandSyntax {
    id: SpecId,
    spec: Arc<CommandSpecification>,
}

impl CommandSyntax {
    pub fn new(id: SpecId, spec: Arc<CommandSpecification>) -> Self {
        Self { id, spec }
    }

    pub fn id(&self) -> SpecId {
        self.id
    }

    pub fn spec(&self) -> &CommandSpecification {
        &self.spec
    }

    /// 消歧用的特异度指标
    pub fn options_count(&self) -> usize {
        self.spec.options_count()
    }
}
