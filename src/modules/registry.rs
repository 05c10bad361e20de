//! 模块注册表
//!
//! 管理可插拔命令来源的生命周期。注册/卸载对语法注册表的修改
//! 以单次调用为单位全有或全无：先校验全部声明，再落库；
//! 卸载精确移除该模块贡献的规范集合，结果与从未注册过不可区分。

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::command::store::{SpecId, SyntaxRegistry};
use crate::modules::descriptor::LoadableUnit;
use crate::modules::error::ModuleError;

/// 命令组的展示信息（help 按声明类型列表用）
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub name: String,
    pub description: String,
}

/// 已注册的模块条目
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub description: String,
    /// 后端单元位置（内存单元为 None）
    pub location: Option<PathBuf>,
    /// 声明命令的命令组数量
    pub types_count: usize,
    pub commands_count: usize,
    /// 该模块声明的命令组
    groups: Vec<GroupInfo>,
    /// 来源集合：该模块贡献的全部规范 id
    spec_ids: Vec<SpecId>,
}

impl Module {
    pub fn spec_ids(&self) -> &[SpecId] {
        &self.spec_ids
    }

    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }
}

/// 模块注册表
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// 按名称排序，便于列表输出
    modules: BTreeMap<String, Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn count(&self) -> usize {
        self.modules.len()
    }

    /// 注册一个可加载单元贡献的全部命令
    ///
    /// 返回 (命令组数, 命令数)。单元未声明任何命令时返回 (0,0)，
    /// 不创建模块条目，也不是错误。
    pub fn register_unit(
        &mut self,
        registry: &mut SyntaxRegistry,
        unit: &dyn LoadableUnit,
    ) -> Result<(usize, usize), ModuleError> {
        let name = unit.unit_name().to_string();
        if self.modules.contains_key(&name) {
            return Err(ModuleError::AlreadyRegistered { name });
        }

        let groups = unit.describe();
        // 先构建并校验全部规范，保证全有或全无
        let mut specs = Vec::new();
        for group in &groups {
            for command in &group.commands {
                specs.push(command.to_spec(&group.name, &name)?);
            }
        }
        if specs.is_empty() {
            return Ok((0, 0));
        }

        let mut spec_ids = Vec::with_capacity(specs.len());
        for spec in specs {
            // 规范已通过校验，这里不会失败；若失败则回滚已插入的部分
            match registry.add(spec) {
                Ok(id) => spec_ids.push(id),
                Err(e) => {
                    registry.remove_ids(&spec_ids);
                    return Err(e.into());
                }
            }
        }

        let types_count = groups.len();
        let commands_count = spec_ids.len();
        let group_infos = groups
            .iter()
            .map(|group| GroupInfo {
                name: group.name.clone(),
                description: group.description.clone(),
            })
            .collect();
        info!(module = %name, types = types_count, commands = commands_count, "模块已注册");
        self.modules.insert(
            name.clone(),
            Module {
                name,
                description: unit.description().to_string(),
                location: unit.location().map(|p| p.to_path_buf()),
                types_count,
                commands_count,
                groups: group_infos,
                spec_ids,
            },
        );
        Ok((types_count, commands_count))
    }

    /// 卸载模块
    ///
    /// 未注册的名称是 (0,0) 无操作并记录诊断；否则精确移除该模块的
    /// 来源集合与模块条目。
    pub fn unregister_module(
        &mut self,
        registry: &mut SyntaxRegistry,
        name: &str,
    ) -> (usize, usize) {
        let Some(module) = self.modules.remove(name) else {
            warn!(module = %name, "卸载未注册的模块");
            return (0, 0);
        };
        let removed = registry.remove_ids(&module.spec_ids);
        info!(module = %name, types = module.types_count, commands = removed, "模块已卸载");
        (module.types_count, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::descriptor::{CommandDescriptor, DescriptorUnit, GroupDescriptor};

    fn unit(name: &str, commands: &[&str]) -> DescriptorUnit {
        let mut group = GroupDescriptor::new("test-group", "test commands");
        for command in commands {
            group = group.with_command(CommandDescriptor::new(*command, "a test command"));
        }
        DescriptorUnit::new(name, "test unit").with_group(group)
    }

    #[test]
    fn test_register_counts() {
        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        let (types, commands) = modules
            .register_unit(&mut store, &unit("m1", &["a", "b"]))
            .unwrap();
        assert_eq!((types, commands), (1, 2));
        assert_eq!(store.syntaxes_count(), 2);
        assert!(modules.contains("m1"));
    }

    #[test]
    fn test_register_empty_unit_is_noop() {
        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        let empty = DescriptorUnit::new("empty", "no commands");
        assert_eq!(modules.register_unit(&mut store, &empty).unwrap(), (0, 0));
        assert!(!modules.contains("empty"));
    }

    #[test]
    fn test_duplicate_module_name_rejected() {
        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        modules
            .register_unit(&mut store, &unit("m1", &["a"]))
            .unwrap();
        assert!(matches!(
            modules.register_unit(&mut store, &unit("m1", &["b"])),
            Err(ModuleError::AlreadyRegistered { .. })
        ));
        // 失败的注册不得留下任何痕迹
        assert_eq!(store.syntaxes_count(), 1);
    }

    #[test]
    fn test_register_unregister_round_trip() {
        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        modules
            .register_unit(&mut store, &unit("base", &["keep"]))
            .unwrap();

        let names_before = store.command_names();
        let modules_before: Vec<String> =
            modules.modules().map(|m| m.name.clone()).collect();

        modules
            .register_unit(&mut store, &unit("extra", &["x", "y", "keep"]))
            .unwrap();
        assert_eq!(store.syntaxes_count(), 4);
        // "keep" 名下出现了来自两个模块的重载
        assert_eq!(
            store
                .find_by_token("keep", true, Default::default())
                .len(),
            2
        );

        let (types, commands) = modules.unregister_module(&mut store, "extra");
        assert_eq!((types, commands), (1, 3));
        assert_eq!(store.command_names(), names_before);
        let modules_after: Vec<String> = modules.modules().map(|m| m.name.clone()).collect();
        assert_eq!(modules_after, modules_before);
        // base 模块的 "keep" 仍可解析
        assert_eq!(
            store
                .find_by_token("keep", true, Default::default())
                .len(),
            1
        );
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        modules
            .register_unit(&mut store, &unit("m1", &["a"]))
            .unwrap();

        assert_eq!(
            modules.unregister_module(&mut store, "never-registered"),
            (0, 0)
        );
        assert_eq!(store.syntaxes_count(), 1);
        assert_eq!(modules.count(), 1);
    }
}
