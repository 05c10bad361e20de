//! 语法注册表
//!
//! 以竞技场方式管理所有已注册命令规范：
//! 扁平的 id → 规范表，加上名称与模块两个二级索引。
//! 按名称的精确查找平均 O(1)，重载列表内的扫描 O(k)；
//! 删除只是索引维护，名称条目清空后整条移除（不留空列表）。

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::spec::{CommandSpecification, SpecError};
use crate::command::syntax::CommandSyntax;

/// 注册表内命令规范的稳定标识
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpecId(u64);

impl SpecId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// 名称比较规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameComparison {
    /// 不区分大小写（默认解析规则）
    #[default]
    CaseInsensitive,
    /// 区分大小写
    CaseSensitive,
}

impl NameComparison {
    pub fn eq(&self, a: &str, b: &str) -> bool {
        match self {
            NameComparison::CaseInsensitive => a.eq_ignore_ascii_case(b),
            NameComparison::CaseSensitive => a == b,
        }
    }
}

fn name_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// 语法注册表
#[derive(Default)]
pub struct SyntaxRegistry {
    next_id: u64,
    specs: HashMap<SpecId, Arc<CommandSpecification>>,
    /// 小写名称 → 该名称下的重载，按注册顺序
    by_name: HashMap<String, Vec<SpecId>>,
    /// 模块名 → 该模块贡献的规范
    by_module: HashMap<String, Vec<SpecId>>,
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条命令规范，返回其稳定 id
    pub fn add(&mut self, spec: CommandSpecification) -> Result<SpecId, SpecError> {
        spec.validate()?;
        let id = SpecId(self.next_id);
        self.next_id += 1;

        self.by_name
            .entry(name_key(&spec.name))
            .or_default()
            .push(id);
        if !spec.module_name.is_empty() {
            self.by_module
                .entry(spec.module_name.clone())
                .or_default()
                .push(id);
        }
        debug!(command = %spec.name, module = %spec.module_name, "注册命令语法");
        self.specs.insert(id, Arc::new(spec));
        Ok(id)
    }

    /// 按 token 查找候选语法
    ///
    /// `exact_only` 为 false 时启用前缀匹配（可选模式，默认解析不使用）。
    pub fn find_by_token(
        &self,
        token: &str,
        exact_only: bool,
        comparison: NameComparison,
    ) -> Vec<CommandSyntax> {
        let mut result = Vec::new();
        if exact_only {
            if let Some(ids) = self.by_name.get(&name_key(token)) {
                for id in ids {
                    if let Some(spec) = self.specs.get(id) {
                        if comparison.eq(&spec.name, token) {
                            result.push(CommandSyntax::new(*id, spec.clone()));
                        }
                    }
                }
            }
        } else {
            // 前缀模式需要遍历名称索引
            let mut names: Vec<&String> = self
                .by_name
                .keys()
                .filter(|key| key.starts_with(&name_key(token)))
                .collect();
            names.sort();
            for key in names {
                for id in &self.by_name[key] {
                    if let Some(spec) = self.specs.get(id) {
                        let matched = match comparison {
                            NameComparison::CaseInsensitive => true,
                            NameComparison::CaseSensitive => spec.name.starts_with(token),
                        };
                        if matched {
                            result.push(CommandSyntax::new(*id, spec.clone()));
                        }
                    }
                }
            }
        }
        result
    }

    pub fn get(&self, id: SpecId) -> Option<Arc<CommandSpecification>> {
        self.specs.get(&id).cloned()
    }

    /// 移除一组规范（模块卸载路径），返回实际移除的数量
    pub fn remove_ids(&mut self, ids: &[SpecId]) -> usize {
        let mut removed = 0;
        for id in ids {
            let Some(spec) = self.specs.remove(id) else {
                continue;
            };
            removed += 1;

            let key = name_key(&spec.name);
            if let Some(list) = self.by_name.get_mut(&key) {
                list.retain(|entry| entry != id);
                if list.is_empty() {
                    self.by_name.remove(&key);
                }
            }
            if let Some(list) = self.by_module.get_mut(&spec.module_name) {
                list.retain(|entry| entry != id);
                if list.is_empty() {
                    self.by_module.remove(&spec.module_name);
                }
            }
            debug!(command = %spec.name, module = %spec.module_name, "移除命令语法");
        }
        removed
    }

    /// 所有规范，按名称排序（help 列表用）
    pub fn all_specs(&self) -> Vec<Arc<CommandSpecification>> {
        let mut specs: Vec<Arc<CommandSpecification>> = self.specs.values().cloned().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.options_count().cmp(&b.options_count())));
        specs
    }

    /// 当前注册的命令名集合（小写键）
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// 不同命令名的数量
    pub fn names_count(&self) -> usize {
        self.by_name.len()
    }

    /// 语法总数（含重载）
    pub fn syntaxes_count(&self) -> usize {
        self.specs.len()
    }
}
