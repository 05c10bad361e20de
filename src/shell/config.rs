//! Shell 配置
//!
//! 提示符、名称比较规则、消歧策略与历史文件位置。
//! 配置文件是 JSON，缺省值覆盖全部字段。

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::command::store::NameComparison;
use crate::history::CommandHistory;
use crate::parser::resolver::DisambiguationPolicy;
use crate::utils::AppResult;

/// Shell 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellConfig {
    /// 交互提示符文本
    pub prompt: String,

    /// 命令名比较规则
    pub comparison: NameComparison,

    /// 消歧策略
    pub policy: DisambiguationPolicy,

    /// 历史文件路径；None 时使用用户主目录下的默认文件
    pub history_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            comparison: NameComparison::CaseInsensitive,
            policy: DisambiguationPolicy::OptionCountTieBreak,
            history_file: None,
        }
    }
}

impl ShellConfig {
    /// 从 JSON 配置文件加载
    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))
    }

    /// 生效的历史文件路径
    pub fn history_file_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(CommandHistory::default_file_path)
    }
}
