//! JSON 清单模块
//!
//! 文件后端的可加载单元：一个 JSON 清单声明命令组与命令，
//! 命令体是带 `{param}` 占位符的输出模板。模块名缺省取清单
//! 文件名的主干。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::modules::descriptor::{GroupDescriptor, LoadableUnit};
use crate::modules::error::ModuleError;
use crate::parser::BoundCommand;
use crate::shell::CommandOutcome;

/// 清单文件结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFile {
    /// 模块名；缺省由文件名派生
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    description: String,

    #[serde(default)]
    groups: Vec<GroupDescriptor>,
}

/// 渲染输出模板：`{param}` 替换为绑定值的文本
pub fn render_template(template: &str, command: &BoundCommand) -> String {
    let mut output = template.to_string();
    for parameter in &command.parameters {
        if let Some(value) = &parameter.value {
            output = output.replace(&format!("{{{}}}", parameter.name), &value.to_text());
        }
    }
    output
}

/// JSON 清单单元
pub struct JsonManifestUnit {
    name: String,
    description: String,
    path: PathBuf,
    groups: Vec<GroupDescriptor>,
}

impl JsonManifestUnit {
    /// 从清单文件加载
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModuleError::ManifestIo {
            path: path.display().to_string(),
            source: e,
        })?;
        let manifest: ManifestFile =
            serde_json::from_str(&content).map_err(|e| ModuleError::ManifestFormat {
                path: path.display().to_string(),
                source: e,
            })?;

        let name = manifest.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });

        // 为每条清单命令补上模板处理函数
        let mut groups = manifest.groups;
        for group in &mut groups {
            for command in &mut group.commands {
                let template = command
                    .output
                    .clone()
                    .unwrap_or_else(|| command.description.clone());
                command.handler = Some(Arc::new(move |ctx, bound| {
                    ctx.out.writeln(&render_template(&template, bound));
                    Ok(CommandOutcome::Continue)
                }));
            }
        }

        debug!(module = %name, path = %path.display(), groups = groups.len(), "清单模块已加载");
        Ok(Self {
            name,
            description: manifest.description,
            path: path.to_path_buf(),
            groups,
        })
    }
}

impl LoadableUnit for JsonManifestUnit {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn describe(&self) -> Vec<GroupDescriptor> {
        self.groups.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::store::SyntaxRegistry;
    use crate::modules::registry::ModuleRegistry;

    const MANIFEST: &str = r#"{
        "description": "greeting commands",
        "groups": [
            {
                "name": "greetings",
                "description": "greeting commands",
                "commands": [
                    {
                        "name": "hello",
                        "description": "say hello",
                        "output": "hello {who}",
                        "parameters": [
                            { "name": "who", "kind": "positional", "defaultValue": "world" }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_manifest_and_register() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greetings.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let unit = JsonManifestUnit::load(&path).unwrap();
        // 模块名派生自文件名主干
        assert_eq!(unit.unit_name(), "greetings");

        let mut store = SyntaxRegistry::new();
        let mut modules = ModuleRegistry::new();
        let (types, commands) = modules.register_unit(&mut store, &unit).unwrap();
        assert_eq!((types, commands), (1, 1));

        let found = store.find_by_token("hello", true, Default::default());
        assert_eq!(found.len(), 1);
        assert!(found[0].spec().handler().is_some());
    }

    #[test]
    fn test_bad_manifest_reports_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonManifestUnit::load(&path),
            Err(ModuleError::ManifestFormat { .. })
        ));
    }

    #[test]
    fn test_missing_manifest_reports_io_error() {
        assert!(matches!(
            JsonManifestUnit::load(Path::new("/nonexistent/x.json")),
            Err(ModuleError::ManifestIo { .. })
        ));
    }
}
