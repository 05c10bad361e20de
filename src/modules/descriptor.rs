//! 命令描述符与可加载单元接口
//!
//! 可加载单元通过 `describe()` 显式声明其命令组/命令/参数元数据，
//! 模块注册表据此构建命令规范。处理函数随描述符携带，不参与序列化。

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::spec::{
    CommandHandler, CommandSpecification, ParamValue, ParameterSpecification, ValueType,
};
use crate::modules::error::ModuleError;

/// 参数形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// 布尔标志选项
    Flag,
    /// 携带值的选项
    Option,
    /// 位置参数
    Positional,
}

/// 参数声明
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub kind: ParameterKind,

    /// 选项短代码；缺省时用参数名
    #[serde(default)]
    pub short_code: Option<String>,

    /// 声明值类型；缺省 string（标志恒为 bool）
    #[serde(default)]
    pub value_type: Option<ValueType>,

    /// 位置参数是否可省略（选项天然可省略，除非 required）
    #[serde(default)]
    pub optional: bool,

    /// 选项是否必须出现
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default_value: Option<serde_json::Value>,

    #[serde(default)]
    pub position: Option<usize>,

    #[serde(default)]
    pub requires: Vec<String>,
}

impl ParameterDescriptor {
    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            short_code: None,
            value_type: None,
            optional: false,
            required: false,
            default_value: None,
            position: None,
            requires: Vec::new(),
        }
    }

    /// 布尔标志选项
    pub fn flag(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut descriptor = Self::new(name, ParameterKind::Flag);
        descriptor.description = description.into();
        descriptor
    }

    /// 携带值的选项
    pub fn option(
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let mut descriptor = Self::new(name, ParameterKind::Option);
        descriptor.description = description.into();
        descriptor.value_type = Some(value_type);
        descriptor
    }

    /// 位置参数
    pub fn positional(
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let mut descriptor = Self::new(name, ParameterKind::Positional);
        descriptor.description = description.into();
        descriptor.value_type = Some(value_type);
        descriptor
    }

    pub fn with_short_code(mut self, code: impl Into<String>) -> Self {
        self.short_code = Some(code.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// 转换为参数规范
    pub fn to_spec(
        &self,
        command: &str,
        fallback_position: usize,
    ) -> Result<ParameterSpecification, ModuleError> {
        let value_type = self.value_type.unwrap_or(ValueType::Str);
        let mut spec = match self.kind {
            ParameterKind::Flag => ParameterSpecification::flag(
                self.short_code.clone().unwrap_or_else(|| self.name.clone()),
                self.description.clone(),
            )
            .with_name(&self.name),
            ParameterKind::Option => ParameterSpecification::option(
                self.short_code.clone().unwrap_or_else(|| self.name.clone()),
                self.description.clone(),
                value_type,
            )
            .with_name(&self.name),
            ParameterKind::Positional => ParameterSpecification::positional(
                self.position.unwrap_or(fallback_position),
                self.name.clone(),
                self.description.clone(),
                value_type,
            ),
        };

        if self.optional {
            spec = spec.optional();
        }
        if self.required {
            spec = spec.required();
        }
        for requirement in &self.requires {
            spec = spec.requires_parameter(requirement);
        }
        if let Some(raw) = &self.default_value {
            let value = json_to_param_value(raw, spec.value_type).ok_or_else(|| {
                ModuleError::InvalidDefault {
                    command: command.to_string(),
                    parameter: self.name.clone(),
                }
            })?;
            spec = spec.with_default(value);
        }
        Ok(spec)
    }
}

fn json_to_param_value(raw: &serde_json::Value, value_type: ValueType) -> Option<ParamValue> {
    match (value_type, raw) {
        (ValueType::Str, serde_json::Value::String(s)) => Some(ParamValue::Str(s.clone())),
        (ValueType::Path, serde_json::Value::String(s)) => Some(ParamValue::Path(s.into())),
        (ValueType::Int, serde_json::Value::Number(n)) => n.as_i64().map(ParamValue::Int),
        (ValueType::Float, serde_json::Value::Number(n)) => n.as_f64().map(ParamValue::Float),
        (ValueType::Bool, serde_json::Value::Bool(b)) => Some(ParamValue::Bool(*b)),
        _ => None,
    }
}

/// 命令声明
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDescriptor {
    pub name: String,

    /// 显式别名，覆盖命令名（如 `!!`）
    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub long_description: Option<String>,

    #[serde(default)]
    pub documentation: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,

    /// 清单命令的输出模板（`{param}` 占位符）
    #[serde(default)]
    pub output: Option<String>,

    /// 命令体；内置模块直接携带闭包，清单模块在加载时补上
    #[serde(skip)]
    pub handler: Option<CommandHandler>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            description: description.into(),
            long_description: None,
            documentation: None,
            parameters: Vec::new(),
            output: None,
            handler: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = Some(text.into());
        self
    }

    pub fn with_documentation(mut self, text: impl Into<String>) -> Self {
        self.documentation = Some(text.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_handler(mut self, handler: CommandHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// 生效的命令名（别名优先）
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// 构建命令规范
    pub fn to_spec(
        &self,
        group_name: &str,
        module_name: &str,
    ) -> Result<CommandSpecification, ModuleError> {
        let mut spec =
            CommandSpecification::new(self.effective_name(), self.description.clone())
                .with_group(group_name)
                .with_module(module_name);
        if let Some(text) = &self.long_description {
            spec = spec.with_long_description(text.clone());
        }
        if let Some(text) = &self.documentation {
            spec = spec.with_documentation(text.clone());
        }
        let mut positional_index = 0usize;
        for parameter in &self.parameters {
            let parameter_spec = parameter.to_spec(self.effective_name(), positional_index)?;
            if !parameter_spec.is_option {
                positional_index += 1;
            }
            spec = spec.with_parameter(parameter_spec);
        }
        if let Some(handler) = &self.handler {
            spec = spec.with_handler(handler.clone());
        }
        spec.validate()?;
        Ok(spec)
    }
}

/// 命令组声明：一组相关命令与其展示信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub commands: Vec<CommandDescriptor>,
}

impl GroupDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: CommandDescriptor) -> Self {
        self.commands.push(command);
        self
    }
}

/// 可加载的命令单元
///
/// 模块注册表对单元的全部认知来自这个接口。
pub trait LoadableUnit {
    /// 模块名（唯一键；文件后端的单元用文件名主干派生）
    fn unit_name(&self) -> &str;

    fn description(&self) -> &str;

    /// 后端二进制/清单的位置（内存单元为 None）
    fn location(&self) -> Option<&Path>;

    /// 声明的命令组集合
    fn describe(&self) -> Vec<GroupDescriptor>;
}

/// 内存中的可加载单元（内置命令与测试使用）
pub struct DescriptorUnit {
    name: String,
    description: String,
    groups: Vec<GroupDescriptor>,
}

impl DescriptorUnit {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: GroupDescriptor) -> Self {
        self.groups.push(group);
        self
    }
}

impl LoadableUnit for DescriptorUnit {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn location(&self) -> Option<&Path> {
        None
    }

    fn describe(&self) -> Vec<GroupDescriptor> {
        self.groups.clone()
    }
}
