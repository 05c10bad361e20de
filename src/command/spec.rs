//! 命令规范定义
//!
//! 描述一个命令的元数据：名称、文档、参数/选项的有序声明，
//! 以及命令被成功解析后要调用的处理函数

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::BoundCommand;
use crate::shell::{CommandOutcome, ShellContext};
use crate::utils::AppResult;

/// 命令处理函数
///
/// 接收 shell 上下文与绑定好的参数集，返回命令结果。
pub type CommandHandler =
    Arc<dyn Fn(&mut ShellContext, &BoundCommand) -> AppResult<CommandOutcome> + Send + Sync>;

/// 参数声明的值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
    Path,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Str => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Path => "path",
        };
        write!(f, "{}", s)
    }
}

/// 解析/绑定后的参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(PathBuf),
}

impl ParamValue {
    /// 按声明类型对一段文本做类型转换
    pub fn coerce(text: &str, value_type: ValueType) -> Result<Self, String> {
        match value_type {
            ValueType::Str => Ok(ParamValue::Str(text.to_string())),
            ValueType::Int => text
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| format!("'{}' is not a valid integer", text)),
            ValueType::Float => text
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| format!("'{}' is not a valid number", text)),
            ValueType::Bool => match text {
                "true" | "on" | "yes" | "1" => Ok(ParamValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(ParamValue::Bool(false)),
                _ => Err(format!("'{}' is not a valid boolean", text)),
            },
            ValueType::Path => Ok(ParamValue::Path(PathBuf::from(text))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            ParamValue::Path(p) => Some(p),
            _ => None,
        }
    }

    /// 不带修饰的文本形式（Display 会给字符串加引号）
    pub fn to_text(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Path(p) => p.display().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "\"{}\"", s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// 参数规范
///
/// 两种形态：
/// - 选项（option）：由短代码引入（如 `-s`），顺序无关，可携带值
/// - 位置参数（positional）：按声明位置绑定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpecification {
    /// 参数名称（绑定结果中的查找键）
    pub name: String,

    /// 参数描述
    pub description: String,

    /// 是否为选项
    pub is_option: bool,

    /// 选项短代码（不含 `-` 前缀）
    pub short_code: Option<String>,

    /// 选项是否携带值；位置参数恒为 true
    pub has_value: bool,

    /// 是否可省略
    pub is_optional: bool,

    /// 缺省值（仅对可省略参数有意义）
    pub default_value: Option<ParamValue>,

    /// 位置参数的声明位置
    pub position: Option<usize>,

    /// 该选项出现时要求同时出现的其它参数名
    pub requires: Vec<String>,

    /// 声明的值类型
    pub value_type: ValueType,
}

impl ParameterSpecification {
    /// 创建布尔标志选项（出现/缺席，不携带值）
    pub fn flag(short_code: impl Into<String>, description: impl Into<String>) -> Self {
        let short_code = short_code.into();
        Self {
            name: short_code.clone(),
            description: description.into(),
            is_option: true,
            short_code: Some(short_code),
            has_value: false,
            is_optional: true,
            default_value: None,
            position: None,
            requires: Vec::new(),
            value_type: ValueType::Bool,
        }
    }

    /// 创建携带值的选项
    pub fn option(
        short_code: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let short_code = short_code.into();
        Self {
            name: short_code.clone(),
            description: description.into(),
            is_option: true,
            short_code: Some(short_code),
            has_value: true,
            is_optional: true,
            default_value: None,
            position: None,
            requires: Vec::new(),
            value_type,
        }
    }

    /// 创建位置参数
    pub fn positional(
        position: usize,
        name: impl Into<String>,
        description: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_option: false,
            short_code: None,
            has_value: true,
            is_optional: false,
            default_value: None,
            position: Some(position),
            requires: Vec::new(),
            value_type,
        }
    }

    /// 设置参数名（选项默认以短代码为名）
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设为可省略
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// 设为必需（主要用于必须出现的选项）
    pub fn required(mut self) -> Self {
        self.is_optional = false;
        self
    }

    /// 设置缺省值
    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.is_optional = true;
        self.default_value = Some(value);
        self
    }

    /// 声明出现时必须同时出现的参数
    pub fn requires_parameter(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// 帮助输出中的语法片段，如 `[-t <type>]`、`<commandName>`
    pub fn dump(&self) -> String {
        let core = if self.is_option {
            let code = self.short_code.as_deref().unwrap_or(&self.name);
            if self.has_value {
                format!("-{} <{}>", code, self.name)
            } else {
                format!("-{}", code)
            }
        } else {
            format!("<{}>", self.name)
        };
        if self.is_optional {
            format!("[{}]", core)
        } else {
            core
        }
    }
}

/// 命令规范校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("命令 '{command}' 中选项短代码 '-{code}' 重复")]
    DuplicateShortCode { command: String, code: String },

    #[error("命令 '{command}' 中参数名 '{name}' 重复")]
    DuplicateParameterName { command: String, name: String },

    #[error("命令 '{command}' 中位置参数位置 {position} 重复")]
    DuplicatePosition { command: String, position: usize },
}

/// 命令规范
///
/// 一条已声明的命令。参数映射保持插入顺序（= 声明顺序），
/// 处理函数在序列化时跳过。
#[derive(Clone, Serialize, Deserialize)]
pub struct CommandSpecification {
    /// 命令名称（注册表查找键，匹配默认不区分大小写）
    pub name: String,

    /// 一句话描述
    pub description: String,

    /// 详细描述
    pub long_description: Option<String>,

    /// 补充文档
    pub documentation: Option<String>,

    /// 声明该命令的命令组短名
    pub group_name: String,

    /// 所属模块名
    pub module_name: String,

    /// 参数规范，按声明顺序
    parameters: Vec<ParameterSpecification>,

    /// 命令体
    #[serde(skip)]
    handler: Option<CommandHandler>,
}

impl fmt::Debug for CommandSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpecification")
            .field("name", &self.name)
            .field("group_name", &self.group_name)
            .field("module_name", &self.module_name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl CommandSpecification {
    /// 创建新的命令规范
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            long_description: None,
            documentation: None,
            group_name: String::new(),
            module_name: String::new(),
            parameters: Vec::new(),
            handler: None,
        }
    }

    pub fn with_long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = Some(text.into());
        self
    }

    pub fn with_documentation(mut self, text: impl Into<String>) -> Self {
        self.documentation = Some(text.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = group.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module_name = module.into();
        self
    }

    /// 追加一个参数声明
    pub fn with_parameter(mut self, parameter: ParameterSpecification) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_handler(mut self, handler: CommandHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// 按声明顺序访问参数规范
    pub fn parameters(&self) -> &[ParameterSpecification] {
        &self.parameters
    }

    /// 按名称查找参数规范
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpecification> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// 参数总数
    pub fn parameters_count(&self) -> usize {
        self.parameters.len()
    }

    /// 选项数量（消歧时的特异度指标）
    pub fn options_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_option).count()
    }

    /// 位置参数，按声明位置排序
    pub fn positional_parameters(&self) -> Vec<&ParameterSpecification> {
        let mut positionals: Vec<&ParameterSpecification> =
            self.parameters.iter().filter(|p| !p.is_option).collect();
        positionals.sort_by_key(|p| p.position.unwrap_or(usize::MAX));
        positionals
    }

    pub fn handler(&self) -> Option<&CommandHandler> {
        self.handler.as_ref()
    }

    /// 校验声明的一致性：短代码、参数名、位置均不得重复
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut codes: Vec<&str> = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        let mut positions: Vec<usize> = Vec::new();
        for p in &self.parameters {
            if names.contains(&p.name.as_str()) {
                return Err(SpecError::DuplicateParameterName {
                    command: self.name.clone(),
                    name: p.name.clone(),
                });
            }
            names.push(&p.name);
            if let Some(code) = p.short_code.as_deref() {
                if codes.contains(&code) {
                    return Err(SpecError::DuplicateShortCode {
                        command: self.name.clone(),
                        code: code.to_string(),
                    });
                }
                codes.push(code);
            }
            if let Some(position) = p.position {
                if positions.contains(&position) {
                    return Err(SpecError::DuplicatePosition {
                        command: self.name.clone(),
                        position,
                    });
                }
                positions.push(position);
            }
        }
        Ok(())
    }

    /// 帮助输出中的完整语法行，如 `history [-i <i>] [-c] [<file>]`
    pub fn syntax_string(&self) -> String {
        let mut parts = vec![self.name.clone()];
        for p in &self.parameters {
            parts.push(p.dump());
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = CommandSpecification::new("help", "print help")
            .with_group("shell")
            .with_module("core")
            .with_parameter(ParameterSpecification::flag("s", "short view"))
            .with_parameter(ParameterSpecification::option(
                "t",
                "filter by type",
                ValueType::Str,
            ))
            .with_parameter(
                ParameterSpecification::positional(0, "commandName", "command", ValueType::Str)
                    .optional(),
            );

        assert_eq!(spec.parameters_count(), 3);
        assert_eq!(spec.options_count(), 2);
        assert_eq!(spec.positional_parameters().len(), 1);
        assert!(spec.validate().is_ok());
        assert_eq!(spec.syntax_string(), "help [-s] [-t <t>] [<commandName>]");
    }

    #[test]
    fn test_duplicate_short_code_rejected() {
        let spec = CommandSpecification::new("x", "")
            .with_parameter(ParameterSpecification::flag("a", ""))
            .with_parameter(ParameterSpecification::flag("a", "").with_name("a2"));

        assert_eq!(
            spec.validate(),
            Err(SpecError::DuplicateShortCode {
                command: "x".into(),
                code: "a".into()
            })
        );
    }

    #[test]
    fn test_coerce_values() {
        assert_eq!(
            ParamValue::coerce("42", ValueType::Int),
            Ok(ParamValue::Int(42))
        );
        assert_eq!(
            ParamValue::coerce("-7", ValueType::Int),
            Ok(ParamValue::Int(-7))
        );
        assert!(ParamValue::coerce("abc", ValueType::Int).is_err());
        assert_eq!(
            ParamValue::coerce("on", ValueType::Bool),
            Ok(ParamValue::Bool(true))
        );
        assert!(ParamValue::coerce("maybe", ValueType::Bool).is_err());
    }

    #[test]
    fn test_default_value_marks_optional() {
        let p = ParameterSpecification::positional(0, "n", "", ValueType::Int)
            .with_default(ParamValue::Int(10));
        assert!(p.is_optional);
        assert!(p.has_default_value());
    }
}
