//! 解析相关的类型定义
//!
//! 分词片段、逐参数解析错误、绑定结果与解析总结果

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::spec::{ParamValue, ValueType};
use crate::command::syntax::CommandSyntax;

/// 分词片段：文本与其在输入行（修剪后）中的字符偏移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub offset: usize,
}

impl Segment {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

/// 逐参数解析错误的种类
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ParseErrorKind {
    #[error("unknown option: -{code}")]
    UnknownOption { code: String },

    #[error("invalid value '{value}' for parameter '{parameter}' (expected {expected})")]
    InvalidValue {
        parameter: String,
        value: String,
        expected: ValueType,
    },

    #[error("option -{code} expects a value")]
    MissingOptionValue { code: String },

    #[error("option -{code} does not take a value")]
    UnexpectedOptionValue { code: String },

    #[error("missing required option: -{code}")]
    MissingRequiredOption { code: String },

    #[error("missing required parameter: '{name}'")]
    MissingRequiredParameter { name: String },

    #[error("too many parameters: '{value}'")]
    TooManyParameters { value: String },

    #[error("option -{option} requires parameter '{requires}'")]
    MissingRequiredCompanion { option: String, requires: String },
}

/// 附着在一次失败匹配上的解析错误
///
/// `position` 是错误片段在变量替换后的输入行中的字符偏移（替换先于分词，
/// 插入符诊断应指向替换后的行），行尾才能检测到的错误（缺少必需参数）没有位置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub segment_index: Option<usize>,
    pub position: Option<usize>,
}

impl ParseError {
    pub fn at(kind: ParseErrorKind, segment_index: usize, position: usize) -> Self {
        Self {
            kind,
            segment_index: Some(segment_index),
            position: Some(position),
        }
    }

    pub fn at_end(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            segment_index: None,
            position: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} (at {})", self.kind, position),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// 绑定好的单个参数
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub is_option: bool,
    pub value: Option<ParamValue>,
    /// 值来自声明的缺省值而非输入
    pub from_default: bool,
}

impl BoundParameter {
    pub fn from_input(name: impl Into<String>, is_option: bool, value: Option<ParamValue>) -> Self {
        Self {
            name: name.into(),
            is_option,
            value,
            from_default: false,
        }
    }

    pub fn from_default(name: impl Into<String>, is_option: bool, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            is_option,
            value: Some(value),
            from_default: true,
        }
    }
}

/// 解析成功后的绑定结果：选中的语法 + 绑定参数集
#[derive(Debug, Clone)]
pub struct BoundCommand {
    pub syntax: CommandSyntax,
    pub parameters: Vec<BoundParameter>,
}

impl BoundCommand {
    pub fn get(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.get(name).and_then(|p| p.value.as_ref())
    }

    /// 布尔标志选项是否出现
    pub fn flag(&self, name: &str) -> bool {
        self.value(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(|v| v.as_str())
    }

    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(|v| v.as_int())
    }

    pub fn path_value(&self, name: &str) -> Option<PathBuf> {
        self.value(name).and_then(|v| v.as_path()).cloned()
    }
}

/// 一次失败的匹配尝试（语法 + 该语法下的解析错误）
#[derive(Debug, Clone)]
pub struct MatchAttempt {
    pub syntax: CommandSyntax,
    pub errors: Vec<ParseError>,
}

/// 解析总结果
///
/// 解析的四种失败与一种成功都是普通值，调用方必须分支处理并报告，
/// 任何一种都不是进程级错误。
#[derive(Debug, Clone)]
pub enum ParseResult {
    /// 空输入（修剪后为空）
    Empty,
    /// 命令 token 未注册
    NotIdentified { token: String },
    /// 有候选语法但没有一个能无错解析
    NotValid { attempts: Vec<MatchAttempt> },
    /// 多个同等特异度的语法均匹配成功
    Ambiguous { matches: Vec<BoundCommand> },
    /// 唯一匹配
    Valid { command: BoundCommand },
}

impl ParseResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParseResult::Valid { .. })
    }
}
