//! 语法匹配器
//!
//! 把参数片段绑定到单个命令语法的参数规范上：
//! - `-x` / `--xx` 形式按短代码绑定选项，携带值的选项消费下一个片段
//!   或 `-x=value` 的内联值，并按声明类型转换
//! - 其余片段按声明顺序绑定到下一个未消费的位置参数
//! - 绑定后检查必需项、缺省值与 requires 伴随约束
//!
//! 对畸形输入永不 panic，一切失败通过错误列表报告。
//! `position_offset` 仅用于把片段偏移折算回完整输入行（变量替换后）的字符偏移。

use crate::command::spec::{ParamValue, ParameterSpecification};
use crate::command::store::NameComparison;
use crate::command::syntax::CommandSyntax;
use crate::parser::types::{BoundParameter, ParseError, ParseErrorKind, Segment};

/// 片段是否是选项形式
///
/// 以 `-`/`--` 开头即视为选项，但形如 `-1`、`-3.5` 的负数除外，
/// 它们要留给数值类型的位置参数（如 `! -1`）。
fn strip_option_prefix(text: &str) -> Option<&str> {
    let rest = text
        .strip_prefix("--")
        .or_else(|| text.strip_prefix('-'))?;
    if rest.is_empty() {
        return None;
    }
    if rest.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    Some(rest)
}

/// 在语法的选项规范中按短代码查找
fn find_option<'a>(
    syntax: &'a CommandSyntax,
    code: &str,
    comparison: NameComparison,
) -> Option<&'a ParameterSpecification> {
    syntax.spec().parameters().iter().find(|p| {
        p.is_option
            && p.short_code
                .as_deref()
                .is_some_and(|sc| comparison.eq(sc, code))
    })
}

/// 绑定或覆盖同名参数（同一选项出现多次时保留最后一次）
fn upsert(bound: &mut Vec<BoundParameter>, parameter: BoundParameter) {
    if let Some(existing) = bound.iter_mut().find(|p| p.name == parameter.name) {
        *existing = parameter;
    } else {
        bound.push(parameter);
    }
}

/// 把片段序列绑定到一个候选语法
pub fn match_syntax(
    syntax: &CommandSyntax,
    comparison: NameComparison,
    segments: &[Segment],
    position_offset: usize,
) -> (Vec<BoundParameter>, Vec<ParseError>) {
    let spec = syntax.spec();
    let positionals = spec.positional_parameters();

    let mut bound: Vec<BoundParameter> = Vec::new();
    let mut errors: Vec<ParseError> = Vec::new();
    let mut next_positional = 0usize;
    let mut index = 0usize;

    while index < segments.len() {
        let segment = &segments[index];
        let position = position_offset + segment.offset;

        if let Some(raw) = strip_option_prefix(&segment.text) {
            // 选项路径
            let (code, inline_value) = match raw.split_once('=') {
                Some((code, value)) => (code, Some(value.to_string())),
                None => (raw, None),
            };

            match find_option(syntax, code, comparison) {
                None => {
                    errors.push(ParseError::at(
                        ParseErrorKind::UnknownOption {
                            code: code.to_string(),
                        },
                        index,
                        position,
                    ));
                }
                Some(option) => {
                    if option.has_value {
                        let value_text = match inline_value {
                            Some(value) => Some(value),
                            None => {
                                // 消费下一个片段作为值
                                if index + 1 < segments.len() {
                                    index += 1;
                                    Some(segments[index].text.clone())
                                } else {
                                    None
                                }
                            }
                        };
                        match value_text {
                            None => errors.push(ParseError::at(
                                ParseErrorKind::MissingOptionValue {
                                    code: code.to_string(),
                                },
                                index,
                                position,
                            )),
                            Some(text) => match ParamValue::coerce(&text, option.value_type) {
                                Ok(value) => upsert(
                                    &mut bound,
                                    BoundParameter::from_input(&option.name, true, Some(value)),
                                ),
                                Err(_) => errors.push(ParseError::at(
                                    ParseErrorKind::InvalidValue {
                                        parameter: option.name.clone(),
                                        value: text,
                                        expected: option.value_type,
                                    },
                                    index,
                                    position,
                                )),
                            },
                        }
                    } else if inline_value.is_some() {
                        errors.push(ParseError::at(
                            ParseErrorKind::UnexpectedOptionValue {
                                code: code.to_string(),
                            },
                            index,
                            position,
                        ));
                    } else {
                        // 布尔标志：出现即为真
                        upsert(
                            &mut bound,
                            BoundParameter::from_input(
                                &option.name,
                                true,
                                Some(ParamValue::Bool(true)),
                            ),
                        );
                    }
                }
            }
        } else {
            // 位置参数路径
            match positionals.get(next_positional) {
                None => errors.push(ParseError::at(
                    ParseErrorKind::TooManyParameters {
                        value: segment.text.clone(),
                    },
                    index,
                    position,
                )),
                Some(parameter) => {
                    next_positional += 1;
                    match ParamValue::coerce(&segment.text, parameter.value_type) {
                        Ok(value) => upsert(
                            &mut bound,
                            BoundParameter::from_input(&parameter.name, false, Some(value)),
                        ),
                        Err(_) => errors.push(ParseError::at(
                            ParseErrorKind::InvalidValue {
                                parameter: parameter.name.clone(),
                                value: segment.text.clone(),
                                expected: parameter.value_type,
                            },
                            index,
                            position,
                        )),
                    }
                }
            }
        }
        index += 1;
    }

    // 行尾检查：必需项缺失、缺省值补齐
    for parameter in spec.parameters() {
        if bound.iter().any(|p| p.name == parameter.name) {
            continue;
        }
        if parameter.is_option {
            if !parameter.is_optional {
                errors.push(ParseError::at_end(ParseErrorKind::MissingRequiredOption {
                    code: parameter
                        .short_code
                        .clone()
                        .unwrap_or_else(|| parameter.name.clone()),
                }));
            } else if let Some(default) = &parameter.default_value {
                bound.push(BoundParameter::from_default(
                    &parameter.name,
                    true,
                    default.clone(),
                ));
            }
        } else if !parameter.is_optional {
            errors.push(ParseError::at_end(
                ParseErrorKind::MissingRequiredParameter {
                    name: parameter.name.clone(),
                },
            ));
        } else if let Some(default) = &parameter.default_value {
            bound.push(BoundParameter::from_default(
                &parameter.name,
                false,
                default.clone(),
            ));
        }
    }

    // requires 伴随约束：只有来自输入的绑定才算“出现”
    for parameter in spec.parameters() {
        let present = bound
            .iter()
            .any(|p| p.name == parameter.name && !p.from_default);
        if !present {
            continue;
        }
        for required in &parameter.requires {
            let companion_present = bound
                .iter()
                .any(|p| p.name == *required && !p.from_default);
            if !companion_present {
                errors.push(ParseError::at_end(
                    ParseErrorKind::MissingRequiredCompanion {
                        option: parameter
                            .short_code
                            .clone()
                            .unwrap_or_else(|| parameter.name.clone()),
                        requires: required.clone(),
                    },
                ));
            }
        }
    }

    (bound, errors)
}
