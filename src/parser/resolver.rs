//! 解析器（resolver）
//!
//! 单行输入的解析状态机：
//! 修剪 → 变量替换 → 分词 → 注册表查找 → 逐候选匹配 → 消歧。
//! 这是解析引擎对外的唯一入口。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::store::{NameComparison, SyntaxRegistry};
use crate::parser::matcher::match_syntax;
use crate::parser::substitution::substitute_variables;
use crate::parser::tokenizer::split_expr;
use crate::parser::types::{BoundCommand, MatchAttempt, ParseResult};

/// 多个语法同时匹配成功时的消歧策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisambiguationPolicy {
    /// 选项数最多的语法最特异；并列第一才报告歧义（默认）
    #[default]
    OptionCountTieBreak,
    /// 超过一个匹配即报告歧义
    Strict,
}

/// 解析器配置与入口
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    comparison: NameComparison,
    policy: DisambiguationPolicy,
}

impl Resolver {
    pub fn new(comparison: NameComparison, policy: DisambiguationPolicy) -> Self {
        Self { comparison, policy }
    }

    pub fn comparison(&self) -> NameComparison {
        self.comparison
    }

    pub fn policy(&self) -> DisambiguationPolicy {
        self.policy
    }

    /// 解析一行输入
    ///
    /// `lookup_var` 提供 `$NAME` 替换所需的变量表视图。
    pub fn parse(
        &self,
        registry: &SyntaxRegistry,
        line: &str,
        lookup_var: impl Fn(&str) -> Option<String>,
    ) -> ParseResult {
        let line = line.trim();
        if line.is_empty() {
            return ParseResult::Empty;
        }

        let line = substitute_variables(line, lookup_var);
        let segments = split_expr(&line);
        let Some((token, arguments)) = segments.split_first() else {
            // 替换后只剩空白
            return ParseResult::Empty;
        };

        let candidates = registry.find_by_token(&token.text, true, self.comparison);
        if candidates.is_empty() {
            debug!(token = %token.text, "命令未识别");
            return ParseResult::NotIdentified {
                token: token.text.clone(),
            };
        }

        let mut valid: Vec<BoundCommand> = Vec::new();
        let mut invalid: Vec<MatchAttempt> = Vec::new();
        for syntax in candidates {
            // 片段偏移已是整行内的绝对偏移，无需再加命令 token 的宽度
            let (parameters, errors) = match_syntax(&syntax, self.comparison, arguments, 0);
            if errors.is_empty() {
                valid.push(BoundCommand { syntax, parameters });
            } else {
                invalid.push(MatchAttempt { syntax, errors });
            }
        }

        if valid.is_empty() {
            return ParseResult::NotValid { attempts: invalid };
        }
        if valid.len() == 1 {
            return ParseResult::Valid {
                command: valid.swap_remove(0),
            };
        }
        self.disambiguate(valid)
    }

    /// 消歧：按配置的策略从多个无错匹配中选出一个，或报告歧义
    fn disambiguate(&self, mut valid: Vec<BoundCommand>) -> ParseResult {
        match self.policy {
            DisambiguationPolicy::Strict => ParseResult::Ambiguous { matches: valid },
            DisambiguationPolicy::OptionCountTieBreak => {
                valid.sort_by(|a, b| b.syntax.options_count().cmp(&a.syntax.options_count()));
                let top = valid[0].syntax.options_count();
                if valid[1].syntax.options_count() < top {
                    let command = valid.swap_remove(0);
                    debug!(command = %command.syntax.spec().name, options = top, "按选项数消歧");
                    ParseResult::Valid { command }
                } else {
                    // 并列第一：只保留同等特异度的匹配作为歧义负载
                    valid.retain(|m| m.syntax.options_count() == top);
                    ParseResult::Ambiguous { matches: valid }
                }
            }
        }
    }
}
