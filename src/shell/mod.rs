//! 交互式命令 shell
//!
//! 读取-解析-执行循环：打印提示符、读一行、经解析器得到绑定命令并
//! 调用其处理函数。五种解析结果都在这里转换成用户可见的输出；
//! 历史召回命令通过回送队列把选中的行重新注入循环。

pub mod builtins;
pub mod config;
pub mod context;

pub use builtins::*;
pub use config::*;
pub use context::*;

#[cfg(test)]
mod integration_test;

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::Arc;

use tracing::debug;

use crate::parser::{BoundCommand, ParseResult, Resolver};
use crate::utils::AppResult;

/// 交互式 shell
pub struct Shell {
    ctx: ShellContext,
    resolver: Resolver,
    /// 待回送的输入行（历史召回命令产生）
    pending: VecDeque<String>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> AppResult<Self> {
        Self::with_output(config, Arc::new(StdoutOutput))
    }

    pub fn with_output(config: ShellConfig, out: Arc<dyn Output>) -> AppResult<Self> {
        let resolver = Resolver::new(config.comparison, config.policy);
        let ctx = ShellContext::new(config, out);
        {
            let mut store = ctx.store.write();
            let mut modules = ctx.modules.write();
            modules.register_unit(&mut store, &builtin_unit())?;
        }
        Ok(Self {
            ctx,
            resolver,
            pending: VecDeque::new(),
        })
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ShellContext {
        &mut self.ctx
    }

    /// 处理一行输入；返回 false 表示用户要求退出
    pub fn eval_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        // 历史召回行本身不入历史，召回出的行会再次经过这里
        if !trimmed.is_empty() && !trimmed.starts_with('!') {
            self.ctx.history.write().append(trimmed.to_string());
        }

        let result = {
            let vars = &self.ctx.variables;
            let store = self.ctx.store.read();
            self.resolver
                .parse(&store, line, |name| vars.get(name).cloned())
        };

        match result {
            ParseResult::Empty => true,
            ParseResult::NotIdentified { token } => {
                self.ctx
                    .out
                    .writeln(&format!("unknown command: '{}'", token));
                true
            }
            ParseResult::NotValid { attempts } => {
                for attempt in &attempts {
                    self.ctx.out.writeln(&format!(
                        "syntax: {}",
                        attempt.syntax.spec().syntax_string(),
                    ));
                    for error in &attempt.errors {
                        self.ctx.out.writeln(&format!("  {}", error));
                    }
                }
                true
            }
            ParseResult::Ambiguous { matches } => {
                self.ctx.out.writeln("ambiguous command:");
                for candidate in &matches {
                    self.ctx.out.writeln(&format!(
                        "  {}",
                        candidate.syntax.spec().syntax_string(),
                    ));
                }
                true
            }
            ParseResult::Valid { command } => self.execute(command),
        }
    }

    fn execute(&mut self, command: BoundCommand) -> bool {
        self.ctx.cancellation.reset();
        let Some(handler) = command.syntax.spec().handler().cloned() else {
            self.ctx.out.writeln(&format!(
                "command '{}' has no body",
                command.syntax.spec().name,
            ));
            return true;
        };
        debug!(command = %command.syntax.spec().name, "执行命令");
        match handler(&mut self.ctx, &command) {
            Ok(CommandOutcome::Continue) => true,
            Ok(CommandOutcome::Exit) => false,
            Ok(CommandOutcome::SendNextInput(line)) => {
                self.pending.push_back(line);
                true
            }
            // 命令体的错误回报给用户，不终止循环
            Err(e) => {
                self.ctx.out.writeln(&format!("command failed: {:#}", e));
                true
            }
        }
    }

    /// 读取-解析-执行循环；输入耗尽或 exit 时返回
    pub fn run<R: BufRead>(&mut self, input: R) -> AppResult<()> {
        let mut lines = input.lines();
        loop {
            let line = match self.pending.pop_front() {
                // 召回的行先回显再执行
                Some(line) => {
                    self.ctx.out.writeln(&line);
                    line
                }
                None => {
                    self.ctx.out.write(&self.ctx.prompt);
                    match lines.next() {
                        Some(line) => line?,
                        None => break,
                    }
                }
            };
            if !self.eval_line(&line) {
                break;
            }
        }
        Ok(())
    }
}
