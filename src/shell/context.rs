//! Shell 上下文
//!
//! 命令体执行时可见的全部环境：输出汇、共享注册表句柄、历史、
//! 变量表、提示符与协作式取消令牌。

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::command::store::SyntaxRegistry;
use crate::history::CommandHistory;
use crate::modules::{JsonManifestUnit, LoadableUnit, ModuleError, ModuleRegistry};
use crate::shell::config::ShellConfig;

/// 输出能力边界
///
/// 核心只依赖“写一段文本”这一能力，格式化/着色层在外部。
pub trait Output: Send + Sync {
    fn write(&self, text: &str);

    fn writeln(&self, text: &str) {
        self.write(text);
        self.write("\n");
    }
}

/// 标准输出
pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn write(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

/// 内存输出（测试与嵌入场景）
#[derive(Default)]
pub struct MemoryOutput {
    buffer: Mutex<String>,
}

impl MemoryOutput {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut self.buffer.lock())
    }

    pub fn snapshot(&self) -> String {
        self.buffer.lock().clone()
    }
}

impl Output for MemoryOutput {
    fn write(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }
}

/// 协作式取消令牌
///
/// 命令体派生的工作线程在安全点轮询该标志并尽快停止，
/// 永远不会被强制抢占。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// 新一轮命令执行前复位
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Shell 变量表
///
/// `$NAME` 替换的数据来源，启动时从进程环境播种。
#[derive(Debug, Clone, Default)]
pub struct Variables {
    map: HashMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self {
            map: std::env::vars().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.map.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into(), value.into());
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.map.remove(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 继续读取下一行
    Continue,
    /// 用户显式退出 shell
    Exit,
    /// 把一行输入送回读取循环（`!!`、`! n`、`history -i`）
    SendNextInput(String),
}

/// 可加载单元提供者：路径 → 已加载单元
///
/// 默认实现加载 JSON 清单；嵌入方可以替换成自己的后端。
pub type UnitProvider =
    Arc<dyn Fn(&Path) -> Result<Box<dyn LoadableUnit>, ModuleError> + Send + Sync>;

pub fn json_manifest_provider() -> UnitProvider {
    Arc::new(|path| Ok(Box::new(JsonManifestUnit::load(path)?) as Box<dyn LoadableUnit>))
}

/// Shell 上下文
///
/// 注册表与模块表是进程级共享可变状态：启动时注入内置命令，
/// 之后只通过注册/卸载变更，每次解析读取。
pub struct ShellContext {
    pub out: Arc<dyn Output>,
    pub store: Arc<RwLock<SyntaxRegistry>>,
    pub modules: Arc<RwLock<ModuleRegistry>>,
    pub history: Arc<RwLock<CommandHistory>>,
    pub variables: Variables,
    pub prompt: String,
    pub cancellation: CancellationToken,
    pub unit_provider: UnitProvider,
    pub config: ShellConfig,
}

impl ShellContext {
    pub fn new(config: ShellConfig, out: Arc<dyn Output>) -> Self {
        Self {
            out,
            store: Arc::new(RwLock::new(SyntaxRegistry::new())),
            modules: Arc::new(RwLock::new(ModuleRegistry::new())),
            history: Arc::new(RwLock::new(CommandHistory::new())),
            variables: Variables::from_env(),
            prompt: config.prompt.clone(),
            cancellation: CancellationToken::new(),
            unit_provider: json_manifest_provider(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        let worker_token = token.clone();
        token.cancel();
        assert!(worker_token.is_cancelled());

        token.reset();
        assert!(!worker_token.is_cancelled());
    }

    #[test]
    fn test_cancellation_stops_spawned_worker() {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let handle = std::thread::spawn(move || {
            let mut visited = 0u64;
            // 模拟在安全点轮询取消标志的长任务
            while !worker_token.is_cancelled() {
                visited += 1;
                std::thread::yield_now();
            }
            visited
        });
        token.cancel();
        let visited = handle.join().unwrap();
        assert!(visited > 0 || token.is_cancelled());
    }

    #[test]
    fn test_variables() {
        let mut vars = Variables::new();
        vars.set("X", "1");
        assert_eq!(vars.get("X"), Some(&"1".to_string()));
        assert_eq!(vars.unset("X"), Some("1".to_string()));
        assert!(vars.get("X").is_none());
    }

    #[test]
    fn test_memory_output() {
        let out = MemoryOutput::new();
        out.writeln("hello");
        assert_eq!(out.snapshot(), "hello\n");
        assert_eq!(out.take(), "hello\n");
        assert!(out.snapshot().is_empty());
    }
}
