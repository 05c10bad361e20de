//! 命令历史模块
//!
//! 维护已提交输入行的有序列表与一个游标（行编辑前端的上下翻阅位置）。
//! 默认只追加；变更操作只有清空、追加与文件批量读写。
//! 历史文件是纯文本，一行一条。

pub mod error;

pub use error::*;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

/// 默认历史文件名（用户主目录下）
const DEFAULT_HISTORY_FILE: &str = ".orbitsh_history";

/// 命令历史
#[derive(Debug, Default, Clone)]
pub struct CommandHistory {
    entries: Vec<String>,
    /// 翻阅游标；None 表示不在翻阅状态
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用户历史文件的默认路径
    pub fn default_file_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_HISTORY_FILE))
    }

    /// 追加一条历史记录并重置游标
    pub fn append(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line);
        self.cursor = None;
    }

    pub fn contains(&self, line: &str) -> bool {
        self.entries.iter().any(|entry| entry == line)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// 取第 n 条（1 起始的历史编号）
    pub fn get(&self, number: usize) -> Option<&String> {
        if number == 0 {
            return None;
        }
        self.entries.get(number - 1)
    }

    pub fn last(&self) -> Option<&String> {
        self.entries.last()
    }

    /// 游标向前（更早的记录）
    pub fn previous(&mut self) -> Option<&String> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.cursor {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(next);
        self.entries.get(next)
    }

    /// 游标向后（更新的记录）；越过末尾时退出翻阅状态
    pub fn next(&mut self) -> Option<&String> {
        let i = self.cursor?;
        if i + 1 >= self.entries.len() {
            self.cursor = None;
            return None;
        }
        self.cursor = Some(i + 1);
        self.entries.get(i + 1)
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// 覆盖写入历史文件（替换文件内容）
    pub fn write_to_file(&self, path: &Path) -> Result<(), HistoryError> {
        let mut file = File::create(path).map_err(|e| HistoryError::io("write", path, e))?;
        for entry in &self.entries {
            writeln!(file, "{}", entry).map_err(|e| HistoryError::io("write", path, e))?;
        }
        debug!(path = %path.display(), lines = self.entries.len(), "历史已写入文件");
        Ok(())
    }

    /// 追加写入历史文件
    pub fn append_to_file(&self, path: &Path) -> Result<(), HistoryError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HistoryError::io("append", path, e))?;
        for entry in &self.entries {
            writeln!(file, "{}", entry).map_err(|e| HistoryError::io("append", path, e))?;
        }
        Ok(())
    }

    /// 读取历史文件，将其中每一行追加到列表
    pub fn read_from_file(&mut self, path: &Path) -> Result<usize, HistoryError> {
        let lines = read_lines(path)?;
        let count = lines.len();
        for line in lines {
            self.append(line);
        }
        self.cursor = None;
        Ok(count)
    }

    /// 合并读取：只追加列表中尚不存在的行（去重读取）
    pub fn merge_from_file(&mut self, path: &Path) -> Result<usize, HistoryError> {
        let lines = read_lines(path)?;
        let mut added = 0;
        for line in lines {
            if !self.contains(&line) {
                self.append(line);
                added += 1;
            }
        }
        self.cursor = None;
        Ok(added)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, HistoryError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| HistoryError::io("read", path, e))?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect())
}
