//! 命令行解析模块
//!
//! 把一行输入变成单个匹配的命令语法与绑定好的参数集，或一个分类失败：
//! - tokenizer：引号感知的分词
//! - substitution：`$NAME` 变量替换
//! - matcher：把参数片段绑定到单个语法的参数规范
//! - resolver：分词 → 注册表查找 → 逐候选匹配 → 消歧

pub mod matcher;
pub mod resolver;
pub mod substitution;
pub mod tokenizer;
pub mod types;

pub use matcher::*;
pub use resolver::*;
pub use substitution::*;
pub use tokenizer::*;
pub use types::*;
