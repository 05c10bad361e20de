//! OrbitSh 可执行入口
//!
//! 加载用户配置与历史文件，在标准输入上运行交互循环，
//! 退出时把历史写回文件。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use orbitsh::shell::{Shell, ShellConfig, StdoutOutput};
use orbitsh::utils::{init_logging, AppResult};

/// 用户配置文件的默认位置
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orbitsh").join("config.json"))
}

fn load_config() -> ShellConfig {
    let Some(path) = default_config_path() else {
        return ShellConfig::default();
    };
    if !path.exists() {
        return ShellConfig::default();
    }
    match ShellConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("配置文件无效，使用缺省配置: {:#}", e);
            ShellConfig::default()
        }
    }
}

fn main() -> AppResult<()> {
    init_logging()?;

    let config = load_config();
    let history_file = config.history_file_path();
    let mut shell = Shell::with_output(config, Arc::new(StdoutOutput))?;

    // 启动时合并历史文件，退出时写回
    if let Some(path) = &history_file {
        if path.exists() {
            if let Err(e) = shell.context().history.write().merge_from_file(path) {
                warn!("读取历史文件失败: {}", e);
            }
        }
    }

    let stdin = std::io::stdin();
    shell.run(stdin.lock())?;

    if let Some(path) = &history_file {
        if let Err(e) = shell.context().history.read().write_to_file(path) {
            warn!("写入历史文件失败: {}", e);
        }
    }
    info!("shell 退出");
    Ok(())
}
