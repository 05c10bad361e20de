//! shell 端到端测试
//!
//! 通过内存输出与脚本化输入驱动完整的读取-解析-执行循环。

use std::io::Cursor;
use std::sync::Arc;

use crate::shell::{MemoryOutput, Shell, ShellConfig};

fn shell() -> (Shell, Arc<MemoryOutput>) {
    let out = MemoryOutput::new();
    let shell = Shell::with_output(ShellConfig::default(), out.clone()).unwrap();
    (shell, out)
}

fn run_script(script: &str) -> String {
    let (mut shell, out) = shell();
    shell.run(Cursor::new(script.to_string())).unwrap();
    out.take()
}

#[test]
fn test_prompt_and_exit() {
    let output = run_script("exit\nprintln never-reached\n");
    assert!(output.starts_with("> "));
    assert!(!output.contains("never-reached"));
}

#[test]
fn test_unknown_command_reported() {
    let output = run_script("frobnicate\nexit\n");
    assert!(output.contains("unknown command: 'frobnicate'"));
}

#[test]
fn test_println_output() {
    let output = run_script("println \"hello there\"\nexit\n");
    assert!(output.contains("hello there\n"));
}

#[test]
fn test_invalid_line_prints_syntax_and_errors() {
    let output = run_script("history -i\nexit\n");
    assert!(output.contains("syntax: history"));
    assert!(output.contains("option -i expects a value"));
}

#[test]
fn test_history_file_flag_requires_file_argument() {
    // 缺少 file 参数的 -w 在匹配阶段就被拒绝，不会进入命令体
    let output = run_script("history -w\nexit\n");
    assert!(output.contains("option -w requires parameter 'file'"));
}

#[test]
fn test_prompt_command_changes_prompt() {
    let output = run_script("prompt \"sh% \"\nexit\n");
    // 下一轮读取前打印新提示符
    assert!(output.contains("sh% "));
}

#[test]
fn test_history_recall_previous() {
    let output = run_script("println once\n!!\nexit\n");
    // 召回的行先回显，然后再次执行
    let occurrences = output.matches("once\n").count();
    assert!(occurrences >= 3, "output was: {}", output);
    // 召回行自身不入历史，召回出的行入历史
    assert!(!output.contains("unknown command: '!!'"));
}

#[test]
fn test_history_recall_by_number() {
    let output = run_script("println one\nprintln two\n! 1\nexit\n");
    assert!(output.matches("one\n").count() >= 3);
    let output = run_script("println one\nprintln two\n! -2\nexit\n");
    assert!(output.matches("one\n").count() >= 3);
}

#[test]
fn test_history_listing_excludes_recall_lines() {
    let output = run_script("println one\n!!\nhistory\nexit\n");
    // 列表含提交的行与召回展开的行，但不含 "!!" 自身
    assert!(output.contains("1  println one"));
    assert!(output.contains("2  println one"));
    assert!(!output.contains("!!\n  "));
}

#[test]
fn test_variable_substitution_in_line() {
    let (mut shell, out) = shell();
    shell.context_mut().variables.set("GREETING", "hi there");
    shell
        .run(Cursor::new("println \"$GREETING\"\nexit\n".to_string()))
        .unwrap();
    assert!(out.take().contains("hi there\n"));
}

#[test]
fn test_module_manifest_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greetings.json");
    std::fs::write(
        &path,
        r#"{
            "description": "greeting commands",
            "groups": [
                {
                    "name": "greet",
                    "description": "greeting commands",
                    "commands": [
                        {
                            "name": "hello",
                            "description": "print a greeting",
                            "parameters": [
                                {
                                    "name": "who",
                                    "kind": "positional",
                                    "valueType": "str",
                                    "optional": true,
                                    "defaultValue": "world"
                                }
                            ],
                            "output": "hello {who}"
                        }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let script = format!(
        "module -l {p}\nhello\nhello orbit\nmodule -u greetings\nhello\nexit\n",
        p = path.display(),
    );
    let output = run_script(&script);
    assert!(output.contains("loaded 1 command in 1 type"));
    assert!(output.contains("hello world\n"));
    assert!(output.contains("hello orbit\n"));
    assert!(output.contains("unloaded 1 command in 1 type"));
    assert!(output.contains("unknown command: 'hello'"));
}

#[test]
fn test_module_load_missing_file() {
    let output = run_script("module -l /no/such/manifest.json\nexit\n");
    assert!(output.contains("cannot load module"));
}

#[test]
fn test_duplicate_module_load_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    std::fs::write(
        &path,
        r#"{
            "description": "",
            "groups": [
                {
                    "name": "g",
                    "description": "",
                    "commands": [{ "name": "zap", "description": "", "output": "zap" }]
                }
            ]
        }"#,
    )
    .unwrap();

    let script = format!("module -l {p}\nmodule -l {p}\nexit\n", p = path.display());
    let output = run_script(&script);
    assert!(output.contains("loaded 1 command in 1 type"));
    assert!(output.contains("cannot register module"));
}

#[test]
fn test_help_after_module_load_includes_new_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    std::fs::write(
        &path,
        r#"{
            "description": "",
            "groups": [
                {
                    "name": "g",
                    "description": "",
                    "commands": [{ "name": "zap", "description": "zap it", "output": "zap" }]
                }
            ]
        }"#,
    )
    .unwrap();

    let script = format!("module -l {p}\nhelp\nexit\n", p = path.display());
    let output = run_script(&script);
    assert!(output.contains("zap"));
    assert!(output.contains("zap it"));
}
