//! 内置命令
//!
//! shell 自带的命令单元：帮助、模块管理、提示符、退出、处理器信息、
//! 历史操作与控制台输出。以普通可加载单元的身份在启动时注册，
//! 与外部模块走完全相同的注册路径。

use std::sync::Arc;

use crate::command::spec::ValueType;
use crate::modules::{CommandDescriptor, DescriptorUnit, GroupDescriptor, ParameterDescriptor};
use crate::parser::BoundCommand;
use crate::shell::context::{CommandOutcome, Output, ShellContext};
use crate::utils::AppResult;

/// 内置命令所属的模块名
pub const BUILTIN_MODULE: &str = "orbitsh";

type HandlerFn = fn(&mut ShellContext, &BoundCommand) -> AppResult<CommandOutcome>;

fn wrap(f: HandlerFn) -> crate::command::spec::CommandHandler {
    Arc::new(f)
}

/// "N command(s)" 风格的计数短语
fn count_noun(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// 构建内置命令单元
pub fn builtin_unit() -> DescriptorUnit {
    let shell_group = GroupDescriptor::new("shell", "shell control commands")
        .with_command(
            CommandDescriptor::new("help", "print help on the registered commands")
                .with_long_description(
                    "without arguments lists all registered commands; \
                     with a command name prints the full help of that command",
                )
                .with_parameter(ParameterDescriptor::flag(
                    "s",
                    "print a short version of the help text",
                ))
                .with_parameter(ParameterDescriptor::flag(
                    "v",
                    "print a verbose version of the help text",
                ))
                .with_parameter(ParameterDescriptor::flag(
                    "all",
                    "include every registered overload",
                ))
                .with_parameter(
                    ParameterDescriptor::option(
                        "t",
                        "only the commands declared by the given type; '*' lists the types",
                        ValueType::Str,
                    ),
                )
                .with_parameter(
                    ParameterDescriptor::option(
                        "m",
                        "only the commands of the given module; '*' lists the modules",
                        ValueType::Str,
                    ),
                )
                .with_parameter(
                    ParameterDescriptor::positional(
                        "commandName",
                        "the command to print help for",
                        ValueType::Str,
                    )
                    .optional(),
                )
                .with_handler(wrap(help_handler)),
        )
        .with_command(
            CommandDescriptor::new("module", "list, load and unload commands modules")
                .with_long_description(
                    "without options lists the registered modules",
                )
                .with_parameter(ParameterDescriptor::option(
                    "l",
                    "load the commands module from the given manifest file",
                    ValueType::Path,
                ))
                .with_parameter(ParameterDescriptor::option(
                    "u",
                    "unload the commands module with the given name",
                    ValueType::Str,
                ))
                .with_handler(wrap(module_handler)),
        )
        .with_command(
            CommandDescriptor::new("prompt", "change the command prompt")
                .with_parameter(ParameterDescriptor::positional(
                    "text",
                    "the new prompt text",
                    ValueType::Str,
                ))
                .with_handler(wrap(prompt_handler)),
        )
        .with_command(
            CommandDescriptor::new("exit", "exit the command shell")
                .with_handler(wrap(exit_handler)),
        )
        .with_command(
            CommandDescriptor::new("cpinfo", "print information about the command processor")
                .with_handler(wrap(cpinfo_handler)),
        )
        .with_command(
            CommandDescriptor::new("history", "display or manipulate the commands history")
                .with_long_description(
                    "without options lists the history with line numbers",
                )
                .with_parameter(ParameterDescriptor::option(
                    "i",
                    "run the command with the given history number",
                    ValueType::Int,
                ))
                .with_parameter(ParameterDescriptor::flag("c", "clear the commands history"))
                .with_parameter(
                    ParameterDescriptor::flag("w", "write the history to the file")
                        .requires("file"),
                )
                .with_parameter(
                    ParameterDescriptor::flag("a", "append the history to the file")
                        .requires("file"),
                )
                .with_parameter(
                    ParameterDescriptor::flag("r", "read the file and append its lines")
                        .requires("file"),
                )
                .with_parameter(
                    ParameterDescriptor::flag(
                        "n",
                        "read the file and append only the lines not yet in the history",
                    )
                    .requires("file"),
                )
                .with_parameter(
                    ParameterDescriptor::positional(
                        "file",
                        "the history file",
                        ValueType::Path,
                    )
                    .optional(),
                )
                .with_handler(wrap(history_handler)),
        )
        .with_command(
            CommandDescriptor::new("historyPrevious", "run the previous command again")
                .with_alias("!!")
                .with_handler(wrap(history_previous_handler)),
        )
        .with_command(
            CommandDescriptor::new("historyRun", "run the command with the given history number")
                .with_alias("!")
                .with_long_description(
                    "a negative number counts backwards from the most recent line",
                )
                .with_parameter(ParameterDescriptor::positional(
                    "n",
                    "the history line number",
                    ValueType::Int,
                ))
                .with_handler(wrap(history_run_handler)),
        );

    let console_group = GroupDescriptor::new("console", "console output commands")
        .with_command(
            CommandDescriptor::new("print", "print the text to the console")
                .with_parameter(
                    ParameterDescriptor::positional("text", "the text to print", ValueType::Str)
                        .optional()
                        .with_default(serde_json::Value::String(String::new())),
                )
                .with_handler(wrap(print_handler)),
        )
        .with_command(
            CommandDescriptor::new("println", "print the text and a new line to the console")
                .with_parameter(
                    ParameterDescriptor::positional("text", "the text to print", ValueType::Str)
                        .optional()
                        .with_default(serde_json::Value::String(String::new())),
                )
                .with_handler(wrap(println_handler)),
        );

    DescriptorUnit::new(BUILTIN_MODULE, "built-in shell commands")
        .with_group(shell_group)
        .with_group(console_group)
}

fn help_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    let short = cmd.flag("s");
    let verbose = cmd.flag("v");
    let comparison = ctx.config.comparison;

    let mut specs = ctx.store.read().all_specs();

    if let Some(name) = cmd.str_value("commandName") {
        specs.retain(|spec| comparison.eq(&spec.name, name));
        if specs.is_empty() {
            ctx.out.writeln(&format!("unknown command: '{}'", name));
            return Ok(CommandOutcome::Continue);
        }
        for (index, spec) in specs.iter().enumerate() {
            if index > 0 {
                ctx.out.writeln("");
            }
            print_command_help(ctx.out.as_ref(), spec, short, verbose);
        }
        return Ok(CommandOutcome::Continue);
    }

    if let Some(type_name) = cmd.str_value("t") {
        if type_name == "*" {
            list_groups(ctx);
            return Ok(CommandOutcome::Continue);
        }
        if !specs.iter().any(|spec| spec.group_name == type_name) {
            ctx.out
                .writeln(&format!("unknown command declaring type: '{}'", type_name));
            return Ok(CommandOutcome::Continue);
        }
        specs.retain(|spec| spec.group_name == type_name);
    }

    if let Some(module_name) = cmd.str_value("m") {
        if module_name == "*" {
            list_modules(ctx, false);
            return Ok(CommandOutcome::Continue);
        }
        if !ctx.modules.read().contains(module_name) {
            ctx.out
                .writeln(&format!("unknown commands module: '{}'", module_name));
            return Ok(CommandOutcome::Continue);
        }
        specs.retain(|spec| spec.module_name == module_name);
    }

    // 同名重载只在列表里出现一次，除非要求全部
    if !cmd.flag("all") {
        specs.dedup_by(|a, b| comparison.eq(&a.name, &b.name));
    }

    let name_width = specs
        .iter()
        .map(|spec| spec.name.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    if verbose && !short {
        let group_width = specs
            .iter()
            .map(|spec| spec.group_name.chars().count())
            .max()
            .unwrap_or(0)
            + 2;
        let module_width = specs
            .iter()
            .map(|spec| spec.module_name.chars().count())
            .max()
            .unwrap_or(0)
            + 2;
        for spec in &specs {
            ctx.out.writeln(&format!(
                "{:<name_width$}{:<module_width$}{:<group_width$}{}",
                spec.name, spec.module_name, spec.group_name, spec.description,
            ));
        }
    } else {
        for spec in &specs {
            ctx.out
                .writeln(&format!("{:<name_width$}{}", spec.name, spec.description));
        }
    }
    Ok(CommandOutcome::Continue)
}

/// 单条命令的完整帮助
fn print_command_help(
    out: &dyn Output,
    spec: &crate::command::spec::CommandSpecification,
    short: bool,
    verbose: bool,
) {
    out.writeln(&spec.description);
    if spec.parameters_count() > 0 {
        out.writeln(&format!("syntax: {}", spec.syntax_string()));
        if !short {
            let width = spec
                .parameters()
                .iter()
                .map(|p| p.dump().chars().count())
                .max()
                .unwrap_or(0)
                + 4;
            for parameter in spec.parameters() {
                out.writeln(&format!(
                    "    {:<width$}{}",
                    parameter.dump(),
                    parameter.description,
                ));
                if verbose {
                    let mut notes = Vec::new();
                    if parameter.has_value {
                        notes.push(format!("of type {}", parameter.value_type));
                    }
                    if let Some(default) = &parameter.default_value {
                        notes.push(format!("default value {}", default));
                    }
                    if !notes.is_empty() {
                        out.writeln(&format!("    {:<width$}{}", "", notes.join(", ")));
                    }
                }
            }
        }
    }
    if !short {
        if let Some(text) = &spec.long_description {
            out.writeln(text);
        }
    }
    if verbose {
        if let Some(text) = &spec.documentation {
            out.writeln(text);
        }
        out.writeln(&format!("type  : {}", spec.group_name));
        out.writeln(&format!("module: {}", spec.module_name));
    }
}

/// `help -t *`：列出全部命令声明类型
fn list_groups(ctx: &ShellContext) {
    let mut groups: Vec<(String, String)> = ctx
        .modules
        .read()
        .modules()
        .flat_map(|module| {
            module
                .groups()
                .iter()
                .map(|group| (group.name.clone(), group.description.clone()))
        })
        .collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups.dedup_by(|a, b| a.0 == b.0);
    let width = groups.iter().map(|g| g.0.chars().count()).max().unwrap_or(0) + 2;
    for (name, description) in groups {
        ctx.out.writeln(&format!("{:<width$}{}", name, description));
    }
}

/// 模块列表（`help -m *` 与 `module`）
fn list_modules(ctx: &ShellContext, with_counts: bool) {
    let modules = ctx.modules.read();
    if modules.count() == 0 {
        ctx.out.writeln("no commands modules registered");
        return;
    }
    let width = modules
        .modules()
        .map(|module| module.name.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    for module in modules.modules() {
        if with_counts {
            ctx.out.writeln(&format!(
                "{:<width$}{} [{} in {}]",
                module.name,
                module.description,
                count_noun(module.commands_count, "command"),
                count_noun(module.types_count, "type"),
            ));
            if let Some(location) = &module.location {
                ctx.out
                    .writeln(&format!("{:<width$}path: {}", "", location.display()));
            }
        } else {
            ctx.out
                .writeln(&format!("{:<width$}{}", module.name, module.description));
        }
    }
}

fn module_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    let load = cmd.path_value("l");
    let unload = cmd.str_value("u").map(str::to_string);

    if load.is_none() && unload.is_none() {
        list_modules(ctx, true);
        return Ok(CommandOutcome::Continue);
    }

    if let Some(path) = load {
        let provider = ctx.unit_provider.clone();
        match provider(&path) {
            Err(e) => ctx.out.writeln(&format!("cannot load module: {}", e)),
            Ok(unit) => {
                let result = {
                    let mut store = ctx.store.write();
                    let mut modules = ctx.modules.write();
                    modules.register_unit(&mut store, unit.as_ref())
                };
                match result {
                    Err(e) => ctx.out.writeln(&format!("cannot register module: {}", e)),
                    Ok((_, 0)) => ctx.out.writeln("no commands have been loaded"),
                    Ok((types, commands)) => ctx.out.writeln(&format!(
                        "loaded {} in {}",
                        count_noun(commands, "command"),
                        count_noun(types, "type"),
                    )),
                }
            }
        }
    }

    if let Some(name) = unload {
        if name == BUILTIN_MODULE {
            ctx.out.writeln("cannot unload the built-in commands module");
            return Ok(CommandOutcome::Continue);
        }
        if !ctx.modules.read().contains(&name) {
            ctx.out
                .writeln(&format!("commands module '{}' not registered", name));
            return Ok(CommandOutcome::Continue);
        }
        let (types, commands) = {
            let mut store = ctx.store.write();
            let mut modules = ctx.modules.write();
            modules.unregister_module(&mut store, &name)
        };
        if commands == 0 {
            ctx.out.writeln("no commands have been unloaded");
        } else {
            ctx.out.writeln(&format!(
                "unloaded {} in {}",
                count_noun(commands, "command"),
                count_noun(types, "type"),
            ));
        }
    }
    Ok(CommandOutcome::Continue)
}

fn prompt_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    if let Some(text) = cmd.str_value("text") {
        ctx.prompt = text.to_string();
    }
    Ok(CommandOutcome::Continue)
}

fn exit_handler(_ctx: &mut ShellContext, _cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    Ok(CommandOutcome::Exit)
}

fn cpinfo_handler(ctx: &mut ShellContext, _cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    let (modules_count, types_count) = {
        let modules = ctx.modules.read();
        (
            modules.count(),
            modules.modules().map(|m| m.types_count).sum::<usize>(),
        )
    };
    let (names_count, syntaxes_count) = {
        let store = ctx.store.read();
        (store.names_count(), store.syntaxes_count())
    };
    ctx.out
        .writeln(&format!("modules count  : {}", modules_count));
    ctx.out.writeln(&format!("types count    : {}", types_count));
    ctx.out.writeln(&format!("commands count : {}", names_count));
    ctx.out
        .writeln(&format!("syntaxes count : {}", syntaxes_count));
    ctx.out
        .writeln(&format!("history length : {}", ctx.history.read().len()));
    Ok(CommandOutcome::Continue)
}

fn history_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    if let Some(number) = cmd.int_value("i") {
        let entry = {
            let history = ctx.history.read();
            if number < 1 || number as usize > history.len() {
                ctx.out.writeln(&format!(
                    "line number out of bounds of the commands history (1..{})",
                    history.len(),
                ));
                return Ok(CommandOutcome::Continue);
            }
            history.get(number as usize).cloned()
        };
        if let Some(entry) = entry {
            return Ok(CommandOutcome::SendNextInput(entry));
        }
        return Ok(CommandOutcome::Continue);
    }

    if cmd.flag("c") {
        ctx.history.write().clear();
        return Ok(CommandOutcome::Continue);
    }

    let write = cmd.flag("w");
    let append = cmd.flag("a");
    let read = cmd.flag("r");
    let merge = cmd.flag("n");
    if write || append || read || merge {
        // w/a/r/n 均声明 requires(file)，匹配阶段已保证 file 在场
        let Some(file) = cmd.path_value("file") else {
            debug_assert!(false, "file parameter missing after match");
            return Ok(CommandOutcome::Continue);
        };
        if write {
            ctx.history.read().write_to_file(&file)?;
        }
        if append {
            ctx.history.read().append_to_file(&file)?;
        }
        if read {
            ctx.history.write().read_from_file(&file)?;
        }
        if merge {
            ctx.history.write().merge_from_file(&file)?;
        }
        return Ok(CommandOutcome::Continue);
    }

    let history = ctx.history.read();
    let width = history.len().to_string().chars().count();
    for (index, entry) in history.entries().iter().enumerate() {
        // 长列表在取消点截断
        if ctx.cancellation.is_cancelled() {
            break;
        }
        ctx.out
            .writeln(&format!("  {:>width$}  {}", index + 1, entry));
    }
    Ok(CommandOutcome::Continue)
}

fn history_previous_handler(
    ctx: &mut ShellContext,
    _cmd: &BoundCommand,
) -> AppResult<CommandOutcome> {
    let last = ctx.history.read().last().cloned();
    match last {
        Some(line) => Ok(CommandOutcome::SendNextInput(line)),
        None => Ok(CommandOutcome::Continue),
    }
}

fn history_run_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    let number = cmd.int_value("n").unwrap_or(0);
    let entry = {
        let history = ctx.history.read();
        let len = history.len() as i64;
        // 负数从最近一条向前数
        let index = if number < 0 { len + number } else { number - 1 };
        if index < 0 || index >= len {
            ctx.out.writeln(&format!(
                "line number out of bounds of the commands history (1..{})",
                len,
            ));
            return Ok(CommandOutcome::Continue);
        }
        history.get(index as usize + 1).cloned()
    };
    match entry {
        Some(line) => Ok(CommandOutcome::SendNextInput(line)),
        None => Ok(CommandOutcome::Continue),
    }
}

fn print_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    ctx.out.write(cmd.str_value("text").unwrap_or(""));
    Ok(CommandOutcome::Continue)
}

fn println_handler(ctx: &mut ShellContext, cmd: &BoundCommand) -> AppResult<CommandOutcome> {
    ctx.out.writeln(cmd.str_value("text").unwrap_or(""));
    Ok(CommandOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseResult, Resolver};
    use crate::shell::config::ShellConfig;
    use crate::shell::context::MemoryOutput;

    fn context() -> (ShellContext, Arc<MemoryOutput>) {
        let out = MemoryOutput::new();
        let ctx = ShellContext::new(ShellConfig::default(), out.clone());
        {
            let mut store = ctx.store.write();
            let mut modules = ctx.modules.write();
            modules
                .register_unit(&mut store, &builtin_unit())
                .unwrap();
        }
        (ctx, out)
    }

    fn exec(ctx: &mut ShellContext, line: &str) -> CommandOutcome {
        let resolver = Resolver::new(ctx.config.comparison, ctx.config.policy);
        let result = {
            let vars = ctx.variables.clone();
            let store = ctx.store.read();
            resolver.parse(&store, line, |name| vars.get(name).cloned())
        };
        let ParseResult::Valid { command } = result else {
            panic!("line did not resolve: {} ({:?})", line, result);
        };
        let handler = command.syntax.spec().handler().cloned().unwrap();
        handler(ctx, &command).unwrap()
    }

    #[test]
    fn test_builtins_register() {
        let (ctx, _out) = context();
        let store = ctx.store.read();
        for name in ["help", "module", "prompt", "exit", "cpinfo", "history", "!!", "!"] {
            assert!(
                !store.find_by_token(name, true, Default::default()).is_empty(),
                "missing builtin: {}",
                name,
            );
        }
    }

    #[test]
    fn test_help_lists_commands() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "help");
        let text = out.take();
        assert!(text.contains("help"));
        assert!(text.contains("module"));
        assert!(text.contains("println"));
    }

    #[test]
    fn test_help_for_unknown_command() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "help nosuchcommand");
        assert!(out.take().contains("unknown command: 'nosuchcommand'"));
    }

    #[test]
    fn test_help_by_type_star_lists_groups() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "help -t *");
        let text = out.take();
        assert!(text.contains("shell"));
        assert!(text.contains("console"));
    }

    #[test]
    fn test_help_by_unknown_type() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "help -t nosuchtype");
        assert!(out.take().contains("unknown command declaring type"));
    }

    #[test]
    fn test_help_single_command_prints_syntax() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "help history");
        let text = out.take();
        assert!(text.contains("syntax: history"));
        assert!(text.contains("[-c]"));
    }

    #[test]
    fn test_prompt_changes_context_prompt() {
        let (mut ctx, _out) = context();
        exec(&mut ctx, "prompt \"sh% \"");
        assert_eq!(ctx.prompt, "sh% ");
    }

    #[test]
    fn test_exit_outcome() {
        let (mut ctx, _out) = context();
        assert_eq!(exec(&mut ctx, "exit"), CommandOutcome::Exit);
    }

    #[test]
    fn test_print_and_println() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "print \"a b\"");
        exec(&mut ctx, "println c");
        assert_eq!(out.take(), "a bc\n");
        // 无参数时打印缺省空文本
        exec(&mut ctx, "println");
        assert_eq!(out.take(), "\n");
    }

    #[test]
    fn test_history_listing_and_clear() {
        let (mut ctx, out) = context();
        ctx.history.write().append("println one");
        ctx.history.write().append("println two");
        exec(&mut ctx, "history");
        let text = out.take();
        assert!(text.contains("1  println one"));
        assert!(text.contains("2  println two"));

        exec(&mut ctx, "history -c");
        assert!(ctx.history.read().is_empty());
    }

    #[test]
    fn test_history_run_by_number() {
        let (mut ctx, _out) = context();
        ctx.history.write().append("println one");
        ctx.history.write().append("println two");
        assert_eq!(
            exec(&mut ctx, "history -i 1"),
            CommandOutcome::SendNextInput("println one".into()),
        );
        assert_eq!(
            exec(&mut ctx, "! -1"),
            CommandOutcome::SendNextInput("println two".into()),
        );
        assert_eq!(
            exec(&mut ctx, "!!"),
            CommandOutcome::SendNextInput("println two".into()),
        );
    }

    #[test]
    fn test_history_run_out_of_bounds() {
        let (mut ctx, out) = context();
        ctx.history.write().append("println one");
        assert_eq!(exec(&mut ctx, "! 5"), CommandOutcome::Continue);
        assert!(out.take().contains("out of bounds"));
        assert_eq!(exec(&mut ctx, "history -i 0"), CommandOutcome::Continue);
        assert!(out.take().contains("out of bounds"));
    }

    #[test]
    fn test_history_file_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.txt");
        let (mut ctx, _out) = context();
        ctx.history.write().append("println one");
        exec(&mut ctx, &format!("history -w {}", path.display()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "println one\n");

        exec(&mut ctx, "history -c");
        exec(&mut ctx, &format!("history -r {}", path.display()));
        assert_eq!(ctx.history.read().entries(), &["println one".to_string()]);
    }

    #[test]
    fn test_module_listing_and_unload_guard() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "module");
        let text = out.take();
        assert!(text.contains(BUILTIN_MODULE));
        assert!(text.contains("in 2 types"));

        exec(&mut ctx, "module -u orbitsh");
        assert!(out.take().contains("cannot unload the built-in commands module"));

        exec(&mut ctx, "module -u nosuchmodule");
        assert!(out
            .take()
            .contains("commands module 'nosuchmodule' not registered"));
    }

    #[test]
    fn test_cpinfo_reports_counts() {
        let (mut ctx, out) = context();
        exec(&mut ctx, "cpinfo");
        let text = out.take();
        assert!(text.contains("modules count  : 1"));
        assert!(text.contains("types count    : 2"));
        assert!(text.contains("history length : 0"));
    }
}
