use std::collections::HashMap;

use crate::action::{Action, ActionId};
use crate::console::Console;
use crate::group::by_group;
use crate::logging::LogLevel;
use crate::registry::{Registry, RegistryError};
use crate::variable::Variable;

/// Output from a command execution.
#[derive(Debug)]
pub enum CommandOutput {
    /// Lines to display in the console.
    Lines(Vec<String>),
    /// Signal that the app should quit.
    Quit,
}

/// Context available to commands during execution.
pub struct CommandContext<'a> {
    pub registry: &'a Registry,
    pub console: &'a mut Console,
}

/// A console command.
pub trait Command {
    fn name(&self) -> &str;
    fn aliases(&self) -> &[&str] { &[] }
    fn description(&self) -> &str;
    fn usage(&self) -> &str { self.name() }
    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput;
}

/// Registry of console commands.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    lookup: HashMap<String, usize>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let idx = self.commands.len();
        self.lookup.insert(cmd.name().to_string(), idx);
        for alias in cmd.aliases() {
            self.lookup.insert(alias.to_string(), idx);
        }
        self.commands.push(cmd);
    }

    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandOutput {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return CommandOutput::Lines(vec![]);
        };

        match self.lookup.get(name) {
            // help needs the command table itself
            Some(&idx) if self.commands[idx].name() == "help" => {
                CommandOutput::Lines(self.help_lines(args.first().copied()))
            }
            Some(&idx) => {
                tracing::debug!(command = self.commands[idx].name(), "executing console command");
                self.commands[idx].execute(args, ctx)
            }
            None => CommandOutput::Lines(vec![
                format!("unknown command: '{}'. Type 'help' for available commands.", name),
            ]),
        }
    }

    /// One line per command, or the usage of a single command.
    pub fn help_lines(&self, topic: Option<&str>) -> Vec<String> {
        match topic {
            Some(topic) => match self.lookup.get(topic) {
                Some(&idx) => {
                    let cmd = &self.commands[idx];
                    let mut lines = vec![
                        format!("usage: {}", cmd.usage()),
                        format!("  {}", cmd.description()),
                    ];
                    if !cmd.aliases().is_empty() {
                        lines.push(format!("  aliases: {}", cmd.aliases().join(", ")));
                    }
                    lines
                }
                None => vec![format!("no help for '{}'", topic)],
            },
            None => self
                .commands
                .iter()
                .map(|cmd| format!("  {:<24} {}", cmd.usage(), cmd.description()))
                .collect(),
        }
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }
}

fn error_line(err: impl std::fmt::Display) -> CommandOutput {
    CommandOutput::Lines(vec![format!("error: {}", err)])
}

// ── Built-in commands ──

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &str { "help" }
    fn aliases(&self) -> &[&str] { &["?"] }
    fn description(&self) -> &str { "List commands or show specific help" }
    fn usage(&self) -> &str { "help [command]" }

    fn execute(&self, _args: &[&str], _ctx: &mut CommandContext) -> CommandOutput {
        // CommandRegistry::execute answers help from its own table
        CommandOutput::Lines(vec!["Type 'help' to list all commands.".into()])
    }
}

pub struct ClearCommand;

impl Command for ClearCommand {
    fn name(&self) -> &str { "clear" }
    fn aliases(&self) -> &[&str] { &["cls"] }
    fn description(&self) -> &str { "Clear console log" }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        ctx.console.clear_logs();
        CommandOutput::Lines(vec![])
    }
}

pub struct QuitCommand;

impl Command for QuitCommand {
    fn name(&self) -> &str { "quit" }
    fn aliases(&self) -> &[&str] { &["exit", "q"] }
    fn description(&self) -> &str { "Exit the program" }

    fn execute(&self, _args: &[&str], _ctx: &mut CommandContext) -> CommandOutput {
        CommandOutput::Quit
    }
}

pub struct EchoCommand;

impl Command for EchoCommand {
    fn name(&self) -> &str { "echo" }
    fn description(&self) -> &str { "Print message to console" }
    fn usage(&self) -> &str { "echo <message>" }

    fn execute(&self, args: &[&str], _ctx: &mut CommandContext) -> CommandOutput {
        CommandOutput::Lines(vec![args.join(" ")])
    }
}

pub struct LevelCommand;

impl Command for LevelCommand {
    fn name(&self) -> &str { "level" }
    fn description(&self) -> &str { "Show or set the minimum log level shown" }
    fn usage(&self) -> &str { "level [trace|debug|info|warn|error]" }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let Some(arg) = args.first() else {
            return CommandOutput::Lines(vec![format!("level: {}", ctx.console.min_level())]);
        };
        match arg.parse::<LogLevel>() {
            Ok(level) => {
                ctx.console.set_min_level(level);
                CommandOutput::Lines(vec![format!("level: {}", level)])
            }
            Err(e) => error_line(e),
        }
    }
}

/// Label used for an action in listings: `#3 Spawn Enemy (confirm)`.
fn action_line(action: &Action) -> String {
    let confirm = if action.requires_confirmation() { " (confirm)" } else { "" };
    format!("  {} {}{}", action.id(), action.name(), confirm)
}

pub struct ActionsCommand;

impl Command for ActionsCommand {
    fn name(&self) -> &str { "actions" }
    fn aliases(&self) -> &[&str] { &["ls"] }
    fn description(&self) -> &str { "List registered actions" }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let actions = ctx.registry.actions();
        if actions.is_empty() {
            return CommandOutput::Lines(vec!["no actions registered".into()]);
        }
        let mut lines = Vec::new();
        for (group, members) in by_group(&actions, |a| a.group()) {
            if let Some(group) = group {
                lines.push(format!("[{}]", group));
            }
            lines.extend(members.into_iter().map(action_line));
        }
        CommandOutput::Lines(lines)
    }
}

/// Exact name first, then a name equal up to runs of whitespace, since
/// console arguments arrive split on spaces.
fn find_action_named(registry: &Registry, name: &str) -> Option<Action> {
    registry.find_action_by_name(name).or_else(|| {
        registry
            .actions()
            .into_iter()
            .find(|a| a.name().split_whitespace().eq(name.split_whitespace()))
    })
}

pub struct RunCommand;

impl Command for RunCommand {
    fn name(&self) -> &str { "run" }
    fn aliases(&self) -> &[&str] { &["do"] }
    fn description(&self) -> &str { "Invoke an action by name or #id" }
    fn usage(&self) -> &str { "run <name|#id> [--yes]" }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let confirmed = args.iter().any(|a| *a == "--yes" || *a == "-y");
        let target = args
            .iter()
            .filter(|a| **a != "--yes" && **a != "-y")
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if target.is_empty() {
            return CommandOutput::Lines(vec![format!("usage: {}", self.usage())]);
        }

        let found = match target.strip_prefix('#').map(str::parse::<u32>) {
            Some(Ok(id)) => ctx.registry.find_action(ActionId(id)),
            Some(Err(_)) => None,
            None => find_action_named(ctx.registry, &target),
        };
        let Some(action) = found else {
            return error_line(RegistryError::UnknownAction(target));
        };

        let result = if confirmed {
            ctx.registry.invoke_action_confirmed(action.id())
        } else {
            ctx.registry.invoke_action(action.id())
        };
        match result {
            Ok(()) => CommandOutput::Lines(vec![format!("ran {}", action.name())]),
            Err(RegistryError::ConfirmationRequired(name)) => CommandOutput::Lines(vec![format!(
                "'{}' requires confirmation: run {} --yes",
                name, action.id()
            )]),
            Err(e) => error_line(e),
        }
    }
}

/// Label used for a variable in listings: `$0 god_mode = true (bool) *`.
fn variable_line(variable: &Variable) -> String {
    let mut line = format!(
        "  {} {} = {} ({})",
        variable.id(),
        variable.name(),
        variable.value(),
        variable.kind()
    );
    if let Some(range) = variable.range() {
        line.push_str(&format!(" [{}..{}]", range.min, range.max));
    }
    if variable.flags().read_only {
        line.push_str(" read-only");
    }
    if variable.flags().hidden {
        line.push_str(" hidden");
    }
    if !variable.is_default() {
        line.push_str(" *");
    }
    line
}

pub struct VarsCommand;

impl Command for VarsCommand {
    fn name(&self) -> &str { "vars" }
    fn description(&self) -> &str { "List variables with their values" }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let variables = ctx.registry.variables();
        if variables.is_empty() {
            return CommandOutput::Lines(vec!["no variables registered".into()]);
        }
        let mut lines = Vec::new();
        for (group, members) in by_group(&variables, |v| v.group()) {
            if let Some(group) = group {
                lines.push(format!("[{}]", group));
            }
            lines.extend(members.into_iter().map(variable_line));
        }
        CommandOutput::Lines(lines)
    }
}

pub struct GetCommand;

impl Command for GetCommand {
    fn name(&self) -> &str { "get" }
    fn description(&self) -> &str { "Show a variable's value and default" }
    fn usage(&self) -> &str { "get <name>" }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let Some(name) = args.first() else {
            return CommandOutput::Lines(vec![format!("usage: {}", self.usage())]);
        };
        match ctx.registry.find_variable_by_name(name) {
            Some(v) => {
                let mut lines = vec![format!(
                    "{} = {} (default: {})",
                    v.name(),
                    v.value(),
                    v.default_value()
                )];
                if let crate::variable::VarValue::Choice { options, .. } = v.value() {
                    lines.push(format!("  options: {}", options.join(", ")));
                }
                CommandOutput::Lines(lines)
            }
            None => error_line(crate::variable::VariableError::UnknownVariable(name.to_string())),
        }
    }
}

pub struct SetCommand;

impl Command for SetCommand {
    fn name(&self) -> &str { "set" }
    fn description(&self) -> &str { "Set a variable from text" }
    fn usage(&self) -> &str { "set <name> <value>" }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let [name, value @ ..] = args else {
            return CommandOutput::Lines(vec![format!("usage: {}", self.usage())]);
        };
        if value.is_empty() {
            return CommandOutput::Lines(vec![format!("usage: {}", self.usage())]);
        }
        match ctx.registry.set_variable_from_str(name, &value.join(" ")) {
            Ok(v) => CommandOutput::Lines(vec![format!("{} = {}", v.name(), v.value())]),
            Err(e) => error_line(e),
        }
    }
}

pub struct ResetCommand;

impl Command for ResetCommand {
    fn name(&self) -> &str { "reset" }
    fn description(&self) -> &str { "Restore a variable, or all with '*'" }
    fn usage(&self) -> &str { "reset <name|*>" }

    fn execute(&self, args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        let Some(&name) = args.first() else {
            return CommandOutput::Lines(vec![format!("usage: {}", self.usage())]);
        };
        let targets: Vec<Variable> = if name == "*" {
            ctx.registry.variables()
        } else {
            match ctx.registry.find_variable_by_name(name) {
                Some(v) => vec![v],
                None => {
                    let err = crate::variable::VariableError::UnknownVariable(name.to_string());
                    return error_line(err);
                }
            }
        };

        let mut lines = Vec::new();
        for v in targets {
            match ctx.registry.reset_variable(v.id()) {
                Ok(true) => lines.push(format!("{} = {}", v.name(), v.default_value())),
                Ok(false) => {}
                Err(e) => lines.push(format!("error: {}", e)),
            }
        }
        if lines.is_empty() {
            lines.push("nothing to reset".into());
        }
        CommandOutput::Lines(lines)
    }
}

pub struct ExportCommand;

impl Command for ExportCommand {
    fn name(&self) -> &str { "export" }
    fn description(&self) -> &str { "Print all variables as JSON" }

    fn execute(&self, _args: &[&str], ctx: &mut CommandContext) -> CommandOutput {
        match serde_json::to_string_pretty(&ctx.registry.variables()) {
            Ok(json) => CommandOutput::Lines(json.lines().map(str::to_string).collect()),
            Err(e) => error_line(e),
        }
    }
}

/// Create a CommandRegistry pre-loaded with all built-in commands.
pub fn builtin_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    reg.register(Box::new(HelpCommand));
    reg.register(Box::new(ClearCommand));
    reg.register(Box::new(QuitCommand));
    reg.register(Box::new(EchoCommand));
    reg.register(Box::new(LevelCommand));
    reg.register(Box::new(ActionsCommand));
    reg.register(Box::new(RunCommand));
    reg.register(Box::new(VarsCommand));
    reg.register(Box::new(GetCommand));
    reg.register(Box::new(SetCommand));
    reg.register(Box::new(ResetCommand));
    reg.register(Box::new(ExportCommand));
    reg
}
