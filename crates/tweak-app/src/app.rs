use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;

use tweak_config::ConsoleSettings;
use tweak_core::{
    action::{Action, ActionId},
    command::{self, CommandContext, CommandOutput, CommandRegistry},
    console::Console,
    logging::{self, LogBuffer, LogLevel},
    registry::{Registration, Registry, RegistryListener},
    variable::Variable,
};
use tweak_ui::{
    console::{render_console, ConsoleView},
    layout::overlay_layout,
    panel::{render_actions_panel, PanelState},
    shell::{render_shell, ShellView},
    view_model::{Activation, ActionsViewModel, ViewState},
};

use crate::demo::{render_arena, Arena};

/// Logs registry changes at info level so they show up in the console.
struct AuditListener;

impl RegistryListener for AuditListener {
    fn on_action_registered(&self, _registry: &Registry, action: &Action) {
        tracing::info!(target: "registry", id = %action.id(), "action added: {}", action.name());
    }

    fn on_action_changed(&self, _registry: &Registry, action: &Action) {
        tracing::info!(target: "registry", id = %action.id(), "action changed: {}", action.name());
    }

    fn on_action_unregistered(&self, _registry: &Registry, action: &Action) {
        tracing::info!(target: "registry", id = %action.id(), "action removed: {}", action.name());
    }

    fn on_actions_cleared(&self, _registry: &Registry) {
        tracing::info!(target: "registry", "actions cleared");
    }

    fn on_variable_registered(&self, _registry: &Registry, variable: &Variable) {
        tracing::info!(
            target: "registry",
            id = %variable.id(),
            "variable added: {}",
            variable.name()
        );
    }

    fn on_variable_updated(&self, _registry: &Registry, variable: &Variable) {
        tracing::info!(
            target: "registry",
            id = %variable.id(),
            "variable {} = {}",
            variable.name(),
            variable.value()
        );
    }

    fn on_variable_unregistered(&self, _registry: &Registry, variable: &Variable) {
        tracing::info!(
            target: "registry",
            id = %variable.id(),
            "variable removed: {}",
            variable.name()
        );
    }
}

/// Which part of the open overlay receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Panel,
}

pub struct App {
    pub registry: Registry,
    pub arena: Rc<Arena>,
    registration: Option<Registration>,
    pub view_model: ActionsViewModel,
    pub panel: PanelState,
    pub console: Console,
    commands: CommandRegistry,
    log_buffer: Option<LogBuffer>,
    settings: ConsoleSettings,
    pub focus: Focus,
    /// Action waiting for a y/n answer.
    pub pending: Option<(ActionId, String)>,
}

impl App {
    pub fn new(settings: ConsoleSettings, log_buffer: Option<LogBuffer>) -> Self {
        let registry = Registry::with_listener(AuditListener);
        let arena = Rc::new(Arena::new());
        let registration = registry.register(&arena);

        let view_model = ActionsViewModel::with_state(
            &registry,
            ViewState::with_collapsed(settings.collapsed_groups.iter().cloned()),
        );

        let mut console =
            Console::new(settings.log_capacity).with_history_size(settings.history_size);
        console.set_visible(settings.start_visible);
        match settings.min_level.parse::<LogLevel>() {
            Ok(level) => console.set_min_level(level),
            Err(e) => tracing::warn!(error = %e, "ignoring min_level"),
        }

        Self {
            registry,
            arena,
            registration: Some(registration),
            view_model,
            panel: PanelState::new(),
            console,
            commands: command::builtin_registry(),
            log_buffer,
            settings,
            focus: Focus::Input,
            pending: None,
        }
    }

    /// Drain new entries from the shared log buffer into the console.
    pub fn sync_logs(&mut self) {
        if let Some(buffer) = &self.log_buffer {
            for entry in logging::drain(buffer) {
                self.console.push_log(entry);
            }
        }
    }

    fn say(&mut self, line: impl Into<String>) {
        self.console.push_line(LogLevel::Info, "console", line);
    }

    /// Execute a console command and handle the output. Returns true when
    /// the app should quit.
    pub fn dispatch_command(&mut self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return false;
        }

        // Echo the command itself
        self.say(format!("> {}", trimmed));

        let mut ctx = CommandContext {
            registry: &self.registry,
            console: &mut self.console,
        };
        match self.commands.execute(trimmed, &mut ctx) {
            CommandOutput::Lines(lines) => {
                for line in lines {
                    self.say(line);
                }
                false
            }
            CommandOutput::Quit => true,
        }
    }

    fn report(&mut self, activation: Activation) {
        match activation {
            Activation::Toggled { .. } | Activation::Nothing => {}
            Activation::Ran(name) => self.say(format!("ran {}", name)),
            Activation::NeedsConfirmation { id, name } => {
                self.pending = Some((id, name));
            }
            Activation::Updated { name, value } => self.say(format!("{} = {}", name, value)),
            Activation::NotEditable(name) => {
                self.say(format!("{} cannot be toggled; use 'set {} <value>'", name, name))
            }
            Activation::Failed(err) => self.console.push_line(LogLevel::Error, "console", err),
        }
    }

    /// Ask the user before running a confirmation-required action.
    pub fn prompt(&self) -> Option<String> {
        self.pending
            .as_ref()
            .map(|(_, name)| format!("Run '{}'? (y/n)", name))
    }

    fn answer(&mut self, yes: bool) {
        let Some((id, name)) = self.pending.take() else {
            return;
        };
        if yes {
            let activation = self.view_model.confirm(id);
            self.report(activation);
        } else {
            self.say(format!("cancelled {}", name));
        }
    }

    /// Advance the demo one frame.
    pub fn tick(&mut self) {
        self.arena.tick(&self.registry);
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        // The toggle key always opens and closes the overlay
        if key.code == KeyCode::Char(self.settings.toggle_char()) {
            self.console.toggle();
            self.pending = None;
            return false;
        }

        if !self.console.is_visible() {
            return matches!(key.code, KeyCode::Char('q'));
        }

        if self.pending.is_some() {
            self.answer(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
            return false;
        }

        match (self.focus, key.code) {
            (_, KeyCode::Esc) => self.console.set_visible(false),
            (_, KeyCode::Tab) => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Panel,
                    Focus::Panel => Focus::Input,
                };
                if self.panel.selected().is_none() {
                    self.panel.select_next(self.view_model.len());
                }
            }
            (_, KeyCode::PageUp) => self.console.scroll_up(10),
            (_, KeyCode::PageDown) => self.console.scroll_down(10),

            (Focus::Panel, KeyCode::Up) => self.panel.select_prev(self.view_model.len()),
            (Focus::Panel, KeyCode::Down) => self.panel.select_next(self.view_model.len()),
            (Focus::Panel, KeyCode::Enter | KeyCode::Char(' ')) => {
                if let Some(index) = self.panel.selected() {
                    let activation = self.view_model.activate(index);
                    self.report(activation);
                    self.panel.clamp(self.view_model.len());
                }
            }
            (Focus::Panel, _) => {}

            (Focus::Input, KeyCode::Enter) => {
                let input = self.console.submit_input();
                return self.dispatch_command(&input);
            }
            (Focus::Input, KeyCode::Backspace) => self.console.backspace(),
            (Focus::Input, KeyCode::Left) => self.console.cursor_left(),
            (Focus::Input, KeyCode::Right) => self.console.cursor_right(),
            (Focus::Input, KeyCode::Up) => self.console.history_prev(),
            (Focus::Input, KeyCode::Down) => self.console.history_next(),
            (Focus::Input, KeyCode::Char(c)) => self.console.insert_char(c),
            (Focus::Input, _) => {}
        }
        false
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        let status = self.arena.status_line();
        let view = ShellView {
            title: "TWEAK",
            status_line: &status,
            toggle_key: self.settings.toggle_char(),
        };
        let (arena, registry) = (&self.arena, &self.registry);
        render_shell(f, area, view, |f, hero| render_arena(f, hero, arena, registry));

        if !self.console.is_visible() {
            return;
        }
        let Some(rects) = overlay_layout(area, self.settings.overlay_fraction) else {
            return;
        };

        let hint = format!("{} close  tab focus", self.settings.toggle_char());
        let prompt = self.prompt();
        render_console(
            f,
            rects.console,
            &self.console,
            ConsoleView {
                hint: &hint,
                prompt: prompt.as_deref(),
                show_cursor: self.focus == Focus::Input,
            },
        );
        let items = self.view_model.current();
        render_actions_panel(f, rects.panel, &items, &mut self.panel, self.focus == Focus::Panel);
    }

    /// Unregister the demo target before shutdown.
    pub fn shutdown(&mut self) {
        if let Some(registration) = self.registration.take() {
            let removed = registration.dispose();
            tracing::info!(removed, "demo arena unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(app: &mut App, text: &str) -> bool {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter))
    }

    fn open_app() -> App {
        let settings = ConsoleSettings {
            start_visible: true,
            min_level: "trace".into(),
            ..ConsoleSettings::default()
        };
        App::new(settings, None)
    }

    fn last_line(app: &App) -> String {
        app.console.log_lines().back().map(|e| e.message.clone()).unwrap_or_default()
    }

    #[test]
    fn toggle_key_opens_and_closes() {
        let mut app = App::new(ConsoleSettings::default(), None);
        assert!(!app.console.is_visible());
        app.handle_key(key(KeyCode::Char('`')));
        assert!(app.console.is_visible());
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.console.is_visible());
    }

    #[test]
    fn q_quits_only_when_closed() {
        let mut app = open_app();
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert_eq!(app.console.input_buffer, "q");
        app.handle_key(key(KeyCode::Esc));
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn typed_command_runs_against_registry() {
        let mut app = open_app();
        type_line(&mut app, "run Spawn Enemy");
        assert_eq!(app.arena.enemies(), 2);
        assert_eq!(last_line(&app), "ran Spawn Enemy");
        assert_eq!(app.console.history().back().map(String::as_str), Some("run Spawn Enemy"));
    }

    #[test]
    fn quit_command_ends_app() {
        let mut app = open_app();
        assert!(type_line(&mut app, "quit"));
    }

    #[test]
    fn panel_confirmation_flow() {
        let mut app = open_app();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Panel);

        let rows = app.view_model.current();
        let reset = rows.iter().position(|r| r.title() == "Reset Arena").unwrap();
        app.registry
            .invoke_action(app.registry.find_action_by_name("Spawn Enemy").unwrap().id())
            .unwrap();
        while app.panel.selected() != Some(reset) {
            app.handle_key(key(KeyCode::Down));
        }

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.prompt().as_deref(), Some("Run 'Reset Arena'? (y/n)"));
        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.pending.is_none());
        assert_eq!(app.arena.enemies(), 2);

        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.arena.enemies(), 1);
        assert_eq!(last_line(&app), "ran Reset Arena");
    }

    #[test]
    fn panel_toggles_bool_variable() {
        let mut app = open_app();
        app.handle_key(key(KeyCode::Tab));
        let rows = app.view_model.current();
        let god = rows.iter().position(|r| r.title() == "god_mode").unwrap();
        while app.panel.selected() != Some(god) {
            app.handle_key(key(KeyCode::Down));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.registry.find_variable_by_name("god_mode").unwrap().value().as_bool(),
            Some(true)
        );
        assert_eq!(last_line(&app), "god_mode = true");
    }

    #[test]
    fn collapsed_groups_from_settings() {
        let settings = ConsoleSettings {
            collapsed_groups: vec!["Variables".into()],
            ..ConsoleSettings::default()
        };
        let app = App::new(settings, None);
        let rows = app.view_model.current();
        assert_eq!(rows.last().map(|r| r.title()), Some("Variables"));
    }

    fn draw_text(app: &mut App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect()
    }

    #[test]
    fn draws_shell_then_overlay() {
        let mut app = App::new(ConsoleSettings::default(), None);
        let text = draw_text(&mut app);
        assert!(text.contains("TWEAK"));
        assert!(text.contains("ARENA"));
        assert!(!text.contains("CONSOLE"));

        app.handle_key(key(KeyCode::Char('`')));
        type_line(&mut app, "echo hi");
        let text = draw_text(&mut app);
        assert!(text.contains("CONSOLE"));
        assert!(text.contains("ACTIONS"));
        assert!(text.contains("Spawn Enemy"));
        assert!(text.contains("> echo hi"));
    }

    #[test]
    fn shutdown_unregisters_arena() {
        let mut app = open_app();
        app.shutdown();
        assert_eq!(app.registry.action_count(), 0);
        assert_eq!(app.registry.variable_count(), 0);
        assert!(app.view_model.current().iter().all(|r| r.title() != "Spawn Enemy"));
    }
}
