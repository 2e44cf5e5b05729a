//! A tiny arena "game" that exposes its knobs through the console.

use std::cell::Cell;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tweak_core::registry::Registry;
use tweak_core::target::{ConsoleTarget, Declarations, Signature};
use tweak_core::variable::{VarValue, VariableSpec};

pub const MAX_HEALTH: i32 = 100;
const MAX_ENEMIES: u32 = 20;

pub struct Arena {
    enemies: Cell<u32>,
    health: Cell<i32>,
    knockouts: Cell<u32>,
    ticks: Cell<u64>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            enemies: Cell::new(1),
            health: Cell::new(MAX_HEALTH),
            knockouts: Cell::new(0),
            ticks: Cell::new(0),
        }
    }

    pub fn enemies(&self) -> u32 {
        self.enemies.get()
    }

    pub fn health(&self) -> i32 {
        self.health.get()
    }

    pub fn knockouts(&self) -> u32 {
        self.knockouts.get()
    }

    // ── Console actions ──

    fn spawn_enemy(&self) {
        let enemies = (self.enemies.get() + 1).min(MAX_ENEMIES);
        self.enemies.set(enemies);
        tracing::info!(enemies, "enemy spawned");
    }

    fn clear_enemies(&self) {
        self.enemies.set(0);
        tracing::info!("arena cleared of enemies");
    }

    fn heal_player(&self) {
        self.health.set(MAX_HEALTH);
        tracing::info!(health = MAX_HEALTH, "player healed");
    }

    fn reset(&self) {
        self.enemies.set(1);
        self.health.set(MAX_HEALTH);
        self.knockouts.set(0);
        self.ticks.set(0);
        tracing::warn!("arena reset");
    }

    fn log_banner() {
        tracing::info!("tweak demo arena: press the toggle key to open the console");
    }

    // ── Simulation ──

    /// Advance one tick, reading the tunables from `registry`.
    ///
    /// Enemies strike every few ticks; `speed` shortens the interval and
    /// `difficulty` scales the damage. `god_mode` makes the player immune.
    pub fn tick(&self, registry: &Registry) {
        let ticks = self.ticks.get() + 1;
        self.ticks.set(ticks);

        let speed = registry
            .find_variable_by_name("speed")
            .and_then(|v| v.value().as_float())
            .unwrap_or(1.0)
            .max(0.1);
        let interval = ((10.0 / speed).round() as u64).max(1);
        if ticks % interval != 0 || self.enemies.get() == 0 {
            return;
        }

        let god_mode = registry
            .find_variable_by_name("god_mode")
            .and_then(|v| v.value().as_bool())
            .unwrap_or(false);
        if god_mode {
            return;
        }

        let multiplier = match registry
            .find_variable_by_name("difficulty")
            .and_then(|v| v.value().as_str().map(str::to_string))
            .as_deref()
        {
            Some("easy") => 1,
            Some("hard") => 3,
            _ => 2,
        };
        let health = self.health.get() - self.enemies.get() as i32 * multiplier;
        if health <= 0 {
            self.knockouts.set(self.knockouts.get() + 1);
            self.health.set(MAX_HEALTH);
            tracing::warn!(knockouts = self.knockouts.get(), "player knocked out");
        } else {
            self.health.set(health);
        }
    }

    pub fn status_line(&self) -> String {
        format!(
            "hp {}/{}  enemies {}  knockouts {}",
            self.health.get(),
            MAX_HEALTH,
            self.enemies.get(),
            self.knockouts.get()
        )
    }
}

impl ConsoleTarget for Arena {
    fn declare(decl: &mut Declarations<Self>) {
        decl.method("spawn_enemy", Arena::spawn_enemy).group("Enemies");
        decl.method("clear_enemies", Arena::clear_enemies).group("Enemies");
        decl.method("heal_player", Arena::heal_player).group("Player");
        decl.action("Reset Arena", Arena::reset).requires_confirmation();
        decl.static_action("Log Banner", Arena::log_banner);

        decl.unsupported("damage_player", Signature::Arguments(1));
        decl.unsupported("enemy_count", Signature::Returns("u32"));

        decl.variable(VariableSpec::new("god_mode", VarValue::Bool(false)).group("Cheats"));
        decl.variable(VariableSpec::new("speed", VarValue::Float(1.0)).range(0.5, 5.0));
        decl.variable(VariableSpec::new(
            "difficulty",
            VarValue::choice("normal", ["easy", "normal", "hard"]),
        ));
        decl.variable(
            VariableSpec::new("player_name", VarValue::Text("Player".into())).group("Player"),
        );
        let version = VarValue::Text(env!("CARGO_PKG_VERSION").into());
        decl.variable(VariableSpec::new("build", version).read_only());
        decl.variable(VariableSpec::new("rng_seed", VarValue::Int(7)).hidden());
    }
}

/// Draw the arena into the hero area.
pub fn render_arena(f: &mut Frame, area: Rect, arena: &Arena, registry: &Registry) {
    let name = registry
        .find_variable_by_name("player_name")
        .and_then(|v| v.value().as_str().map(str::to_string))
        .unwrap_or_default();
    let god_mode = registry
        .find_variable_by_name("god_mode")
        .and_then(|v| v.value().as_bool())
        .unwrap_or(false);

    let health_color = match arena.health() {
        h if h > MAX_HEALTH / 2 => Color::Green,
        h if h > MAX_HEALTH / 5 => Color::Yellow,
        _ => Color::Red,
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(if god_mode { "  (god mode)" } else { "" }),
        ]),
        Line::from(Span::styled(
            format!("HP {:>3}/{}", arena.health(), MAX_HEALTH),
            Style::default().fg(health_color),
        )),
        Line::from(format!("Knockouts {}", arena.knockouts())),
        Line::from(""),
    ];
    let row: String = "x ".repeat(arena.enemies() as usize);
    lines.push(Line::from(Span::styled(row, Style::default().fg(Color::Red))));

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" ARENA ")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn setup() -> (Registry, Rc<Arena>) {
        let registry = Registry::new();
        let arena = Rc::new(Arena::new());
        registry.register(&arena);
        (registry, arena)
    }

    #[test]
    fn registers_supported_members_only() {
        let (registry, arena) = setup();
        let names: Vec<String> = registry.actions().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["Spawn Enemy", "Clear Enemies", "Heal Player", "Reset Arena", "Log Banner"]
        );
        assert_eq!(registry.variable_count(), 6);
        assert_eq!(registry.actions_owned_by(&arena).len(), 4);
        assert!(registry.find_action_by_name("Damage Player").is_none());
    }

    #[test]
    fn actions_drive_the_arena() {
        let (registry, arena) = setup();
        let spawn = registry.find_action_by_name("Spawn Enemy").unwrap();
        registry.invoke_action(spawn.id()).unwrap();
        registry.invoke_action(spawn.id()).unwrap();
        assert_eq!(arena.enemies(), 3);

        let reset = registry.find_action_by_name("Reset Arena").unwrap();
        assert!(registry.invoke_action(reset.id()).is_err());
        registry.invoke_action_confirmed(reset.id()).unwrap();
        assert_eq!(arena.enemies(), 1);
    }

    #[test]
    fn enemies_strike_on_interval() {
        let (registry, arena) = setup();
        for _ in 0..9 {
            arena.tick(&registry);
        }
        assert_eq!(arena.health(), MAX_HEALTH);
        arena.tick(&registry);
        assert_eq!(arena.health(), MAX_HEALTH - 2);
    }

    #[test]
    fn god_mode_blocks_damage() {
        let (registry, arena) = setup();
        registry.set_variable_from_str("god_mode", "on").unwrap();
        for _ in 0..50 {
            arena.tick(&registry);
        }
        assert_eq!(arena.health(), MAX_HEALTH);
    }

    #[test]
    fn hard_and_fast_knocks_out() {
        let (registry, arena) = setup();
        registry.set_variable_from_str("difficulty", "hard").unwrap();
        registry.set_variable_from_str("speed", "5").unwrap();
        for _ in 0..20 {
            let spawn = registry.find_action_by_name("Spawn Enemy").unwrap();
            registry.invoke_action(spawn.id()).unwrap();
        }
        // 20 enemies * 3 damage every 2 ticks
        for _ in 0..4 {
            arena.tick(&registry);
        }
        assert_eq!(arena.knockouts(), 1);
        assert_eq!(arena.health(), MAX_HEALTH);
    }

    #[test]
    fn unregistering_the_arena_leaves_static_action() {
        let (registry, arena) = setup();
        let removed = registry.unregister_all(&arena);
        assert_eq!(removed, 4 + 6);
        let names: Vec<String> = registry.actions().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["Log Banner"]);
    }
}
