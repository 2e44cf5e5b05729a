use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "TWEAK_CONFIG";
/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "tweak.toml";

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Console settings loaded from `tweak.toml`. Every field is optional in the
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleSettings {
    /// Log lines kept in the overlay.
    pub log_capacity: usize,
    /// Submitted commands remembered for Up/Down.
    pub history_size: usize,
    /// Share of the screen height covered by the overlay.
    pub overlay_fraction: f64,
    pub start_visible: bool,
    /// Single character that opens and closes the overlay.
    pub toggle_key: String,
    /// Lowest level shown in the overlay log.
    pub min_level: String,
    /// Panel groups collapsed at startup: `Actions`, `Variables`, or
    /// `<section>/<group>`.
    pub collapsed_groups: Vec<String>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            log_capacity: 1000,
            history_size: 50,
            overlay_fraction: 0.5,
            start_visible: false,
            toggle_key: "`".to_string(),
            min_level: "info".to_string(),
            collapsed_groups: Vec::new(),
        }
    }
}

impl ConsoleSettings {
    /// Parse and validate settings TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let settings: Self = toml::from_str(input).context("failed to parse settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;

        Self::from_toml_str(&raw).with_context(|| format!("invalid settings at {}", path.display()))
    }

    /// Find the settings to use and where they came from.
    ///
    /// Precedence: the file named by `TWEAK_CONFIG` (which must exist) >
    /// `tweak.toml` in the working directory > built-in defaults.
    pub fn discover() -> Result<(Self, Option<PathBuf>)> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(explicit);
            let settings = Self::from_path(&path)
                .with_context(|| format!("{CONFIG_ENV} points at unusable settings"))?;
            return Ok((settings, Some(path)));
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            let settings = Self::from_path(&local)?;
            return Ok((settings, Some(local)));
        }

        Ok((Self::default(), None))
    }

    /// Validate ranges and formats.
    pub fn validate(&self) -> Result<()> {
        if self.log_capacity == 0 {
            bail!("log_capacity must be greater than zero");
        }
        if self.history_size == 0 {
            bail!("history_size must be greater than zero");
        }
        if !(0.1..=1.0).contains(&self.overlay_fraction) {
            bail!(
                "overlay_fraction must be between 0.1 and 1.0, got {}",
                self.overlay_fraction
            );
        }
        if self.toggle_key.chars().count() != 1 {
            bail!(
                "toggle_key must be a single character, got {:?}",
                self.toggle_key
            );
        }
        if !LEVELS.contains(&self.min_level.to_ascii_lowercase().as_str()) {
            bail!(
                "min_level must be one of {}, got {:?}",
                LEVELS.join(", "),
                self.min_level
            );
        }
        validate_groups(&self.collapsed_groups)?;
        Ok(())
    }

    pub fn toggle_char(&self) -> char {
        self.toggle_key.chars().next().unwrap_or('`')
    }
}

fn validate_groups(groups: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();

    for group in groups {
        if group.trim().is_empty() {
            bail!("collapsed_groups entries must not be empty");
        }
        if group.trim() != group {
            bail!("collapsed_groups entry {:?} has leading/trailing whitespace", group);
        }
        if !seen.insert(group.as_str()) {
            bail!("collapsed_groups contains duplicate entry {:?}", group);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid data races.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const FULL_SETTINGS: &str = r#"
log_capacity = 200
history_size = 10
overlay_fraction = 0.75
start_visible = true
toggle_key = "~"
min_level = "debug"
collapsed_groups = ["Variables", "Actions/Cheats"]
"#;

    #[test]
    fn defaults_are_valid() {
        let settings = ConsoleSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.toggle_char(), '`');
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(ConsoleSettings::from_toml_str("").unwrap(), ConsoleSettings::default());
    }

    #[test]
    fn parses_full_settings() {
        let settings = ConsoleSettings::from_toml_str(FULL_SETTINGS).unwrap();
        assert_eq!(settings.log_capacity, 200);
        assert_eq!(settings.history_size, 10);
        assert_eq!(settings.overlay_fraction, 0.75);
        assert!(settings.start_visible);
        assert_eq!(settings.toggle_char(), '~');
        assert_eq!(settings.min_level, "debug");
        assert_eq!(settings.collapsed_groups, vec!["Variables", "Actions/Cheats"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ConsoleSettings::from_toml_str("font = \"mono\"").unwrap_err().to_string();
        assert!(err.contains("failed to parse settings TOML"));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let raw = FULL_SETTINGS.replace("overlay_fraction = 0.75", "overlay_fraction = 1.5");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("overlay_fraction must be between"));
    }

    #[test]
    fn multi_char_toggle_key_is_rejected() {
        let raw = FULL_SETTINGS.replace("toggle_key = \"~\"", "toggle_key = \"F1\"");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("toggle_key must be a single character"));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let raw = FULL_SETTINGS.replace("min_level = \"debug\"", "min_level = \"loud\"");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("min_level must be one of"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let raw = FULL_SETTINGS.replace("log_capacity = 200", "log_capacity = 0");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("log_capacity must be greater than zero"));
    }

    #[test]
    fn duplicate_collapsed_groups_are_rejected() {
        let raw = FULL_SETTINGS.replace("\"Actions/Cheats\"", "\"Variables\"");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("collapsed_groups contains duplicate entry"));
    }

    #[test]
    fn padded_group_is_rejected() {
        let raw = FULL_SETTINGS.replace("\"Actions/Cheats\"", "\" Cheats\"");
        let err = ConsoleSettings::from_toml_str(&raw).unwrap_err().to_string();
        assert!(err.contains("leading/trailing whitespace"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConsoleSettings::from_path(Path::new("/nonexistent/tweak.toml"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("/nonexistent/tweak.toml"));
    }

    #[test]
    fn discover_prefers_env_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = std::env::var(CONFIG_ENV).ok();

        let path = std::env::temp_dir().join("tweak-test-discover.toml");
        std::fs::write(&path, "start_visible = true\n").unwrap();
        unsafe { std::env::set_var(CONFIG_ENV, &path) };

        let (settings, source) = ConsoleSettings::discover().unwrap();
        assert!(settings.start_visible);
        assert_eq!(source, Some(path.clone()));

        unsafe { std::env::set_var(CONFIG_ENV, "/nonexistent/tweak.toml") };
        assert!(ConsoleSettings::discover().is_err());

        match original {
            Some(v) => unsafe { std::env::set_var(CONFIG_ENV, v) },
            None => unsafe { std::env::remove_var(CONFIG_ENV) },
        }
        let _ = std::fs::remove_file(&path);
    }
}
