use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use ghost_trail_core::{Action, Rules};
use serde::Deserialize;

/// File looked up in the working directory when no `--config` is given.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "ghost-trail.toml";

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Script characters bound to each action. Every character in a string is a key.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct KeyBindings {
    pub(crate) right: String,
    pub(crate) up: String,
    pub(crate) left: String,
    pub(crate) down: String,
    pub(crate) choose: String,
    pub(crate) pause: String,
    pub(crate) restart: String,
    pub(crate) undo: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            right: "d".to_owned(),
            up: "w".to_owned(),
            left: "a".to_owned(),
            down: "s".to_owned(),
            choose: "e".to_owned(),
            pause: "p".to_owned(),
            restart: "r".to_owned(),
            undo: "z".to_owned(),
        }
    }
}

impl KeyBindings {
    fn keys(&self, action: Action) -> &str {
        match action {
            Action::Right => &self.right,
            Action::Up => &self.up,
            Action::Left => &self.left,
            Action::Down => &self.down,
            Action::Choose => &self.choose,
            Action::Pause => &self.pause,
            Action::Restart => &self.restart,
            Action::Undo => &self.undo,
        }
    }

    /// Resolves the lookup table, rejecting keys bound to more than one action.
    pub(crate) fn resolve(&self) -> Result<HashMap<char, Action>> {
        let mut table = HashMap::new();
        for action in Action::ALL {
            for key in self.keys(action).chars() {
                if key == IDLE_KEY || key.is_whitespace() {
                    bail!("key {key:?} is reserved and cannot be bound to {action:?}");
                }
                if let Some(previous) = table.insert(key, action) {
                    bail!("key {key:?} is bound to both {previous:?} and {action:?}");
                }
            }
        }
        Ok(table)
    }
}

/// Script character that lets one idle frame pass.
pub(crate) const IDLE_KEY: char = '.';

/// Contents of `ghost-trail.toml`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) version: u32,
    pub(crate) progress_path: PathBuf,
    pub(crate) keys: KeyBindings,
    pub(crate) rules: Rules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            progress_path: PathBuf::from("ghost-trail.progress"),
            keys: KeyBindings::default(),
            rules: Rules::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when it exists.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !fallback.exists() {
                    log::debug!("no {DEFAULT_CONFIG_PATH} found, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config toml")?;
        if config.version != SUPPORTED_CONFIG_VERSION {
            bail!(
                "unsupported config version {}; expected {}",
                config.version,
                SUPPORTED_CONFIG_VERSION
            );
        }
        if !(config.rules.move_speed > 0.0 && config.rules.move_speed <= 1.0) {
            bail!(
                "rules.move_speed must be in (0, 1], got {}",
                config.rules.move_speed
            );
        }
        if config.rules.history_capacity == 0 {
            bail!("rules.history_capacity must be positive");
        }
        let _ = config.keys.resolve()?;
        Ok(config)
    }
}
