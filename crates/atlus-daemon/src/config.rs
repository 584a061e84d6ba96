//! Configuration file management.

use std::path::PathBuf;

use atlus_engine::accounts::SessionSettings;
use atlus_engine::{CooldownMode, CooldownPolicy};
use serde::{Deserialize, Serialize};

/// Complete daemon configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlusConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Competition rules.
    #[serde(default)]
    pub competition: CompetitionConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Puzzle content root holding `level<N>/problem_set/<variant>.json`
    /// and `level<N>/inputs/<variant>.txt`. Empty = $data_dir/puzzles/.
    #[serde(default)]
    pub puzzles_dir: String,
}

/// Competition rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Length of one cooldown step.
    #[serde(default = "default_cooldown_step_minutes")]
    pub cooldown_step_minutes: u64,
    /// "escalating" | "continuous".
    #[serde(default)]
    pub cooldown_mode: CooldownMode,
    /// Distinct inputs per level; identities are spread across them.
    #[serde(default = "default_input_variants")]
    pub input_variants: u32,
    /// Session lifetime.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: u64,
    /// Release time of level 1 (Unix seconds).
    #[serde(default)]
    pub first_release: u64,
    /// Seconds between level releases.
    #[serde(default = "default_release_interval")]
    pub release_interval_secs: u64,
    /// Number of levels to seed.
    #[serde(default = "default_level_count")]
    pub level_count: u32,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_cooldown_step_minutes() -> u64 {
    15
}

fn default_input_variants() -> u32 {
    4
}

fn default_session_ttl_days() -> u64 {
    30
}

fn default_release_interval() -> u64 {
    24 * 60 * 60
}

fn default_level_count() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            cooldown_step_minutes: default_cooldown_step_minutes(),
            cooldown_mode: CooldownMode::default(),
            input_variants: default_input_variants(),
            session_ttl_days: default_session_ttl_days(),
            first_release: 0,
            release_interval_secs: default_release_interval(),
            level_count: default_level_count(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl CompetitionConfig {
    pub fn cooldown_policy(&self) -> CooldownPolicy {
        CooldownPolicy::new(self.cooldown_step_minutes.saturating_mul(60)).with_mode(self.cooldown_mode)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ttl_secs: self.session_ttl_days.saturating_mul(24 * 60 * 60),
            input_variants: self.input_variants,
        }
    }
}

impl AtlusConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: AtlusConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the puzzles directory path.
    pub fn puzzles_dir(&self) -> PathBuf {
        if self.storage.puzzles_dir.is_empty() {
            self.data_dir().join("puzzles")
        } else {
            PathBuf::from(&self.storage.puzzles_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Default data directory: `$ATLUS_DATA_DIR`, else `~/.atlus`.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("ATLUS_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".atlus"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/atlus"))
    }
}
