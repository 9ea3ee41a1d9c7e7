use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use std::fs;

/// Prefix for environment variables overriding settings, e.g. `MODSTACKER_STACK_FOLDER`.
pub const ENV_PREFIX: &str = "MODSTACKER";

const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Configuration manager for loading and saving `settings.yaml`.
///
/// Reads are layered: the YAML file first, then `MODSTACKER_*` environment
/// variables on top. Writes only ever touch the YAML file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at `config_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            config_dir,
        })
    }

    /// ConfigManager for the platform's per-user configuration directory.
    pub fn in_default_location() -> Result<Self> {
        Self::new(default_config_dir()?)
    }

    /// Load settings, using defaults for anything the file and environment leave unset.
    pub fn load_settings(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let layered = config::Config::builder()
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: Settings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Load settings, writing the defaults to disk first if no settings file exists yet.
    pub fn load_or_init_settings(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::info!("Creating default settings at {}", self.settings_path);
            self.save_settings(&Settings::default())?;
        }
        self.load_settings()
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

/// Per-user configuration directory for modstacker.
pub fn default_config_dir() -> Result<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "", crate::APP_NAME)
        .context("Failed to resolve user configuration directory")?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).map_err(|path| {
        anyhow::anyhow!("Configuration directory is not UTF-8: {}", path.display())
    })
}
