use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use directories::{BaseDirs, UserDirs};
use serde::{Deserialize, Serialize};

/// Language used for localized fields when none is configured.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Persisted settings from `settings.yaml`.
///
/// Paths are stored as plain strings; an empty string means "not set" and is
/// replaced by the platform default when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory whose immediate subdirectories are stacks. Required.
    #[serde(default)]
    pub stack_folder: String,

    /// Path of the directory link the game reads its mods from.
    #[serde(default)]
    pub game_mods_folder: String,

    /// Preferred language code for titles and descriptions.
    #[serde(default = "default_language")]
    pub language: String,

    /// Where resolved icons are copied to.
    #[serde(default)]
    pub icon_cache_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stack_folder: String::new(),
            game_mods_folder: default_game_mods_folder()
                .map(|path| path.into_string())
                .unwrap_or_default(),
            language: default_language(),
            icon_cache_folder: String::new(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Settings after defaults and validation, as consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSettings {
    pub stack_folder: Utf8PathBuf,
    pub game_mods_folder: Utf8PathBuf,
    pub language: String,
    pub icon_cache_dir: Utf8PathBuf,
}

impl Settings {
    /// Apply defaults for unset values and check required ones.
    pub fn resolve(&self) -> Result<CoreSettings> {
        if self.stack_folder.trim().is_empty() {
            anyhow::bail!("stack_folder is not configured");
        }

        let game_mods_folder = if self.game_mods_folder.trim().is_empty() {
            default_game_mods_folder().context("Failed to determine default game mods folder")?
        } else {
            absolute(&self.game_mods_folder)?
        };

        let language = if self.language.trim().is_empty() {
            default_language()
        } else {
            self.language.trim().to_string()
        };

        let icon_cache_dir = if self.icon_cache_folder.trim().is_empty() {
            default_icon_cache_dir()?
        } else {
            Utf8PathBuf::from(&self.icon_cache_folder)
        };

        Ok(CoreSettings {
            stack_folder: absolute(&self.stack_folder)?,
            game_mods_folder,
            language,
            icon_cache_dir,
        })
    }
}

/// Anchor a configured path at the working directory if it is relative.
fn absolute(path: &str) -> Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to make {} absolute", path))?;
    Utf8PathBuf::from_path_buf(absolute)
        .map_err(|path| anyhow::anyhow!("Path is not UTF-8: {}", path.display()))
}

/// `<Documents>/My Games/FarmingSimulator2022/mods`
pub fn default_game_mods_folder() -> Option<Utf8PathBuf> {
    let documents = UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|dir| dir.to_path_buf()))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join("Documents")))?;
    let documents = Utf8PathBuf::from_path_buf(documents).ok()?;
    Some(game_mods_folder_under(&documents))
}

fn game_mods_folder_under(documents: &Utf8Path) -> Utf8PathBuf {
    documents
        .join("My Games")
        .join("FarmingSimulator2022")
        .join("mods")
}

/// `<temp>/modstacker/icons`
pub fn default_icon_cache_dir() -> Result<Utf8PathBuf> {
    let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .map_err(|path| anyhow::anyhow!("Temporary directory is not UTF-8: {}", path.display()))?;
    Ok(temp.join("modstacker").join("icons"))
}
