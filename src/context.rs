// Process context shared by the registry and every stack.
//
// Built once at start-up from resolved settings and passed down explicitly,
// instead of the stack services reaching for global configuration.

use crate::models::CoreSettings;
use crate::services::descriptor::DescriptorParser;
use crate::services::link::{DirectoryLinker, SystemLinker};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

/// Settings, parser, link backend and stack bookkeeping for one process.
pub struct AppContext {
    settings: CoreSettings,
    parser: DescriptorParser,
    linker: Box<dyn DirectoryLinker>,
    stack_paths: StackPaths,
}

impl AppContext {
    /// Context using the operating system's directory links.
    pub fn new(settings: CoreSettings) -> Self {
        Self::with_linker(settings, Box::new(SystemLinker))
    }

    pub fn with_linker(settings: CoreSettings, linker: Box<dyn DirectoryLinker>) -> Self {
        Self {
            parser: DescriptorParser::new(settings.language.clone()),
            settings,
            linker,
            stack_paths: StackPaths::default(),
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn stack_folder(&self) -> &Utf8Path {
        &self.settings.stack_folder
    }

    pub fn game_mods_folder(&self) -> &Utf8Path {
        &self.settings.game_mods_folder
    }

    pub fn icon_cache_dir(&self) -> &Utf8Path {
        &self.settings.icon_cache_dir
    }

    pub fn parser(&self) -> &DescriptorParser {
        &self.parser
    }

    pub fn linker(&self) -> &dyn DirectoryLinker {
        self.linker.as_ref()
    }

    pub(crate) fn stack_paths(&self) -> &StackPaths {
        &self.stack_paths
    }

    /// Delete every cached icon. Icons of loaded mods are gone afterwards.
    pub fn clear_icon_cache(&self) -> io::Result<()> {
        match fs::remove_dir_all(self.icon_cache_dir()) {
            Ok(()) => {
                tracing::info!("Cleared icon cache {}", self.icon_cache_dir());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Directories currently owned by a live stack.
#[derive(Debug, Clone, Default)]
pub(crate) struct StackPaths {
    claimed: Arc<Mutex<HashSet<Utf8PathBuf>>>,
}

impl StackPaths {
    /// Claim `path` for a new stack; `None` if another stack already owns it.
    pub(crate) fn claim(&self, path: &Utf8Path) -> Option<StackClaim> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if !claimed.insert(path.to_path_buf()) {
            return None;
        }
        Some(StackClaim {
            claimed: Arc::clone(&self.claimed),
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn is_claimed(&self, path: &Utf8Path) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }
}

/// Ownership of one stack directory, released on drop.
#[derive(Debug)]
pub(crate) struct StackClaim {
    claimed: Arc<Mutex<HashSet<Utf8PathBuf>>>,
    path: Utf8PathBuf,
}

impl Drop for StackClaim {
    fn drop(&mut self) {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}
