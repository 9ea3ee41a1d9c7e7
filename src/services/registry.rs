use crate::context::AppContext;
use crate::services::stack::{ModStack, StackError};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while discovering or looking up stacks
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("stack {0} not found")]
    NotFound(String),

    #[error("stack folder {0} does not exist")]
    MissingStackFolder(Utf8PathBuf),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Every stack found directly below the configured stack folder, keyed by name.
///
/// Discovery happens once, in [`StackRegistry::load`]; directories created
/// later are only picked up by [`StackRegistry::reload`].
#[derive(Debug)]
pub struct StackRegistry {
    ctx: Arc<AppContext>,
    stacks: BTreeMap<String, ModStack>,
}

impl StackRegistry {
    pub fn load(ctx: Arc<AppContext>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            ctx,
            stacks: BTreeMap::new(),
        };
        registry.scan()?;
        Ok(registry)
    }

    /// Drop every loaded stack and discover them again.
    pub fn reload(&mut self) -> Result<(), RegistryError> {
        // Stacks must be dropped first so their directories can be claimed again.
        self.stacks.clear();
        self.scan()
    }

    fn scan(&mut self) -> Result<(), RegistryError> {
        let stack_folder = self.ctx.stack_folder().to_path_buf();
        tracing::info!("Loading stacks from {}", stack_folder);

        let entries = match stack_folder.read_dir_utf8() {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RegistryError::MissingStackFolder(stack_folder));
            }
            Err(err) => return Err(err.into()),
        };

        let mut directories = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Links are skipped: the active-stack link may live in here too.
            if entry.file_type()?.is_dir() {
                directories.push(entry.into_path());
            }
        }
        directories.sort();

        for directory in directories {
            let stack = ModStack::open(&directory, Arc::clone(&self.ctx))?;
            self.stacks.insert(stack.name().to_string(), stack);
        }

        tracing::info!("{} stacks loaded", self.stacks.len());
        Ok(())
    }

    pub fn get_stack(&self, name: &str) -> Result<&ModStack, RegistryError> {
        self.stacks.get(name).ok_or_else(|| {
            tracing::error!("Stack {} not found", name);
            RegistryError::NotFound(name.to_string())
        })
    }

    pub fn get_stack_mut(&mut self, name: &str) -> Result<&mut ModStack, RegistryError> {
        self.stacks.get_mut(name).ok_or_else(|| {
            tracing::error!("Stack {} not found", name);
            RegistryError::NotFound(name.to_string())
        })
    }

    /// Stack names in sorted order.
    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks.keys().map(String::as_str).collect()
    }

    pub fn stacks(&self) -> impl Iterator<Item = &ModStack> {
        self.stacks.values()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Link the named stack as the game's mod folder.
    pub fn enable(&self, name: &str) -> Result<(), RegistryError> {
        self.get_stack(name)?.enable()?;
        Ok(())
    }

    /// Remove the game mods folder link, if any.
    pub fn disable(&self) -> Result<(), RegistryError> {
        ModStack::disable(&self.ctx)?;
        Ok(())
    }

    /// Name of the stack the game mods folder currently links to.
    pub fn active_stack_name(&self) -> Option<&str> {
        self.stacks
            .values()
            .find(|stack| stack.is_enabled())
            .map(ModStack::name)
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }
}
