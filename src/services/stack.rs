use crate::context::{AppContext, StackClaim};
use crate::services::mod_archive::{ModArchive, ModError};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Mods shown per page by the presentation layer.
pub const DEFAULT_PAGE_SIZE: usize = 18;

const ARCHIVE_EXTENSION: &str = ".zip";

/// Errors raised by stack operations
#[derive(Error, Debug)]
pub enum StackError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} is already in the stack, update it instead")]
    AlreadyPresent(String),

    #[error("{0} is not in the stack")]
    NotPresent(String),

    #[error("a stack for {0} is already loaded")]
    DuplicateStack(Utf8PathBuf),

    #[error("mod index {index} out of range for a stack of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to link {link} -> {target}: {source}")]
    Link {
        link: Utf8PathBuf,
        target: Utf8PathBuf,
        source: io::Error,
    },

    #[error("failed to remove link {link}: {source}")]
    Unlink { link: Utf8PathBuf, source: io::Error },

    #[error("{0} exists and is not a link, refusing to replace it")]
    LinkOccupied(Utf8PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What a load or reconcile pass changed, by archive file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<String>,
    pub removed: Vec<String>,
}

impl LoadReport {
    /// True when the pass neither admitted nor dropped a mod.
    pub fn is_unchanged(&self) -> bool {
        self.loaded.is_empty() && self.removed.is_empty()
    }
}

/// A named collection of mod archives living directly inside one directory.
///
/// Only one `ModStack` per directory can be alive at a time within an
/// [`AppContext`]. Mods are kept in archive-name order as first discovered;
/// archives added later are appended.
#[derive(Debug)]
pub struct ModStack {
    name: String,
    directory: Utf8PathBuf,
    canonical_directory: Utf8PathBuf,
    mods: IndexMap<String, ModArchive>,
    ctx: Arc<AppContext>,
    _claim: StackClaim,
}

impl ModStack {
    /// Open the stack stored in `directory` and load every archive in it.
    ///
    /// Archives that fail to load are logged and left out; only I/O errors on
    /// the directory itself or a duplicate stack fail the call.
    pub fn open(directory: impl AsRef<Utf8Path>, ctx: Arc<AppContext>) -> Result<Self, StackError> {
        // Relative link targets resolve against the link's parent, so keep an absolute path.
        let directory = absolute_path(directory.as_ref())?;
        let canonical_directory = directory.canonicalize_utf8()?;

        let claim = ctx
            .stack_paths()
            .claim(&canonical_directory)
            .ok_or_else(|| StackError::DuplicateStack(directory.clone()))?;

        let name = directory
            .file_name()
            .or_else(|| canonical_directory.file_name())
            .unwrap_or(canonical_directory.as_str())
            .to_string();

        let mut stack = Self {
            name,
            directory,
            canonical_directory,
            mods: IndexMap::new(),
            ctx,
            _claim: claim,
        };
        stack.load()?;
        Ok(stack)
    }

    fn load(&mut self) -> Result<LoadReport, StackError> {
        tracing::info!("Loading mods from {} (this may take a while)", self.directory);

        let archives = self.list_archives()?;
        let mut report = LoadReport::default();
        self.mods.clear();
        for name in &archives {
            self.admit(name, &mut report);
        }

        tracing::info!(
            "Loaded {}/{} mods from {}",
            report.loaded.len(),
            archives.len(),
            self.directory
        );
        if !report.failed.is_empty() {
            tracing::debug!("Failed mods: {:?}", report.failed);
        }
        Ok(report)
    }

    /// Bring the loaded mods in line with the archives currently in the directory.
    ///
    /// New archives are loaded, vanished ones dropped, known ones left untouched.
    /// A missing directory reads as empty.
    pub fn reconcile(&mut self) -> Result<LoadReport, StackError> {
        let mut report = LoadReport::default();
        self.reconcile_into(&mut report)?;
        Ok(report)
    }

    fn reconcile_into(&mut self, report: &mut LoadReport) -> Result<(), StackError> {
        tracing::info!("Updating {}", self.directory);

        let archives = self.list_archives()?;
        let present: HashSet<&str> = archives.iter().map(String::as_str).collect();

        let vanished: Vec<String> = self
            .mods
            .keys()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect();
        for name in vanished {
            self.mods.shift_remove(&name);
            tracing::debug!("Mod {} no longer in {}", name, self.directory);
            report.removed.push(name);
        }

        for name in &archives {
            if !self.mods.contains_key(name) {
                self.admit(name, report);
            }
        }

        tracing::info!(
            "Updated {}: {}/{} mods",
            self.directory,
            self.mods.len(),
            archives.len()
        );
        Ok(())
    }

    /// Try to load one archive of this stack; failures are logged and reported, not raised.
    fn admit(&mut self, name: &str, report: &mut LoadReport) {
        match self.load_archive(name) {
            Ok(loaded) => {
                self.mods.insert(name.to_string(), loaded);
                report.loaded.push(name.to_string());
            }
            Err(err) => {
                tracing::error!("Could not load mod {}: {}", name, err);
                report.failed.push(name.to_string());
            }
        }
    }

    fn load_archive(&self, name: &str) -> Result<ModArchive, ModError> {
        ModArchive::load(
            &self.directory.join(name),
            self.ctx.parser(),
            self.ctx.icon_cache_dir(),
        )
    }

    /// Sorted names of the `.zip` files directly inside the stack directory.
    fn list_archives(&self) -> Result<Vec<String>, StackError> {
        let entries = match self.directory.read_dir_utf8() {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Stack directory {} is missing", self.directory);
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_name().ends_with(ARCHIVE_EXTENSION) && entry.path().is_file() {
                names.push(entry.file_name().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Copy a new archive into the stack and load it.
    pub fn add_mod(&mut self, archive: impl AsRef<Utf8Path>) -> Result<LoadReport, StackError> {
        let archive = archive.as_ref();
        let name = validate_archive(archive)?;
        let destination = self.directory.join(&name);
        if destination.exists() {
            return Err(StackError::AlreadyPresent(name));
        }

        fs::copy(archive, &destination)?;
        tracing::info!("Added {} to {}", name, self.name);
        self.reconcile()
    }

    /// Replace an archive already in the stack and reload its metadata in place.
    pub fn update_mod(&mut self, archive: impl AsRef<Utf8Path>) -> Result<LoadReport, StackError> {
        let archive = archive.as_ref();
        let name = validate_archive(archive)?;
        let destination = self.directory.join(&name);
        if !destination.is_file() {
            return Err(StackError::NotPresent(name));
        }

        if !is_same_file(archive, &destination) {
            fs::copy(archive, &destination)?;
        }
        tracing::info!("Updated {} in {}", name, self.name);

        let mut report = LoadReport::default();
        match self.load_archive(&name) {
            Ok(reloaded) => {
                // Replacing keeps the mod's position in the listing.
                self.mods.insert(name.clone(), reloaded);
                report.loaded.push(name);
            }
            Err(err) => {
                // Dropped here; the reconcile below retries and reports the failure.
                tracing::warn!("Replaced archive {} no longer loads: {}", name, err);
                if self.mods.shift_remove(&name).is_some() {
                    report.removed.push(name);
                }
            }
        }
        self.reconcile_into(&mut report)?;
        Ok(report)
    }

    /// Delete an archive from the stack directory.
    pub fn remove_mod(&mut self, name: &str) -> Result<LoadReport, StackError> {
        if Utf8Path::new(name).file_name() != Some(name) {
            return Err(StackError::InvalidArgument(format!(
                "{name} is not a plain archive file name"
            )));
        }

        let path = self.directory.join(name);
        if !path.is_file() {
            return Err(StackError::NotPresent(name.to_string()));
        }

        fs::remove_file(&path)?;
        tracing::info!("Removed {} from {}", name, self.name);
        self.reconcile()
    }

    /// Make this stack the game's mod folder, replacing whichever stack was linked.
    pub fn enable(&self) -> Result<(), StackError> {
        Self::disable(&self.ctx)?;

        let link = self.ctx.game_mods_folder();
        self.ctx
            .linker()
            .create_link(&self.directory, link)
            .map_err(|source| {
                tracing::error!("Linking {} to {} failed: {}", link, self.directory, source);
                StackError::Link {
                    link: link.to_path_buf(),
                    target: self.directory.clone(),
                    source,
                }
            })?;

        tracing::info!("Enabled {}", self.directory);
        Ok(())
    }

    /// Remove the game mods folder link, whichever stack it points at.
    ///
    /// Does nothing when no link exists. A real directory at that path is left
    /// alone and reported as [`StackError::LinkOccupied`].
    pub fn disable(ctx: &AppContext) -> Result<(), StackError> {
        let link = ctx.game_mods_folder();
        let linker = ctx.linker();

        if linker.is_link(link) {
            linker.remove_link(link).map_err(|source| StackError::Unlink {
                link: link.to_path_buf(),
                source,
            })?;
            tracing::info!("Disabled current mod stack");
        } else if fs::symlink_metadata(link).is_ok() {
            return Err(StackError::LinkOccupied(link.to_path_buf()));
        } else {
            tracing::debug!("No mod stack enabled at {}", link);
        }
        Ok(())
    }

    /// Whether the game mods folder currently links to this stack.
    pub fn is_enabled(&self) -> bool {
        self.ctx
            .linker()
            .link_target(self.ctx.game_mods_folder())
            .is_some_and(|target| {
                target == self.directory
                    || target.canonicalize_utf8().ok().as_ref() == Some(&self.canonical_directory)
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn mod_by_index(&self, index: usize) -> Result<&ModArchive, StackError> {
        self.mods
            .get_index(index)
            .map(|(_, loaded)| loaded)
            .ok_or(StackError::IndexOutOfRange {
                index,
                len: self.mods.len(),
            })
    }

    pub fn get_mod(&self, name: &str) -> Option<&ModArchive> {
        self.mods.get(name)
    }

    pub fn mods(&self) -> impl Iterator<Item = &ModArchive> {
        self.mods.values()
    }

    pub fn mod_names(&self) -> impl Iterator<Item = &str> {
        self.mods.keys().map(String::as_str)
    }

    /// Mods on page `page` (zero-based) for pages of `page_size`.
    pub fn page(&self, page: usize, page_size: usize) -> Vec<&ModArchive> {
        self.mods
            .values()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .collect()
    }

    /// Number of pages of `page_size` needed to show every mod.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.mods.len().div_ceil(page_size)
    }
}

impl std::fmt::Display for ModStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModStack {}", self.name)
    }
}

/// Check an archive handed to add/update and return its file name.
fn validate_archive(archive: &Utf8Path) -> Result<String, StackError> {
    if !archive.as_str().ends_with(ARCHIVE_EXTENSION) {
        return Err(StackError::InvalidArgument(format!(
            "only zip archives are supported: {archive}"
        )));
    }
    if !archive.is_file() {
        return Err(StackError::InvalidArgument(format!(
            "archive {archive} not found"
        )));
    }
    archive
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| StackError::InvalidArgument(format!("archive {archive} has no file name")))
}

fn absolute_path(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|path| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not UTF-8: {}", path.display()),
        )
    })
}

fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
