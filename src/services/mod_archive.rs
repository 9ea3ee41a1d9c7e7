use crate::models::{Descriptor, ModDetails};
use crate::services::descriptor::{DESCRIPTOR_ENTRY, DescriptorError, DescriptorParser};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{self, BufReader};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors that prevent a mod archive from being loaded
#[derive(Error, Debug)]
pub enum ModError {
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(#[from] DescriptorError),

    #[error("icon {icon} not found in {archive}")]
    IconNotFound { icon: String, archive: Utf8PathBuf },

    #[error("archive entry {0} points outside the icon cache")]
    UnsafeEntryPath(String),

    #[error("unreadable archive: {0}")]
    Archive(#[from] ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Which lookup strategy located an icon entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconMatch {
    /// Entry name equals the declared icon path
    Exact,
    /// Equal ignoring case
    CaseInsensitive,
    /// Same name before the first `.`, any extension
    Stem,
}

/// Find the archive entry the declared icon refers to.
///
/// Directory entries are never matched. For the stem strategy the first
/// matching entry in archive order wins.
pub fn resolve_icon_entry<'a>(reference: &str, entries: &'a [String]) -> Option<(&'a str, IconMatch)> {
    let files = || entries.iter().map(String::as_str).filter(|name| !name.ends_with('/'));

    if let Some(name) = files().find(|name| *name == reference) {
        return Some((name, IconMatch::Exact));
    }
    tracing::trace!("No exact match for icon {}, trying case insensitive", reference);

    let lowered = reference.to_lowercase();
    if let Some(name) = files().find(|name| name.to_lowercase() == lowered) {
        return Some((name, IconMatch::CaseInsensitive));
    }
    tracing::trace!("No case insensitive match for icon {}, trying stem", reference);

    let wanted = stem(reference);
    files()
        .find(|name| stem(name) == wanted)
        .map(|name| (name, IconMatch::Stem))
}

fn stem(name: &str) -> &str {
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

/// One loaded mod archive: its parsed descriptor and a cached copy of its icon.
///
/// Construction is all-or-nothing and the archive is closed again before
/// [`ModArchive::load`] returns.
#[derive(Debug, Clone)]
pub struct ModArchive {
    archive_path: Utf8PathBuf,
    file_name: String,
    descriptor: Descriptor,
    icon_entry: String,
    icon_cache_path: Utf8PathBuf,
}

impl ModArchive {
    /// Open `archive_path`, parse its descriptor and copy its icon into `icon_cache_dir`.
    ///
    /// The icon keeps its in-archive path below the cache directory, so two mods
    /// shipping the same icon entry name share (and overwrite) one cache file.
    pub fn load(
        archive_path: &Utf8Path,
        parser: &DescriptorParser,
        icon_cache_dir: &Utf8Path,
    ) -> Result<Self, ModError> {
        tracing::debug!("Loading mod {}", archive_path);

        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let descriptor = match archive.by_name(DESCRIPTOR_ENTRY) {
            Ok(entry) => parser.parse_reader(entry)?,
            Err(ZipError::FileNotFound) => return Err(DescriptorError::NotInArchive.into()),
            Err(err) => return Err(err.into()),
        };
        tracing::trace!("Parsed {} of {}", DESCRIPTOR_ENTRY, archive_path);

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            entries.push(archive.by_index_raw(index)?.name().to_string());
        }

        let (icon_entry, matched_by) = resolve_icon_entry(&descriptor.icon, &entries).ok_or_else(|| {
            tracing::error!("Could not find icon {} for mod {}", descriptor.icon, archive_path);
            ModError::IconNotFound {
                icon: descriptor.icon.clone(),
                archive: archive_path.to_path_buf(),
            }
        })?;
        tracing::trace!("Icon {} resolved to {} ({:?})", descriptor.icon, icon_entry, matched_by);
        let icon_entry = icon_entry.to_string();

        let icon_cache_path = extract_icon(&mut archive, &icon_entry, icon_cache_dir)?;
        drop(archive);

        let file_name = archive_path
            .file_name()
            .unwrap_or(archive_path.as_str())
            .to_string();

        tracing::debug!("Mod {} loaded, icon cached at {}", archive_path, icon_cache_path);
        Ok(Self {
            archive_path: archive_path.to_path_buf(),
            file_name,
            descriptor,
            icon_entry,
            icon_cache_path,
        })
    }

    pub fn archive_path(&self) -> &Utf8Path {
        &self.archive_path
    }

    /// Archive file name, the key of this mod within its stack.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Archive entry the icon was read from.
    pub fn icon_entry(&self) -> &str {
        &self.icon_entry
    }

    pub fn icon_cache_path(&self) -> &Utf8Path {
        &self.icon_cache_path
    }
}

impl ModDetails for ModArchive {
    fn author(&self) -> &str {
        self.descriptor.author()
    }

    fn version(&self) -> &str {
        self.descriptor.version()
    }

    fn title(&self) -> &str {
        self.descriptor.title()
    }

    fn description(&self) -> &str {
        self.descriptor.description()
    }

    fn icon(&self) -> &str {
        self.descriptor.icon()
    }

    fn supports_multiplayer(&self) -> bool {
        self.descriptor.supports_multiplayer()
    }
}

fn extract_icon<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    entry_name: &str,
    icon_cache_dir: &Utf8Path,
) -> Result<Utf8PathBuf, ModError> {
    let mut entry = archive.by_name(entry_name)?;
    let relative = entry
        .enclosed_name()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .ok_or_else(|| ModError::UnsafeEntryPath(entry_name.to_string()))?;

    let destination = icon_cache_dir.join(relative);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = File::create(&destination)?;
    io::copy(&mut entry, &mut out)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_exact_match_preferred() {
        let entries = names(&["ICON.dds", "icon.dds"]);
        assert_eq!(
            resolve_icon_entry("icon.dds", &entries),
            Some(("icon.dds", IconMatch::Exact))
        );
    }

    #[test]
    fn test_case_insensitive_match() {
        let entries = names(&["modDesc.xml", "Icon.DDS"]);
        assert_eq!(
            resolve_icon_entry("icon.dds", &entries),
            Some(("Icon.DDS", IconMatch::CaseInsensitive))
        );
    }

    #[test]
    fn test_stem_match_ignores_extension() {
        let entries = names(&["modDesc.xml", "icon.png"]);
        assert_eq!(
            resolve_icon_entry("icon.dds", &entries),
            Some(("icon.png", IconMatch::Stem))
        );
    }

    #[test]
    fn test_stem_match_takes_first_in_archive_order() {
        let entries = names(&["store/icon.jpg", "store/icon.png"]);
        assert_eq!(
            resolve_icon_entry("store/icon.dds", &entries),
            Some(("store/icon.jpg", IconMatch::Stem))
        );
    }

    #[test]
    fn test_stem_is_case_sensitive() {
        let entries = names(&["Icon.png"]);
        assert_eq!(resolve_icon_entry("icon.dds", &entries), None);
    }

    #[test]
    fn test_directories_never_match() {
        let entries = names(&["icon/", "modDesc.xml"]);
        assert_eq!(resolve_icon_entry("icon", &entries), None);
    }

    #[test]
    fn test_no_match() {
        let entries = names(&["modDesc.xml", "textures/silo.dds"]);
        assert_eq!(resolve_icon_entry("icon_silo.dds", &entries), None);
    }
}
