//! Directory links used to present one stack as the game's mod folder.
//!
//! On Unix this is a plain symlink. On Windows a directory symlink is tried
//! first and an `mklink /J` junction is the fallback, since symlinks need
//! developer mode or elevation there.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Creates, removes and inspects the directory link at the game mods folder.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryLinker: Send + Sync {
    /// Create `link` pointing at the directory `target`. `link` must not exist.
    fn create_link(&self, target: &Utf8Path, link: &Utf8Path) -> io::Result<()>;

    /// Remove the link itself, never the directory it points at.
    fn remove_link(&self, link: &Utf8Path) -> io::Result<()>;

    /// Whether `path` exists as a link (symlink or junction).
    fn is_link(&self, path: &Utf8Path) -> bool;

    /// Where `link` points, if it is a readable link.
    fn link_target(&self, link: &Utf8Path) -> Option<Utf8PathBuf>;
}

/// [`DirectoryLinker`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl DirectoryLinker for SystemLinker {
    fn create_link(&self, target: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
        tracing::debug!("Linking {} -> {}", link, target);
        create_dir_link(target, link)
    }

    fn remove_link(&self, link: &Utf8Path) -> io::Result<()> {
        tracing::debug!("Removing link {}", link);
        remove_dir_link(link)
    }

    fn is_link(&self, path: &Utf8Path) -> bool {
        fs::symlink_metadata(path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn link_target(&self, link: &Utf8Path) -> Option<Utf8PathBuf> {
        let target = fs::read_link(link).ok()?;
        Utf8PathBuf::from_path_buf(target).ok()
    }
}

#[cfg(unix)]
fn create_dir_link(target: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_dir_link(target: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    match std::os::windows::fs::symlink_dir(target, link) {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::debug!("symlink_dir failed ({}), falling back to junction", err);
            let status = std::process::Command::new("cmd")
                .args(["/C", "mklink", "/J"])
                .arg(link.as_str())
                .arg(target.as_str())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()?;
            if status.success() {
                Ok(())
            } else {
                Err(io::Error::other(format!(
                    "mklink /J exited with {}",
                    status.code().unwrap_or(-1)
                )))
            }
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn create_dir_link(_target: &Utf8Path, _link: &Utf8Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "directory links unavailable on this platform",
    ))
}

#[cfg(windows)]
fn remove_dir_link(link: &Utf8Path) -> io::Result<()> {
    // Directory symlinks and junctions are removed like empty directories.
    fs::remove_dir(link)
}

#[cfg(not(windows))]
fn remove_dir_link(link: &Utf8Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_inspect_remove() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let target = root.join("stack");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("a.zip"), b"zip").unwrap();
        let link = root.join("mods");

        let linker = SystemLinker;
        assert!(!linker.is_link(&link));

        linker.create_link(&target, &link).unwrap();
        assert!(linker.is_link(&link));
        assert_eq!(linker.link_target(&link), Some(target.clone()));
        assert!(link.join("a.zip").exists());

        linker.remove_link(&link).unwrap();
        assert!(!linker.is_link(&link));
        assert!(target.join("a.zip").exists());
    }

    #[test]
    fn test_real_directory_is_not_a_link() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        assert!(!SystemLinker.is_link(&root));
        assert_eq!(SystemLinker.link_target(&root), None);
    }
}
