//! Shared fixtures for the integration tests: scratch directories and mod archives.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use modstacker::{AppContext, CoreSettings};
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Scratch layout: `stacks/`, `mods` (link location), `icons/`, `downloads/`.
pub struct Workspace {
    _temp_dir: TempDir,
    pub root: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        fs::create_dir(root.join("stacks")).unwrap();
        fs::create_dir(root.join("downloads")).unwrap();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn settings(&self, language: &str) -> CoreSettings {
        CoreSettings {
            stack_folder: self.root.join("stacks"),
            game_mods_folder: self.root.join("mods"),
            language: language.to_string(),
            icon_cache_dir: self.root.join("icons"),
        }
    }

    pub fn context(&self) -> Arc<AppContext> {
        Arc::new(AppContext::new(self.settings("en")))
    }

    pub fn stack_dir(&self, name: &str) -> Utf8PathBuf {
        let dir = self.root.join("stacks").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn downloads(&self) -> Utf8PathBuf {
        self.root.join("downloads")
    }

    pub fn game_mods_folder(&self) -> Utf8PathBuf {
        self.root.join("mods")
    }

    pub fn icon_cache(&self) -> Utf8PathBuf {
        self.root.join("icons")
    }
}

/// A `modDesc.xml` with English and German titles.
pub fn mod_desc(title: &str, version: &str, icon: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="no" ?>
<modDesc descVersion="72">
    <author>Test Farmer</author>
    <version>{version}</version>
    <title>
        <en>{title}</en>
        <de>{title} (de)</de>
    </title>
    <description>
        <en>
            Description of {title}.
        </en>
    </description>
    <iconFilename>{icon}</iconFilename>
    <multiplayer supported="true"/>
</modDesc>
"#
    )
}

/// Write a zip archive containing `entries` in the given order.
pub fn write_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}

/// Write a well-formed mod archive with a `modDesc.xml` and an `icon.dds`.
pub fn write_mod(path: &Utf8Path, title: &str, version: &str) {
    let desc = mod_desc(title, version, "icon.dds");
    let icon = format!("icon of {title}");
    write_zip(
        path,
        &[
            ("modDesc.xml", desc.as_bytes()),
            ("icon.dds", icon.as_bytes()),
        ],
    );
}
