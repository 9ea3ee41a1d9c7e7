//! Data models for modstacker.
//!
//! - [`Settings`]: user settings persisted in `settings.yaml`
//! - [`CoreSettings`]: settings with defaults applied, as consumed by the stack services
//! - [`Descriptor`]: metadata parsed from a mod archive's `modDesc.xml`
//! - [`ModDetails`]: read accessors shared by [`Descriptor`] and loaded mods

pub mod descriptor;
pub mod settings;

pub use descriptor::{Descriptor, ModDetails};
pub use settings::{CoreSettings, DEFAULT_LANGUAGE, Settings};
