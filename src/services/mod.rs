//! Services module - the mod-stack management core.
//!
//! Everything here is synchronous and framework-agnostic; the binary (or any
//! other front end) decides which thread it runs on.
//!
//! # Components
//!
//! - [`DescriptorParser`]: reads `modDesc.xml` into a [`Descriptor`](crate::models::Descriptor),
//!   resolving title and description against the preferred language
//!   (preferred, then `en`, then the first entry).
//! - [`ModArchive`]: one loaded `.zip` mod. Parses the descriptor, locates the
//!   icon (exact, case-insensitive, then same-stem match) and copies it into the
//!   shared icon cache. The archive is closed again before loading returns.
//! - [`ModStack`]: the mods of one directory. Keeps its listing in sync with the
//!   directory through [`ModStack::reconcile`], copies archives in and out, and
//!   swaps the game mods folder link on [`ModStack::enable`].
//! - [`StackRegistry`]: every stack below the configured stack folder, by name.
//! - [`DirectoryLinker`]: the link backend, replaceable for tests.
//!
//! # Failure locality
//!
//! A broken archive never fails its stack: it is logged, listed in the
//! returned [`LoadReport`] and left out. Misuse of stack operations and link
//! failures are returned to the caller.
//!
//! # Usage Example
//!
//! ```ignore
//! use modstacker::{AppContext, StackRegistry};
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(AppContext::new(settings.resolve()?));
//! let mut registry = StackRegistry::load(ctx)?;
//!
//! registry.get_stack_mut("harvest")?.add_mod("downloads/FS22_BigSilo.zip")?;
//! registry.enable("harvest")?;
//! ```

pub mod descriptor;
pub mod link;
pub mod mod_archive;
pub mod registry;
pub mod stack;

pub use descriptor::{DESCRIPTOR_ENTRY, DescriptorError, DescriptorParser};
pub use link::{DirectoryLinker, SystemLinker};
pub use mod_archive::{IconMatch, ModArchive, ModError, resolve_icon_entry};
pub use registry::{RegistryError, StackRegistry};
pub use stack::{DEFAULT_PAGE_SIZE, LoadReport, ModStack, StackError};
