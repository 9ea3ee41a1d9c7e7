// Modstacker - switch between stacks of Farming Simulator mods
//
// This is the library crate containing the stack management core.
// The binary crate (main.rs) provides a small command-line front end.

pub mod config;
pub mod context;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use context::AppContext;
pub use models::{CoreSettings, Descriptor, ModDetails, Settings};
pub use services::{ModArchive, ModStack, StackRegistry};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
