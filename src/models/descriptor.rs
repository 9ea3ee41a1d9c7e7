/// Metadata read from a mod archive's `modDesc.xml`.
///
/// Title and description are already resolved against the preferred language
/// at parse time, so a `Descriptor` never needs the configuration again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub author: String,
    pub version: String,
    pub title: String,
    pub description: String,
    /// Icon path exactly as declared in `<iconFilename>`; may not match an entry name.
    pub icon: String,
    pub supports_multiplayer: bool,
}

/// Read access to the descriptor fields of a mod.
///
/// Implemented by [`Descriptor`] itself and by
/// [`ModArchive`](crate::services::ModArchive), which delegates to the descriptor it owns.
pub trait ModDetails {
    fn author(&self) -> &str;
    fn version(&self) -> &str;
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn icon(&self) -> &str;
    fn supports_multiplayer(&self) -> bool;
}

impl ModDetails for Descriptor {
    fn author(&self) -> &str {
        &self.author
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn supports_multiplayer(&self) -> bool {
        self.supports_multiplayer
    }
}
