//! ID generation utilities.

use ulid::Ulid;

/// ID generator for posts, comments, reactions and profiles.
///
/// IDs are lowercase ULIDs. They sort by creation time and never contain
/// the `_` separator used by pagination cursors.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}
