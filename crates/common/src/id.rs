//! ID generation utilities.

use uuid::Uuid;

/// Length of generated account identifiers.
pub const ACCOUNT_ID_LEN: usize = 6;

/// ID generator for entities.
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

    /// Generate a new short random account identifier.
    ///
    /// Identifiers are 6-character lowercase alphanumeric tokens taken from
    /// the hex form of a v4 UUID. They are assigned once at creation and
    /// never reassigned.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ACCOUNT_ID_LEN);
        id
    }
}
