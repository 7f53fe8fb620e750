//! Empire identification.
//!
//! `ALL_EMPIRES` (-1) doubles as "unowned" for object owners and as
//! "no particular empire" for affiliation and recipient lookups.

use serde::{Deserialize, Serialize};

/// Empire identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmpireId(pub i32);

/// Unowned / no specific empire.
pub const ALL_EMPIRES: EmpireId = EmpireId(-1);

impl EmpireId {
    /// Create a new empire ID.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// True for `ALL_EMPIRES` (and any other negative id).
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl Default for EmpireId {
    fn default() -> Self {
        ALL_EMPIRES
    }
}

impl From<i32> for EmpireId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EmpireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "Empire(none)")
        } else {
            write!(f, "Empire({})", self.0)
        }
    }
}
