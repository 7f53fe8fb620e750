//! Universe object identification.
//!
//! Every entity in the universe (ship, fleet, planet, building, system, field)
//! has a unique `ObjectId`, assigned when the object is inserted.
//!
//! ## Sentinel
//!
//! `INVALID_OBJECT_ID` (-1) never refers to a real object. It is used for
//! "no containing system", "no next system", "no source", and so on.
//!
//! ```
//! use effect_engine::core::{ObjectId, INVALID_OBJECT_ID};
//!
//! let id = ObjectId::new(7);
//! assert!(id.is_valid());
//! assert!(!INVALID_OBJECT_ID.is_valid());
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for any universe object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i32);

/// Id that never refers to a real object.
pub const INVALID_OBJECT_ID: ObjectId = ObjectId(-1);

impl ObjectId {
    /// Create a new object ID.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Whether this ID could refer to an object (non-negative).
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        INVALID_OBJECT_ID
    }
}

impl From<i32> for ObjectId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}
