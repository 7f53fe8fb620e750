//! Engine configuration.
//!
//! The engine never hardcodes naming lists or creation defaults; callers
//! configure them once via `EngineConfig` and the universe owns the result.
//!
//! ```
//! use effect_engine::core::EngineConfig;
//!
//! let config = EngineConfig::new(42)
//!     .with_star_names(["Sol", "Vega"])
//!     .with_default_orbits(5);
//!
//! assert_eq!(config.star_names.len(), 2);
//! assert_eq!(config.default_orbits, 5);
//! ```

use serde::{Deserialize, Serialize};

/// Creation defaults and naming lists used by effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for the universe RNG.
    pub seed: u64,
    /// Candidate names for systems created without an explicit name.
    pub star_names: Vec<String>,
    /// Prefix for generated system names once `star_names` is exhausted.
    pub system_name_prefix: String,
    /// Prefix for generated monster ship names.
    pub monster_name_prefix: String,
    /// Prefix for generated fleet names.
    pub fleet_name_prefix: String,
    /// Orbit slots given to newly created systems.
    pub default_orbits: usize,
    /// Size given to fields created without an explicit size.
    pub field_default_size: f64,
    /// Smallest allowed field size.
    pub field_min_size: f64,
    /// Largest allowed field size.
    pub field_max_size: f64,
}

impl EngineConfig {
    /// Create a configuration with default naming and creation settings.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            star_names: Vec::new(),
            system_name_prefix: "System".to_string(),
            monster_name_prefix: "Monster".to_string(),
            fleet_name_prefix: "Fleet".to_string(),
            default_orbits: 7,
            field_default_size: 10.0,
            field_min_size: 1.0,
            field_max_size: 10000.0,
        }
    }

    #[must_use]
    pub fn with_star_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.star_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_system_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.system_name_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_monster_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.monster_name_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_fleet_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fleet_name_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_default_orbits(mut self, orbits: usize) -> Self {
        self.default_orbits = orbits;
        self
    }

    /// Set the default field size and its allowed bounds.
    #[must_use]
    pub fn with_field_sizes(mut self, default: f64, min: f64, max: f64) -> Self {
        self.field_default_size = default;
        self.field_min_size = min;
        self.field_max_size = max;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
