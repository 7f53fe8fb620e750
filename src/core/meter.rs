//! Meters: the numeric state effects act on.
//!
//! A `Meter` holds a `current` value (what effects modify this turn) and an
//! `initial` value (what the meter held when the turn's effects started).
//! `back_propagate` copies current into initial once a phase is complete.
//!
//! ## Sentinels
//!
//! - `DEFAULT_VALUE` (0): the reset value.
//! - `LARGE_VALUE` (65536): "intentionally hidden", used when censoring
//!   meters for an observer that cannot see the real value.

use serde::{Deserialize, Serialize};

/// A current/initial numeric pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    current: f64,
    initial: f64,
}

impl Meter {
    /// Reset value for meters.
    pub const DEFAULT_VALUE: f64 = 0.0;
    /// Upper clamp bound and "hidden" sentinel.
    pub const LARGE_VALUE: f64 = (2u32 << 15) as f64;
    /// Marker for a meter value that could not be determined.
    pub const INVALID_VALUE: f64 = -Self::LARGE_VALUE;

    /// Create a meter with both values set to `value`.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self {
            current: value,
            initial: value,
        }
    }

    /// Create a meter with distinct current and initial values.
    #[must_use]
    pub const fn with_values(current: f64, initial: f64) -> Self {
        Self { current, initial }
    }

    /// The sentinel pair shown to observers who may not see the real value.
    #[must_use]
    pub const fn hidden() -> Self {
        Self::new(Self::LARGE_VALUE)
    }

    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    #[must_use]
    pub const fn initial(&self) -> f64 {
        self.initial
    }

    pub fn set_current(&mut self, value: f64) {
        self.current = value;
    }

    pub fn add_to_current(&mut self, delta: f64) {
        self.current += delta;
    }

    pub fn set(&mut self, current: f64, initial: f64) {
        self.current = current;
        self.initial = initial;
    }

    /// Reset the current value to `DEFAULT_VALUE`.
    pub fn reset_current(&mut self) {
        self.current = Self::DEFAULT_VALUE;
    }

    /// Copy current into initial.
    pub fn back_propagate(&mut self) {
        self.initial = self.current;
    }

    /// Clamp the current value into `[min, max]`.
    pub fn clamp_current(&mut self, min: f64, max: f64) {
        self.current = self.current.clamp(min, max);
    }

    /// Clamp the current value into `[DEFAULT_VALUE, LARGE_VALUE]`.
    pub fn clamp_current_to_range(&mut self) {
        self.clamp_current(Self::DEFAULT_VALUE, Self::LARGE_VALUE);
    }

    /// Whether both values hold the hidden sentinel.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.current == Self::LARGE_VALUE && self.initial == Self::LARGE_VALUE
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VALUE)
    }
}

/// Every meter an object (or ship part) can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeterType {
    // === Target ===
    TargetPopulation,
    TargetIndustry,
    TargetResearch,
    TargetInfluence,
    TargetConstruction,
    TargetHappiness,

    // === Max ===
    MaxCapacity,
    MaxSecondaryStat,
    MaxFuel,
    MaxShield,
    MaxStructure,
    MaxDefense,
    MaxSupply,
    MaxStockpile,
    MaxTroops,

    // === Active ===
    Population,
    Industry,
    Research,
    Influence,
    Construction,
    Happiness,
    Capacity,
    SecondaryStat,
    Fuel,
    Shield,
    Structure,
    Defense,
    Supply,
    Stockpile,
    Troops,
    RebelTroops,

    // === Unpaired ===
    Size,
    Stealth,
    Detection,
    Speed,
}

impl MeterType {
    /// The max meter bounding this active meter, if any.
    #[must_use]
    pub const fn max_counterpart(self) -> Option<MeterType> {
        match self {
            Self::Capacity => Some(Self::MaxCapacity),
            Self::SecondaryStat => Some(Self::MaxSecondaryStat),
            Self::Fuel => Some(Self::MaxFuel),
            Self::Shield => Some(Self::MaxShield),
            Self::Structure => Some(Self::MaxStructure),
            Self::Defense => Some(Self::MaxDefense),
            Self::Supply => Some(Self::MaxSupply),
            Self::Stockpile => Some(Self::MaxStockpile),
            Self::Troops => Some(Self::MaxTroops),
            _ => None,
        }
    }

    /// The target meter this active meter grows toward, if any.
    #[must_use]
    pub const fn target_counterpart(self) -> Option<MeterType> {
        match self {
            Self::Population => Some(Self::TargetPopulation),
            Self::Industry => Some(Self::TargetIndustry),
            Self::Research => Some(Self::TargetResearch),
            Self::Influence => Some(Self::TargetInfluence),
            Self::Construction => Some(Self::TargetConstruction),
            Self::Happiness => Some(Self::TargetHappiness),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_target(self) -> bool {
        matches!(
            self,
            Self::TargetPopulation
                | Self::TargetIndustry
                | Self::TargetResearch
                | Self::TargetInfluence
                | Self::TargetConstruction
                | Self::TargetHappiness
        )
    }

    #[must_use]
    pub const fn is_max(self) -> bool {
        matches!(
            self,
            Self::MaxCapacity
                | Self::MaxSecondaryStat
                | Self::MaxFuel
                | Self::MaxShield
                | Self::MaxStructure
                | Self::MaxDefense
                | Self::MaxSupply
                | Self::MaxStockpile
                | Self::MaxTroops
        )
    }

    /// Meters that effects recompute from scratch every turn.
    ///
    /// Target, max and unpaired meters are reset to `DEFAULT_VALUE` before
    /// the effect phase; active meters carry over. Field size carries over.
    #[must_use]
    pub const fn resets_before_effects(self) -> bool {
        self.is_target()
            || self.is_max()
            || matches!(self, Self::Stealth | Self::Detection | Self::Speed)
    }
}

impl std::fmt::Display for MeterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
