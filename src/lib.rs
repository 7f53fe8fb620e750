//! # effect-engine
//!
//! A deterministic, content-driven effect execution engine for turn-based
//! 4X simulations.
//!
//! ## Design Principles
//!
//! 1. **Content-Driven**: Techs, buildings, specials and species describe
//!    their behavior as effects groups built from conditions, expressions
//!    and effects. The engine has no hardcoded rules.
//!
//! 2. **Invariant-Preserving**: Every effect leaves containment consistent.
//!    Ships are always in a fleet, empty fleets are gone, and system and
//!    planet membership agree in both directions.
//!
//! 3. **Deterministic**: All randomness comes from one seeded `GameRng`,
//!    all iterated state is ordered, and structural checksums are stable
//!    across platforms.
//!
//! ## Modules
//!
//! - `core`: Object and empire ids, meters, RNG, configuration, errors, checksums
//! - `universe`: Objects, containment, empires, content, visibility, pathfinding
//! - `scripting`: Expressions, conditions, affiliations and their context
//! - `effects`: Effects, effects groups, batch execution and accounting

pub mod core;
pub mod universe;
pub mod scripting;
pub mod effects;

// Re-export commonly used types
pub use crate::core::{
    CheckSum, EffectError, EmpireId, EngineConfig, GameRng, GameRngState, Meter, MeterType,
    ObjectId, RouteError, ALL_EMPIRES, INVALID_OBJECT_ID,
};

pub use crate::universe::{
    ContentRegistry, Empire, FleetAggression, ObjectKind, Pathfinder, PlanetSize, PlanetType,
    StarType, StarlanePathfinder, Universe, UniverseObject, UniverseObjectType, Visibility,
};

pub use crate::scripting::{
    AffiliationResolver, Condition, EmpireAffiliation, ScriptingContext, Value, ValueRef,
};

pub use crate::effects::{
    apply_effect_derived_visibilities, AccountingLedger, BatchPath, Effect, EffectCause, EffectsApplication,
    EffectsCauseType, EffectsGroup, ExecutionFilter, FocalPoint, ShipDesignRef,
};
