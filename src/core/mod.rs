//! Core engine types: ids, meters, RNG, configuration, errors, checksums.
//!
//! These are the building blocks every other module depends on. Nothing in
//! here knows about specific object kinds or effects.

pub mod entity;
pub mod empire_id;
pub mod meter;
pub mod rng;
pub mod config;
pub mod error;
pub mod checksum;

pub use entity::{ObjectId, INVALID_OBJECT_ID};
pub use empire_id::{EmpireId, ALL_EMPIRES};
pub use meter::{Meter, MeterType};
pub use rng::{GameRng, GameRngState};
pub use config::EngineConfig;
pub use error::{EffectError, RouteError};
pub use checksum::{CheckSum, FnvHasher};
