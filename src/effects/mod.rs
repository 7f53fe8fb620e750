//! Effects: the mutations content applies to the universe.
//!
//! - `Effect`: one atomic mutation, with single-target and batch execution
//! - `EffectsGroup`: scope, activation and an ordered list of effects
//! - `EffectsApplication`: many sourced groups applied in one ordered pass
//! - `AccountingLedger`: optional record of every meter change and its cause
//!
//! ## Error handling
//!
//! Executors return `Result<(), EffectError>` internally. The dispatcher
//! logs failures and moves on, so a broken effect never stops the groups
//! around it.

mod effect;
mod execute;
pub(crate) mod executors;
pub mod accounting;
pub mod batch;
pub mod group;
pub mod runner;

pub use effect::{target_owner, Effect, FocalPoint, ShipDesignRef};
pub use accounting::{AccountingInfo, AccountingLedger, EffectCause, EffectsCauseType};
pub use batch::{BatchPath, ExecutionFilter};
pub use group::EffectsGroup;
pub use runner::{apply_effect_derived_visibilities, EffectsApplication, SourcedGroup, TargetsAndCause};
