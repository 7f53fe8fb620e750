//! Scripting primitives: expressions, conditions and the context they are
//! evaluated in.
//!
//! Content (buildings, specials, techs, species) describes its behavior as
//! trees of these types. Nothing here mutates the universe; effects do
//! that, using these to decide what and how much.

pub mod context;
pub mod valueref;
pub mod condition;
pub mod affiliation;

pub use context::ScriptingContext;
pub use valueref::{
    IncrementSign, OpType, Property, ReferenceType, Value, ValueRef, ValueType, Variable,
};
pub use condition::Condition;
pub use affiliation::{AffiliationResolver, EmpireAffiliation};
