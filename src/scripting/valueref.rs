//! Typed expression trees.
//!
//! A `ValueRef<T>` computes a `T` from a `ScriptingContext`: a constant,
//! the current value being modified, the turn number, a property of the
//! source or target object, or an arithmetic combination of those.
//!
//! ## Optimization hints
//!
//! - `target_invariant()`: the result does not depend on the effect target,
//!   so a batch may evaluate it once for every target.
//! - `simple_increment()`: the tree is `CurrentValue ± c` with `c`
//!   target-invariant, so a batch may evaluate `c` once and add it.
//!
//! ```
//! use effect_engine::scripting::{OpType, ValueRef};
//!
//! let plus_five: ValueRef<f64> = ValueRef::increment(ValueRef::Constant(5.0));
//! assert!(!plus_five.target_invariant());
//! assert!(plus_five.simple_increment().is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::core::checksum::{combine_serialized, CheckSum, FnvHasher};
use crate::core::{MeterType, ObjectId};
use crate::universe::{PlanetSize, PlanetType, StarType, UniverseObject, Visibility};

use super::context::ScriptingContext;

/// A dynamically typed value flowing through evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Double(f64),
    Int(i32),
    Text(String),
    PlanetType(PlanetType),
    PlanetSize(PlanetSize),
    StarType(StarType),
    Visibility(Visibility),
}

/// Types a `ValueRef` can produce.
pub trait ValueType: Clone + std::fmt::Debug + PartialEq + Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: Value) -> Option<Self>;

    fn into_value(self) -> Value;

    /// Result of an evaluation that failed.
    fn default_value() -> Self;

    /// Apply a binary operator; `None` when the type does not support it.
    fn apply(op: OpType, lhs: Self, rhs: Self) -> Option<Self> {
        let _ = (op, lhs, rhs);
        None
    }
}

impl ValueType for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(v),
            Value::Int(v) => Some(f64::from(v)),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn default_value() -> Self {
        0.0
    }

    fn apply(op: OpType, lhs: Self, rhs: Self) -> Option<Self> {
        Some(match op {
            OpType::Plus => lhs + rhs,
            OpType::Minus => lhs - rhs,
            OpType::Times => lhs * rhs,
            OpType::Divide if rhs == 0.0 => 0.0,
            OpType::Divide => lhs / rhs,
            OpType::Min => lhs.min(rhs),
            OpType::Max => lhs.max(rhs),
        })
    }
}

impl ValueType for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            // Nearest integer; out-of-range values saturate.
            Value::Double(v) => Some(v.round() as i32),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn default_value() -> Self {
        0
    }

    fn apply(op: OpType, lhs: Self, rhs: Self) -> Option<Self> {
        Some(match op {
            OpType::Plus => lhs.saturating_add(rhs),
            OpType::Minus => lhs.saturating_sub(rhs),
            OpType::Times => lhs.saturating_mul(rhs),
            OpType::Divide => lhs.checked_div(rhs).unwrap_or(0),
            OpType::Min => lhs.min(rhs),
            OpType::Max => lhs.max(rhs),
        })
    }
}

impl ValueType for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v),
            Value::Int(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn default_value() -> Self {
        String::new()
    }

    fn apply(op: OpType, lhs: Self, rhs: Self) -> Option<Self> {
        match op {
            OpType::Plus => Some(lhs + &rhs),
            OpType::Min => Some(lhs.min(rhs)),
            OpType::Max => Some(lhs.max(rhs)),
            _ => None,
        }
    }
}

macro_rules! enum_value_type {
    ($ty:ident, $name:literal, $invalid:expr) => {
        impl ValueType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$ty(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$ty(self)
            }

            fn default_value() -> Self {
                $invalid
            }
        }
    };
}

enum_value_type!(PlanetType, "planet type", PlanetType::Invalid);
enum_value_type!(PlanetSize, "planet size", PlanetSize::Invalid);
enum_value_type!(StarType, "star type", StarType::Invalid);
enum_value_type!(Visibility, "visibility", Visibility::None);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    Plus,
    Minus,
    Times,
    Divide,
    Min,
    Max,
}

/// Which object a variable reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    Source,
    Target,
}

/// Object properties readable by a variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Id,
    Owner,
    SystemId,
    FleetId,
    PlanetId,
    X,
    Y,
    CreationTurn,
    Age,
    Name,
    Species,
    PlanetType,
    PlanetSize,
    StarType,
    DesignId,
    FinalDestinationId,
    Meter(MeterType),
    InitialMeter(MeterType),
    SpecialCapacity(String),
}

impl Property {
    /// Value read from `obj`, or `None` if the object has no such property.
    fn read(&self, obj: &UniverseObject, ctx: &ScriptingContext<'_>) -> Option<Value> {
        let id = |id: ObjectId| Some(Value::Int(id.raw()));
        match self {
            Self::Id => id(obj.id),
            Self::Owner => Some(Value::Int(obj.owner.raw())),
            Self::SystemId => id(obj.system_id),
            Self::FleetId => match obj.as_fleet() {
                Some(_) => id(obj.id),
                None => obj.as_ship().map(|ship| Value::Int(ship.fleet_id.raw())),
            },
            Self::PlanetId => match obj.as_planet() {
                Some(_) => id(obj.id),
                None => obj.as_building().map(|b| Value::Int(b.planet_id.raw())),
            },
            Self::X => Some(Value::Double(obj.x)),
            Self::Y => Some(Value::Double(obj.y)),
            Self::CreationTurn => Some(Value::Int(obj.created_turn)),
            Self::Age => Some(Value::Int(ctx.current_turn() - obj.created_turn)),
            Self::Name => Some(Value::Text(obj.name.clone())),
            Self::Species => obj.species().map(|s| Value::Text(s.to_string())),
            Self::PlanetType => obj.as_planet().map(|p| Value::PlanetType(p.planet_type)),
            Self::PlanetSize => obj.as_planet().map(|p| Value::PlanetSize(p.size)),
            Self::StarType => obj
                .as_system()
                .or_else(|| ctx.universe.get(obj.system_id).and_then(UniverseObject::as_system))
                .map(|s| Value::StarType(s.star)),
            Self::DesignId => obj.as_ship().map(|ship| Value::Int(ship.design_id)),
            Self::FinalDestinationId => obj
                .as_fleet()
                .map(|fleet| Value::Int(fleet.final_destination.raw())),
            Self::Meter(meter) => obj.meter(*meter).map(|m| Value::Double(m.current())),
            Self::InitialMeter(meter) => obj.meter(*meter).map(|m| Value::Double(m.initial())),
            Self::SpecialCapacity(name) => obj.special_capacity(name).map(Value::Double),
        }
    }

    /// Id-valued properties read as -1 when there is nothing to read.
    fn missing_value(&self) -> Option<Value> {
        match self {
            Self::Id
            | Self::Owner
            | Self::SystemId
            | Self::FleetId
            | Self::PlanetId
            | Self::DesignId
            | Self::FinalDestinationId => Some(Value::Int(-1)),
            _ => None,
        }
    }
}

/// A property lookup on the source or target object.
///
/// Equality ignores `top_level_content`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variable {
    pub reference: ReferenceType,
    pub property: Property,
    /// Name of the content item this expression belongs to, for diagnostics.
    #[serde(skip)]
    pub top_level_content: Option<String>,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference && self.property == other.property
    }
}

impl Variable {
    #[must_use]
    pub fn new(reference: ReferenceType, property: Property) -> Self {
        Self {
            reference,
            property,
            top_level_content: None,
        }
    }

    fn eval(&self, ctx: &ScriptingContext<'_>) -> Option<Value> {
        let id = match self.reference {
            ReferenceType::Source => ctx.source,
            ReferenceType::Target => ctx.target,
        };
        let Some(obj) = ctx.universe.get(id) else {
            tracing::trace!(
                reference = ?self.reference,
                object = %id,
                content = self.top_level_content.as_deref().unwrap_or(""),
                "variable references missing object"
            );
            return self.property.missing_value();
        };
        self.property.read(obj, ctx).or_else(|| self.property.missing_value())
    }
}

/// Sign of a simple increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncrementSign {
    Add,
    Subtract,
}

/// A typed expression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueRef<T> {
    Constant(T),
    /// The pre-effect value of whatever is being modified.
    CurrentValue,
    CurrentTurn,
    Variable(Variable),
    Operation {
        op: OpType,
        lhs: Box<ValueRef<T>>,
        rhs: Box<ValueRef<T>>,
    },
}

impl<T: ValueType> ValueRef<T> {
    /// Property of the effect target.
    #[must_use]
    pub fn target(property: Property) -> Self {
        Self::Variable(Variable::new(ReferenceType::Target, property))
    }

    /// Property of the effect source.
    #[must_use]
    pub fn source(property: Property) -> Self {
        Self::Variable(Variable::new(ReferenceType::Source, property))
    }

    #[must_use]
    pub fn operation(op: OpType, lhs: ValueRef<T>, rhs: ValueRef<T>) -> Self {
        Self::Operation {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `CurrentValue + amount`.
    #[must_use]
    pub fn increment(amount: ValueRef<T>) -> Self {
        Self::operation(OpType::Plus, Self::CurrentValue, amount)
    }

    /// `CurrentValue - amount`.
    #[must_use]
    pub fn decrement(amount: ValueRef<T>) -> Self {
        Self::operation(OpType::Minus, Self::CurrentValue, amount)
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Whether evaluation never depends on the effect target or on the
    /// current value.
    #[must_use]
    pub fn target_invariant(&self) -> bool {
        match self {
            Self::Constant(_) | Self::CurrentTurn => true,
            Self::CurrentValue => false,
            Self::Variable(var) => var.reference != ReferenceType::Target,
            Self::Operation { lhs, rhs, .. } => lhs.target_invariant() && rhs.target_invariant(),
        }
    }

    /// `Some((sign, c))` when this is `CurrentValue ± c` with `c`
    /// target-invariant.
    #[must_use]
    pub fn simple_increment(&self) -> Option<(IncrementSign, &ValueRef<T>)> {
        match self {
            Self::Operation { op, lhs, rhs }
                if matches!(**lhs, Self::CurrentValue) && rhs.target_invariant() =>
            {
                match op {
                    OpType::Plus => Some((IncrementSign::Add, &**rhs)),
                    OpType::Minus => Some((IncrementSign::Subtract, &**rhs)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Evaluate against `ctx`. Failures yield `T::default_value()`.
    pub fn eval(&self, ctx: &ScriptingContext<'_>) -> T {
        match self {
            Self::Constant(value) => value.clone(),
            Self::CurrentValue => ctx
                .current_value
                .clone()
                .and_then(T::from_value)
                .unwrap_or_else(|| {
                    tracing::trace!(ty = T::TYPE_NAME, "no usable current value");
                    T::default_value()
                }),
            Self::CurrentTurn => {
                T::from_value(Value::Int(ctx.current_turn())).unwrap_or_else(T::default_value)
            }
            Self::Variable(var) => var
                .eval(ctx)
                .and_then(T::from_value)
                .unwrap_or_else(T::default_value),
            Self::Operation { op, lhs, rhs } => {
                let lhs = lhs.eval(ctx);
                let rhs = rhs.eval(ctx);
                T::apply(*op, lhs.clone(), rhs).unwrap_or_else(|| {
                    tracing::trace!(ty = T::TYPE_NAME, ?op, "unsupported operation");
                    lhs
                })
            }
        }
    }

    /// Attach the owning content name to every variable in the tree.
    pub fn set_top_level_content(&mut self, name: &str) {
        match self {
            Self::Variable(var) => var.top_level_content = Some(name.to_string()),
            Self::Operation { lhs, rhs, .. } => {
                lhs.set_top_level_content(name);
                rhs.set_top_level_content(name);
            }
            Self::Constant(_) | Self::CurrentValue | Self::CurrentTurn => {}
        }
    }
}

impl<T: ValueType> From<T> for ValueRef<T> {
    fn from(value: T) -> Self {
        Self::Constant(value)
    }
}

impl<T: Serialize> CheckSum for ValueRef<T> {
    const KIND: &'static str = "ValueRef";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}
