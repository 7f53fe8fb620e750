//! Error taxonomy for effect execution and route assignment.
//!
//! Effect executors return `Result<(), EffectError>` internally. The
//! dispatcher logs the error with the severity its class calls for and
//! swallows it: no error ever crosses an effect boundary.

use thiserror::Error;

use super::{EmpireId, ObjectId};

/// Failures while computing or assigning a fleet route.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RouteError {
    #[error("{0} is not a known system")]
    UnknownSystem(ObjectId),

    #[error("{0} is not a fleet")]
    NotAFleet(ObjectId),

    #[error("fleet {0} has no system to start a route from")]
    NoStartSystem(ObjectId),

    #[error("route for fleet {0} is empty")]
    EmptyRoute(ObjectId),

    #[error("fleet {0} cannot move")]
    Immobile(ObjectId),
}

/// Failures inside a single effect execution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EffectError {
    #[error("target {0} does not exist")]
    MissingTarget(ObjectId),

    #[error("{effect} does not apply to {kind} {target}")]
    WrongKind {
        effect: &'static str,
        kind: &'static str,
        target: ObjectId,
    },

    #[error("unknown {kind} '{name}'")]
    MissingContent { kind: &'static str, name: String },

    #[error("unknown empire {0}")]
    UnknownEmpire(EmpireId),

    #[error("system {0} has no free orbit")]
    NoFreeOrbit(ObjectId),

    #[error("{0} is not in a system")]
    NotInSystem(ObjectId),

    #[error("no valid destination")]
    NoDestination,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Route(#[from] RouteError),
}

impl EffectError {
    pub fn missing_content(kind: &'static str, name: impl Into<String>) -> Self {
        Self::MissingContent {
            kind,
            name: name.into(),
        }
    }

    /// Whether this failure indicates broken content or universe state,
    /// as opposed to an effect that simply had nothing to do.
    #[must_use]
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::MissingContent { .. }
                | Self::UnknownEmpire(_)
                | Self::NoFreeOrbit(_)
                | Self::InvalidParameter(_)
                | Self::Route(_)
        )
    }

    /// Log this error for `effect` at the severity its class calls for.
    pub fn log(&self, effect: &str) {
        if self.is_content_error() {
            tracing::error!(effect, error = %self, "effect aborted");
        } else {
            tracing::debug!(effect, reason = %self, "effect skipped");
        }
    }
}
