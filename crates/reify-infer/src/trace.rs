//! Step-by-step unification traces.
//!
//! Recording is opt-in through [`UnifierOptions::record_trace`](crate::UnifierOptions);
//! a unifier built with the default options records nothing.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Unification trace
// ---------------------------------------------------------------------------

/// A single decision taken while unifying a formal type with an actual type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifyStep {
    pub step: usize,
    pub action: UnifyAction,
    pub formal: String,
    pub actual: String,
    pub detail: String,
}

/// What the unifier did at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifyAction {
    /// Formal and actual already equal, nothing recorded.
    Identity,
    /// Formal variable bound to the actual type (e.g. `K := String`).
    Bind,
    /// One side is a wildcard; accepted without a binding.
    AcceptWildcard,
    /// Structural recursion into arguments, owners, bounds or components.
    Decompose,
    /// Unification failed.
    Error,
}

impl UnifyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            UnifyAction::Identity => "identity",
            UnifyAction::Bind => "bind",
            UnifyAction::AcceptWildcard => "accept_wildcard",
            UnifyAction::Decompose => "decompose",
            UnifyAction::Error => "error",
        }
    }
}

impl std::fmt::Display for UnifyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}. {} {} ~ {}: {}",
            self.step,
            self.action.as_str(),
            self.formal,
            self.actual,
            self.detail
        )
    }
}

/// Render a trace one step per line.
pub fn render_trace(steps: &[UnifyStep]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
