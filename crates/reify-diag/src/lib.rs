//! Error reporting and diagnostics for reify.
//!
//! Errors are produced by `reify-types` and `reify-infer` as typed values;
//! this crate gives each of them a stable code and a rendered form so that
//! code generators and mappers built on the engine can report them uniformly.

use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostic categories
// ---------------------------------------------------------------------------

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Formal and actual type expressions are structurally incompatible.
    MalformedUnification,
    /// An engine contract was violated (self-binding, malformed declaration).
    InvariantViolation,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::MalformedUnification, Category::InvariantViolation];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::MalformedUnification => "malformed_unification",
            Category::InvariantViolation => "invariant_violation",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::MalformedUnification => "E0001",
            Category::InvariantViolation => "E0002",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::MalformedUnification => {
                "The actual type does not have the shape required by the formal type."
            }
            Category::InvariantViolation => {
                "A substitution or type declaration broke an engine invariant."
            }
        }
    }

    pub fn example_fix(self) -> &'static str {
        match self {
            Category::MalformedUnification => {
                "Pass an actual type with the same raw type and argument count as the formal."
            }
            Category::InvariantViolation => {
                "Check the class registry declarations and never bind a variable to itself."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0001).
    pub code: String,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: category.code().to_string(),
            category,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)?;
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_builder() {
        let diag = Diagnostic::error(Category::MalformedUnification, "Map<K, V> vs List<String>")
            .with_help("unify against a Map");

        assert_eq!(diag.code, "E0001");
        assert_eq!(diag.category, Category::MalformedUnification);
        assert!(diag.message.contains("List<String>"));
        assert!(diag.help.unwrap().contains("Map"));
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::error(Category::InvariantViolation, "type variable T bound to itself");
        assert_eq!(diag.to_string(), "error[E0002]: type variable T bound to itself");

        let with_help = diag.with_help("drop the binding");
        assert_eq!(
            with_help.to_string(),
            "error[E0002]: type variable T bound to itself\n  help: drop the binding"
        );
    }

    #[test]
    fn category_metadata_is_stable_and_unique() {
        let mut codes = std::collections::BTreeSet::new();
        for cat in Category::all() {
            assert!(!cat.as_str().is_empty());
            assert!(!cat.description().is_empty());
            assert!(!cat.example_fix().is_empty());
            assert!(
                codes.insert(cat.code()),
                "duplicate diagnostic code detected: {}",
                cat.code()
            );
        }
    }
}
