//! Errors raised by the engine.
//!
//! Both kinds are contract violations by the caller (or by malformed type
//! declarations) rather than recoverable runtime conditions.

use reify_diag::{Category, Diagnostic};

use crate::{ClassType, TypeExpr, VariableKey};

/// Error type for every fallible engine operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// Formal and actual type expressions are structurally incompatible.
    #[error("{}", .reason.describe(.formal, .actual))]
    MalformedUnification {
        formal: TypeExpr,
        actual: TypeExpr,
        reason: Mismatch,
    },
    /// A substitution or declaration would break an engine invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(#[from] Violation),
}

/// Why a formal type could not be unified with an actual type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Wildcards with different upper or lower bound counts.
    WildcardBoundCount,
    /// A parameterized formal against an actual that is not parameterized.
    NotParameterized,
    /// Parameterized types over different raw classes.
    InconsistentRawType { formal: ClassType, actual: ClassType },
    /// Same raw class, different number of type arguments.
    ArgumentCount { formal: usize, actual: usize },
    /// An array formal against an actual without a component type.
    NotAnArray,
    /// A raw class can only be unified with itself or a wildcard.
    RawClass { class: ClassType },
}

impl Mismatch {
    fn describe(&self, formal: &TypeExpr, actual: &TypeExpr) -> String {
        match self {
            Mismatch::WildcardBoundCount => {
                format!("incompatible wildcard bounds: `{formal}` vs `{actual}`")
            }
            Mismatch::NotParameterized => {
                format!("`{actual}` is not a parameterized type (unifying with `{formal}`)")
            }
            Mismatch::InconsistentRawType {
                formal: formal_raw,
                actual: actual_raw,
            } => format!(
                "inconsistent raw type: `{formal_raw}` vs `{actual_raw}` (unifying `{formal}` with `{actual}`)"
            ),
            Mismatch::ArgumentCount {
                formal: formal_count,
                actual: actual_count,
            } => format!(
                "`{formal}` not compatible with `{actual}`: {formal_count} vs {actual_count} type arguments"
            ),
            Mismatch::NotAnArray => {
                format!("`{actual}` is not an array type (unifying with `{formal}`)")
            }
            Mismatch::RawClass { class } => {
                format!("no mapping from raw class `{class}` to `{actual}`")
            }
        }
    }
}

/// An engine invariant that a caller or declaration broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("type variable `{0}` bound to itself")]
    SelfBinding(VariableKey),
    #[error("class `{0}` has no declaration in the class registry")]
    UndeclaredClass(ClassType),
    #[error("expected {declared} type arguments for `{class}`, but got {supplied}")]
    ParameterCount {
        class: ClassType,
        declared: usize,
        supplied: usize,
    },
}

impl TypeError {
    pub fn mismatch(formal: &TypeExpr, actual: &TypeExpr, reason: Mismatch) -> Self {
        TypeError::MalformedUnification {
            formal: formal.clone(),
            actual: actual.clone(),
            reason,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TypeError::MalformedUnification { .. } => Category::MalformedUnification,
            TypeError::InvariantViolation(_) => Category::InvariantViolation,
        }
    }

    /// Render this error as a coded diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let category = self.category();
        Diagnostic::error(category, self.to_string()).with_help(category.example_fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeId;

    #[test]
    fn raw_class_message_names_both_sides() {
        let err = TypeError::mismatch(
            &TypeExpr::class("String"),
            &TypeExpr::class("Integer"),
            Mismatch::RawClass {
                class: ClassType::new("String"),
            },
        );
        assert_eq!(err.to_string(), "no mapping from raw class `String` to `Integer`");
        assert_eq!(err.category(), Category::MalformedUnification);
    }

    #[test]
    fn inconsistent_raw_type_message_names_both_raw_types() {
        let formal = TypeExpr::parameterized(
            ClassType::new("List"),
            vec![TypeExpr::variable(ScopeId::of_type("List"), "E")],
        );
        let actual =
            TypeExpr::parameterized(ClassType::new("Set"), vec![TypeExpr::class("String")]);
        let err = TypeError::mismatch(
            &formal,
            &actual,
            Mismatch::InconsistentRawType {
                formal: ClassType::new("List"),
                actual: ClassType::new("Set"),
            },
        );
        assert_eq!(
            err.to_string(),
            "inconsistent raw type: `List` vs `Set` (unifying `List<E>` with `Set<String>`)"
        );
    }

    #[test]
    fn violation_converts_into_invariant_error() {
        let key = crate::VariableKey::new(ScopeId::of_type("Box"), "T");
        let err: TypeError = Violation::SelfBinding(key).into();
        assert_eq!(
            err.to_string(),
            "invariant violated: type variable `T` bound to itself"
        );

        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "E0002");
        assert!(diag.help.is_some());
        assert!(diag.to_string().starts_with("error[E0002]: invariant violated"));
    }
}
