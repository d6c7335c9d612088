//! Unification and resolution of generic types for reify.
//!
//! This crate implements:
//! - Structural unification of a formal type against an actual type,
//!   producing variable bindings in a [`SubstitutionTable`]
//! - Wildcard capture ([`capture`])
//! - Supertype introspection through a [`ClassRegistry`] ([`extract_mappings`])
//!
//! Resolution of type expressions against a table lives on
//! [`SubstitutionTable::resolve`] in `reify-types`.

pub mod capture;
pub mod introspect;
pub mod trace;


use std::collections::BTreeMap;

use reify_types::{
    ClassRegistry, Mismatch, SubstitutionTable, TypeError, TypeExpr, VariableKey, component_type,
};

use crate::trace::{UnifyAction, UnifyStep};

pub use capture::capture;
pub use introspect::extract_mappings;

// Re-export for convenience.
pub use reify_diag::{Category, Diagnostic};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Unify `formal` with `actual` into a fresh table.
///
/// `unify(Map<K, V>, Map<String, Integer>)` yields `{K -> String, V -> Integer}`.
pub fn unify(formal: &TypeExpr, actual: &TypeExpr) -> Result<SubstitutionTable, TypeError> {
    unify_into(&SubstitutionTable::new(), formal, actual)
}

/// Unify `formal` with `actual` and extend `table` with the new bindings.
/// On failure nothing is committed and `table` stays as it was.
pub fn unify_into(
    table: &SubstitutionTable,
    formal: &TypeExpr,
    actual: &TypeExpr,
) -> Result<SubstitutionTable, TypeError> {
    let mut unifier = Unifier::new();
    unifier.populate(formal, actual)?;
    table.extend(unifier.into_mappings())
}

/// A table holding every mapping `context` implies for its generic
/// supertypes, as collected by [`extract_mappings`].
pub fn from_context(
    context: &TypeExpr,
    registry: &ClassRegistry,
) -> Result<SubstitutionTable, TypeError> {
    SubstitutionTable::new().extend(extract_mappings(context, registry)?)
}

// ---------------------------------------------------------------------------
// Unifier
// ---------------------------------------------------------------------------

/// Tuning for a [`Unifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnifierOptions {
    /// Record a [`UnifyStep`] for each decision.
    pub record_trace: bool,
    /// Maximum number of recorded steps; later steps are dropped.
    pub trace_limit: usize,
}

impl Default for UnifierOptions {
    fn default() -> Self {
        Self {
            record_trace: false,
            trace_limit: 256,
        }
    }
}

/// Accumulates variable bindings from formal/actual type pairs.
///
/// Repeated [`populate`](Self::populate) calls share one mapping set, and a
/// later binding of the same variable replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct Unifier {
    mappings: BTreeMap<VariableKey, TypeExpr>,
    options: UnifierOptions,
    /// Populated only when `options.record_trace` is set.
    unify_trace: Vec<UnifyStep>,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: UnifierOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Bindings recorded so far.
    pub fn mappings(&self) -> &BTreeMap<VariableKey, TypeExpr> {
        &self.mappings
    }

    pub fn into_mappings(self) -> BTreeMap<VariableKey, TypeExpr> {
        self.mappings
    }

    /// Steps recorded so far (empty unless tracing is enabled).
    pub fn unify_trace(&self) -> &[UnifyStep] {
        &self.unify_trace
    }

    /// Unify `formal` with `actual`, recording bindings for the variables
    /// in `formal`.
    ///
    /// On error the mappings are restored to what they were before the
    /// call. Trace steps, including the failing one, are kept.
    pub fn populate(&mut self, formal: &TypeExpr, actual: &TypeExpr) -> Result<(), TypeError> {
        let snapshot = self.mappings.clone();
        let result = self.unify_types(formal, actual);
        if result.is_err() {
            self.mappings = snapshot;
        }
        result
    }

    fn unify_types(&mut self, formal: &TypeExpr, actual: &TypeExpr) -> Result<(), TypeError> {
        if formal == actual {
            self.push_unify_step(UnifyAction::Identity, formal, actual, "types already equal".into());
            return Ok(());
        }

        match (formal, actual) {
            (TypeExpr::Variable(var), _) => {
                self.push_unify_step(
                    UnifyAction::Bind,
                    formal,
                    actual,
                    format!("{} := {actual}", var.name()),
                );
                tracing::trace!(variable = %var.name(), ty = %actual, "bound type variable");
                self.mappings.insert(var.key(), actual.clone());
                Ok(())
            }

            (TypeExpr::Wildcard(from), TypeExpr::Wildcard(to)) => {
                if from.upper_bounds.len() != to.upper_bounds.len()
                    || from.lower_bounds.len() != to.lower_bounds.len()
                {
                    return Err(self.fail(formal, actual, Mismatch::WildcardBoundCount));
                }
                self.push_unify_step(
                    UnifyAction::Decompose,
                    formal,
                    actual,
                    "unify wildcard bounds pairwise".into(),
                );
                for (f, a) in from.upper_bounds.iter().zip(&to.upper_bounds) {
                    self.unify_types(f, a)?;
                }
                for (f, a) in from.lower_bounds.iter().zip(&to.lower_bounds) {
                    self.unify_types(f, a)?;
                }
                Ok(())
            }

            // Wildcard acceptance is unconditional: no bound is checked.
            (TypeExpr::Wildcard(_), _) => {
                self.push_unify_step(
                    UnifyAction::AcceptWildcard,
                    formal,
                    actual,
                    "wildcard accepts any type".into(),
                );
                Ok(())
            }
            (_, TypeExpr::Wildcard(_)) => {
                self.push_unify_step(
                    UnifyAction::AcceptWildcard,
                    formal,
                    actual,
                    format!("{} satisfies a wildcard", formal.kind_name()),
                );
                Ok(())
            }

            (TypeExpr::Parameterized(from), _) => {
                let TypeExpr::Parameterized(to) = actual else {
                    return Err(self.fail(formal, actual, Mismatch::NotParameterized));
                };
                if let (Some(from_owner), Some(to_owner)) = (&from.owner, &to.owner) {
                    self.unify_types(from_owner, to_owner)?;
                }
                if from.raw != to.raw {
                    return Err(self.fail(
                        formal,
                        actual,
                        Mismatch::InconsistentRawType {
                            formal: from.raw.clone(),
                            actual: to.raw.clone(),
                        },
                    ));
                }
                if from.args.len() != to.args.len() {
                    return Err(self.fail(
                        formal,
                        actual,
                        Mismatch::ArgumentCount {
                            formal: from.args.len(),
                            actual: to.args.len(),
                        },
                    ));
                }
                self.push_unify_step(
                    UnifyAction::Decompose,
                    formal,
                    actual,
                    format!("unify {} type arguments pairwise", from.args.len()),
                );
                for (f, a) in from.args.iter().zip(&to.args) {
                    self.unify_types(f, a)?;
                }
                Ok(())
            }

            (TypeExpr::Array(from), _) => {
                let Some(component) = component_type(actual) else {
                    return Err(self.fail(formal, actual, Mismatch::NotAnArray));
                };
                self.push_unify_step(
                    UnifyAction::Decompose,
                    formal,
                    actual,
                    "unify array components".into(),
                );
                self.unify_types(from.component(), &component)
            }

            (TypeExpr::Class(class), _) => Err(self.fail(
                formal,
                actual,
                Mismatch::RawClass {
                    class: class.clone(),
                },
            )),
        }
    }

    fn fail(&mut self, formal: &TypeExpr, actual: &TypeExpr, reason: Mismatch) -> TypeError {
        let err = TypeError::mismatch(formal, actual, reason);
        self.push_unify_step(UnifyAction::Error, formal, actual, err.to_string());
        err
    }

    fn push_unify_step(
        &mut self,
        action: UnifyAction,
        formal: &TypeExpr,
        actual: &TypeExpr,
        detail: String,
    ) {
        if self.options.record_trace && self.unify_trace.len() < self.options.trace_limit {
            let step = self.unify_trace.len() + 1;
            self.unify_trace.push(UnifyStep {
                step,
                action,
                formal: formal.to_string(),
                actual: actual.to_string(),
                detail,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reify_types::{ClassDecl, ClassType, ScopeId, Violation};

    fn generic(raw: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::parameterized(ClassType::new(raw), args)
    }

    fn map_var(name: &str) -> TypeExpr {
        TypeExpr::variable(ScopeId::of_type("Map"), name)
    }

    fn string() -> TypeExpr {
        TypeExpr::class("String")
    }

    fn integer() -> TypeExpr {
        TypeExpr::class("Integer")
    }

    #[test]
    fn unify_map_binds_key_and_value() {
        let table = unify(
            &generic("Map", vec![map_var("K"), map_var("V")]),
            &generic("Map", vec![string(), integer()]),
        )
        .expect("unifiable");

        assert_eq!(table.resolve(&map_var("K")), string());
        assert_eq!(table.resolve(&map_var("V")), integer());
        assert_eq!(table.resolve(&generic("List", vec![map_var("K")])), generic("List", vec![string()]));
    }

    #[test]
    fn unify_equal_types_binds_nothing() {
        let ty = generic("List", vec![map_var("K")]);
        let table = unify(&ty, &ty).expect("reflexive");
        assert!(table.is_empty());
    }

    #[test]
    fn last_binding_wins() {
        let mut unifier = Unifier::new();
        unifier.populate(&map_var("K"), &string()).expect("bind");
        unifier.populate(&map_var("K"), &integer()).expect("rebind");
        assert_eq!(
            unifier.mappings().get(&VariableKey::new(ScopeId::of_type("Map"), "K")),
            Some(&integer())
        );
    }

    #[test]
    fn wildcard_formal_accepts_anything_without_binding() {
        let formal = TypeExpr::subtype_of(map_var("K"));
        let table = unify(&formal, &generic("List", vec![string()])).expect("permissive");
        assert!(table.is_empty());
    }

    #[test]
    fn non_variable_formal_accepts_wildcard_actual() {
        for formal in [
            string(),
            generic("List", vec![map_var("K")]),
            TypeExpr::array_of(map_var("K")),
        ] {
            let table = unify(&formal, &TypeExpr::wildcard()).expect("permissive");
            assert!(table.is_empty(), "{formal} bound something");
        }
    }

    #[test]
    fn wildcards_unify_bounds_pairwise() {
        let table = unify(
            &TypeExpr::supertype_of(map_var("K")),
            &TypeExpr::supertype_of(string()),
        )
        .expect("matching bounds");
        assert_eq!(table.resolve(&map_var("K")), string());

        let err = unify(
            &TypeExpr::supertype_of(map_var("K")),
            &TypeExpr::subtype_of(string()),
        )
        .expect_err("bound counts differ");
        assert!(matches!(
            err,
            TypeError::MalformedUnification {
                reason: Mismatch::WildcardBoundCount,
                ..
            }
        ));
    }

    #[test]
    fn inconsistent_raw_types_are_fatal() {
        let err = unify(
            &generic("List", vec![map_var("K")]),
            &generic("Set", vec![string()]),
        )
        .expect_err("different raw types");
        let message = err.to_string();
        assert!(message.contains("`List` vs `Set`"), "{message}");
    }

    #[test]
    fn argument_count_mismatch_is_fatal() {
        let err = unify(
            &generic("Map", vec![map_var("K"), map_var("V")]),
            &generic("Map", vec![string()]),
        )
        .expect_err("arity mismatch");
        assert!(matches!(
            err,
            TypeError::MalformedUnification {
                reason: Mismatch::ArgumentCount { formal: 2, actual: 1 },
                ..
            }
        ));
    }

    #[test]
    fn parameterized_formal_requires_parameterized_actual() {
        let err = unify(&generic("List", vec![map_var("K")]), &string()).expect_err("raw actual");
        assert_eq!(err.category(), Category::MalformedUnification);
        assert!(matches!(
            err,
            TypeError::MalformedUnification {
                reason: Mismatch::NotParameterized,
                ..
            }
        ));
    }

    #[test]
    fn generic_array_unifies_with_native_array_class() {
        let table = unify(
            &TypeExpr::array_of(map_var("K")),
            &TypeExpr::array_of(string()),
        )
        .expect("array components");
        assert_eq!(table.resolve(&map_var("K")), string());

        let err = unify(&TypeExpr::array_of(map_var("K")), &string()).expect_err("not an array");
        assert!(matches!(
            err,
            TypeError::MalformedUnification {
                reason: Mismatch::NotAnArray,
                ..
            }
        ));
    }

    #[test]
    fn generic_array_unifies_with_bounded_variable_component() {
        let bounded = TypeExpr::variable_with_bounds(
            ScopeId::method("Arrays", "fill"),
            "A",
            vec![TypeExpr::array_of(integer())],
        );
        let table = unify(&TypeExpr::array_of(map_var("K")), &bounded).expect("array bound");
        assert_eq!(table.resolve(&map_var("K")), TypeExpr::subtype_of(integer()));
    }

    #[test]
    fn raw_class_formal_rejects_other_types() {
        let err = unify(&string(), &integer()).expect_err("distinct classes");
        assert_eq!(err.to_string(), "no mapping from raw class `String` to `Integer`");
    }

    #[test]
    fn owners_are_unified_when_both_present() {
        let outer_t = TypeExpr::variable(ScopeId::of_type("Outer"), "T");
        let inner_u = TypeExpr::variable(ScopeId::of_type("Inner"), "U");
        let formal = TypeExpr::parameterized_with_owner(
            Some(generic("Outer", vec![outer_t.clone()])),
            ClassType::new("Inner"),
            vec![inner_u.clone()],
        );
        let actual = TypeExpr::parameterized_with_owner(
            Some(generic("Outer", vec![string()])),
            ClassType::new("Inner"),
            vec![integer()],
        );

        let table = unify(&formal, &actual).expect("owner-qualified");
        assert_eq!(table.resolve(&outer_t), string());
        assert_eq!(table.resolve(&inner_u), integer());
    }

    #[test]
    fn failed_unification_commits_nothing() {
        let base = unify(&map_var("V"), &integer()).expect("bind V");
        let err = unify_into(
            &base,
            &generic("Map", vec![map_var("K"), map_var("V")]),
            &generic("Map", vec![string(), integer(), integer()]),
        );
        assert!(err.is_err());
        assert_eq!(base.len(), 1);

        let mut unifier = Unifier::new();
        unifier.populate(&map_var("V"), &integer()).expect("bind V");
        let result = unifier.populate(
            &generic("Pair", vec![map_var("K"), string()]),
            &generic("Pair", vec![string(), integer()]),
        );
        assert!(result.is_err());
        assert_eq!(unifier.mappings().len(), 1);
    }

    #[test]
    fn unify_into_extends_existing_table() {
        let base = unify(&map_var("K"), &string()).expect("bind K");
        let table = unify_into(&base, &map_var("V"), &integer()).expect("bind V");
        assert_eq!(table.len(), 2);
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn from_context_resolves_supertype_variables() {
        let mut registry = ClassRegistry::new();
        let list = ClassDecl::generic("List", &["E"]);
        registry.register("List", list);
        let array_list = ClassDecl::generic("ArrayList", &["E"]);
        let e = array_list.variables();
        registry.register("ArrayList", array_list.implements(generic("List", e)));

        let table = from_context(&generic("ArrayList", vec![string()]), &registry)
            .expect("well-formed context");
        let list_e = TypeExpr::variable(ScopeId::of_type("List"), "E");
        assert_eq!(table.resolve(&generic("List", vec![list_e])), generic("List", vec![string()]));
    }

    #[test]
    fn from_context_reports_undeclared_class() {
        let err = from_context(&generic("Ghost", vec![string()]), &ClassRegistry::new())
            .expect_err("undeclared");
        assert_eq!(
            err,
            TypeError::InvariantViolation(Violation::UndeclaredClass(ClassType::new("Ghost")))
        );
        assert_eq!(err.to_diagnostic().code, "E0002");
    }

    #[test]
    fn tracing_disabled_by_default() {
        let mut unifier = Unifier::new();
        unifier
            .populate(&map_var("K"), &string())
            .expect("bind");
        assert!(unifier.unify_trace().is_empty());
    }

    #[test]
    fn trace_records_decisions_in_order() {
        let mut unifier = Unifier::with_options(UnifierOptions {
            record_trace: true,
            ..UnifierOptions::default()
        });
        unifier
            .populate(
                &generic("Map", vec![map_var("K"), TypeExpr::wildcard()]),
                &generic("Map", vec![string(), integer()]),
            )
            .expect("unifiable");

        let actions: Vec<UnifyAction> = unifier.unify_trace().iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![UnifyAction::Decompose, UnifyAction::Bind, UnifyAction::AcceptWildcard]
        );
        assert_eq!(unifier.unify_trace()[1].detail, "K := String");
        assert_eq!(unifier.unify_trace()[2].step, 3);
    }

    #[test]
    fn trace_respects_limit() {
        let mut unifier = Unifier::with_options(UnifierOptions {
            record_trace: true,
            trace_limit: 2,
        });
        unifier
            .populate(
                &generic("Map", vec![map_var("K"), map_var("V")]),
                &generic("Map", vec![string(), integer()]),
            )
            .expect("unifiable");
        assert_eq!(unifier.unify_trace().len(), 2);
        assert_eq!(unifier.mappings().len(), 2);
    }
}
