//! Immutable substitution tables and type resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    ParameterizedType, ScopeId, TypeError, TypeExpr, TypeVariable, VariableKey, Violation,
    WildcardType,
};

/// Maps type variables to the type expressions they stand for.
///
/// Tables are immutable: [`extend`](Self::extend) returns a new table and
/// leaves the receiver untouched. The backing map is shared, so cloning a
/// table is cheap, and iteration order is the key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    map: Arc<BTreeMap<VariableKey, TypeExpr>>,
}

/// One frame of the resolution guard.
enum Frame<'a> {
    /// A mapped variable whose target is being resolved. Only that variable
    /// is shielded, so chains through other variables keep resolving.
    Expanding(&'a TypeVariable),
    /// Bounds of a variable declared in this scope are being resolved.
    /// Every variable of the scope resolves to itself meanwhile.
    Bounds(&'a ScopeId),
}

struct Guard<'a> {
    frame: Frame<'a>,
    parent: Option<&'a Guard<'a>>,
}

impl Guard<'_> {
    fn shields(&self, var: &TypeVariable) -> bool {
        let mut next = Some(self);
        while let Some(guard) = next {
            let hit = match guard.frame {
                Frame::Expanding(expanding) => expanding == var,
                Frame::Bounds(scope) => scope == var.scope(),
            };
            if hit {
                return true;
            }
            next = guard.parent;
        }
        false
    }
}

/// Structural equality that also compares variable bounds.
///
/// `TypeExpr`'s `PartialEq` identifies variables by key alone, which would
/// hide an artificial variable minted with resolved bounds.
fn identical(a: &TypeExpr, b: &TypeExpr) -> bool {
    match (a, b) {
        (TypeExpr::Variable(x), TypeExpr::Variable(y)) => {
            Arc::ptr_eq(x, y) || (x == y && all_identical(x.bounds(), y.bounds()))
        }
        (TypeExpr::Parameterized(x), TypeExpr::Parameterized(y)) => {
            Arc::ptr_eq(x, y)
                || (x.raw == y.raw
                    && match (&x.owner, &y.owner) {
                        (Some(xo), Some(yo)) => identical(xo, yo),
                        (None, None) => true,
                        _ => false,
                    }
                    && all_identical(&x.args, &y.args))
        }
        (TypeExpr::Array(x), TypeExpr::Array(y)) => identical(x.component(), y.component()),
        (TypeExpr::Wildcard(x), TypeExpr::Wildcard(y)) => {
            all_identical(&x.upper_bounds, &y.upper_bounds)
                && all_identical(&x.lower_bounds, &y.lower_bounds)
        }
        (TypeExpr::Class(x), TypeExpr::Class(y)) => x == y,
        _ => false,
    }
}

fn all_identical(a: &[TypeExpr], b: &[TypeExpr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical(x, y))
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &VariableKey) -> Option<&TypeExpr> {
        self.map.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariableKey, &TypeExpr)> {
        self.map.iter()
    }

    /// A new table holding this table's entries plus `mappings`, where the
    /// new entries win on conflicting keys.
    ///
    /// Fails without producing a table if any entry binds a variable to
    /// itself.
    pub fn extend<I>(&self, mappings: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = (VariableKey, TypeExpr)>,
    {
        let mut map = (*self.map).clone();
        for (key, ty) in mappings {
            if key.equals_type(&ty) {
                return Err(Violation::SelfBinding(key).into());
            }
            map.insert(key, ty);
        }
        Ok(Self { map: Arc::new(map) })
    }

    /// Shorthand for extending with a single binding.
    pub fn bind(&self, var: &TypeVariable, ty: TypeExpr) -> Result<Self, TypeError> {
        self.extend([(var.key(), ty)])
    }

    /// Substitute every variable in `ty` according to this table.
    ///
    /// The result may still contain variables: unbound ones, variables
    /// reached again through their own scope while resolving bounds, and
    /// variables reached again through a cyclic chain of mappings.
    /// Resolving is idempotent for tables without such cycles.
    pub fn resolve(&self, ty: &TypeExpr) -> TypeExpr {
        self.resolve_in(ty, None)
    }

    pub fn resolve_all(&self, types: &[TypeExpr]) -> Vec<TypeExpr> {
        self.resolve_each(types, None)
    }

    fn resolve_each(&self, types: &[TypeExpr], guard: Option<&Guard<'_>>) -> Vec<TypeExpr> {
        types.iter().map(|ty| self.resolve_in(ty, guard)).collect()
    }

    fn resolve_in(&self, ty: &TypeExpr, guard: Option<&Guard<'_>>) -> TypeExpr {
        match ty {
            TypeExpr::Variable(var) => self.resolve_variable(var, guard),
            TypeExpr::Parameterized(p) => TypeExpr::Parameterized(Arc::new(ParameterizedType {
                owner: p.owner.as_ref().map(|owner| self.resolve_in(owner, guard)),
                raw: p.raw.clone(),
                args: self.resolve_each(&p.args, guard),
            })),
            TypeExpr::Array(array) => TypeExpr::array_of(self.resolve_in(array.component(), guard)),
            TypeExpr::Wildcard(w) => TypeExpr::Wildcard(Arc::new(WildcardType {
                upper_bounds: self.resolve_each(&w.upper_bounds, guard),
                lower_bounds: self.resolve_each(&w.lower_bounds, guard),
            })),
            // Raw classes have nothing to substitute.
            TypeExpr::Class(_) => ty.clone(),
        }
    }

    fn resolve_variable(&self, var: &Arc<TypeVariable>, guard: Option<&Guard<'_>>) -> TypeExpr {
        if guard.is_some_and(|g| g.shields(var)) {
            return TypeExpr::Variable(Arc::clone(var));
        }

        if let Some(mapped) = self.map.get(&var.key()) {
            // The mapped type may itself be, or contain, another variable.
            let expanding = Guard {
                frame: Frame::Expanding(var.as_ref()),
                parent: guard,
            };
            return self.resolve_in(mapped, Some(&expanding));
        }

        if var.bounds().is_empty() {
            return TypeExpr::Variable(Arc::clone(var));
        }
        let dependants = Guard {
            frame: Frame::Bounds(var.scope()),
            parent: guard,
        };
        let resolved_bounds = self.resolve_each(var.bounds(), Some(&dependants));
        if all_identical(&resolved_bounds, var.bounds()) {
            return TypeExpr::Variable(Arc::clone(var));
        }
        TypeExpr::Variable(Arc::new(TypeVariable::with_bounds(
            var.scope().clone(),
            var.name(),
            resolved_bounds,
        )))
    }
}

impl<'a> IntoIterator for &'a SubstitutionTable {
    type Item = (&'a VariableKey, &'a TypeExpr);
    type IntoIter = std::collections::btree_map::Iter<'a, VariableKey, TypeExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}
