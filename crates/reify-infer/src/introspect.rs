//! Supertype introspection: which type arguments a context type implicitly
//! supplies to every generic supertype it extends or implements.

use std::collections::{BTreeMap, HashSet};

use reify_types::{ClassRegistry, TypeError, TypeExpr, VariableKey, Violation};

use crate::capture::capture;

/// Collect the variable mappings implied by `context` and its supertypes.
///
/// Wildcards in `context` are captured first. For `ArrayList<String>`
/// declared as `ArrayList<E> extends AbstractList<E> implements List<E>`,
/// the result maps `ArrayList.E` to `String` and the supertypes' `E`
/// variables to `ArrayList.E`.
pub fn extract_mappings(
    context: &TypeExpr,
    registry: &ClassRegistry,
) -> Result<BTreeMap<VariableKey, TypeExpr>, TypeError> {
    let mut introspector = Introspector {
        registry,
        mappings: BTreeMap::new(),
        visited: HashSet::new(),
    };
    introspector.visit(&capture(context))?;
    Ok(introspector.mappings)
}

struct Introspector<'a> {
    registry: &'a ClassRegistry,
    mappings: BTreeMap<VariableKey, TypeExpr>,
    visited: HashSet<TypeExpr>,
}

impl Introspector<'_> {
    fn visit(&mut self, ty: &TypeExpr) -> Result<(), TypeError> {
        if !self.visited.insert(ty.clone()) {
            return Ok(());
        }
        let registry = self.registry;
        match ty {
            TypeExpr::Class(class) => {
                if let Some(decl) = registry.get(class) {
                    for supertype in decl.supertypes() {
                        self.visit(supertype)?;
                    }
                }
            }
            TypeExpr::Parameterized(p) => {
                let decl = registry
                    .get(&p.raw)
                    .ok_or_else(|| Violation::UndeclaredClass(p.raw.clone()))?;
                if decl.params.len() != p.args.len() {
                    return Err(Violation::ParameterCount {
                        class: p.raw.clone(),
                        declared: decl.params.len(),
                        supplied: p.args.len(),
                    }
                    .into());
                }
                for (param, arg) in decl.params.iter().zip(&p.args) {
                    self.map(param.key(), arg);
                }
                self.visit(&TypeExpr::Class(p.raw.clone()))?;
                if let Some(owner) = &p.owner {
                    self.visit(owner)?;
                }
            }
            TypeExpr::Variable(var) => {
                for bound in var.bounds() {
                    self.visit(bound)?;
                }
            }
            TypeExpr::Wildcard(w) => {
                for bound in &w.upper_bounds {
                    self.visit(bound)?;
                }
            }
            // Generic arrays have no declared supertypes.
            TypeExpr::Array(_) => {}
        }
        Ok(())
    }

    /// Record `key -> arg` unless `key` is already mapped. If following the
    /// variable chain from `arg` leads back to `key`, the chain is dropped
    /// instead, so the finished mappings never contain a cycle.
    fn map(&mut self, key: VariableKey, arg: &TypeExpr) {
        if self.mappings.contains_key(&key) {
            return;
        }
        let mut link = Some(arg.clone());
        while let Some(ty) = link {
            if key.equals_type(&ty) {
                let mut stale = VariableKey::for_lookup(arg);
                while let Some(stale_key) = stale {
                    stale = self
                        .mappings
                        .remove(&stale_key)
                        .and_then(|next| VariableKey::for_lookup(&next));
                }
                tracing::debug!(variable = %key, "dropped cyclic mapping chain");
                return;
            }
            link = VariableKey::for_lookup(&ty).and_then(|next| self.mappings.get(&next).cloned());
        }
        self.mappings.insert(key, arg.clone());
    }
}
