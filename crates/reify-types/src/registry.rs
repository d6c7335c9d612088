//! Class declarations available to supertype introspection.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{ClassType, ScopeId, TypeExpr, TypeVariable};

/// Generic declaration of one class: its type parameters and its generic
/// supertypes, which may mention those parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDecl {
    pub params: Vec<TypeVariable>,
    pub superclass: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
}

impl ClassDecl {
    /// A declaration without type parameters or supertypes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A declaration whose type parameters are declared in scope `Type(name)`.
    pub fn generic(name: &str, params: &[&str]) -> Self {
        let scope = ScopeId::of_type(name);
        Self {
            params: params
                .iter()
                .map(|param| TypeVariable::new(scope.clone(), *param))
                .collect(),
            ..Self::default()
        }
    }

    pub fn extends(mut self, superclass: TypeExpr) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeExpr) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// The declared type parameters as type expressions, in declaration order.
    pub fn variables(&self) -> Vec<TypeExpr> {
        self.params.iter().cloned().map(TypeExpr::from).collect()
    }

    /// Generic superclass first, then interfaces in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeExpr> {
        self.superclass.iter().chain(&self.interfaces)
    }
}

/// Read-only lookup table from class name to [`ClassDecl`].
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<Arc<str>, ClassDecl>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decl` under `name`, returning the declaration it replaces.
    pub fn register(&mut self, name: impl Into<Arc<str>>, decl: ClassDecl) -> Option<ClassDecl> {
        self.classes.insert(name.into(), decl)
    }

    /// Declare `name` with the given type parameters and no supertypes.
    /// Returns the parameters so callers can mention them elsewhere.
    pub fn declare(&mut self, name: &str, params: &[&str]) -> Vec<TypeExpr> {
        let decl = ClassDecl::generic(name, params);
        let vars = decl.variables();
        self.register(name, decl);
        vars
    }

    /// Declaration of a plain class. Native array classes are never declared.
    pub fn get(&self, class: &ClassType) -> Option<&ClassDecl> {
        if class.is_array() {
            return None;
        }
        self.classes.get(class.name())
    }
}
