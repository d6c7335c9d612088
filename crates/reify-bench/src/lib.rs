//! Workload builders shared by the benchmarks and the trace metrics tool.

use reify_types::{
    ClassDecl, ClassRegistry, ClassType, ScopeId, SubstitutionTable, TypeError, TypeExpr,
    VariableKey,
};

/// `Pair<A0, Pair<A1, ... Pair<A{n-1}, String>>>` against the same shape
/// with `Integer` in every variable position.
pub fn nested_pairs(depth: usize) -> (TypeExpr, TypeExpr) {
    let scope = ScopeId::of_type("Pair");
    let mut formal = TypeExpr::class("String");
    let mut actual = TypeExpr::class("String");
    for i in (0..depth).rev() {
        let var = TypeExpr::variable(scope.clone(), format!("A{i}"));
        formal = TypeExpr::parameterized(ClassType::new("Pair"), vec![var, formal]);
        actual = TypeExpr::parameterized(
            ClassType::new("Pair"),
            vec![TypeExpr::class("Integer"), actual],
        );
    }
    (formal, actual)
}

/// A registry where `C0<E>` implements `C1<E>`, which implements `C2<E>`,
/// and so on, together with the context type `C0<String>`.
pub fn interface_chain(len: usize) -> (ClassRegistry, TypeExpr) {
    let mut registry = ClassRegistry::new();
    for i in 0..len {
        let name = format!("C{i}");
        let decl = ClassDecl::generic(&name, &["E"]);
        let decl = if i + 1 < len {
            let e = decl.variables();
            decl.implements(TypeExpr::parameterized(ClassType::new(format!("C{}", i + 1)), e))
        } else {
            decl
        };
        registry.register(name, decl);
    }
    let context = TypeExpr::parameterized(ClassType::new("C0"), vec![TypeExpr::class("String")]);
    (registry, context)
}

/// A table where `m0::T` maps to `m1::T`, and so on down to `String`,
/// together with `List<m0::T>`.
pub fn variable_chain(len: usize) -> Result<(SubstitutionTable, TypeExpr), TypeError> {
    let var = |i: usize| TypeExpr::variable(ScopeId::method("Chain", format!("m{i}")), "T");
    let mappings = (0..len).map(|i| {
        let target = if i + 1 < len {
            var(i + 1)
        } else {
            TypeExpr::class("String")
        };
        (VariableKey::new(ScopeId::method("Chain", format!("m{i}")), "T"), target)
    });
    let table = SubstitutionTable::new().extend(mappings)?;
    let ty = TypeExpr::parameterized(ClassType::new("List"), vec![var(0)]);
    Ok((table, ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_pairs_unify() {
        let (formal, actual) = nested_pairs(4);
        let table = reify_infer::unify(&formal, &actual).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.resolve(&formal), actual);
    }

    #[test]
    fn interface_chain_maps_every_level() {
        let (registry, context) = interface_chain(5);
        let table = reify_infer::from_context(&context, &registry).unwrap();
        assert_eq!(table.len(), 5);
        let last = TypeExpr::variable(ScopeId::of_type("C4"), "E");
        assert_eq!(table.resolve(&last), TypeExpr::class("String"));
    }

    #[test]
    fn variable_chain_resolves_to_string() {
        let (table, ty) = variable_chain(8).unwrap();
        assert_eq!(table.resolve(&ty).to_string(), "List<String>");
    }
}
