//! Type expressions for reify.
//!
//! This crate defines the closed type-expression grammar the engine works
//! over (raw classes, parameterized types, generic arrays, wildcards and type
//! variables), the canonical identity of a type variable, and the immutable
//! substitution table used to resolve variables. Unification and supertype
//! introspection live in `reify-infer`.

mod error;
mod registry;
mod table;

pub use error::{Mismatch, TypeError, Violation};
pub use registry::{ClassDecl, ClassRegistry};
pub use table::SubstitutionTable;

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the universal top class. Unbounded wildcards are `? extends Object`.
pub const TOP_CLASS_NAME: &str = "Object";

const PRIMITIVE_CLASS_NAMES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// The declaration site that owns a type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeId {
    /// Type parameter of a class or interface.
    Type(Arc<str>),
    /// Type parameter of a generic method.
    Method { owner: Arc<str>, name: Arc<str> },
    /// Type parameter of a generic constructor.
    Constructor { owner: Arc<str> },
    /// Synthetic scope shared by every variable minted by wildcard capture.
    Capture,
}

impl ScopeId {
    pub fn of_type(name: impl Into<Arc<str>>) -> Self {
        ScopeId::Type(name.into())
    }

    pub fn method(owner: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        ScopeId::Method {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn constructor(owner: impl Into<Arc<str>>) -> Self {
        ScopeId::Constructor {
            owner: owner.into(),
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, ScopeId::Capture)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Type(name) => write!(f, "{name}"),
            ScopeId::Method { owner, name } => write!(f, "{owner}::{name}"),
            ScopeId::Constructor { owner } => write!(f, "{owner}::<init>"),
            ScopeId::Capture => write!(f, "<capture>"),
        }
    }
}

/// Canonical identity of a type variable: its declaring scope plus its name.
///
/// Bounds are not part of the key: an artificial variable
/// minted with resolved bounds still looks up the same table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableKey {
    scope: ScopeId,
    name: Arc<str>,
}

impl VariableKey {
    pub fn new(scope: ScopeId, name: impl Into<Arc<str>>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }

    pub fn of(var: &TypeVariable) -> Self {
        Self {
            scope: var.scope.clone(),
            name: Arc::clone(&var.name),
        }
    }

    /// Key of `ty` if it is a type variable.
    pub fn for_lookup(ty: &TypeExpr) -> Option<Self> {
        ty.as_variable().map(Self::of)
    }

    /// Whether `ty` is a type variable with this identity.
    pub fn equals_type(&self, ty: &TypeExpr) -> bool {
        ty.as_variable()
            .is_some_and(|var| var.scope == self.scope && var.name == self.name)
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A type expression.
///
/// The variant set is closed. Children are reference counted, so cloning a
/// tree is cheap and sub-trees may be shared between positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Nominal type without arguments (a raw class, possibly a native array class).
    Class(ClassType),
    /// `Raw<A, B>`, optionally qualified by a generic owner type.
    Parameterized(Arc<ParameterizedType>),
    /// Generic array whose component is not a plain class: `T[]`, `List<T>[]`.
    Array(Arc<ArrayType>),
    /// `?`, `? extends X`, `? super X`.
    Wildcard(Arc<WildcardType>),
    /// Placeholder declared by a class, method or constructor.
    Variable(Arc<TypeVariable>),
}

/// A nominal class. A non-zero `dimensions` denotes a native array class
/// such as `String[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassType {
    name: Arc<str>,
    dimensions: u32,
}

impl ClassType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            dimensions: 0,
        }
    }

    /// The universal top class.
    pub fn top() -> Self {
        Self::new(TOP_CLASS_NAME)
    }

    /// Name of the element class, without array brackets.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    pub fn is_top(&self) -> bool {
        self.dimensions == 0 && &*self.name == TOP_CLASS_NAME
    }

    pub fn is_primitive(&self) -> bool {
        self.dimensions == 0 && PRIMITIVE_CLASS_NAMES.contains(&&*self.name)
    }

    /// The native array class with this class as its component.
    pub fn array_class(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            dimensions: self.dimensions + 1,
        }
    }

    /// Component class of a native array class.
    pub fn component_class(&self) -> Option<Self> {
        self.is_array().then(|| Self {
            name: Arc::clone(&self.name),
            dimensions: self.dimensions - 1,
        })
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.dimensions {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// `owner.raw<args>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    pub owner: Option<TypeExpr>,
    pub raw: ClassType,
    pub args: Vec<TypeExpr>,
}

/// A generic array type. Only constructible through [`TypeExpr::array_of`],
/// which folds class components into native array classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    component: TypeExpr,
}

impl ArrayType {
    pub fn component(&self) -> &TypeExpr {
        &self.component
    }
}

/// A wildcard. Well-formed wildcards never have both bound lists empty; an
/// unbounded wildcard has the single upper bound `Object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub upper_bounds: Vec<TypeExpr>,
    pub lower_bounds: Vec<TypeExpr>,
}

impl WildcardType {
    /// `?`: no lower bound and only the implicit top upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.lower_bounds.is_empty()
            && matches!(self.upper_bounds.as_slice(), [TypeExpr::Class(class)] if class.is_top())
    }
}

/// A type variable.
///
/// Equality and hashing consider only the declaring scope and the name
/// (the [`VariableKey`]); bounds are carried along for resolution.
#[derive(Debug, Clone)]
pub struct TypeVariable {
    scope: ScopeId,
    name: Arc<str>,
    bounds: Vec<TypeExpr>,
}

impl TypeVariable {
    pub fn new(scope: ScopeId, name: impl Into<Arc<str>>) -> Self {
        Self::with_bounds(scope, name, Vec::new())
    }

    pub fn with_bounds(scope: ScopeId, name: impl Into<Arc<str>>, bounds: Vec<TypeExpr>) -> Self {
        Self {
            scope,
            name: name.into(),
            bounds,
        }
    }

    pub fn key(&self) -> VariableKey {
        VariableKey::of(self)
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &[TypeExpr] {
        &self.bounds
    }

    /// Whether this variable was minted by wildcard capture.
    pub fn is_captured(&self) -> bool {
        self.scope.is_capture()
    }
}

impl PartialEq for TypeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.name == other.name
    }
}

impl Eq for TypeVariable {}

impl Hash for TypeVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scope.hash(state);
        self.name.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Constructors and accessors
// ---------------------------------------------------------------------------

impl TypeExpr {
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        TypeExpr::Class(ClassType::new(name))
    }

    pub fn top() -> Self {
        TypeExpr::Class(ClassType::top())
    }

    pub fn parameterized(raw: ClassType, args: Vec<TypeExpr>) -> Self {
        Self::parameterized_with_owner(None, raw, args)
    }

    pub fn parameterized_with_owner(
        owner: Option<TypeExpr>,
        raw: ClassType,
        args: Vec<TypeExpr>,
    ) -> Self {
        TypeExpr::Parameterized(Arc::new(ParameterizedType { owner, raw, args }))
    }

    /// Array of `component`.
    ///
    /// A class component yields the native array class (`String[]`); a
    /// wildcard with a single bound yields a wildcard of arrays
    /// (`? extends X[]`, `? super X[]`). Everything else is a generic array.
    pub fn array_of(component: TypeExpr) -> Self {
        match component {
            TypeExpr::Class(class) => TypeExpr::Class(class.array_class()),
            TypeExpr::Wildcard(wildcard) => {
                match (
                    wildcard.lower_bounds.as_slice(),
                    wildcard.upper_bounds.as_slice(),
                ) {
                    ([lower], _) => Self::supertype_of(Self::array_of(lower.clone())),
                    ([], [upper]) => Self::subtype_of(Self::array_of(upper.clone())),
                    _ => TypeExpr::Array(Arc::new(ArrayType {
                        component: TypeExpr::Wildcard(wildcard),
                    })),
                }
            }
            other => TypeExpr::Array(Arc::new(ArrayType { component: other })),
        }
    }

    /// `?`
    pub fn wildcard() -> Self {
        Self::subtype_of(Self::top())
    }

    /// `? extends bound`
    pub fn subtype_of(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(Arc::new(WildcardType {
            upper_bounds: vec![bound],
            lower_bounds: Vec::new(),
        }))
    }

    /// `? super bound`
    pub fn supertype_of(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(Arc::new(WildcardType {
            upper_bounds: vec![Self::top()],
            lower_bounds: vec![bound],
        }))
    }

    pub fn variable(scope: ScopeId, name: impl Into<Arc<str>>) -> Self {
        TypeExpr::Variable(Arc::new(TypeVariable::new(scope, name)))
    }

    pub fn variable_with_bounds(
        scope: ScopeId,
        name: impl Into<Arc<str>>,
        bounds: Vec<TypeExpr>,
    ) -> Self {
        TypeExpr::Variable(Arc::new(TypeVariable::with_bounds(scope, name, bounds)))
    }

    pub fn as_variable(&self) -> Option<&TypeVariable> {
        match self {
            TypeExpr::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            TypeExpr::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeExpr::Wildcard(_))
    }

    /// Short lowercase name of the variant, used in traces.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeExpr::Class(_) => "class",
            TypeExpr::Parameterized(_) => "parameterized",
            TypeExpr::Array(_) => "array",
            TypeExpr::Wildcard(_) => "wildcard",
            TypeExpr::Variable(_) => "variable",
        }
    }
}

impl From<ClassType> for TypeExpr {
    fn from(class: ClassType) -> Self {
        TypeExpr::Class(class)
    }
}

impl From<TypeVariable> for TypeExpr {
    fn from(var: TypeVariable) -> Self {
        TypeExpr::Variable(Arc::new(var))
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Class(class) => write!(f, "{class}"),
            TypeExpr::Parameterized(p) => {
                if let Some(owner) = &p.owner {
                    write!(f, "{owner}.")?;
                }
                write!(f, "{}", p.raw)?;
                if !p.args.is_empty() {
                    write!(f, "<")?;
                    write_joined(f, &p.args, ", ")?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Array(array) => write!(f, "{}[]", array.component),
            TypeExpr::Wildcard(w) => {
                write!(f, "?")?;
                if !w.lower_bounds.is_empty() {
                    write!(f, " super ")?;
                    write_joined(f, &w.lower_bounds, " & ")?;
                }
                let upper: Vec<&TypeExpr> = w
                    .upper_bounds
                    .iter()
                    .filter(|bound| !matches!(bound, TypeExpr::Class(class) if class.is_top()))
                    .collect();
                if !upper.is_empty() {
                    write!(f, " extends ")?;
                    for (i, bound) in upper.iter().enumerate() {
                        if i > 0 {
                            write!(f, " & ")?;
                        }
                        write!(f, "{bound}")?;
                    }
                }
                Ok(())
            }
            TypeExpr::Variable(var) => write!(f, "{}", var.name),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Structural helpers
// ---------------------------------------------------------------------------

/// Component type of an array-shaped type, if any.
///
/// Native array classes pass through to their component class. Variables
/// and wildcards expose the component of their first array-shaped bound,
/// as `? extends C` unless `C` is primitive.
pub fn component_type(ty: &TypeExpr) -> Option<TypeExpr> {
    match ty {
        TypeExpr::Array(array) => Some(array.component.clone()),
        TypeExpr::Class(class) => class.component_class().map(TypeExpr::Class),
        TypeExpr::Variable(var) => component_of_bounds(&var.bounds),
        TypeExpr::Wildcard(w) => component_of_bounds(&w.upper_bounds),
        TypeExpr::Parameterized(_) => None,
    }
}

fn component_of_bounds(bounds: &[TypeExpr]) -> Option<TypeExpr> {
    let component = bounds.iter().find_map(component_type)?;
    match &component {
        TypeExpr::Class(class) if class.is_primitive() => Some(component),
        _ => Some(TypeExpr::subtype_of(component)),
    }
}

/// Keys of every type variable occurring in `ty`.
///
/// Variable bounds are not descended into.
pub fn free_variables(ty: &TypeExpr) -> BTreeSet<VariableKey> {
    let mut out = BTreeSet::new();
    collect_variables(ty, &mut out);
    out
}

fn collect_variables(ty: &TypeExpr, out: &mut BTreeSet<VariableKey>) {
    match ty {
        TypeExpr::Class(_) => {}
        TypeExpr::Parameterized(p) => {
            if let Some(owner) = &p.owner {
                collect_variables(owner, out);
            }
            for arg in &p.args {
                collect_variables(arg, out);
            }
        }
        TypeExpr::Array(array) => collect_variables(&array.component, out),
        TypeExpr::Wildcard(w) => {
            for bound in w.upper_bounds.iter().chain(&w.lower_bounds) {
                collect_variables(bound, out);
            }
        }
        TypeExpr::Variable(var) => {
            out.insert(var.key());
        }
    }
}
