//! Wildcard capture: replacing upper-bounded wildcards with fresh type
//! variables so they can take part in supertype introspection.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use reify_types::{ParameterizedType, ScopeId, TypeExpr, TypeVariable, WildcardType};

/// Process-wide counter for captured variable names. Starts at 1.
static NEXT_CAPTURE_ID: AtomicU32 = AtomicU32::new(1);

fn next_capture_id() -> u32 {
    NEXT_CAPTURE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Replace every upper-bounded wildcard in `ty` with a fresh captured
/// variable in the [`ScopeId::Capture`] scope.
///
/// Unbounded wildcards and wildcards with a lower bound are kept as they
/// are. A wildcard node shared between several positions of `ty` is
/// captured once; every other occurrence, and every separate call, gets a
/// new variable.
pub fn capture(ty: &TypeExpr) -> TypeExpr {
    WildcardCapturer::default().capture(ty)
}

#[derive(Default)]
struct WildcardCapturer {
    /// Keyed by node address; the nodes outlive this call.
    captured: HashMap<*const WildcardType, TypeExpr>,
}

impl WildcardCapturer {
    fn capture(&mut self, ty: &TypeExpr) -> TypeExpr {
        match ty {
            TypeExpr::Class(_) | TypeExpr::Variable(_) => ty.clone(),
            TypeExpr::Array(array) => TypeExpr::array_of(self.capture(array.component())),
            TypeExpr::Parameterized(p) => TypeExpr::Parameterized(Arc::new(ParameterizedType {
                owner: p.owner.as_ref().map(|owner| self.capture(owner)),
                raw: p.raw.clone(),
                args: p.args.iter().map(|arg| self.capture(arg)).collect(),
            })),
            TypeExpr::Wildcard(w) => {
                if w.is_unbounded() || !w.lower_bounds.is_empty() {
                    return ty.clone();
                }
                self.captured
                    .entry(Arc::as_ptr(w))
                    .or_insert_with(|| mint(w))
                    .clone()
            }
        }
    }
}

fn mint(wildcard: &WildcardType) -> TypeExpr {
    let bounds = wildcard
        .upper_bounds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("&");
    let name = format!("capture#{}-of ? extends {bounds}", next_capture_id());
    tracing::trace!(%name, "captured wildcard");
    TypeVariable::with_bounds(ScopeId::Capture, name, wildcard.upper_bounds.clone()).into()
}
