use std::sync::Arc;

use crate::context::{DecodeContext, NodeId};
use crate::metadata::TypeRegistry;
use crate::types::{RawType, TypeDescriptor};

/// A type variable with no binding in scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved type variable `{0}`")]
pub struct Unresolved(pub Arc<str>);

/// Replaces every type variable in `declared` with its binding, searching
/// outward from `scope`.
///
/// A variable is looked up in each enclosing value's declaring class. When a
/// binding is found it is itself resolved starting from the parent of the
/// node that supplied it, so bindings that refer to outer variables are
/// followed all the way out. The result contains no type variables.
pub fn resolve(
    declared: &TypeDescriptor,
    context: &DecodeContext,
    scope: Option<NodeId>,
) -> Result<TypeDescriptor, Unresolved> {
    match declared {
        TypeDescriptor::Type(_, _) if declared.is_resolved() => Ok(declared.clone()),
        TypeDescriptor::Type(raw, arguments) => Ok(TypeDescriptor::Type(
            raw.clone(),
            arguments
                .iter()
                .map(|argument| resolve(argument, context, scope))
                .collect::<Result<_, _>>()?,
        )),
        TypeDescriptor::Variable(name) => {
            let mut cursor = scope;
            while let Some(node) = cursor.and_then(|id| context.node(id)) {
                if let Some(binding) = node.binding(name) {
                    return resolve(&binding, context, node.parent());
                }
                cursor = node.parent();
            }
            Err(Unresolved(name.clone()))
        }
    }
}

/// Replaces the type variables `params` in `declared` with `arguments`,
/// position by position. Parameters without a matching argument become the
/// unconstrained type; variables not in `params` are left in place.
#[must_use]
pub fn substitute(
    declared: &TypeDescriptor,
    params: &[Arc<str>],
    arguments: &[TypeDescriptor],
) -> TypeDescriptor {
    match declared {
        TypeDescriptor::Type(raw, nested) => TypeDescriptor::Type(
            raw.clone(),
            nested
                .iter()
                .map(|argument| substitute(argument, params, arguments))
                .collect(),
        ),
        TypeDescriptor::Variable(name) => match params.iter().position(|param| param == name) {
            Some(index) => arguments
                .get(index)
                .cloned()
                .unwrap_or_else(TypeDescriptor::any),
            None => declared.clone(),
        },
    }
}

/// Rewrites a user container class as the built-in map or sequence it
/// extends, carrying its type arguments through each supertype.
///
/// Built-in types are returned unchanged. Returns `None` when `ty` is a
/// registered class whose supertype chain does not end in a built-in
/// container.
#[must_use]
pub fn container_view(ty: &TypeDescriptor, types: &TypeRegistry) -> Option<TypeDescriptor> {
    let mut current = ty.clone();
    // A chain longer than the number of registered types must be cyclic.
    for _ in 0..=types.len() {
        match current.raw()? {
            RawType::Sequence(_) | RawType::Map(_) => return Some(current),
            raw @ RawType::Named(_) => {
                let class = types.class_def(raw)?;
                let supertype = class.supertype.as_ref()?;
                current = substitute(supertype, &class.type_params, current.arguments());
            }
            _ => return None,
        }
    }
    None
}
