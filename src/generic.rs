use alloc::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    vec::Vec,
};

use crate::{
    errors::{RegisterErrorKind, SignatureErrorKind},
    key::Key,
    recipe::Recipe,
};

type TypeMapping = BTreeMap<Arc<str>, Key>;

/// Recipe parameters with type variables replaced by the binding's type arguments.
pub(crate) type Signature = Vec<(Arc<str>, Key)>;

/// Substitutes type variables of `key` using `mapping`.
/// Variables missing from the mapping are kept.
#[must_use]
pub(crate) fn substitute(key: &Key, mapping: &TypeMapping) -> Key {
    match key {
        Key::Var(name) => mapping.get(name).cloned().unwrap_or_else(|| key.clone()),
        Key::Generic(contract, args) => Key::Generic(*contract, args.iter().map(|arg| substitute(arg, mapping)).collect()),
        Key::Type(_) | Key::Name(_) | Key::Deferred(_) => key.clone(),
    }
}

/// Type variable mapping of `recipe` when bound under `key`.
///
/// A recipe declaring its own type variables takes them from its explicit type
/// arguments, or from the key's type arguments when it has none. A recipe
/// without type variables sees the contract's type variables instead.
fn mapping<F>(key: &Key, recipe: &Recipe<F>) -> Result<TypeMapping, RegisterErrorKind> {
    if recipe.type_params.is_empty() {
        return Ok(match key {
            Key::Generic(contract, args) => contract.params().iter().map(|param| Arc::from(*param)).zip(args.iter().cloned()).collect(),
            _ => TypeMapping::new(),
        });
    }

    let args = recipe.type_args.as_deref().unwrap_or(key.args());
    if args.len() != recipe.type_params.len() || args.iter().any(Key::is_unbound) {
        return Err(RegisterErrorKind::UnboundGenericParameters { key: key.clone() });
    }

    Ok(recipe.type_params.iter().cloned().zip(args.iter().cloned()).collect())
}

/// Computes the concrete signature of `recipe` bound under `key`.
///
/// # Errors
/// - Returns [`RegisterErrorKind::UnboundGenericParameters`] if the recipe's type variables can't be bound
/// - Returns [`RegisterErrorKind::NonCallableRecipe`] if the manifest declares a parameter twice
///   or uses a type variable nobody binds
pub(crate) fn signature<F>(key: &Key, recipe: &Recipe<F>) -> Result<Signature, RegisterErrorKind> {
    let mut seen = BTreeSet::new();
    for (name, _) in &recipe.params {
        if !seen.insert(name) {
            return Err(RegisterErrorKind::NonCallableRecipe {
                key: key.clone(),
                kind: SignatureErrorKind::DuplicateParameter { name: name.clone() },
            });
        }
    }

    let mapping = mapping(key, recipe)?;

    recipe
        .params
        .iter()
        .map(|(name, param_key)| {
            let param_key = substitute(param_key, &mapping);
            if let Some(var) = param_key.vars().first() {
                return Err(RegisterErrorKind::NonCallableRecipe {
                    key: key.clone(),
                    kind: SignatureErrorKind::UndeclaredTypeVariable {
                        name: name.clone(),
                        var: (*var).clone(),
                    },
                });
            }
            Ok((name.clone(), param_key))
        })
        .collect()
}
