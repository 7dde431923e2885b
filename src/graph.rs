use alloc::{collections::BTreeMap, vec::Vec};
use tracing::{debug, error};

use crate::{errors::BuildErrorKind, key::Key, registry::Registry};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Resolving,
    Resolved,
}

/// Checks that every dependency of every binding is registered and that no
/// binding depends on itself, directly or through other bindings.
///
/// All bindings are visited, not only the ones reachable from some root.
pub(crate) fn validate<F>(registry: &Registry<F>) -> Result<(), BuildErrorKind> {
    let mut marks = BTreeMap::new();
    let mut path = Vec::new();

    for key in registry.keys() {
        if marks.contains_key(key) {
            continue;
        }
        visit(registry, key, &mut marks, &mut path).inspect_err(|err| error!("{}", err))?;
    }

    debug!(bindings = registry.len(), "Graph validated");
    Ok(())
}

fn visit<F>(registry: &Registry<F>, key: &Key, marks: &mut BTreeMap<Key, Mark>, path: &mut Vec<Key>) -> Result<(), BuildErrorKind> {
    let Some(binding) = registry.get(key) else {
        return Ok(());
    };

    marks.insert(key.clone(), Mark::Resolving);
    path.push(key.clone());

    for (_, dependency) in &binding.dependencies {
        let dependency = registry.canonicalize(dependency);
        match marks.get(&dependency) {
            Some(Mark::Resolved) => continue,
            Some(Mark::Resolving) => {
                let start = path.iter().position(|key| *key == dependency).unwrap_or_default();
                let mut cycle = path.split_off(start);
                cycle.push(dependency.clone());
                return Err(BuildErrorKind::CyclicDependency {
                    key: dependency,
                    cycle: cycle.into_boxed_slice(),
                });
            }
            None => {}
        }

        if registry.get(&dependency).is_none() {
            return Err(BuildErrorKind::MissingDependency {
                key: dependency,
                parent: key.clone(),
            });
        }
        visit(registry, &dependency, marks, path)?;
    }

    path.pop();
    marks.insert(key.clone(), Mark::Resolved);
    Ok(())
}
