//! Inference of a root type's generics from a known binding of one of its supertypes.

use crate::class::{is_subclass, ClassRef};
use crate::error::{GenericsError, Result};
use crate::format::{render_class, render_generics, render_hierarchy};
use crate::hierarchy::{resolve_hierarchy, resolve_raw_hierarchy};
use crate::store::{ClassId, TypeEnv};
use crate::subst::{placeholder_for, resolve_declared_bounds, resolve_raw_owner_generics};
use crate::ty::{GenericsMap, KnownGenerics, Type};
use crate::visitors::{get_more_specific_type, incompatible, is_compatible, match_variables};

/// Generics of `root` implied by `known_generics`, the binding of its supertype `known`.
///
/// For `class Root<T> extends Base<List<T>>` and `Base<List<String>>` this yields
/// `{T: String}`. Variables that can't be traced resolve to their declared upper bounds; only
/// contradicting values are errors.
pub fn track_root_generics(
    env: &dyn TypeEnv,
    root: ClassId,
    known: ClassId,
    known_generics: &GenericsMap,
) -> Result<GenericsMap> {
    let Some(def) = env.class(root) else {
        return Err(GenericsError::MissingClass(root));
    };
    if def.type_params.is_empty() || known_generics.is_empty() {
        return Ok(GenericsMap::new());
    }
    if !is_subclass(env, &ClassRef::Declared(root), &ClassRef::Declared(known)) {
        let hierarchy = resolve_raw_hierarchy(env, root, &[])
            .map(|h| render_hierarchy(env, &h, None))
            .unwrap_or_default();
        return Err(GenericsError::TypeNotInHierarchy {
            root: render_class(env, root),
            requested: render_class(env, known),
            hierarchy,
        });
    }

    let symbolic_root: GenericsMap = def
        .type_params
        .iter()
        .filter_map(|id| {
            let name = env.type_param(*id)?.name.clone();
            Some((name, placeholder_for(env, *id)))
        })
        .collect();
    let hierarchy = resolve_hierarchy(env, root, &symbolic_root, &KnownGenerics::new(), &[])?;
    let symbolic = hierarchy.generics_of(env, known)?;

    let tracking_error = |variable: &str, source: GenericsError| GenericsError::Tracking {
        root: render_class(env, root),
        known: render_class(env, known),
        known_generics: render_generics(env, known_generics),
        variable: variable.to_string(),
        source: Box::new(source),
    };

    let mut tracked = GenericsMap::new();
    for (name, template) in symbolic {
        let Some(real) = known_generics.get(name) else {
            continue;
        };
        if !template.has_placeholders() {
            if !is_compatible(env, template, real)? {
                return Err(tracking_error(name, incompatible(env, template, real)));
            }
            continue;
        }
        let matched =
            match_variables(env, template, real).map_err(|err| tracking_error(name, err))?;
        for (var, value) in matched {
            let value = match tracked.get(&var) {
                Some(existing) => get_more_specific_type(env, existing, &value)
                    .map_err(|err| tracking_error(name, err))?,
                None => value,
            };
            tracked.insert(var, value);
        }
    }

    let mut scope = resolve_raw_owner_generics(env, root);
    let object = Type::object(env);
    let params: Vec<_> = def
        .type_params
        .iter()
        .filter_map(|id| env.type_param(*id))
        .collect();
    for param in &params {
        let value = tracked.get(&param.name).cloned().unwrap_or_else(|| object.clone());
        scope.shift_remove(&param.name);
        scope.insert(param.name.clone(), value);
    }
    for param in &params {
        if !tracked.contains_key(&param.name) {
            let value = resolve_declared_bounds(env, &param.upper_bounds, &scope);
            scope.insert(param.name.clone(), value);
        }
    }

    let result: GenericsMap = params
        .iter()
        .filter_map(|param| scope.get(&param.name).map(|ty| (param.name.clone(), ty.clone())))
        .collect();

    tracing::debug!(
        target = "genera.tracking",
        root = %render_class(env, root),
        known = %render_class(env, known),
        tracked = tracked.len(),
        "tracked root generics"
    );
    Ok(result)
}
