//! Substitution of type variables into type expressions.

use crate::class::ClassRef;
use crate::error::{GenericsError, Result};
use crate::format::{render_declaration, render_generics};
use crate::store::{ClassId, TypeEnv, TypeVarId};
use crate::ty::{ExplicitVariable, GenericsMap, ParameterizedType, Type, WildcardType};

/// How variables are replaced during substitution.
#[derive(Clone, Copy)]
enum Lookup<'a> {
    /// By name from the map; unknown names are an error. Placeholders are only replaced when
    /// `placeholders` is set and the map has an entry for them.
    Strict {
        generics: &'a GenericsMap,
        placeholders: bool,
    },
    /// By name from the map; unknown names become `Object`.
    Lenient(&'a GenericsMap),
    /// Every variable and placeholder becomes `Object`.
    Object,
    /// Every variable becomes its declared upper bound (inner variables become `Object`).
    Bounds,
}

fn substitute(env: &dyn TypeEnv, ty: &Type, lookup: Lookup<'_>) -> Result<Type> {
    Ok(match ty {
        Type::Class(_) => ty.clone(),
        Type::Parameterized(p) => Type::Parameterized(ParameterizedType {
            raw: p.raw,
            args: p
                .args
                .iter()
                .map(|arg| substitute(env, arg, lookup))
                .collect::<Result<_>>()?,
            owner: match p.owner.as_deref() {
                Some(owner) => Some(Box::new(substitute(env, owner, lookup)?)),
                None => None,
            },
        }),
        Type::GenericArray(component) => Type::array(substitute(env, component, lookup)?),
        Type::Wildcard(w) => Type::Wildcard(WildcardType {
            upper: w
                .upper
                .iter()
                .map(|u| substitute(env, u, lookup))
                .collect::<Result<_>>()?,
            lower: match w.lower.as_deref() {
                Some(lower) => Some(Box::new(substitute(env, lower, lookup)?)),
                None => None,
            },
        }),
        Type::Variable(id) => substitute_variable(env, *id, lookup)?,
        Type::Placeholder(var) => match lookup {
            Lookup::Strict {
                generics,
                placeholders: true,
            } => generics.get(&var.name).cloned().unwrap_or_else(|| ty.clone()),
            Lookup::Object => Type::object(env),
            Lookup::Strict { .. } | Lookup::Lenient(_) | Lookup::Bounds => ty.clone(),
        },
    })
}

fn substitute_variable(env: &dyn TypeEnv, id: TypeVarId, lookup: Lookup<'_>) -> Result<Type> {
    let object = Type::object(env);
    let Some(def) = env.type_param(id) else {
        return Ok(object);
    };
    match lookup {
        Lookup::Strict { generics, .. } => match generics.get(&def.name) {
            Some(value) => Ok(value.clone()),
            None => Err(GenericsError::UnknownVariable {
                name: def.name.clone(),
                declaration: def
                    .owner
                    .map(|owner| render_declaration(env, owner))
                    .unwrap_or_else(|| "an unknown declaration".to_string()),
                generics: render_generics(env, generics),
            }),
        },
        Lookup::Lenient(generics) => Ok(generics.get(&def.name).cloned().unwrap_or(object)),
        Lookup::Object => Ok(object),
        Lookup::Bounds => match def.upper_bounds.as_slice() {
            [] => Ok(object),
            [single] => substitute(env, single, Lookup::Object),
            bounds => Ok(Type::Wildcard(WildcardType::extends(
                bounds
                    .iter()
                    .map(|b| substitute(env, b, Lookup::Object))
                    .collect::<Result<_>>()?,
            ))),
        },
    }
}

/// Replace every variable of `ty` with its value from `generics`.
///
/// Fails with [`GenericsError::UnknownVariable`] when `ty` mentions a variable that is not in
/// `generics`, which usually means the type belongs to a method or constructor whose own
/// generics were not included. Placeholders are left untouched.
pub fn resolve_type_variables(
    env: &dyn TypeEnv,
    ty: &Type,
    generics: &GenericsMap,
) -> Result<Type> {
    substitute(
        env,
        ty,
        Lookup::Strict {
            generics,
            placeholders: false,
        },
    )
}

/// Like [`resolve_type_variables`], but placeholders with an entry in `generics` are replaced
/// as well.
pub fn resolve_all_type_variables(
    env: &dyn TypeEnv,
    ty: &Type,
    generics: &GenericsMap,
) -> Result<Type> {
    substitute(
        env,
        ty,
        Lookup::Strict {
            generics,
            placeholders: true,
        },
    )
}

/// Substitution that never fails: variables missing from `generics` become `Object`.
pub fn resolve_type_variables_lenient(
    env: &dyn TypeEnv,
    ty: &Type,
    generics: &GenericsMap,
) -> Type {
    substitute(env, ty, Lookup::Lenient(generics)).unwrap_or_else(|_| Type::object(env))
}

/// Replace every variable with its declared upper bound. Placeholders are kept.
pub fn resolve_with_bounds(env: &dyn TypeEnv, ty: &Type) -> Type {
    substitute(env, ty, Lookup::Bounds).unwrap_or_else(|_| Type::object(env))
}

/// Replace every variable and placeholder with `Object`.
pub fn erase_to_object(env: &dyn TypeEnv, ty: &Type) -> Type {
    substitute(env, ty, Lookup::Object).unwrap_or_else(|_| Type::object(env))
}

/// Raw class of `ty` after substitution (`List<T>` → `List`, `T[]` → `[Ljava.lang.Integer;`).
pub fn resolve_class(env: &dyn TypeEnv, ty: &Type, generics: &GenericsMap) -> Result<ClassRef> {
    Ok(resolve_type_variables(env, ty, generics)?.erased_class(env))
}

/// Raw classes of the immediate type arguments of `ty`.
///
/// A raw reference to a generic class yields the erasure of its variables' upper bounds.
pub fn resolve_type_arguments(
    env: &dyn TypeEnv,
    ty: &Type,
    generics: &GenericsMap,
) -> Result<Vec<ClassRef>> {
    let resolved = resolve_type_variables(env, ty, generics)?;
    Ok(type_arguments_of(env, &resolved)
        .iter()
        .map(|arg| arg.erased_class(env))
        .collect())
}

fn type_arguments_of(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    match ty {
        Type::Parameterized(p) => p.args.clone(),
        Type::Class(ClassRef::Declared(id)) => {
            resolve_raw_generics(env, *id).into_values().collect()
        }
        Type::Wildcard(w) => w
            .upper
            .first()
            .map(|u| type_arguments_of(env, u))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Upper bound classes of `ty` after substitution.
///
/// Wildcards and placeholders report every upper bound; a lower bounded wildcard reports
/// `Object`.
pub fn resolve_upper_bounds(
    env: &dyn TypeEnv,
    ty: &Type,
    generics: &GenericsMap,
) -> Result<Vec<ClassRef>> {
    let resolved = resolve_type_variables(env, ty, generics)?;
    Ok(upper_bound_classes(env, &resolved))
}

pub(crate) fn upper_bound_classes(env: &dyn TypeEnv, ty: &Type) -> Vec<ClassRef> {
    let object = ClassRef::Declared(env.well_known().object);
    match ty {
        Type::Wildcard(w) if w.lower.is_some() => vec![object],
        Type::Wildcard(w) => w
            .upper_bounds(env)
            .iter()
            .map(|u| u.erased_class(env))
            .collect(),
        Type::Placeholder(var) if var.bounds.is_empty() => vec![object],
        Type::Placeholder(var) => var.bounds.iter().map(|b| b.erased_class(env)).collect(),
        Type::Variable(id) => match env.type_param(*id) {
            Some(def) if !def.upper_bounds.is_empty() => def
                .upper_bounds
                .iter()
                .map(|b| b.erased_class(env))
                .collect(),
            _ => vec![object],
        },
        _ => vec![ty.erased_class(env)],
    }
}

/// Own type variables of `class` from a scope that may also contain outer class generics.
pub fn extract_type_generics(
    env: &dyn TypeEnv,
    class: ClassId,
    generics: &GenericsMap,
) -> GenericsMap {
    let Some(def) = env.class(class) else {
        return GenericsMap::new();
    };
    def.type_params
        .iter()
        .filter_map(|id| env.type_param(*id))
        .filter_map(|param| {
            generics
                .get(&param.name)
                .map(|ty| (param.name.clone(), ty.clone()))
        })
        .collect()
}

/// Entries of `generics` that are not declared by `class` itself (captured outer generics).
pub fn extract_owner_generics(
    env: &dyn TypeEnv,
    class: ClassId,
    generics: &GenericsMap,
) -> GenericsMap {
    let own = own_names(env, class);
    generics
        .iter()
        .filter(|(name, _)| !own.contains(name))
        .map(|(name, ty)| (name.clone(), ty.clone()))
        .collect()
}

pub(crate) fn own_names(env: &dyn TypeEnv, class: ClassId) -> Vec<String> {
    env.class(class)
        .map(|def| {
            def.type_params
                .iter()
                .filter_map(|id| env.type_param(*id))
                .map(|param| param.name.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Own generics of `class` resolved from their declared upper bounds, as for a raw reference.
///
/// Variables are resolved in declaration order, so a bound may use earlier siblings. Self
/// references see `Object`; a variable with several bounds becomes a wildcard of all of them.
pub fn resolve_raw_generics(env: &dyn TypeEnv, class: ClassId) -> GenericsMap {
    let outer = resolve_raw_owner_generics(env, class);
    raw_generics_in(env, class, &outer)
}

/// Generics of the enclosing classes visible to `class`, resolved raw. Empty unless `class` is
/// an inner (non-static member) class.
pub fn resolve_raw_owner_generics(env: &dyn TypeEnv, class: ClassId) -> GenericsMap {
    match env.class(class) {
        Some(def) if def.is_inner() => match def.enclosing {
            Some(outer) => raw_scope(env, outer),
            None => GenericsMap::new(),
        },
        _ => GenericsMap::new(),
    }
}

/// Everything visible inside `class` when used raw: outer generics, then its own.
pub(crate) fn raw_scope(env: &dyn TypeEnv, class: ClassId) -> GenericsMap {
    let mut scope = resolve_raw_owner_generics(env, class);
    let own = raw_generics_in(env, class, &scope);
    for (name, ty) in own {
        scope.shift_remove(&name);
        scope.insert(name, ty);
    }
    scope
}

/// Raw resolution of `class`'s own variables with `outer` visible.
pub(crate) fn raw_generics_in(
    env: &dyn TypeEnv,
    class: ClassId,
    outer: &GenericsMap,
) -> GenericsMap {
    match env.class(class) {
        Some(def) => raw_variables_in(env, &def.type_params, outer),
        None => GenericsMap::new(),
    }
}

/// Raw resolution of `vars` (declared together, in order) with `outer` visible.
pub(crate) fn raw_variables_in(
    env: &dyn TypeEnv,
    vars: &[TypeVarId],
    outer: &GenericsMap,
) -> GenericsMap {
    let object = Type::object(env);
    let params: Vec<_> = vars.iter().filter_map(|id| env.type_param(*id)).collect();

    let mut scope = outer.clone();
    for param in &params {
        scope.shift_remove(&param.name);
        scope.insert(param.name.clone(), object.clone());
    }
    for param in &params {
        let value = resolve_declared_bounds(env, &param.upper_bounds, &scope);
        scope.insert(param.name.clone(), value);
    }

    params
        .iter()
        .filter_map(|param| {
            scope
                .get(&param.name)
                .map(|ty| (param.name.clone(), ty.clone()))
        })
        .collect()
}

/// Value of a variable declared with `bounds` when nothing better is known.
///
/// A single bound is substituted directly; several bounds become a wildcard of all of them.
pub(crate) fn resolve_declared_bounds(
    env: &dyn TypeEnv,
    bounds: &[Type],
    scope: &GenericsMap,
) -> Type {
    match bounds {
        [] => Type::object(env),
        [single] => resolve_type_variables_lenient(env, single, scope),
        bounds => {
            let mut upper = Vec::new();
            for bound in bounds {
                match resolve_type_variables_lenient(env, bound, scope) {
                    Type::Wildcard(w) if w.lower.is_none() && !is_object_only(env, &w) => {
                        upper.extend(w.upper)
                    }
                    other => upper.push(other),
                }
            }
            Type::Wildcard(WildcardType::extends(upper))
        }
    }
}

fn is_object_only(env: &dyn TypeEnv, w: &WildcardType) -> bool {
    w.upper.iter().all(|u| u.is_object(env))
}

/// Binding of `target`'s own variables as seen through a declared supertype expression.
///
/// `declared` is a superclass or interface expression written inside a class whose visible
/// generics are `scope` (`extends Base<List<T>>` gives `Base`'s `{T: List<scope[T]>}`). A raw
/// supertype reference resolves raw.
pub fn resolve_generics(
    env: &dyn TypeEnv,
    declared: &Type,
    scope: &GenericsMap,
) -> Result<GenericsMap> {
    match declared {
        Type::Parameterized(p) => {
            let names = own_names(env, p.raw);
            if names.len() != p.args.len() {
                return Ok(resolve_raw_generics(env, p.raw));
            }
            let mut out = GenericsMap::new();
            for (name, arg) in names.into_iter().zip(&p.args) {
                out.insert(name, resolve_type_variables(env, arg, scope)?);
            }
            Ok(out)
        }
        other => match other.erased_class(env) {
            ClassRef::Declared(id) => Ok(resolve_raw_generics(env, id)),
            _ => Ok(GenericsMap::new()),
        },
    }
}

/// Placeholder standing in for variable `id`.
pub fn placeholder_for(env: &dyn TypeEnv, id: TypeVarId) -> Type {
    match env.type_param(id) {
        Some(def) => Type::Placeholder(ExplicitVariable {
            name: def.name.clone(),
            declaration: def.owner,
            bounds: def
                .upper_bounds
                .iter()
                .map(|b| erase_to_object(env, b))
                .collect(),
        }),
        None => Type::object(env),
    }
}

/// Convert every declared variable of `ty` into a placeholder with the same name.
pub fn preserve_variables(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Class(_) | Type::Placeholder(_) => ty.clone(),
        Type::Variable(id) => placeholder_for(env, *id),
        Type::Parameterized(p) => Type::Parameterized(ParameterizedType {
            raw: p.raw,
            args: p.args.iter().map(|a| preserve_variables(env, a)).collect(),
            owner: p
                .owner
                .as_deref()
                .map(|o| Box::new(preserve_variables(env, o))),
        }),
        Type::GenericArray(component) => {
            Type::GenericArray(Box::new(preserve_variables(env, component)))
        }
        Type::Wildcard(w) => Type::Wildcard(WildcardType {
            upper: w.upper.iter().map(|u| preserve_variables(env, u)).collect(),
            lower: w
                .lower
                .as_deref()
                .map(|l| Box::new(preserve_variables(env, l))),
        }),
    }
}
