//! Lock-step traversal of two type expressions.

use crate::class::{box_type, is_subclass, ClassRef};
use crate::error::Result;
use crate::hierarchy::resolve_hierarchy;
use crate::store::{ClassId, TypeEnv};
use crate::subst::{own_names, resolve_raw_generics, resolve_with_bounds, upper_bound_classes};
use crate::ty::{GenericsMap, KnownGenerics, Type};

/// Callbacks of [`walk`].
pub trait TypesVisitor {
    /// Called for every compatible pair of types. Returning `false` skips the arguments and
    /// components of this pair; siblings are still visited.
    fn next(&mut self, one: &Type, two: &Type) -> Result<bool>;

    /// Called when the types at the current position can't be related. The walk stops after
    /// this call.
    fn incompatible_hierarchy(&mut self, one: &Type, two: &Type);
}

/// Walk `one` and `two` in parallel, descending into array components and type arguments.
///
/// The walk stops at the first incompatible pair.
///
/// Variables are replaced by their upper bounds first; placeholders are kept so that visitors
/// can observe them. Primitives are boxed at every step.
pub fn walk(
    env: &dyn TypeEnv,
    one: &Type,
    two: &Type,
    visitor: &mut dyn TypesVisitor,
) -> Result<()> {
    let one = resolve_with_bounds(env, one);
    let two = resolve_with_bounds(env, two);
    do_walk(env, &one, &two, visitor)?;
    Ok(())
}

fn do_walk(
    env: &dyn TypeEnv,
    one: &Type,
    two: &Type,
    visitor: &mut dyn TypesVisitor,
) -> Result<bool> {
    let one = box_type(env, one);
    let two = box_type(env, two);

    if !is_compatible_step(env, &one, &two) {
        visitor.incompatible_hierarchy(&one, &two);
        return Ok(false);
    }
    if !visitor.next(&one, &two)? || one.is_object(env) || two.is_object(env) {
        return Ok(true);
    }

    let (Some(one), Some(two)) = (descend_type(&one), descend_type(&two)) else {
        return Ok(true);
    };
    match (one.component_type(), two.component_type()) {
        (Some(a), Some(b)) => do_walk(env, &a, &b, visitor),
        (None, None) => visit_generics(env, &one, &two, visitor),
        _ => Ok(true),
    }
}

/// The expression whose structure is walked further, if any.
///
/// Lower bounded and multi-bound wildcards and placeholders are leaves.
fn descend_type(ty: &Type) -> Option<Type> {
    match ty {
        Type::Wildcard(w) if w.lower.is_some() => None,
        Type::Wildcard(w) => match w.upper.as_slice() {
            [single] => descend_type(single),
            _ => None,
        },
        Type::Placeholder(_) | Type::Variable(_) => None,
        other => Some(other.clone()),
    }
}

fn visit_generics(
    env: &dyn TypeEnv,
    one: &Type,
    two: &Type,
    visitor: &mut dyn TypesVisitor,
) -> Result<bool> {
    let (ClassRef::Declared(one_class), ClassRef::Declared(two_class)) =
        (one.erased_class(env), two.erased_class(env))
    else {
        return Ok(true);
    };

    let (target, one_args, two_args) = if one_class == two_class {
        (one_class, type_generics(env, one), type_generics(env, two))
    } else if is_subclass(
        env,
        &ClassRef::Declared(one_class),
        &ClassRef::Declared(two_class),
    ) {
        (two_class, generics_as(env, one, two_class)?, type_generics(env, two))
    } else if is_subclass(
        env,
        &ClassRef::Declared(two_class),
        &ClassRef::Declared(one_class),
    ) {
        (one_class, type_generics(env, one), generics_as(env, two, one_class)?)
    } else {
        return Ok(true);
    };

    let object = Type::object(env);
    for name in own_names(env, target) {
        let a = one_args.get(&name).unwrap_or(&object);
        let b = two_args.get(&name).unwrap_or(&object);
        if !do_walk(env, a, b, visitor)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Own generics carried by `ty`: its arguments, or raw bounds for a raw class reference.
pub(crate) fn type_generics(env: &dyn TypeEnv, ty: &Type) -> GenericsMap {
    match ty {
        Type::Parameterized(p) => {
            let names = own_names(env, p.raw);
            if names.len() == p.args.len() {
                names.into_iter().zip(p.args.iter().cloned()).collect()
            } else {
                resolve_raw_generics(env, p.raw)
            }
        }
        Type::Class(ClassRef::Declared(id)) => resolve_raw_generics(env, *id),
        _ => GenericsMap::new(),
    }
}

/// Generics of supertype `target` as seen from `ty`.
pub(crate) fn generics_as(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Result<GenericsMap> {
    let ClassRef::Declared(class) = ty.erased_class(env) else {
        return Ok(resolve_raw_generics(env, target));
    };
    if class == target {
        return Ok(type_generics(env, ty));
    }
    let generics = type_generics(env, ty);
    let hierarchy = resolve_hierarchy(env, class, &generics, &KnownGenerics::new(), &[])?;
    Ok(hierarchy
        .binding(target)
        .cloned()
        .unwrap_or_else(|| resolve_raw_generics(env, target)))
}

pub(crate) fn lower_bound(ty: &Type) -> Option<&Type> {
    match ty {
        Type::Wildcard(w) => w.lower.as_deref(),
        _ => None,
    }
}

/// `one` is assignable to `two`: every class in `two` has a subclass among `one`.
pub(crate) fn is_assignable_bounds(env: &dyn TypeEnv, one: &[ClassRef], two: &[ClassRef]) -> bool {
    two.iter()
        .all(|sup| one.iter().any(|sub| is_subclass(env, sub, sup)))
}

fn is_compatible_step(env: &dyn TypeEnv, one: &Type, two: &Type) -> bool {
    match (lower_bound(one), lower_bound(two)) {
        (Some(a), Some(b)) => {
            let a = box_type(env, a).erased_class(env);
            let b = box_type(env, b).erased_class(env);
            is_subclass(env, &a, &b) || is_subclass(env, &b, &a)
        }
        (Some(lower), None) => lower_compatible(env, lower, two),
        (None, Some(lower)) => lower_compatible(env, lower, one),
        (None, None) => {
            let a = upper_bound_classes(env, one);
            let b = upper_bound_classes(env, two);
            is_assignable_bounds(env, &a, &b) || is_assignable_bounds(env, &b, &a)
        }
    }
}

/// A `? super lower` is compatible with anything whose bounds accept `lower`.
fn lower_compatible(env: &dyn TypeEnv, lower: &Type, other: &Type) -> bool {
    let lower = box_type(env, lower).erased_class(env);
    upper_bound_classes(env, other)
        .iter()
        .all(|upper| is_subclass(env, &lower, upper))
}
