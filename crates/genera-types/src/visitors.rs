//! Comparisons built on [`walk`].

use crate::class::{box_type, is_subclass};
use crate::error::{GenericsError, Result};
use crate::format::render_type;
use crate::store::TypeEnv;
use crate::subst::upper_bound_classes;
use crate::ty::{GenericsMap, Type};
use crate::walker::{is_assignable_bounds, lower_bound, walk, TypesVisitor};

#[derive(Debug, Default)]
struct CompatibilityVisitor {
    compatible: bool,
}

impl TypesVisitor for CompatibilityVisitor {
    fn next(&mut self, _one: &Type, _two: &Type) -> Result<bool> {
        Ok(true)
    }

    fn incompatible_hierarchy(&mut self, _one: &Type, _two: &Type) {
        self.compatible = false;
    }
}

/// Whether `one` and `two` could describe the same value: at every level one side is assignable
/// to the other.
pub fn is_compatible(env: &dyn TypeEnv, one: &Type, two: &Type) -> Result<bool> {
    let mut visitor = CompatibilityVisitor { compatible: true };
    walk(env, one, two, &mut visitor)?;
    Ok(visitor.compatible)
}

/// Decides at the first level where the two sides differ.
struct ComparatorVisitor<'a> {
    env: &'a dyn TypeEnv,
    more_specific: bool,
    decided: bool,
    incompatible: bool,
}

impl ComparatorVisitor<'_> {
    fn decide(&mut self, more_specific: bool) -> Result<bool> {
        self.more_specific = more_specific;
        self.decided = true;
        Ok(false)
    }
}

impl TypesVisitor for ComparatorVisitor<'_> {
    fn next(&mut self, one: &Type, two: &Type) -> Result<bool> {
        if self.decided {
            return Ok(false);
        }
        let env = self.env;
        // `? super X` is bounded by Object from above.
        let one_bounds = upper_bound_classes(env, one);
        let two_bounds = upper_bound_classes(env, two);
        let forward = is_assignable_bounds(env, &one_bounds, &two_bounds);
        let backward = is_assignable_bounds(env, &two_bounds, &one_bounds);
        if !(forward && backward) {
            return self.decide(forward);
        }

        match (lower_bound(one), lower_bound(two)) {
            (Some(one_lower), Some(two_lower)) => {
                let one_lower = box_type(env, one_lower).erased_class(env);
                let two_lower = box_type(env, two_lower).erased_class(env);
                if one_lower == two_lower {
                    return Ok(true);
                }
                // `? super` narrows the other way round.
                self.decide(is_subclass(env, &two_lower, &one_lower))
            }
            (Some(_), None) => self.decide(true),
            (None, Some(_)) => self.decide(false),
            (None, None) => Ok(true),
        }
    }

    fn incompatible_hierarchy(&mut self, _one: &Type, _two: &Type) {
        self.incompatible = true;
    }
}

/// Whether `one` is strictly more specific than `two`.
///
/// Structurally equal types are not more specific than each other. Fails with
/// [`GenericsError::IncompatibleTypes`] when the types can't be compared at all.
pub fn is_more_specific(env: &dyn TypeEnv, one: &Type, two: &Type) -> Result<bool> {
    let mut visitor = ComparatorVisitor {
        env,
        more_specific: false,
        decided: false,
        incompatible: false,
    };
    walk(env, one, two, &mut visitor)?;
    if visitor.incompatible {
        return Err(incompatible(env, one, two));
    }
    Ok(visitor.decided && visitor.more_specific)
}

/// The more specific of two compatible types; `one` when neither is more specific.
pub fn get_more_specific_type(env: &dyn TypeEnv, one: &Type, two: &Type) -> Result<Type> {
    if !is_compatible(env, one, two)? {
        return Err(incompatible(env, one, two));
    }
    Ok(if is_more_specific(env, two, one)? {
        two.clone()
    } else {
        one.clone()
    })
}

struct AssignabilityVisitor<'a> {
    env: &'a dyn TypeEnv,
    assignable: bool,
}

impl TypesVisitor for AssignabilityVisitor<'_> {
    fn next(&mut self, one: &Type, two: &Type) -> Result<bool> {
        let env = self.env;
        if two.is_object(env) {
            return Ok(true);
        }
        let ok = match (lower_bound(one), lower_bound(two)) {
            // A `? super X` value is only known to be an Object.
            (Some(_), None) => false,
            (None, Some(lower)) => {
                let lower = box_type(env, lower).erased_class(env);
                upper_bound_classes(env, one)
                    .iter()
                    .all(|upper| is_subclass(env, &lower, upper))
            }
            (Some(one_lower), Some(two_lower)) => {
                let one_lower = box_type(env, one_lower).erased_class(env);
                let two_lower = box_type(env, two_lower).erased_class(env);
                is_subclass(env, &two_lower, &one_lower)
            }
            (None, None) => is_assignable_bounds(
                env,
                &upper_bound_classes(env, one),
                &upper_bound_classes(env, two),
            ),
        };
        if !ok {
            self.assignable = false;
        }
        Ok(ok)
    }

    fn incompatible_hierarchy(&mut self, _one: &Type, _two: &Type) {
        self.assignable = false;
    }
}

/// Whether a value of type `one` can be used where `two` is expected.
///
/// Type arguments are compared covariantly (`List<Integer>` is assignable to `List<Number>`);
/// lower bounded wildcards follow the `? super` rules.
pub fn is_assignable(env: &dyn TypeEnv, one: &Type, two: &Type) -> Result<bool> {
    let mut visitor = AssignabilityVisitor {
        env,
        assignable: true,
    };
    walk(env, one, two, &mut visitor)?;
    Ok(visitor.assignable)
}

#[derive(Debug, Default)]
struct MatchVariablesVisitor {
    matched: Vec<(String, Type)>,
    incompatible: Option<(Type, Type)>,
}

impl TypesVisitor for MatchVariablesVisitor {
    fn next(&mut self, one: &Type, two: &Type) -> Result<bool> {
        if let Type::Placeholder(var) = one {
            self.matched.push((var.name.clone(), two.clone()));
        }
        Ok(true)
    }

    fn incompatible_hierarchy(&mut self, one: &Type, two: &Type) {
        self.incompatible = Some((one.clone(), two.clone()));
    }
}

/// Values matched by the placeholders of `template` when it is laid over `real`.
///
/// `List<T>` over `ArrayList<String>` gives `{T: String}`. A placeholder matched more than once
/// keeps the most specific value; contradicting matches are an error.
pub fn match_variables(env: &dyn TypeEnv, template: &Type, real: &Type) -> Result<GenericsMap> {
    let mut visitor = MatchVariablesVisitor::default();
    walk(env, template, real, &mut visitor)?;
    if let Some((one, two)) = visitor.incompatible {
        return Err(incompatible(env, &one, &two));
    }

    let mut out = GenericsMap::new();
    for (name, ty) in visitor.matched {
        let value = match out.get(&name) {
            Some(existing) => get_more_specific_type(env, existing, &ty)?,
            None => ty,
        };
        out.insert(name, value);
    }
    Ok(out)
}

pub(crate) fn incompatible(env: &dyn TypeEnv, one: &Type, two: &Type) -> GenericsError {
    GenericsError::IncompatibleTypes {
        first: render_type(env, one),
        second: render_type(env, two),
    }
}
