//! Common (median) type of two types.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::class::{box_type, direct_supertypes, is_subclass, ClassRef};
use crate::error::Result;
use crate::format::type_sort_key;
use crate::hierarchy::{resolve_hierarchy, ResolvedHierarchy};
use crate::store::{ClassId, TypeEnv};
use crate::subst::{erase_to_object, own_names};
use crate::ty::{KnownGenerics, Type, WildcardType};
use crate::visitors::is_assignable;
use crate::walker::type_generics;

/// The most specific type both `one` and `two` are assignable to.
///
/// The result is a class, an interface, or a wildcard joining a class with the interfaces both
/// types share. Interfaces are only reported next to a common class when `all_interfaces` is
/// set; without a common class (other than `Object`) they are always reported. Variables are
/// treated as `Object`.
///
/// ```text
/// Integer, Double        -> Number
/// Integer, Double, all   -> ? extends Number & Comparable<Number>
/// ```
pub fn common_type(
    env: &dyn TypeEnv,
    one: &Type,
    two: &Type,
    all_interfaces: bool,
) -> Result<Type> {
    CommonTypeBuilder {
        env,
        cache: HashMap::new(),
    }
    .build(one, two, all_interfaces)
}

enum Entry {
    InProgress,
    Done(Type),
}

struct CommonTypeBuilder<'a> {
    env: &'a dyn TypeEnv,
    cache: HashMap<(Type, Type, bool), Entry>,
}

impl CommonTypeBuilder<'_> {
    fn build(&mut self, one: &Type, two: &Type, all_interfaces: bool) -> Result<Type> {
        let env = self.env;
        let one = box_type(env, &erase_to_object(env, one));
        let two = box_type(env, &erase_to_object(env, two));

        let key = (one.clone(), two.clone(), all_interfaces);
        let swapped = (two.clone(), one.clone(), all_interfaces);
        match self.cache.get(&key).or_else(|| self.cache.get(&swapped)) {
            Some(Entry::Done(ty)) => return Ok(ty.clone()),
            Some(Entry::InProgress) => {
                tracing::trace!(target = "genera.common", "cycle in common type resolution");
                return Ok(self.cycle_fallback(&one, &two));
            }
            None => {}
        }

        self.cache.insert(key.clone(), Entry::InProgress);
        let result = self.compute(&one, &two, all_interfaces);
        match &result {
            Ok(ty) => {
                self.cache.insert(key, Entry::Done(ty.clone()));
            }
            Err(_) => {
                self.cache.remove(&key);
            }
        }
        result
    }

    fn compute(&mut self, one: &Type, two: &Type, all_interfaces: bool) -> Result<Type> {
        let env = self.env;
        if one == two {
            return Ok(one.clone());
        }

        let one_to_two = is_assignable(env, one, two)?;
        let two_to_one = is_assignable(env, two, one)?;
        match (one_to_two, two_to_one) {
            (true, true) => {
                return Ok(
                    if type_sort_key(env, one) <= type_sort_key(env, two) {
                        one.clone()
                    } else {
                        two.clone()
                    },
                )
            }
            (true, false) => return Ok(two.clone()),
            (false, true) => return Ok(one.clone()),
            (false, false) => {}
        }

        if let (Some(a), Some(b)) = (one.component_type(), two.component_type()) {
            return self.array_common(&a, &b, all_interfaces);
        }
        if matches!(one, Type::Wildcard(_)) || matches!(two, Type::Wildcard(_)) {
            return self.wildcard_common(one, two, all_interfaces);
        }

        match (declared_class(env, one), declared_class(env, two)) {
            (Some(a), Some(b)) => self.class_common(one, a, two, b, all_interfaces),
            // An array and a class share at most `Object`, `Cloneable` and `Serializable`.
            _ if one.is_array() || two.is_array() => Ok(self.array_and_class(one, two)),
            _ => Ok(Type::object(env)),
        }
    }

    fn array_common(&mut self, one: &Type, two: &Type, all_interfaces: bool) -> Result<Type> {
        let env = self.env;
        let is_primitive = |ty: &Type| matches!(ty, Type::Class(ClassRef::Primitive(_)));
        if is_primitive(one) || is_primitive(two) {
            // No covariance between primitive arrays.
            return Ok(Type::object(env));
        }
        let one = first_bound(one);
        let two = first_bound(two);
        Ok(Type::array(self.build(&one, &two, all_interfaces)?))
    }

    fn array_and_class(&self, one: &Type, two: &Type) -> Type {
        let env = self.env;
        let wk = env.well_known();
        let other = if one.is_array() { two } else { one };
        let other = other.erased_class(env);
        let interfaces: Vec<Type> = [wk.cloneable, wk.serializable]
            .into_iter()
            .filter(|iface| is_subclass(env, &other, &ClassRef::Declared(*iface)))
            .map(Type::class)
            .collect();
        self.finish(interfaces)
    }

    fn wildcard_common(&mut self, one: &Type, two: &Type, all_interfaces: bool) -> Result<Type> {
        let env = self.env;
        let mut collected: Vec<Type> = Vec::new();
        for a in wildcard_parts(env, one) {
            for b in wildcard_parts(env, two) {
                let common = self.build(&a, &b, all_interfaces)?;
                for candidate in wildcard_parts(env, &common) {
                    if candidate.is_object(env) {
                        continue;
                    }
                    self.collect(&mut collected, candidate)?;
                }
            }
        }
        Ok(self.finish(collected))
    }

    /// Add `candidate` unless a collected type is at least as specific; drop collected types
    /// that `candidate` is more specific than.
    fn collect(&self, collected: &mut Vec<Type>, candidate: Type) -> Result<()> {
        let env = self.env;
        for existing in collected.iter() {
            if *existing == candidate || is_assignable(env, existing, &candidate)? {
                return Ok(());
            }
        }
        let mut kept = Vec::with_capacity(collected.len() + 1);
        for existing in collected.drain(..) {
            if !is_assignable(env, &candidate, &existing)? {
                kept.push(existing);
            }
        }
        kept.push(candidate);
        *collected = kept;
        Ok(())
    }

    fn class_common(
        &mut self,
        one: &Type,
        one_class: ClassId,
        two: &Type,
        two_class: ClassId,
        all_interfaces: bool,
    ) -> Result<Type> {
        let env = self.env;
        let object = env.well_known().object;
        let one_hierarchy = hierarchy_of(env, one, one_class)?;
        let two_hierarchy = hierarchy_of(env, two, two_class)?;

        let common_class = superclass_chain(env, one_class)
            .into_iter()
            .find(|class| two_hierarchy.contains(*class))
            .unwrap_or(object);

        let shared: Vec<ClassId> = one_hierarchy
            .classes()
            .filter(|id| is_interface(env, *id) && two_hierarchy.contains(*id))
            .collect();
        let interfaces: Vec<ClassId> = shared
            .iter()
            .copied()
            .filter(|iface| {
                let target = ClassRef::Declared(*iface);
                let implied_by_class = common_class != object
                    && is_subclass(env, &ClassRef::Declared(common_class), &target);
                let implied_by_interface = shared.iter().any(|other| {
                    other != iface && is_subclass(env, &ClassRef::Declared(*other), &target)
                });
                !implied_by_class && !implied_by_interface
            })
            .collect();

        let mut types = Vec::new();
        if common_class != object {
            types.push(self.parametrize(common_class, &one_hierarchy, &two_hierarchy)?);
        }
        if common_class == object || all_interfaces {
            for iface in interfaces {
                types.push(self.parametrize(iface, &one_hierarchy, &two_hierarchy)?);
            }
        }
        Ok(self.finish(types))
    }

    /// `class` with each argument the common type of both sides' values for it.
    fn parametrize(
        &mut self,
        class: ClassId,
        one: &ResolvedHierarchy,
        two: &ResolvedHierarchy,
    ) -> Result<Type> {
        let env = self.env;
        let names = own_names(env, class);
        if names.is_empty() {
            return Ok(Type::class(class));
        }
        let object = Type::object(env);
        let mut args = Vec::with_capacity(names.len());
        for name in names {
            let a = one.binding(class).and_then(|g| g.get(&name)).unwrap_or(&object);
            let b = two.binding(class).and_then(|g| g.get(&name)).unwrap_or(&object);
            args.push(self.build(a, b, false)?);
        }
        Ok(Type::parameterized(class, args))
    }

    fn finish(&self, mut types: Vec<Type>) -> Type {
        let env = self.env;
        match types.len() {
            0 => Type::object(env),
            1 => types.remove(0),
            _ => {
                types.sort_by_key(|ty| {
                    (
                        ty.erased_class(env).is_interface(env),
                        type_sort_key(env, ty),
                    )
                });
                Type::Wildcard(WildcardType::extends(types))
            }
        }
    }

    /// Raw approximation used when a pair is already being computed further up the stack.
    ///
    /// Picks the nearest shared superclass, otherwise the first shared interface by sort key, so
    /// the result does not depend on argument order.
    fn cycle_fallback(&self, one: &Type, two: &Type) -> Type {
        let env = self.env;
        let (Some(a), Some(b)) = (declared_class(env, one), declared_class(env, two)) else {
            return Type::object(env);
        };
        let object = env.well_known().object;
        let b_ref = ClassRef::Declared(b);
        if let Some(class) = superclass_chain(env, a)
            .into_iter()
            .find(|class| *class != object && is_subclass(env, &b_ref, &ClassRef::Declared(*class)))
        {
            return Type::class(class);
        }
        ancestors(env, a)
            .into_iter()
            .chain(is_interface(env, a).then_some(a))
            .filter(|id| {
                is_interface(env, *id) && is_subclass(env, &b_ref, &ClassRef::Declared(*id))
            })
            .map(Type::class)
            .min_by_key(|ty| type_sort_key(env, ty))
            .unwrap_or_else(|| Type::object(env))
    }
}

fn declared_class(env: &dyn TypeEnv, ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Parameterized(p) => Some(p.raw),
        Type::Class(ClassRef::Declared(id)) => Some(*id),
        Type::Wildcard(w) if w.lower.is_none() => {
            w.upper.first().and_then(|upper| declared_class(env, upper))
        }
        _ => None,
    }
}

fn first_bound(ty: &Type) -> Type {
    match ty {
        Type::Wildcard(w) if w.lower.is_none() && !w.upper.is_empty() => w.upper[0].clone(),
        other => other.clone(),
    }
}

fn wildcard_parts(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    match ty {
        Type::Wildcard(w) if w.lower.is_some() => vec![Type::object(env)],
        Type::Wildcard(w) => w.upper_bounds(env),
        other => vec![other.clone()],
    }
}

fn is_interface(env: &dyn TypeEnv, id: ClassId) -> bool {
    env.class(id).is_some_and(|def| def.is_interface())
}

fn hierarchy_of(env: &dyn TypeEnv, ty: &Type, class: ClassId) -> Result<ResolvedHierarchy> {
    resolve_hierarchy(env, class, &type_generics(env, ty), &KnownGenerics::new(), &[])
}

/// `class` and its superclasses up to `Object`. Interfaces have an empty chain.
fn superclass_chain(env: &dyn TypeEnv, class: ClassId) -> Vec<ClassId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(class);
    while let Some(id) = current {
        if is_interface(env, id) || !seen.insert(id) {
            break;
        }
        chain.push(id);
        current = env
            .class(id)
            .and_then(|def| def.super_class.as_ref())
            .and_then(|ty| ty.erased_class(env).declared());
    }
    chain
}

/// Every supertype of `class` in breadth-first order.
fn ancestors(env: &dyn TypeEnv, class: ClassId) -> Vec<ClassId> {
    let mut seen = HashSet::from([class]);
    let mut out = Vec::new();
    let mut queue = VecDeque::from([class]);
    while let Some(current) = queue.pop_front() {
        for next in direct_supertypes(env, current) {
            if seen.insert(next) {
                out.push(next);
                queue.push_back(next);
            }
        }
    }
    out
}
