//! Resolution of the generics of every type in a class hierarchy.

use indexmap::IndexMap;

use crate::class::ClassRef;
use crate::error::{GenericsError, Result};
use crate::format::{render_class, render_generics, render_hierarchy, render_type};
use crate::store::{ClassId, TypeEnv};
use crate::subst::{
    extract_owner_generics, extract_type_generics, own_names, raw_generics_in, raw_scope,
    resolve_generics, resolve_raw_owner_generics,
};
use crate::ty::{GenericsMap, KnownGenerics, Type};
use crate::visitors::{is_compatible, is_more_specific};

/// Generics of every class and interface reachable from a root type.
///
/// Each binding holds the type's own variables in declaration order, fully resolved in terms of
/// the root's generics. Inner classes additionally keep the generics captured from their
/// enclosing classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHierarchy {
    root: ClassId,
    types: IndexMap<ClassId, GenericsMap>,
    owners: IndexMap<ClassId, GenericsMap>,
    ignored: Vec<ClassId>,
}

impl ResolvedHierarchy {
    pub fn root(&self) -> ClassId {
        self.root
    }

    pub fn ignored(&self) -> &[ClassId] {
        &self.ignored
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.types.contains_key(&class)
    }

    pub fn binding(&self, class: ClassId) -> Option<&GenericsMap> {
        self.types.get(&class)
    }

    /// Binding of `class`, or [`GenericsError::TypeNotInHierarchy`].
    pub fn generics_of(&self, env: &dyn TypeEnv, class: ClassId) -> Result<&GenericsMap> {
        self.types
            .get(&class)
            .ok_or_else(|| self.not_in_hierarchy(env, &render_class(env, class), None))
    }

    /// Generics captured from enclosing classes (empty unless `class` is an inner class).
    pub fn owner_generics(&self, class: ClassId) -> GenericsMap {
        self.owners.get(&class).cloned().unwrap_or_default()
    }

    /// Every variable visible inside `class`: enclosing class generics, then its own.
    pub fn scope(&self, class: ClassId) -> GenericsMap {
        let mut scope = self.owner_generics(class);
        if let Some(own) = self.types.get(&class) {
            for (name, ty) in own {
                scope.shift_remove(name);
                scope.insert(name.clone(), ty.clone());
            }
        }
        scope
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &GenericsMap)> {
        self.types.iter().map(|(id, generics)| (*id, generics))
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.types.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `current` is marked in the rendered tree.
    pub(crate) fn not_in_hierarchy(
        &self,
        env: &dyn TypeEnv,
        requested: &str,
        current: Option<ClassId>,
    ) -> GenericsError {
        GenericsError::TypeNotInHierarchy {
            root: render_class(env, self.root),
            requested: requested.to_string(),
            hierarchy: render_hierarchy(env, self, current),
        }
    }
}

/// Resolve the hierarchy of `root` treating it as a raw type (own variables from upper bounds).
pub fn resolve_raw_hierarchy(
    env: &dyn TypeEnv,
    root: ClassId,
    ignore: &[ClassId],
) -> Result<ResolvedHierarchy> {
    resolve_hierarchy(env, root, &GenericsMap::new(), &KnownGenerics::new(), ignore)
}

/// Resolve the generics of every type reachable from `root`.
///
/// `root_generics` may bind the root's own variables and the variables it captures from
/// enclosing classes; anything missing is resolved raw. Types present in `known` take their
/// binding from there instead of deriving it, and their supertypes are resolved from that
/// binding. Types in `ignore` are pruned together with everything only reachable through them.
pub fn resolve_hierarchy(
    env: &dyn TypeEnv,
    root: ClassId,
    root_generics: &GenericsMap,
    known: &KnownGenerics,
    ignore: &[ClassId],
) -> Result<ResolvedHierarchy> {
    let mut builder = Builder {
        env,
        known,
        ignore,
        root,
        types: IndexMap::new(),
        owners: IndexMap::new(),
    };
    builder.run(root_generics).map_err(|source| GenericsError::HierarchyResolution {
        root: render_class(env, root),
        generics: if root_generics.is_empty() {
            String::new()
        } else {
            render_generics(env, root_generics)
        },
        source: Box::new(source),
    })?;

    tracing::debug!(
        target = "genera.hierarchy",
        root = %render_class(env, root),
        types = builder.types.len(),
        "resolved hierarchy"
    );

    Ok(ResolvedHierarchy {
        root,
        types: builder.types,
        owners: builder.owners,
        ignored: ignore.to_vec(),
    })
}

struct Builder<'a> {
    env: &'a dyn TypeEnv,
    known: &'a KnownGenerics,
    ignore: &'a [ClassId],
    root: ClassId,
    types: IndexMap<ClassId, GenericsMap>,
    owners: IndexMap<ClassId, GenericsMap>,
}

impl Builder<'_> {
    fn run(&mut self, root_generics: &GenericsMap) -> Result<()> {
        let env = self.env;
        if env.class(self.root).is_none() {
            return Err(GenericsError::MissingClass(self.root));
        }

        let owner = {
            let supplied = extract_owner_generics(env, self.root, root_generics);
            let mut owner = resolve_raw_owner_generics(env, self.root);
            for (name, ty) in supplied {
                owner.insert(name, ty);
            }
            owner
        };
        let own = match self.known.get(&self.root) {
            Some(known) => known.clone(),
            None => {
                let mut own = raw_generics_in(env, self.root, &owner);
                for (name, ty) in extract_type_generics(env, self.root, root_generics) {
                    own.insert(name, ty);
                }
                own
            }
        };

        self.types.insert(self.root, own);
        if !owner.is_empty() {
            self.owners.insert(self.root, owner);
        }
        self.analyze(self.root)?;

        let object = env.well_known().object;
        if !self.ignore.contains(&object) {
            self.types.entry(object).or_default();
        }
        Ok(())
    }

    fn scope(&self, class: ClassId) -> GenericsMap {
        let mut scope = self.owners.get(&class).cloned().unwrap_or_default();
        if let Some(own) = self.types.get(&class) {
            for (name, ty) in own {
                scope.shift_remove(name);
                scope.insert(name.clone(), ty.clone());
            }
        }
        scope
    }

    fn analyze(&mut self, class: ClassId) -> Result<()> {
        let env = self.env;
        let Some(def) = env.class(class) else {
            return Ok(());
        };
        let scope = self.scope(class);

        for iface in &def.interfaces {
            self.analyze_interface(iface, &scope)?;
        }

        let Some(super_ty) = def.super_class.as_ref() else {
            return Ok(());
        };
        let ClassRef::Declared(superclass) = super_ty.erased_class(env) else {
            return Ok(());
        };
        if superclass == env.well_known().object || self.ignore.contains(&superclass) {
            return Ok(());
        }
        let (own, owner) = self.binding_for(superclass, super_ty, &scope)?;
        self.types.insert(superclass, own);
        if !owner.is_empty() {
            self.owners.insert(superclass, owner);
        }
        self.analyze(superclass)
    }

    fn analyze_interface(&mut self, declared: &Type, scope: &GenericsMap) -> Result<()> {
        let env = self.env;
        let ClassRef::Declared(iface) = declared.erased_class(env) else {
            return Ok(());
        };
        if self.ignore.contains(&iface) {
            return Ok(());
        }

        let (own, owner) = self.binding_for(iface, declared, scope)?;
        let binding = match self.types.get(&iface) {
            Some(existing) if *existing == own => return Ok(()),
            Some(existing) => {
                let merged = self.merge(iface, existing, &own)?;
                if merged == *existing {
                    return Ok(());
                }
                merged
            }
            None => own,
        };

        self.types.insert(iface, binding);
        if !owner.is_empty() {
            self.owners.insert(iface, owner);
        }
        self.analyze(iface)
    }

    /// Per variable, keep whichever value is more specific. Incompatible values are fatal.
    fn merge(
        &self,
        iface: ClassId,
        existing: &GenericsMap,
        new: &GenericsMap,
    ) -> Result<GenericsMap> {
        let env = self.env;
        let mut merged = GenericsMap::new();
        for (name, old) in existing {
            let Some(candidate) = new.get(name) else {
                merged.insert(name.clone(), old.clone());
                continue;
            };
            if old == candidate {
                merged.insert(name.clone(), old.clone());
                continue;
            }
            if !is_compatible(env, old, candidate)? {
                return Err(GenericsError::IncompatibleInterface {
                    root: render_class(env, self.root),
                    interface: render_class(env, iface),
                    variable: name.clone(),
                    first: render_type(env, old),
                    second: render_type(env, candidate),
                });
            }
            let value = if is_more_specific(env, candidate, old)? {
                candidate.clone()
            } else {
                old.clone()
            };
            merged.insert(name.clone(), value);
        }
        Ok(merged)
    }

    /// Own binding and captured outer generics of `target`, referenced as `declared` from a
    /// class whose visible generics are `scope`.
    fn binding_for(
        &self,
        target: ClassId,
        declared: &Type,
        scope: &GenericsMap,
    ) -> Result<(GenericsMap, GenericsMap)> {
        let owner = fill_outer_generics(self.env, target, declared, scope, self.known)?;
        let own = match self.known.get(&target) {
            Some(known) => known.clone(),
            None => match declared {
                Type::Parameterized(_) => {
                    let mut visible = owner.clone();
                    for (name, ty) in scope {
                        visible.entry(name.clone()).or_insert_with(|| ty.clone());
                    }
                    resolve_generics(self.env, declared, &visible)?
                }
                _ => raw_generics_in(self.env, target, &owner),
            },
        };
        Ok((own, owner))
    }
}

/// Generics `target` captures from its enclosing classes when referenced as `declared` from a
/// place whose visible generics are `scope`.
///
/// Sources, in order: an explicitly parameterized owner type (`Outer<String>.Inner`), a known
/// binding of the enclosing class, the host's own scope when it already sees every outer
/// variable (the host is the outer class or one of its inner classes), and finally raw
/// resolution. Names declared by `target` itself shadow outer names.
pub(crate) fn fill_outer_generics(
    env: &dyn TypeEnv,
    target: ClassId,
    declared: &Type,
    scope: &GenericsMap,
    known: &KnownGenerics,
) -> Result<GenericsMap> {
    let Some(def) = env.class(target) else {
        return Ok(GenericsMap::new());
    };
    let Some(outer) = def.enclosing.filter(|_| def.is_inner()) else {
        return Ok(GenericsMap::new());
    };

    let raw_outer = raw_scope(env, outer);
    let mut generics = if let Some(owner_ty) = owner_type(declared) {
        scope_of_type(env, outer, owner_ty, scope)?
    } else if let Some(known_outer) = known.get(&outer) {
        let mut generics = resolve_raw_owner_generics(env, outer);
        for (name, ty) in known_outer {
            generics.insert(name.clone(), ty.clone());
        }
        generics
    } else if raw_outer.keys().all(|name| scope.contains_key(name)) {
        raw_outer
            .keys()
            .filter_map(|name| scope.get(name).map(|ty| (name.clone(), ty.clone())))
            .collect()
    } else {
        raw_outer
    };

    for name in own_names(env, target) {
        generics.shift_remove(&name);
    }
    Ok(generics)
}

fn owner_type(declared: &Type) -> Option<&Type> {
    match declared {
        Type::Parameterized(p) => p.owner.as_deref(),
        _ => None,
    }
}

/// Everything visible inside `class` when it is referenced through `ty` (an owner type).
fn scope_of_type(
    env: &dyn TypeEnv,
    class: ClassId,
    ty: &Type,
    host_scope: &GenericsMap,
) -> Result<GenericsMap> {
    let Type::Parameterized(p) = ty else {
        return Ok(raw_scope(env, class));
    };
    let mut scope = match (env.class(class), p.owner.as_deref()) {
        (Some(def), Some(owner)) if def.is_inner() => match def.enclosing {
            Some(outer) => scope_of_type(env, outer, owner, host_scope)?,
            None => GenericsMap::new(),
        },
        _ => resolve_raw_owner_generics(env, class),
    };
    for (name, value) in resolve_generics(env, ty, host_scope)? {
        scope.shift_remove(&name);
        scope.insert(name, value);
    }
    Ok(scope)
}
