//! Navigation over a resolved hierarchy.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CachePolicy, HierarchyCache};
use crate::class::{is_subclass, ClassRef};
use crate::error::{GenericsError, Result};
use crate::format::{render_class, render_declaration, render_hierarchy, render_type};
use crate::hierarchy::{resolve_hierarchy, ResolvedHierarchy};
use crate::store::{
    ClassId, ConstructorDef, ConstructorId, GenericDeclaration, MethodDef, MethodId, TypeEnv,
};
use crate::subst::{raw_variables_in, resolve_type_variables};
use crate::tracking::track_root_generics;
use crate::ty::{GenericsMap, KnownGenerics, ParameterizedType, Type};
use crate::walker::type_generics;

/// Entry point: resolves hierarchies for one type environment and caches raw ones by root.
///
/// Share it between threads through an `Arc`.
pub struct GenericsResolver<'env> {
    env: &'env (dyn TypeEnv + Sync),
    cache: HierarchyCache,
}

impl fmt::Debug for GenericsResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericsResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<'env> GenericsResolver<'env> {
    pub fn new(env: &'env (dyn TypeEnv + Sync)) -> Self {
        Self::with_policy(env, CachePolicy::default())
    }

    pub fn with_policy(env: &'env (dyn TypeEnv + Sync), policy: CachePolicy) -> Self {
        Self {
            env,
            cache: HierarchyCache::new(policy),
        }
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    pub fn cache(&self) -> &HierarchyCache {
        &self.cache
    }

    /// Raw hierarchy of `root`, from the cache when possible.
    pub fn hierarchy(&self, root: ClassId) -> Result<Arc<ResolvedHierarchy>> {
        self.cache.get_or_resolve(self.env, root)
    }

    /// Hierarchy of `root` without the `ignored` branches. Never cached, since pruning changes
    /// the bindings of what remains.
    pub fn hierarchy_ignoring(
        &self,
        root: ClassId,
        ignored: &[ClassId],
    ) -> Result<Arc<ResolvedHierarchy>> {
        if ignored.is_empty() {
            return self.hierarchy(root);
        }
        Ok(Arc::new(resolve_hierarchy(
            self.env,
            root,
            &GenericsMap::new(),
            &KnownGenerics::new(),
            ignored,
        )?))
    }

    pub fn resolve(&self, root: ClassId) -> Result<TypeContext<'_>> {
        let hierarchy = self.hierarchy(root)?;
        Ok(TypeContext::new(self, hierarchy, root, None))
    }

    pub fn resolve_ignoring(&self, root: ClassId, ignored: &[ClassId]) -> Result<TypeContext<'_>> {
        let hierarchy = self.hierarchy_ignoring(root, ignored)?;
        Ok(TypeContext::new(self, hierarchy, root, None))
    }

    /// Context of `root` with some of its own (or captured outer) variables bound explicitly.
    pub fn resolve_with_generics(
        &self,
        root: ClassId,
        generics: &GenericsMap,
    ) -> Result<TypeContext<'_>> {
        let hierarchy = resolve_hierarchy(self.env, root, generics, &KnownGenerics::new(), &[])?;
        Ok(TypeContext::new(self, Arc::new(hierarchy), root, None))
    }
}

/// A resolved hierarchy focused on one of its types.
///
/// Contexts are immutable; navigation returns new contexts sharing the same hierarchy.
/// Contexts created for a field, parameter or return type keep a link back to the context
/// they were created from.
#[derive(Clone)]
pub struct TypeContext<'a> {
    resolver: &'a GenericsResolver<'a>,
    hierarchy: Arc<ResolvedHierarchy>,
    current: ClassId,
    generics: GenericsMap,
    scope: GenericsMap,
    parent: Option<Arc<TypeContext<'a>>>,
}

impl fmt::Debug for TypeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeContext")
            .field("root", &self.hierarchy.root())
            .field("current", &self.current)
            .field("generics", &self.generics)
            .finish_non_exhaustive()
    }
}

impl<'a> TypeContext<'a> {
    fn new(
        resolver: &'a GenericsResolver<'a>,
        hierarchy: Arc<ResolvedHierarchy>,
        current: ClassId,
        parent: Option<Arc<TypeContext<'a>>>,
    ) -> Self {
        let generics = hierarchy.binding(current).cloned().unwrap_or_default();
        let scope = hierarchy.scope(current);
        Self {
            resolver,
            hierarchy,
            current,
            generics,
            scope,
            parent,
        }
    }

    fn env(&self) -> &'a dyn TypeEnv {
        self.resolver.env()
    }

    pub fn hierarchy(&self) -> &ResolvedHierarchy {
        &self.hierarchy
    }

    pub fn current_class(&self) -> ClassId {
        self.current
    }

    pub fn root_class(&self) -> ClassId {
        self.hierarchy.root()
    }

    /// The context this one was created from by `inlying_type*` navigation.
    pub fn parent(&self) -> Option<&TypeContext<'a>> {
        self.parent.as_deref()
    }

    /// Own generics of the current type.
    pub fn generics_map(&self) -> &GenericsMap {
        &self.generics
    }

    pub fn generics(&self) -> Vec<&Type> {
        self.generics.values().collect()
    }

    pub fn generic(&self, index: usize) -> Result<&Type> {
        positional(&self.generics, index, &render_class(self.env(), self.current))
    }

    pub fn generic_by_name(&self, name: &str) -> Result<&Type> {
        named(&self.generics, name, &render_class(self.env(), self.current))
    }

    /// Generics the current type captures from its enclosing classes.
    pub fn owner_generics(&self) -> GenericsMap {
        self.hierarchy.owner_generics(self.current)
    }

    /// Switch focus to another type of the same hierarchy.
    pub fn type_of(&self, class: ClassId) -> Result<TypeContext<'a>> {
        let env = self.env();
        if !self.hierarchy.contains(class) {
            let requested = render_class(env, class);
            return Err(self
                .hierarchy
                .not_in_hierarchy(env, &requested, Some(self.current)));
        }
        Ok(TypeContext::new(
            self.resolver,
            self.hierarchy.clone(),
            class,
            self.parent.clone(),
        ))
    }

    pub fn resolve_type(&self, ty: &Type) -> Result<Type> {
        self.resolve_in(ty, &self.scope)
    }

    pub fn resolve_class(&self, ty: &Type) -> Result<ClassRef> {
        Ok(self.resolve_type(ty)?.erased_class(self.env()))
    }

    /// Resolved type arguments of `ty` (upper bounds for a raw generic class).
    pub fn resolve_type_generics(&self, ty: &Type) -> Result<Vec<Type>> {
        let resolved = self.resolve_type(ty)?;
        Ok(type_generics(self.env(), &resolved).into_values().collect())
    }

    /// Declared type of field `name`, looked up in the current type and then in the rest of the
    /// hierarchy, resolved in the declaring type's scope.
    pub fn field_type(&self, name: &str) -> Result<Type> {
        let env = self.env();
        let candidates = std::iter::once(self.current)
            .chain(self.hierarchy.classes().filter(|id| *id != self.current));
        for class in candidates {
            let Some(field) = env
                .class(class)
                .and_then(|def| def.fields.iter().find(|f| f.name == name))
            else {
                continue;
            };
            let scope = self.hierarchy.scope(class);
            return self.resolve_in(&field.ty, &scope);
        }
        Err(GenericsError::UnknownName {
            what: "field",
            name: name.to_string(),
            available: self.field_names().join(", "),
            owner: render_class(env, self.current),
        })
    }

    fn field_names(&self) -> Vec<String> {
        self.env()
            .class(self.current)
            .map(|def| def.fields.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn method(&self, id: MethodId) -> Result<MethodContext<'a>> {
        let env = self.env();
        let class = self.type_of(id.class)?;
        let def = env
            .class(id.class)
            .and_then(|def| def.methods.get(id.index as usize))
            .ok_or_else(|| GenericsError::IndexOutOfRange {
                what: "method",
                index: id.index as usize,
                count: env.class(id.class).map_or(0, |def| def.methods.len()),
                owner: render_class(env, id.class),
            })?;
        let generics = raw_variables_in(env, &def.type_params, &class.scope);
        let scope = merged(&class.scope, &generics);
        Ok(MethodContext {
            class,
            id,
            def,
            generics,
            scope,
        })
    }

    /// First method of the current type called `name`.
    pub fn method_named(&self, name: &str) -> Result<MethodContext<'a>> {
        let env = self.env();
        let methods = env
            .class(self.current)
            .map(|def| def.methods.as_slice())
            .unwrap_or_default();
        let Some(index) = methods.iter().position(|m| m.name == name) else {
            return Err(GenericsError::UnknownName {
                what: "method",
                name: name.to_string(),
                available: methods
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                owner: render_class(env, self.current),
            });
        };
        self.method(MethodId {
            class: self.current,
            index: index as u32,
        })
    }

    /// Constructor `index` of the current type.
    pub fn constructor(&self, index: usize) -> Result<ConstructorContext<'a>> {
        let env = self.env();
        let constructors = env
            .class(self.current)
            .map(|def| def.constructors.as_slice())
            .unwrap_or_default();
        let def = constructors
            .get(index)
            .ok_or_else(|| GenericsError::IndexOutOfRange {
                what: "constructor",
                index,
                count: constructors.len(),
                owner: render_class(env, self.current),
            })?;
        let generics = raw_variables_in(env, &def.type_params, &self.scope);
        let scope = merged(&self.scope, &generics);
        Ok(ConstructorContext {
            class: self.clone(),
            id: ConstructorId {
                class: self.current,
                index: index as u32,
            },
            def,
            generics,
            scope,
        })
    }

    /// Context of the type `ty` declared inside the current type (a field type, say), with the
    /// current generics carried into it.
    pub fn inlying_type(&self, ty: &Type) -> Result<TypeContext<'a>> {
        self.inlying_in(ty, &self.scope)
    }

    /// Like [`TypeContext::inlying_type`], but for `implementation`, a subtype of the declared
    /// type. The implementation's own generics are tracked from the declared ones.
    pub fn inlying_type_as(&self, ty: &Type, implementation: ClassId) -> Result<TypeContext<'a>> {
        self.inlying_as_in(ty, implementation, &self.scope)
    }

    /// Hierarchy tree with the current type marked.
    pub fn render(&self) -> String {
        render_hierarchy(self.env(), &self.hierarchy, Some(self.current))
    }

    fn resolve_in(&self, ty: &Type, scope: &GenericsMap) -> Result<Type> {
        self.check_scope(ty, scope)?;
        resolve_type_variables(self.env(), ty, scope)
    }

    /// Variables of `ty` must be visible in `scope`; otherwise point at the declaration that
    /// owns them.
    fn check_scope(&self, ty: &Type, scope: &GenericsMap) -> Result<()> {
        let env = self.env();
        for var in ty.variables() {
            let Some(def) = env.type_param(var) else {
                continue;
            };
            if scope.contains_key(&def.name) {
                continue;
            }
            let (declared_by, suggestion) = match def.owner {
                Some(owner) => (render_declaration(env, owner), suggestion(env, owner)),
                None => ("an unknown declaration".to_string(), "the declaring context".to_string()),
            };
            return Err(GenericsError::WrongContext {
                name: def.name.clone(),
                declared_by,
                suggestion,
                hierarchy: self.render(),
            });
        }
        Ok(())
    }

    fn inlying_in(&self, ty: &Type, scope: &GenericsMap) -> Result<TypeContext<'a>> {
        let env = self.env();
        let resolved = self.resolve_in(ty, scope)?;
        let target = innermost(&resolved);
        let Some(class) = declared_class(&target) else {
            return Err(GenericsError::UnknownName {
                what: "class type",
                name: render_type(env, &resolved),
                available: String::new(),
                owner: render_class(env, self.current),
            });
        };

        let ignored = self.hierarchy.ignored();
        let hierarchy = if matches!(target, Type::Class(_)) {
            self.resolver.hierarchy_ignoring(class, ignored)?
        } else {
            let mut generics = type_generics(env, &target);
            if let Type::Parameterized(ParameterizedType { owner: Some(owner), .. }) = &target {
                for (name, ty) in type_generics(env, owner) {
                    generics.entry(name).or_insert(ty);
                }
            }
            Arc::new(resolve_hierarchy(env, class, &generics, &KnownGenerics::new(), ignored)?)
        };
        Ok(TypeContext::new(
            self.resolver,
            hierarchy,
            class,
            Some(Arc::new(self.clone())),
        ))
    }

    fn inlying_as_in(
        &self,
        ty: &Type,
        implementation: ClassId,
        scope: &GenericsMap,
    ) -> Result<TypeContext<'a>> {
        let env = self.env();
        let resolved = self.resolve_in(ty, scope)?;
        let target = innermost(&resolved);
        let Some(declared) = declared_class(&target) else {
            return self.inlying_in(ty, scope);
        };
        if !is_subclass(env, &ClassRef::Declared(implementation), &ClassRef::Declared(declared)) {
            let declared_hierarchy = self.resolver.hierarchy(declared)?;
            return Err(GenericsError::TypeNotInHierarchy {
                root: render_class(env, implementation),
                requested: render_type(env, &resolved),
                hierarchy: render_hierarchy(env, &declared_hierarchy, None),
            });
        }

        let declared_generics = type_generics(env, &target);
        let root_generics = track_root_generics(env, implementation, declared, &declared_generics)?;
        let mut known = KnownGenerics::new();
        if !declared_generics.is_empty() {
            known.insert(declared, declared_generics);
        }
        let hierarchy = resolve_hierarchy(
            env,
            implementation,
            &root_generics,
            &known,
            self.hierarchy.ignored(),
        )?;
        Ok(TypeContext::new(
            self.resolver,
            Arc::new(hierarchy),
            implementation,
            Some(Arc::new(self.clone())),
        ))
    }
}

/// Generics of a method, resolved in the scope of its declaring type.
#[derive(Debug, Clone)]
pub struct MethodContext<'a> {
    class: TypeContext<'a>,
    id: MethodId,
    def: &'a MethodDef,
    generics: GenericsMap,
    scope: GenericsMap,
}

impl<'a> MethodContext<'a> {
    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn def(&self) -> &'a MethodDef {
        self.def
    }

    /// Context of the declaring type.
    pub fn type_context(&self) -> &TypeContext<'a> {
        &self.class
    }

    /// The method's own generics, from their declared bounds.
    pub fn generics_map(&self) -> &GenericsMap {
        &self.generics
    }

    pub fn generic(&self, index: usize) -> Result<&Type> {
        positional(&self.generics, index, &self.describe())
    }

    pub fn generic_by_name(&self, name: &str) -> Result<&Type> {
        named(&self.generics, name, &self.describe())
    }

    pub fn resolve_type(&self, ty: &Type) -> Result<Type> {
        self.class.resolve_in(ty, &self.scope)
    }

    pub fn parameter_types(&self) -> Result<Vec<Type>> {
        self.def
            .params
            .iter()
            .map(|param| self.resolve_type(param))
            .collect()
    }

    pub fn parameter_type(&self, index: usize) -> Result<Type> {
        self.resolve_type(self.param(index)?)
    }

    pub fn return_type(&self) -> Result<Type> {
        self.resolve_type(&self.def.return_type)
    }

    pub fn return_type_context(&self) -> Result<TypeContext<'a>> {
        self.class.inlying_in(&self.def.return_type, &self.scope)
    }

    pub fn return_type_context_as(&self, implementation: ClassId) -> Result<TypeContext<'a>> {
        self.class
            .inlying_as_in(&self.def.return_type, implementation, &self.scope)
    }

    pub fn parameter_context(&self, index: usize) -> Result<TypeContext<'a>> {
        self.class.inlying_in(self.param(index)?, &self.scope)
    }

    fn param(&self, index: usize) -> Result<&'a Type> {
        self.def
            .params
            .get(index)
            .ok_or_else(|| GenericsError::IndexOutOfRange {
                what: "parameter",
                index,
                count: self.def.params.len(),
                owner: self.describe(),
            })
    }

    fn describe(&self) -> String {
        render_declaration(self.class.env(), GenericDeclaration::Method(self.id))
    }
}

/// Generics of a constructor, resolved in the scope of its declaring type.
#[derive(Debug, Clone)]
pub struct ConstructorContext<'a> {
    class: TypeContext<'a>,
    id: ConstructorId,
    def: &'a ConstructorDef,
    generics: GenericsMap,
    scope: GenericsMap,
}

impl<'a> ConstructorContext<'a> {
    pub fn id(&self) -> ConstructorId {
        self.id
    }

    pub fn type_context(&self) -> &TypeContext<'a> {
        &self.class
    }

    pub fn generics_map(&self) -> &GenericsMap {
        &self.generics
    }

    pub fn generic(&self, index: usize) -> Result<&Type> {
        positional(&self.generics, index, &self.describe())
    }

    pub fn resolve_type(&self, ty: &Type) -> Result<Type> {
        self.class.resolve_in(ty, &self.scope)
    }

    pub fn parameter_types(&self) -> Result<Vec<Type>> {
        self.def
            .params
            .iter()
            .map(|param| self.resolve_type(param))
            .collect()
    }

    pub fn parameter_context(&self, index: usize) -> Result<TypeContext<'a>> {
        let param = self
            .def
            .params
            .get(index)
            .ok_or_else(|| GenericsError::IndexOutOfRange {
                what: "parameter",
                index,
                count: self.def.params.len(),
                owner: self.describe(),
            })?;
        self.class.inlying_in(param, &self.scope)
    }

    fn describe(&self) -> String {
        render_declaration(self.class.env(), GenericDeclaration::Constructor(self.id))
    }
}

fn merged(outer: &GenericsMap, own: &GenericsMap) -> GenericsMap {
    let mut scope = outer.clone();
    for (name, ty) in own {
        scope.shift_remove(name);
        scope.insert(name.clone(), ty.clone());
    }
    scope
}

fn positional<'m>(
    generics: &'m GenericsMap,
    index: usize,
    owner: &str,
) -> Result<&'m Type> {
    generics
        .get_index(index)
        .map(|(_, ty)| ty)
        .ok_or_else(|| GenericsError::IndexOutOfRange {
            what: "generic",
            index,
            count: generics.len(),
            owner: owner.to_string(),
        })
}

fn named<'m>(
    generics: &'m GenericsMap,
    name: &str,
    owner: &str,
) -> Result<&'m Type> {
    generics.get(name).ok_or_else(|| GenericsError::UnknownName {
        what: "generic",
        name: name.to_string(),
        available: generics.keys().cloned().collect::<Vec<_>>().join(", "),
        owner: owner.to_string(),
    })
}

fn suggestion(env: &dyn TypeEnv, owner: GenericDeclaration) -> String {
    match owner {
        GenericDeclaration::Class(class) => format!("type_of({})", render_class(env, class)),
        GenericDeclaration::Method(m) => {
            let name = env
                .class(m.class)
                .and_then(|def| def.methods.get(m.index as usize))
                .map_or("?", |method| method.name.as_str());
            format!("type_of({}).method_named({name})", render_class(env, m.class))
        }
        GenericDeclaration::Constructor(c) => {
            format!("type_of({}).constructor({})", render_class(env, c.class), c.index)
        }
    }
}

/// Array types are navigated through their (innermost) component.
fn innermost(ty: &Type) -> Type {
    match ty.component_type() {
        Some(component) => innermost(&component),
        None => match ty {
            Type::Wildcard(w) if w.lower.is_none() && !w.upper.is_empty() => innermost(&w.upper[0]),
            other => other.clone(),
        },
    }
}

fn declared_class(ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Parameterized(p) => Some(p.raw),
        Type::Class(ClassRef::Declared(id)) => Some(*id),
        _ => None,
    }
}
