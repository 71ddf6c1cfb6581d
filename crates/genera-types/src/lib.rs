//! Generic type resolution for Java class hierarchies.
//!
//! Given declared class metadata (a [`TypeEnv`]), this crate computes the actual binding of
//! every type variable across a class's full hierarchy, and offers the type algebra built on
//! top of that: substitution, compatibility and specificity checks, common supertypes and
//! inference of a root type's generics from a known supertype binding.
//!
//! The usual entry point is [`GenericsResolver`], which caches raw hierarchies and hands out
//! [`TypeContext`]s for navigation.

mod cache;
mod class;
mod common;
mod context;
mod error;
mod format;
mod hierarchy;
mod minimal_jdk;
mod store;
mod subst;
mod tracking;
mod ty;
mod visitors;
mod walker;

pub use cache::{CachePolicy, HierarchyCache};
pub use class::{
    array_class, box_class, box_type, direct_supertypes, is_subclass, ClassRef, PrimitiveType,
};
pub use common::common_type;
pub use context::{ConstructorContext, GenericsResolver, MethodContext, TypeContext};
pub use error::{GenericsError, Result};
pub use format::{
    render_class, render_declaration, render_generics, render_hierarchy, render_type, simple_name,
    type_sort_key, TypeDisplay,
};
pub use hierarchy::{resolve_hierarchy, resolve_raw_hierarchy, ResolvedHierarchy};
pub use store::{
    ClassDef, ClassId, ClassKind, ConstructorDef, ConstructorId, FieldDef, GenericDeclaration,
    MethodDef, MethodId, TypeEnv, TypeParamDef, TypeStore, TypeVarId, WellKnownTypes,
};
pub use subst::{
    erase_to_object, extract_owner_generics, extract_type_generics, placeholder_for,
    preserve_variables, resolve_all_type_variables, resolve_class, resolve_generics,
    resolve_raw_generics, resolve_raw_owner_generics, resolve_type_arguments,
    resolve_type_variables, resolve_type_variables_lenient, resolve_upper_bounds,
    resolve_with_bounds,
};
pub use tracking::track_root_generics;
pub use ty::{ExplicitVariable, GenericsMap, KnownGenerics, ParameterizedType, Type, WildcardType};
pub use visitors::{
    get_more_specific_type, is_assignable, is_compatible, is_more_specific, match_variables,
};
pub use walker::{walk, TypesVisitor};
