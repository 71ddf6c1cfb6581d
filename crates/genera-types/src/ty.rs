use std::collections::HashSet;

use indexmap::IndexMap;

use crate::class::{ClassRef, PrimitiveType};
use crate::store::{ClassId, GenericDeclaration, TypeEnv, TypeVarId};

/// Resolved generics of one declaration, in declaration order.
pub type GenericsMap = IndexMap<String, Type>;

/// Externally supplied bindings for types in the middle of a hierarchy.
pub type KnownGenerics = IndexMap<ClassId, GenericsMap>;

/// A (possibly generic) type expression.
///
/// `Variable` refers to a declared type parameter and is substituted through a [`GenericsMap`]
/// by name. `Placeholder` keeps a variable's identity through hierarchy resolution; it is only
/// produced by tracking and matching and never appears in a hierarchy resolved for ordinary
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Class(ClassRef),
    Parameterized(ParameterizedType),
    GenericArray(Box<Type>),
    Wildcard(WildcardType),
    Variable(TypeVarId),
    Placeholder(ExplicitVariable),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    pub raw: ClassId,
    pub args: Vec<Type>,
    /// Enclosing type for inner classes (`Outer<String>.Inner<Integer>`).
    pub owner: Option<Box<Type>>,
}

/// A wildcard, also used to carry the bounds of a multi-bound variable (`T extends A & B`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    /// Upper bounds. An empty list means `Object`.
    pub upper: Vec<Type>,
    pub lower: Option<Box<Type>>,
}

impl WildcardType {
    pub fn unbounded(object: ClassId) -> Self {
        Self {
            upper: vec![Type::class(object)],
            lower: None,
        }
    }

    pub fn extends(bounds: Vec<Type>) -> Self {
        Self {
            upper: bounds,
            lower: None,
        }
    }

    pub fn super_of(lower: Type, object: ClassId) -> Self {
        Self {
            upper: vec![Type::class(object)],
            lower: Some(Box::new(lower)),
        }
    }

    pub fn is_lower_bounded(&self) -> bool {
        self.lower.is_some()
    }

    /// Upper bounds with the implicit `Object` made explicit.
    pub fn upper_bounds(&self, env: &dyn TypeEnv) -> Vec<Type> {
        if self.upper.is_empty() {
            vec![Type::class(env.well_known().object)]
        } else {
            self.upper.clone()
        }
    }
}

/// Identity-preserving stand-in for a type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplicitVariable {
    pub name: String,
    pub declaration: Option<GenericDeclaration>,
    pub bounds: Vec<Type>,
}

impl Type {
    pub fn class(id: ClassId) -> Type {
        Type::Class(ClassRef::Declared(id))
    }

    pub fn primitive(p: PrimitiveType) -> Type {
        Type::Class(ClassRef::Primitive(p))
    }

    pub fn object(env: &dyn TypeEnv) -> Type {
        Type::class(env.well_known().object)
    }

    pub fn parameterized(raw: ClassId, args: Vec<Type>) -> Type {
        Type::Parameterized(ParameterizedType {
            raw,
            args,
            owner: None,
        })
    }

    pub fn parameterized_with_owner(owner: Type, raw: ClassId, args: Vec<Type>) -> Type {
        Type::Parameterized(ParameterizedType {
            raw,
            args,
            owner: Some(Box::new(owner)),
        })
    }

    /// Array of `component`. Arrays of plain classes collapse into an array class token.
    pub fn array(component: Type) -> Type {
        match component {
            Type::Class(class) => Type::Class(ClassRef::array_of(class)),
            other => Type::GenericArray(Box::new(other)),
        }
    }

    pub fn wildcard_extends(bounds: Vec<Type>) -> Type {
        Type::Wildcard(WildcardType::extends(bounds))
    }

    pub fn wildcard_super(lower: Type, object: ClassId) -> Type {
        Type::Wildcard(WildcardType::super_of(lower, object))
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_object(&self, env: &dyn TypeEnv) -> bool {
        matches!(self, Type::Class(class) if class.is_object(env))
    }

    /// True for `GenericArray` and array class tokens.
    pub fn is_array(&self) -> bool {
        match self {
            Type::Class(class) => class.is_array(),
            Type::GenericArray(_) => true,
            _ => false,
        }
    }

    /// Component of an array type (either form), if this is one.
    pub fn component_type(&self) -> Option<Type> {
        match self {
            Type::Class(ClassRef::Array(component)) => Some(Type::Class((**component).clone())),
            Type::GenericArray(component) => Some((**component).clone()),
            _ => None,
        }
    }

    /// Whether any declared variable or placeholder occurs in this type.
    pub fn has_variables(&self) -> bool {
        self.any(&|ty| matches!(ty, Type::Variable(_) | Type::Placeholder(_)))
    }

    pub fn has_placeholders(&self) -> bool {
        self.any(&|ty| matches!(ty, Type::Placeholder(_)))
    }

    pub fn has_declared_variables(&self) -> bool {
        self.any(&|ty| matches!(ty, Type::Variable(_)))
    }

    /// Declared variables occurring in this type, in order of first appearance.
    pub fn variables(&self) -> Vec<TypeVarId> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<TypeVarId>) {
        match self {
            Type::Class(_) => {}
            Type::Variable(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            Type::Parameterized(p) => {
                if let Some(owner) = p.owner.as_deref() {
                    owner.collect_variables(out);
                }
                for arg in &p.args {
                    arg.collect_variables(out);
                }
            }
            Type::GenericArray(component) => component.collect_variables(out),
            Type::Wildcard(w) => {
                for upper in &w.upper {
                    upper.collect_variables(out);
                }
                if let Some(lower) = w.lower.as_deref() {
                    lower.collect_variables(out);
                }
            }
            Type::Placeholder(var) => {
                for bound in &var.bounds {
                    bound.collect_variables(out);
                }
            }
        }
    }

    fn any(&self, pred: &dyn Fn(&Type) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Type::Class(_) | Type::Variable(_) => false,
            Type::Parameterized(p) => {
                p.args.iter().any(|a| a.any(pred))
                    || p.owner.as_deref().is_some_and(|o| o.any(pred))
            }
            Type::GenericArray(component) => component.any(pred),
            Type::Wildcard(w) => {
                w.upper.iter().any(|u| u.any(pred))
                    || w.lower.as_deref().is_some_and(|l| l.any(pred))
            }
            Type::Placeholder(var) => var.bounds.iter().any(|b| b.any(pred)),
        }
    }

    /// Erasure of this type. Variables and placeholders erase to their first bound.
    ///
    /// Never fails: missing classes and unbounded variables erase to `Object`.
    pub fn erased_class(&self, env: &dyn TypeEnv) -> ClassRef {
        self.erase_guarded(env, &mut HashSet::new())
    }

    fn erase_guarded(&self, env: &dyn TypeEnv, seen: &mut HashSet<TypeVarId>) -> ClassRef {
        let object = ClassRef::Declared(env.well_known().object);
        match self {
            Type::Class(class) => class.clone(),
            Type::Parameterized(p) => ClassRef::Declared(p.raw),
            Type::GenericArray(component) => {
                ClassRef::array_of(component.erase_guarded(env, seen))
            }
            Type::Wildcard(w) => w
                .upper
                .first()
                .map(|u| u.erase_guarded(env, seen))
                .unwrap_or(object),
            Type::Variable(id) => {
                if !seen.insert(*id) {
                    return object;
                }
                env.type_param(*id)
                    .and_then(|def| def.upper_bounds.first())
                    .map(|b| b.erase_guarded(env, seen))
                    .unwrap_or(object)
            }
            Type::Placeholder(var) => var
                .bounds
                .first()
                .map(|b| b.erase_guarded(env, seen))
                .unwrap_or(object),
        }
    }
}

impl From<ClassRef> for Type {
    fn from(class: ClassRef) -> Self {
        Type::Class(class)
    }
}
