use std::collections::{HashSet, VecDeque};

use crate::store::{ClassId, TypeEnv};
use crate::ty::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Void,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Void => "void",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    /// JVM descriptor character (`I` for `int`, ...).
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Char => 'C',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
            PrimitiveType::Void => 'V',
        }
    }

    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
            PrimitiveType::Void => "java.lang.Void",
        }
    }
}

/// A raw (erased) class token: what remains of a type once all generic information is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassRef {
    Primitive(PrimitiveType),
    Declared(ClassId),
    Array(Box<ClassRef>),
}

impl ClassRef {
    pub fn array_of(component: ClassRef) -> ClassRef {
        ClassRef::Array(Box::new(component))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ClassRef::Array(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ClassRef::Primitive(_))
    }

    pub fn component(&self) -> Option<&ClassRef> {
        match self {
            ClassRef::Array(component) => Some(component),
            _ => None,
        }
    }

    pub fn declared(&self) -> Option<ClassId> {
        match self {
            ClassRef::Declared(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_object(&self, env: &dyn TypeEnv) -> bool {
        *self == ClassRef::Declared(env.well_known().object)
    }

    pub fn is_interface(&self, env: &dyn TypeEnv) -> bool {
        match self {
            ClassRef::Declared(id) => env.class(*id).is_some_and(|def| def.is_interface()),
            _ => false,
        }
    }

    /// Name as reported by the JVM: `java.lang.String`, `int`, `[I`, `[Ljava.lang.String;`.
    pub fn binary_name(&self, env: &dyn TypeEnv) -> String {
        match self {
            ClassRef::Primitive(p) => p.keyword().to_string(),
            ClassRef::Declared(id) => declared_name(env, *id),
            ClassRef::Array(_) => {
                let mut out = String::new();
                write_descriptor(env, self, &mut out);
                out
            }
        }
    }
}

fn declared_name(env: &dyn TypeEnv, id: ClassId) -> String {
    env.class(id)
        .map(|def| def.name.clone())
        .unwrap_or_else(|| format!("<unknown class #{}>", id.to_raw()))
}

fn write_descriptor(env: &dyn TypeEnv, class: &ClassRef, out: &mut String) {
    match class {
        ClassRef::Primitive(p) => out.push(p.descriptor()),
        ClassRef::Declared(id) => {
            out.push('L');
            out.push_str(&declared_name(env, *id));
            out.push(';');
        }
        ClassRef::Array(component) => {
            out.push('[');
            write_descriptor(env, component, out);
        }
    }
}

/// Declared direct supertypes of `id`: superclass first, then interfaces in declaration order.
pub fn direct_supertypes(env: &dyn TypeEnv, id: ClassId) -> Vec<ClassId> {
    let Some(def) = env.class(id) else {
        return Vec::new();
    };
    def.super_class
        .iter()
        .chain(def.interfaces.iter())
        .filter_map(|ty| match ty.erased_class(env) {
            ClassRef::Declared(id) => Some(id),
            _ => None,
        })
        .collect()
}

fn is_declared_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup || sup == env.well_known().object {
        return true;
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([sub]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        for next in direct_supertypes(env, current) {
            if next == sup {
                return true;
            }
            queue.push_back(next);
        }
    }
    false
}

/// Raw assignability between class tokens (`sup.isAssignableFrom(sub)`).
pub fn is_subclass(env: &dyn TypeEnv, sub: &ClassRef, sup: &ClassRef) -> bool {
    if sub == sup {
        return true;
    }
    match (sub, sup) {
        (ClassRef::Primitive(_), _) | (_, ClassRef::Primitive(_)) => false,
        (ClassRef::Array(a), ClassRef::Array(b)) => {
            !a.is_primitive() && !b.is_primitive() && is_subclass(env, a, b)
        }
        (ClassRef::Array(_), ClassRef::Declared(id)) => {
            let wk = env.well_known();
            *id == wk.object || *id == wk.cloneable || *id == wk.serializable
        }
        (ClassRef::Declared(_), ClassRef::Array(_)) => false,
        (ClassRef::Declared(a), ClassRef::Declared(b)) => is_declared_subclass(env, *a, *b),
    }
}

/// Primitive to wrapper class; anything else is returned unchanged.
///
/// Falls back to the primitive itself when the wrapper class is not known to `env`.
pub fn box_class(env: &dyn TypeEnv, class: &ClassRef) -> ClassRef {
    match class {
        ClassRef::Primitive(p) => env
            .lookup_class(p.wrapper_name())
            .map(ClassRef::Declared)
            .unwrap_or_else(|| class.clone()),
        _ => class.clone(),
    }
}

/// Boxes a primitive type expression. Primitive arrays are left alone.
pub fn box_type(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Class(class @ ClassRef::Primitive(_)) => Type::Class(box_class(env, class)),
        _ => ty.clone(),
    }
}

/// Array class with the given component (`int` → `[I`).
pub fn array_class(component: &ClassRef) -> ClassRef {
    ClassRef::array_of(component.clone())
}
