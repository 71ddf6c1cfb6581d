use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ty::Type;

/// Index of a class or interface inside a [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// Index of a declared type variable inside a [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// A method, addressed by its position in [`ClassDef::methods`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    pub class: ClassId,
    pub index: u32,
}

/// A constructor, addressed by its position in [`ClassDef::constructors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstructorId {
    pub class: ClassId,
    pub index: u32,
}

/// The declaration that introduced a type variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericDeclaration {
    Class(ClassId),
    Method(MethodId),
    Constructor(ConstructorId),
}

impl GenericDeclaration {
    pub fn class(self) -> ClassId {
        match self {
            GenericDeclaration::Class(id) => id,
            GenericDeclaration::Method(m) => m.class,
            GenericDeclaration::Constructor(c) => c.class,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    /// Declared upper bounds. Empty means `Object`.
    pub upper_bounds: Vec<Type>,
    /// Filled in by [`TypeStore::define_class`].
    pub owner: Option<GenericDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDef {
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
}

/// Declared (generic) metadata of a class or interface.
///
/// `super_class` and `interfaces` are the declared supertype expressions, so they may refer to
/// the class's own type variables (and to variables of the enclosing class for inner classes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.Map$Entry`.
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub enclosing: Option<ClassId>,
    /// Only meaningful for member classes.
    pub is_static: bool,
    pub fields: Vec<FieldDef>,
    pub constructors: Vec<ConstructorDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    /// An empty declaration; use struct update syntax to fill in the rest.
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            enclosing: None,
            is_static: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Non-static member classes see the type variables of their enclosing class.
    pub fn is_inner(&self) -> bool {
        self.enclosing.is_some() && !self.is_static
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
}

/// Read-only access to class metadata.
///
/// Every algorithm in this crate takes `&dyn TypeEnv`; [`TypeStore`] is the only implementation
/// shipped here.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

#[derive(Debug, Clone)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    class_by_name: HashMap<String, ClassId>,
    type_params: Vec<TypeParamDef>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        let placeholder = ClassId(0);
        let mut store = Self {
            classes: Vec::new(),
            class_by_name: HashMap::new(),
            type_params: Vec::new(),
            well_known: WellKnownTypes {
                object: placeholder,
                cloneable: placeholder,
                serializable: placeholder,
            },
        };

        let object = store.add_class(ClassDef::new("java.lang.Object", ClassKind::Class));
        let cloneable = store.add_class(ClassDef::new("java.lang.Cloneable", ClassKind::Interface));
        let serializable =
            store.add_class(ClassDef::new("java.io.Serializable", ClassKind::Interface));
        store.well_known = WellKnownTypes {
            object,
            cloneable,
            serializable,
        };
        store
    }
}

impl TypeStore {
    /// Reserve an id for `name` without defining it yet.
    ///
    /// Needed for self-referential declarations (`class Node<T extends Node<T>>`). Interning an
    /// existing name returns the existing id.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.class_by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::new(name, ClassKind::Class));
        self.class_by_name.insert(name.to_string(), id);
        id
    }

    /// Store `def` under `id` and record the owning declaration of every type variable it
    /// declares.
    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        for var in &def.type_params {
            self.set_owner(*var, GenericDeclaration::Class(id));
        }
        for (index, method) in def.methods.iter().enumerate() {
            let owner = GenericDeclaration::Method(MethodId {
                class: id,
                index: index as u32,
            });
            for var in &method.type_params {
                self.set_owner(*var, owner);
            }
        }
        for (index, ctor) in def.constructors.iter().enumerate() {
            let owner = GenericDeclaration::Constructor(ConstructorId {
                class: id,
                index: index as u32,
            });
            for var in &ctor.type_params {
                self.set_owner(*var, owner);
            }
        }

        if def.name != self.classes[id.0 as usize].name {
            self.class_by_name.insert(def.name.clone(), id);
        }
        self.classes[id.0 as usize] = def;
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class_id(&def.name);
        self.define_class(id, def);
        id
    }

    pub fn add_type_param(
        &mut self,
        name: impl Into<String>,
        upper_bounds: Vec<Type>,
    ) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
            owner: None,
        });
        id
    }

    /// Replace a type variable definition, keeping a previously recorded owner when `def` has
    /// none.
    pub fn define_type_param(&mut self, id: TypeVarId, mut def: TypeParamDef) {
        let slot = &mut self.type_params[id.0 as usize];
        if def.owner.is_none() {
            def.owner = slot.owner;
        }
        *slot = def;
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(name).copied()
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    fn set_owner(&mut self, var: TypeVarId, owner: GenericDeclaration) {
        if let Some(def) = self.type_params.get_mut(var.0 as usize) {
            def.owner = Some(owner);
        }
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.class_by_name.get(name) {
            return Some(*id);
        }
        // Implicit `java.lang.*` import.
        if !name.contains('.') {
            return self.class_by_name.get(&format!("java.lang.{name}")).copied();
        }
        None
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
