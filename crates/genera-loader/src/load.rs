use std::collections::{HashMap, HashSet};
use std::path::Path;

use genera_types::{
    ClassDef, ClassId, ClassKind, ConstructorDef, FieldDef, MethodDef, Type, TypeEnv,
    TypeParamDef, TypeStore, TypeVarId,
};

use crate::error::{LoadError, Result};
use crate::model::{ClassModel, ModelFile, TypeParamModel};
use crate::signature::{parse_with_imports, resolve_class_name, TypeVariables};

/// Classes of a model file, loaded on top of the minimal JDK.
#[derive(Debug, Clone)]
pub struct Model {
    store: TypeStore,
    classes: Vec<ClassId>,
    imports: HashMap<String, ClassId>,
}

impl Model {
    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn into_store(self) -> TypeStore {
        self.store
    }

    /// Classes declared by the model file, in file order.
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// Look a class up by binary name, dotted nested name or unambiguous simple name.
    pub fn class(&self, name: &str) -> Result<ClassId> {
        resolve_class_name(&self.store, &self.imports, name.trim()).ok_or_else(|| {
            LoadError::UnknownClass {
                name: name.trim().to_owned(),
                context: "model".to_owned(),
            }
        })
    }

    /// Parse a signature with no type variables in scope.
    pub fn parse_type(&self, text: &str) -> Result<Type> {
        parse_with_imports(
            &self.store,
            &self.imports,
            &TypeVariables::new(),
            text,
            "signature",
        )
    }
}

pub fn load_model(file: &ModelFile) -> Result<Model> {
    Loader::new(TypeStore::with_minimal_jdk()).load(file)
}

pub fn load_model_file(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let file = ModelFile::read(path)?;
    let model = load_model(&file)?;
    tracing::debug!(
        target = "genera.loader",
        path = %path.display(),
        classes = model.classes.len(),
        "loaded class model"
    );
    Ok(model)
}

struct Loader {
    store: TypeStore,
    imports: HashMap<String, ClassId>,
}

impl Loader {
    fn new(store: TypeStore) -> Self {
        Self {
            store,
            imports: HashMap::new(),
        }
    }

    fn load(mut self, file: &ModelFile) -> Result<Model> {
        // First pass: ids, own type variables and kinds, so signatures may refer to any class
        // of the file (including the one being declared) with the right arity.
        let mut seen = HashSet::new();
        let mut ambiguous = HashSet::new();
        let mut classes = Vec::with_capacity(file.classes.len());
        for class in &file.classes {
            if !seen.insert(class.name.as_str()) {
                return Err(LoadError::DuplicateClass(class.name.clone()));
            }
            let type_params = class
                .type_params
                .iter()
                .map(|param| self.store.add_type_param(param.name.clone(), Vec::new()))
                .collect();
            let id = self.store.add_class(ClassDef {
                type_params,
                is_static: class.is_static,
                ..ClassDef::new(class.name.clone(), class.kind)
            });
            for alias in import_aliases(&class.name) {
                if self.imports.insert(alias.clone(), id).is_some() {
                    ambiguous.insert(alias);
                }
            }
            classes.push(id);
        }
        for alias in ambiguous {
            self.imports.remove(&alias);
        }

        for (class, &id) in file.classes.iter().zip(&classes) {
            let enclosing = match class.enclosing.as_deref() {
                Some(name) => Some(self.resolve_class(name, &format!("class {}", class.name))?),
                None => None,
            };
            if let Some(def) = self.store.class_mut(id) {
                def.enclosing = enclosing;
            }
        }

        // Second pass: bounds, supertypes and members.
        for (class, &id) in file.classes.iter().zip(&classes) {
            self.define(class, id)?;
        }

        Ok(Model {
            store: self.store,
            classes,
            imports: self.imports,
        })
    }

    fn define(&mut self, class: &ClassModel, id: ClassId) -> Result<()> {
        let (type_params, enclosing) = match self.store.class(id) {
            Some(def) => (def.type_params.clone(), def.enclosing),
            None => (Vec::new(), None),
        };
        let scope = self.scope_of(id);
        let context = format!("class {}", class.name);
        self.define_bounds(&class.type_params, &type_params, &scope, &context)?;

        let super_class = match &class.extends {
            Some(signature) => Some(self.parse(signature, &scope, &context)?),
            None if class.kind == ClassKind::Class && id != self.store.well_known().object => {
                Some(Type::object(&self.store))
            }
            None => None,
        };
        let interfaces = class
            .implements
            .iter()
            .map(|signature| self.parse(signature, &scope, &context))
            .collect::<Result<Vec<_>>>()?;

        let mut fields = Vec::with_capacity(class.fields.len());
        for field in &class.fields {
            let context = format!("field {}#{}", class.name, field.name);
            fields.push(FieldDef {
                name: field.name.clone(),
                ty: self.parse(&field.ty, &scope, &context)?,
                is_static: field.is_static,
            });
        }

        let mut methods = Vec::with_capacity(class.methods.len());
        for method in &class.methods {
            let context = format!("method {}#{}", class.name, method.name);
            let (vars, scope) = self.declare_variables(&method.type_params, &scope, &context)?;
            let params = method
                .params
                .iter()
                .map(|signature| self.parse(signature, &scope, &context))
                .collect::<Result<Vec<_>>>()?;
            methods.push(MethodDef {
                name: method.name.clone(),
                type_params: vars,
                params,
                return_type: self.parse(&method.returns, &scope, &context)?,
                is_static: method.is_static,
            });
        }

        let mut constructors = Vec::with_capacity(class.constructors.len());
        for (index, ctor) in class.constructors.iter().enumerate() {
            let context = format!("constructor {}#new[{index}]", class.name);
            let (vars, scope) = self.declare_variables(&ctor.type_params, &scope, &context)?;
            let params = ctor
                .params
                .iter()
                .map(|signature| self.parse(signature, &scope, &context))
                .collect::<Result<Vec<_>>>()?;
            constructors.push(ConstructorDef {
                type_params: vars,
                params,
            });
        }

        self.store.define_class(
            id,
            ClassDef {
                name: class.name.clone(),
                kind: class.kind,
                type_params,
                super_class,
                interfaces,
                enclosing,
                is_static: class.is_static,
                fields,
                constructors,
                methods,
            },
        );
        Ok(())
    }

    /// Allocate method or constructor variables; their bounds see each other and the class
    /// scope.
    fn declare_variables(
        &mut self,
        params: &[TypeParamModel],
        outer: &TypeVariables,
        context: &str,
    ) -> Result<(Vec<TypeVarId>, TypeVariables)> {
        let vars: Vec<TypeVarId> = params
            .iter()
            .map(|param| self.store.add_type_param(param.name.clone(), Vec::new()))
            .collect();
        let scope = outer.extended(
            params
                .iter()
                .zip(&vars)
                .map(|(param, var)| (param.name.clone(), *var)),
        );
        self.define_bounds(params, &vars, &scope, context)?;
        Ok((vars, scope))
    }

    fn define_bounds(
        &mut self,
        params: &[TypeParamModel],
        vars: &[TypeVarId],
        scope: &TypeVariables,
        context: &str,
    ) -> Result<()> {
        for (param, &var) in params.iter().zip(vars) {
            let upper_bounds = param
                .bounds
                .iter()
                .map(|signature| self.parse(signature, scope, context))
                .collect::<Result<Vec<_>>>()?;
            self.store.define_type_param(
                var,
                TypeParamDef {
                    name: param.name.clone(),
                    upper_bounds,
                    owner: None,
                },
            );
        }
        Ok(())
    }

    /// Variables visible inside `id`: those of enclosing classes it captures, then its own.
    fn scope_of(&self, id: ClassId) -> TypeVariables {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(def) = self.store.class(current) {
            let Some(outer) = def.enclosing.filter(|_| def.is_inner()) else {
                break;
            };
            if chain.contains(&outer) {
                break;
            }
            chain.push(outer);
            current = outer;
        }

        let mut scope = TypeVariables::new();
        for class in chain.into_iter().rev() {
            let Some(def) = self.store.class(class) else {
                continue;
            };
            for &var in &def.type_params {
                if let Some(param) = self.store.type_param(var) {
                    scope.push(param.name.clone(), var);
                }
            }
        }
        scope
    }

    fn parse(&self, signature: &str, scope: &TypeVariables, context: &str) -> Result<Type> {
        parse_with_imports(&self.store, &self.imports, scope, signature, context)
    }

    fn resolve_class(&self, name: &str, context: &str) -> Result<ClassId> {
        resolve_class_name(&self.store, &self.imports, name).ok_or_else(|| {
            LoadError::UnknownClass {
                name: name.to_owned(),
                context: context.to_owned(),
            }
        })
    }
}

/// Short names a model class can be referred to by: `Outer$Inner` and `Outer.Inner` for
/// `com.example.Outer$Inner`.
fn import_aliases(name: &str) -> Vec<String> {
    let simple = name.rsplit('.').next().unwrap_or(name);
    if simple == name {
        return Vec::new();
    }
    let mut aliases = vec![simple.to_owned()];
    if simple.contains('$') {
        aliases.push(simple.replace('$', "."));
    }
    aliases
}
