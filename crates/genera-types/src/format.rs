use std::collections::HashSet;
use std::fmt::{self, Write as _};

use crate::class::ClassRef;
use crate::hierarchy::ResolvedHierarchy;
use crate::store::{ClassId, GenericDeclaration, TypeEnv};
use crate::ty::{GenericsMap, Type};

/// Java-like rendering of a type expression (`List<? extends Number>[]`).
///
/// Simple names are used unless [`TypeDisplay::qualified`] is requested.
pub struct TypeDisplay<'a> {
    env: &'a dyn TypeEnv,
    ty: &'a Type,
    qualified: bool,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(env: &'a dyn TypeEnv, ty: &'a Type) -> Self {
        Self {
            env,
            ty,
            qualified: false,
        }
    }

    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    fn write_type(&self, f: &mut fmt::Formatter<'_>, ty: &Type) -> fmt::Result {
        match ty {
            Type::Class(class) => self.write_class(f, class),
            Type::Parameterized(p) => {
                match p.owner.as_deref() {
                    Some(owner) => {
                        self.write_type(f, owner)?;
                        f.write_str(".")?;
                        f.write_str(inner_name(&class_name(self.env, p.raw)))?;
                    }
                    None => self.write_declared(f, p.raw)?,
                }
                if !p.args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in p.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        self.write_type(f, arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::GenericArray(component) => {
                self.write_type(f, component)?;
                f.write_str("[]")
            }
            Type::Wildcard(w) => {
                if let Some(lower) = w.lower.as_deref() {
                    f.write_str("? super ")?;
                    return self.write_type(f, lower);
                }
                let bounds: Vec<&Type> =
                    w.upper.iter().filter(|u| !u.is_object(self.env)).collect();
                if bounds.is_empty() {
                    return f.write_str("?");
                }
                f.write_str("? extends ")?;
                for (i, bound) in bounds.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    self.write_type(f, bound)?;
                }
                Ok(())
            }
            Type::Variable(id) => match self.env.type_param(*id) {
                Some(def) => f.write_str(&def.name),
                None => write!(f, "<unknown variable #{}>", id.to_raw()),
            },
            Type::Placeholder(var) => f.write_str(&var.name),
        }
    }

    fn write_class(&self, f: &mut fmt::Formatter<'_>, class: &ClassRef) -> fmt::Result {
        match class {
            ClassRef::Primitive(p) => f.write_str(p.keyword()),
            ClassRef::Declared(id) => self.write_declared(f, *id),
            ClassRef::Array(component) => {
                self.write_class(f, component)?;
                f.write_str("[]")
            }
        }
    }

    fn write_declared(&self, f: &mut fmt::Formatter<'_>, id: ClassId) -> fmt::Result {
        let name = class_name(self.env, id);
        if self.qualified {
            f.write_str(&name)
        } else {
            f.write_str(&simple_name(&name))
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_type(f, self.ty)
    }
}

fn class_name(env: &dyn TypeEnv, id: ClassId) -> String {
    env.class(id)
        .map(|def| def.name.clone())
        .unwrap_or_else(|| format!("<unknown class #{}>", id.to_raw()))
}

/// `java.util.Map$Entry` → `Map.Entry`.
pub fn simple_name(binary_name: &str) -> String {
    let last = binary_name.rsplit('.').next().unwrap_or(binary_name);
    last.replace('$', ".")
}

fn inner_name(binary_name: &str) -> &str {
    binary_name
        .rsplit(&['.', '$'][..])
        .next()
        .unwrap_or(binary_name)
}

pub fn render_type(env: &dyn TypeEnv, ty: &Type) -> String {
    TypeDisplay::new(env, ty).to_string()
}

pub fn render_class(env: &dyn TypeEnv, id: ClassId) -> String {
    simple_name(&class_name(env, id))
}

/// `[T=Integer, K=String]`.
pub fn render_generics(env: &dyn TypeEnv, generics: &GenericsMap) -> String {
    let mut out = String::from("[");
    for (i, (name, ty)) in generics.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{name}={}", TypeDisplay::new(env, ty));
    }
    out.push(']');
    out
}

/// `class Base`, `method Base#get` or `constructor Base#new[0]`.
pub fn render_declaration(env: &dyn TypeEnv, declaration: GenericDeclaration) -> String {
    match declaration {
        GenericDeclaration::Class(id) => format!("class {}", render_class(env, id)),
        GenericDeclaration::Method(m) => {
            let name = env
                .class(m.class)
                .and_then(|def| def.methods.get(m.index as usize))
                .map(|method| method.name.clone())
                .unwrap_or_else(|| format!("#{}", m.index));
            format!("method {}#{name}", render_class(env, m.class))
        }
        GenericDeclaration::Constructor(c) => {
            format!("constructor {}#new[{}]", render_class(env, c.class), c.index)
        }
    }
}

/// Deterministic ordering key: fully qualified rendering.
pub fn type_sort_key(env: &dyn TypeEnv, ty: &Type) -> String {
    TypeDisplay::new(env, ty).qualified().to_string()
}

/// Class of a hierarchy entry rendered with its resolved arguments (`Base<Integer>`).
fn render_node(env: &dyn TypeEnv, id: ClassId, generics: Option<&GenericsMap>) -> String {
    let mut out = render_class(env, id);
    if let Some(generics) = generics.filter(|g| !g.is_empty()) {
        out.push('<');
        for (i, ty) in generics.values().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", TypeDisplay::new(env, ty));
        }
        out.push('>');
    }
    out
}

/// Tree view of a resolved hierarchy, marking `current` with `<-- current`.
///
/// ```text
/// Root
///   extends Base<Integer>
///     implements Comparable<Integer>  <-- current
/// ```
///
/// A type reachable along several paths is expanded once; later occurrences are printed as
/// `(see above)`.
pub fn render_hierarchy(
    env: &dyn TypeEnv,
    hierarchy: &ResolvedHierarchy,
    current: Option<ClassId>,
) -> String {
    let mut out = String::new();
    let mut rendered = HashSet::new();
    render_subtree(env, hierarchy, hierarchy.root(), current, 0, None, &mut rendered, &mut out);
    out
}

#[allow(clippy::too_many_arguments)]
fn render_subtree(
    env: &dyn TypeEnv,
    hierarchy: &ResolvedHierarchy,
    id: ClassId,
    current: Option<ClassId>,
    depth: usize,
    edge: Option<&str>,
    rendered: &mut HashSet<ClassId>,
    out: &mut String,
) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if let Some(edge) = edge {
        out.push_str(edge);
        out.push(' ');
    }
    out.push_str(&render_node(env, id, hierarchy.binding(id)));
    if current == Some(id) {
        out.push_str("  <-- current");
    }
    let first = rendered.insert(id);
    if !first {
        out.push_str("  (see above)");
    }
    out.push('\n');
    if !first {
        return;
    }
    if let Some(def) = env.class(id) {
        let object = env.well_known().object;
        let superclass = def
            .super_class
            .as_ref()
            .and_then(|ty| ty.erased_class(env).declared())
            .filter(|sup| *sup != object && hierarchy.contains(*sup));
        if let Some(sup) = superclass {
            render_subtree(env, hierarchy, sup, current, depth + 1, Some("extends"), rendered, out);
        }
        for iface in &def.interfaces {
            let Some(iface) = iface.erased_class(env).declared() else {
                continue;
            };
            if hierarchy.contains(iface) {
                render_subtree(
                    env,
                    hierarchy,
                    iface,
                    current,
                    depth + 1,
                    Some("implements"),
                    rendered,
                    out,
                );
            }
        }
    }
}
