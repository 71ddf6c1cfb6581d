use genera_types::{
    ClassDef, ClassId, ClassKind, ConstructorDef, FieldDef, GenericsError, GenericsMap,
    GenericsResolver, MethodDef, Type, TypeEnv, TypeParamDef, TypeStore, TypeVarId,
};
use pretty_assertions::assert_eq;

use super::{class, generic, object, ty, var};

struct Fixture {
    env: TypeStore,
    base: ClassId,
    root: ClassId,
}

/// ```java
/// class Base<T> {
///     List<T> items;
///     <K extends T> K convert(T value, List<K> into);
///     <C extends Comparable<C>> Base(C seed);
/// }
/// class Root extends Base<Integer> {
///     String name;
/// }
/// ```
fn fixture() -> Fixture {
    let mut env = TypeStore::with_minimal_jdk();
    let list = class(&env, "java.util.List");
    let comparable = class(&env, "java.lang.Comparable");
    let integer = ty(&env, "java.lang.Integer");
    let string = ty(&env, "java.lang.String");

    let t = env.add_type_param("T", vec![]);
    let k = env.add_type_param("K", vec![var(t)]);
    let c = env.add_type_param("C", vec![]);
    let base = env.add_class(ClassDef {
        type_params: vec![t],
        super_class: Some(object(&env)),
        fields: vec![FieldDef {
            name: "items".into(),
            ty: Type::parameterized(list, vec![var(t)]),
            is_static: false,
        }],
        methods: vec![MethodDef {
            name: "convert".into(),
            type_params: vec![k],
            params: vec![var(t), Type::parameterized(list, vec![var(k)])],
            return_type: var(k),
            is_static: false,
        }],
        constructors: vec![ConstructorDef {
            type_params: vec![c],
            params: vec![var(c)],
        }],
        ..ClassDef::new("com.example.Base", ClassKind::Class)
    });
    env.define_type_param(
        c,
        TypeParamDef {
            name: "C".into(),
            upper_bounds: vec![Type::parameterized(comparable, vec![var(c)])],
            owner: None,
        },
    );
    let root = env.add_class(ClassDef {
        super_class: Some(Type::parameterized(base, vec![integer])),
        fields: vec![FieldDef {
            name: "name".into(),
            ty: string,
            is_static: false,
        }],
        ..ClassDef::new("com.example.Root", ClassKind::Class)
    });

    Fixture { env, base, root }
}

#[test]
fn field_types_resolve_in_declaring_class() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let ctx = resolver.resolve(f.root).unwrap();

    assert_eq!(ctx.field_type("name").unwrap(), ty(&f.env, "java.lang.String"));
    assert_eq!(
        ctx.field_type("items").unwrap(),
        generic(&f.env, "java.util.List", vec![ty(&f.env, "java.lang.Integer")])
    );
    assert!(matches!(
        ctx.field_type("missing").unwrap_err(),
        GenericsError::UnknownName { what: "field", .. }
    ));
}

#[test]
fn navigation_between_hierarchy_types() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let root = resolver.resolve(f.root).unwrap();
    assert!(root.generics().is_empty());

    let base = root.type_of(f.base).unwrap();
    assert_eq!(base.current_class(), f.base);
    assert_eq!(base.root_class(), f.root);
    assert_eq!(base.generic(0).unwrap(), &ty(&f.env, "java.lang.Integer"));
    assert_eq!(base.generic_by_name("T").unwrap(), &ty(&f.env, "java.lang.Integer"));
    assert!(matches!(
        base.generic(1).unwrap_err(),
        GenericsError::IndexOutOfRange { index: 1, count: 1, .. }
    ));

    let string = class(&f.env, "java.lang.String");
    assert!(matches!(
        root.type_of(string).unwrap_err(),
        GenericsError::TypeNotInHierarchy { .. }
    ));
    assert!(base.render().contains("Base<Integer>  <-- current"));
}

#[test]
fn missing_type_error_marks_the_current_type() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let base = resolver.resolve(f.root).unwrap().type_of(f.base).unwrap();

    match base.type_of(class(&f.env, "java.lang.String")).unwrap_err() {
        GenericsError::TypeNotInHierarchy {
            requested,
            hierarchy,
            ..
        } => {
            assert_eq!(requested, "String");
            assert!(hierarchy.contains("Base<Integer>  <-- current"), "{hierarchy}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn variables_from_another_declaration_report_wrong_context() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let root = resolver.resolve(f.root).unwrap();
    let t = f.class_param(f.base, 0);

    let err = root.resolve_type(&var(t)).unwrap_err();
    match err {
        GenericsError::WrongContext {
            name,
            declared_by,
            suggestion,
            hierarchy,
        } => {
            assert_eq!(name, "T");
            assert_eq!(declared_by, "class Base");
            assert_eq!(suggestion, "type_of(Base)");
            assert!(hierarchy.contains("Root  <-- current"), "{hierarchy}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let base = root.type_of(f.base).unwrap();
    let method = base.method_named("convert").unwrap();
    let k = method.def().type_params[0];
    match base.resolve_type(&var(k)).unwrap_err() {
        GenericsError::WrongContext { suggestion, .. } => {
            assert_eq!(suggestion, "type_of(Base).method_named(convert)")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn method_generics_use_class_scope() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let base = resolver.resolve(f.root).unwrap().type_of(f.base).unwrap();
    let integer = ty(&f.env, "java.lang.Integer");

    let method = base.method_named("convert").unwrap();
    assert_eq!(
        method.generics_map(),
        &GenericsMap::from([("K".to_string(), integer.clone())])
    );
    assert_eq!(method.return_type().unwrap(), integer);
    assert_eq!(
        method.parameter_types().unwrap(),
        vec![integer.clone(), generic(&f.env, "java.util.List", vec![integer.clone()])]
    );
    assert!(matches!(
        method.parameter_type(2).unwrap_err(),
        GenericsError::IndexOutOfRange { what: "parameter", .. }
    ));

    let list_ctx = method.parameter_context(1).unwrap();
    assert_eq!(list_ctx.current_class(), class(&f.env, "java.util.List"));
    assert_eq!(list_ctx.generic(0).unwrap(), &integer);
    assert_eq!(list_ctx.parent().map(|p| p.current_class()), Some(f.base));
}

#[test]
fn constructor_generics_are_self_bounded() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let base = resolver.resolve(f.base).unwrap();

    let ctor = base.constructor(0).unwrap();
    let comparable = class(&f.env, "java.lang.Comparable");
    assert_eq!(
        ctor.generic(0).unwrap(),
        &Type::parameterized(comparable, vec![object(&f.env)])
    );
    assert!(matches!(
        base.constructor(1).unwrap_err(),
        GenericsError::IndexOutOfRange { what: "constructor", .. }
    ));
}

#[test]
fn inlying_types_carry_resolved_generics() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let base = resolver.resolve(f.root).unwrap().type_of(f.base).unwrap();
    let integer = ty(&f.env, "java.lang.Integer");
    let items = f.field_type(f.base, "items");

    let list_ctx = base.inlying_type(&items).unwrap();
    let collection = class(&f.env, "java.util.Collection");
    assert_eq!(list_ctx.type_of(collection).unwrap().generic(0).unwrap(), &integer);

    let array_list = class(&f.env, "java.util.ArrayList");
    let impl_ctx = base.inlying_type_as(&items, array_list).unwrap();
    assert_eq!(impl_ctx.current_class(), array_list);
    assert_eq!(impl_ctx.generic(0).unwrap(), &integer);
    let abstract_list = class(&f.env, "java.util.AbstractList");
    assert_eq!(impl_ctx.type_of(abstract_list).unwrap().generic(0).unwrap(), &integer);

    let hash_map = class(&f.env, "java.util.HashMap");
    assert!(matches!(
        base.inlying_type_as(&items, hash_map).unwrap_err(),
        GenericsError::TypeNotInHierarchy { .. }
    ));
}

#[test]
fn explicit_root_generics_and_ignored_types() {
    let f = fixture();
    let resolver = GenericsResolver::new(&f.env);
    let string = ty(&f.env, "java.lang.String");

    let base = resolver
        .resolve_with_generics(f.base, &GenericsMap::from([("T".to_string(), string.clone())]))
        .unwrap();
    assert_eq!(
        base.field_type("items").unwrap(),
        generic(&f.env, "java.util.List", vec![string])
    );

    let pruned = resolver.resolve_ignoring(f.root, &[f.base]).unwrap();
    assert!(!pruned.hierarchy().contains(f.base));
    assert!(pruned.type_of(f.base).is_err());
    assert_eq!(pruned.hierarchy().ignored(), &[f.base]);
}

impl Fixture {
    fn class_param(&self, class: ClassId, index: usize) -> TypeVarId {
        self.env.class(class).unwrap().type_params[index]
    }

    fn field_type(&self, class: ClassId, name: &str) -> Type {
        self.env
            .class(class)
            .unwrap()
            .fields
            .iter()
            .find(|f| f.name == name)
            .unwrap()
            .ty
            .clone()
    }
}
