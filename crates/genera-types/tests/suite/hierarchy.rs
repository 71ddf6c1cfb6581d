use genera_types::{
    render_hierarchy, resolve_hierarchy, resolve_raw_hierarchy, ClassDef, ClassKind,
    GenericsError, GenericsMap, KnownGenerics, Type, TypeEnv, TypeStore,
};
use pretty_assertions::assert_eq;

use super::{class, declare, generic, object, ty, var};

#[test]
fn subclass_binds_superclass_generics() {
    let mut env = TypeStore::with_minimal_jdk();
    let integer = ty(&env, "java.lang.Integer");
    let (base, _) = declare(
        &mut env,
        "com.example.Base",
        ClassKind::Class,
        &["T"],
        |_| (None, vec![]),
    );
    let (child, _) = declare(&mut env, "com.example.Child", ClassKind::Class, &[], |_| {
        (Some(Type::parameterized(base, vec![integer.clone()])), vec![])
    });

    let hierarchy = resolve_raw_hierarchy(&env, child, &[]).unwrap();
    assert_eq!(
        hierarchy.binding(base),
        Some(&GenericsMap::from([("T".to_string(), integer)]))
    );
    assert_eq!(hierarchy.classes().next(), Some(child));
    assert_eq!(hierarchy.classes().last(), Some(env.well_known().object));
}

#[test]
fn raw_root_resolves_from_upper_bounds() {
    let mut env = TypeStore::with_minimal_jdk();
    let number = ty(&env, "java.lang.Number");
    let (base, _) = declare(
        &mut env,
        "com.example.Base",
        ClassKind::Class,
        &["T"],
        |_| (None, vec![]),
    );
    let t = env.add_type_param("T", vec![number.clone()]);
    let root = env.add_class(ClassDef {
        type_params: vec![t],
        super_class: Some(Type::parameterized(base, vec![var(t)])),
        ..ClassDef::new("com.example.Root", ClassKind::Class)
    });

    let raw = resolve_raw_hierarchy(&env, root, &[]).unwrap();
    assert_eq!(raw.binding(root).unwrap()["T"], number);
    assert_eq!(raw.binding(base).unwrap()["T"], number);

    let integer = ty(&env, "java.lang.Integer");
    let bound = resolve_hierarchy(
        &env,
        root,
        &GenericsMap::from([("T".to_string(), integer.clone())]),
        &KnownGenerics::new(),
        &[],
    )
    .unwrap();
    assert_eq!(bound.binding(base).unwrap()["T"], integer);
}

#[test]
fn collection_hierarchy_propagates_element_type() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let string = ty(&env, "java.lang.String");

    let hierarchy = resolve_hierarchy(
        &env,
        array_list,
        &GenericsMap::from([("E".to_string(), string.clone())]),
        &KnownGenerics::new(),
        &[],
    )
    .unwrap();

    for name in [
        "java.util.List",
        "java.util.Collection",
        "java.util.AbstractList",
        "java.util.AbstractCollection",
    ] {
        assert_eq!(hierarchy.generics_of(&env, class(&env, name)).unwrap()["E"], string, "{name}");
    }
    assert_eq!(
        hierarchy
            .generics_of(&env, class(&env, "java.lang.Iterable"))
            .unwrap()["T"],
        string
    );
    assert!(hierarchy.contains(class(&env, "java.util.RandomAccess")));
}

#[test]
fn diamond_keeps_the_more_specific_binding() {
    let mut env = TypeStore::with_minimal_jdk();
    let number = ty(&env, "java.lang.Number");
    let integer = ty(&env, "java.lang.Integer");
    let (holder, _) = declare(
        &mut env,
        "com.example.Holder",
        ClassKind::Interface,
        &["T"],
        |_| (None, vec![]),
    );
    let (left, _) = declare(&mut env, "com.example.Left", ClassKind::Class, &[], |_| {
        (None, vec![Type::parameterized(holder, vec![number.clone()])])
    });
    let (root, _) = declare(&mut env, "com.example.Root", ClassKind::Class, &[], |_| {
        (
            Some(Type::class(left)),
            vec![Type::parameterized(holder, vec![integer.clone()])],
        )
    });

    let hierarchy = resolve_raw_hierarchy(&env, root, &[]).unwrap();
    assert_eq!(hierarchy.binding(holder).unwrap()["T"], integer);
}

#[test]
fn diamond_prefers_a_class_over_a_lower_bounded_wildcard() {
    let mut env = TypeStore::with_minimal_jdk();
    let number = ty(&env, "java.lang.Number");
    let super_integer =
        Type::wildcard_super(ty(&env, "java.lang.Integer"), env.well_known().object);
    let (holder, _) = declare(
        &mut env,
        "com.example.Holder",
        ClassKind::Interface,
        &["T"],
        |_| (None, vec![]),
    );
    let (left, _) = declare(&mut env, "com.example.Left", ClassKind::Class, &[], |_| {
        (None, vec![Type::parameterized(holder, vec![number.clone()])])
    });
    let (root, _) = declare(&mut env, "com.example.Root", ClassKind::Class, &[], |_| {
        (
            Some(Type::class(left)),
            vec![Type::parameterized(holder, vec![super_integer.clone()])],
        )
    });

    let hierarchy = resolve_raw_hierarchy(&env, root, &[]).unwrap();
    assert_eq!(hierarchy.binding(holder).unwrap()["T"], number);
}

#[test]
fn diamond_with_incompatible_bindings_fails() {
    let mut env = TypeStore::with_minimal_jdk();
    let number = ty(&env, "java.lang.Number");
    let string = ty(&env, "java.lang.String");
    let (holder, _) = declare(
        &mut env,
        "com.example.Holder",
        ClassKind::Interface,
        &["T"],
        |_| (None, vec![]),
    );
    let (left, _) = declare(&mut env, "com.example.Left", ClassKind::Class, &[], |_| {
        (None, vec![Type::parameterized(holder, vec![number.clone()])])
    });
    let (root, _) = declare(&mut env, "com.example.Root", ClassKind::Class, &[], |_| {
        (
            Some(Type::class(left)),
            vec![Type::parameterized(holder, vec![string.clone()])],
        )
    });

    let err = resolve_raw_hierarchy(&env, root, &[]).unwrap_err();
    let GenericsError::HierarchyResolution { root: name, source, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(name, "Root");
    match source.as_ref() {
        GenericsError::IncompatibleInterface {
            interface,
            variable,
            first,
            second,
            ..
        } => {
            assert_eq!(interface, "Holder");
            assert_eq!(variable, "T");
            assert_eq!((first.as_str(), second.as_str()), ("String", "Number"));
        }
        other => panic!("unexpected source: {other}"),
    }
}

#[test]
fn ignored_types_are_pruned() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let list = class(&env, "java.util.List");
    let abstract_list = class(&env, "java.util.AbstractList");

    let hierarchy = resolve_raw_hierarchy(&env, array_list, &[abstract_list, list]).unwrap();
    assert!(!hierarchy.contains(list));
    assert!(!hierarchy.contains(abstract_list));
    assert!(!hierarchy.contains(class(&env, "java.util.Collection")));
    assert!(hierarchy.contains(class(&env, "java.util.RandomAccess")));
    assert_eq!(hierarchy.ignored(), &[abstract_list, list]);
}

#[test]
fn known_generics_override_derived_bindings() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let collection = class(&env, "java.util.Collection");
    let integer = ty(&env, "java.lang.Integer");

    let known = KnownGenerics::from([(
        collection,
        GenericsMap::from([("E".to_string(), integer.clone())]),
    )]);
    let hierarchy = resolve_hierarchy(&env, array_list, &GenericsMap::new(), &known, &[]).unwrap();
    assert_eq!(hierarchy.binding(collection).unwrap()["E"], integer);
    assert_eq!(
        hierarchy
            .binding(class(&env, "java.lang.Iterable"))
            .unwrap()["T"],
        integer
    );
    assert_eq!(hierarchy.binding(array_list).unwrap()["E"], object(&env));
}

#[test]
fn inner_class_sees_outer_generics() {
    let mut env = TypeStore::with_minimal_jdk();
    let string = ty(&env, "java.lang.String");
    let (base, _) = declare(
        &mut env,
        "com.example.Base",
        ClassKind::Class,
        &["T"],
        |_| (None, vec![]),
    );
    let (outer, outer_vars) = declare(
        &mut env,
        "com.example.Outer",
        ClassKind::Class,
        &["T"],
        |_| (None, vec![]),
    );
    let inner = env.add_class(ClassDef {
        super_class: Some(Type::parameterized(base, vec![var(outer_vars[0])])),
        enclosing: Some(outer),
        ..ClassDef::new("com.example.Outer$Inner", ClassKind::Class)
    });

    let hierarchy = resolve_hierarchy(
        &env,
        inner,
        &GenericsMap::from([("T".to_string(), string.clone())]),
        &KnownGenerics::new(),
        &[],
    )
    .unwrap();
    assert_eq!(hierarchy.binding(inner), Some(&GenericsMap::new()));
    assert_eq!(hierarchy.owner_generics(inner)["T"], string);
    assert_eq!(hierarchy.binding(base).unwrap()["T"], string);

    let raw = resolve_raw_hierarchy(&env, inner, &[]).unwrap();
    assert_eq!(raw.binding(base).unwrap()["T"], object(&env));
}

#[test]
fn rendering_shows_resolved_arguments() {
    let mut env = TypeStore::with_minimal_jdk();
    let integer = ty(&env, "java.lang.Integer");
    let comparable = generic(&env, "java.lang.Comparable", vec![integer.clone()]);
    let (base, _) = declare(
        &mut env,
        "com.example.Base",
        ClassKind::Class,
        &["T"],
        |_| (None, vec![]),
    );
    let (root, _) = declare(&mut env, "com.example.Root", ClassKind::Class, &[], |_| {
        (
            Some(Type::parameterized(base, vec![integer.clone()])),
            vec![comparable],
        )
    });

    let hierarchy = resolve_raw_hierarchy(&env, root, &[]).unwrap();
    assert_eq!(
        render_hierarchy(&env, &hierarchy, Some(base)),
        "Root\n  extends Base<Integer>  <-- current\n  implements Comparable<Integer>\n"
    );
}

#[test]
fn rendering_expands_shared_types_once() {
    let mut env = TypeStore::with_minimal_jdk();
    let (shared, _) = declare(
        &mut env,
        "com.example.Shared",
        ClassKind::Interface,
        &[],
        |_| (None, vec![]),
    );
    let (deep, _) = declare(&mut env, "com.example.Deep", ClassKind::Interface, &[], |_| {
        (None, vec![Type::class(shared)])
    });
    let (left, _) = declare(&mut env, "com.example.Left", ClassKind::Class, &[], |_| {
        (None, vec![Type::class(deep)])
    });
    let (root, _) = declare(&mut env, "com.example.Root", ClassKind::Class, &[], |_| {
        (Some(Type::class(left)), vec![Type::class(deep)])
    });

    let hierarchy = resolve_raw_hierarchy(&env, root, &[]).unwrap();
    assert_eq!(
        render_hierarchy(&env, &hierarchy, None),
        "Root\n  extends Left\n    implements Deep\n      implements Shared\n  \
         implements Deep  (see above)\n"
    );
}
