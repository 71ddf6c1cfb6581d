use genera_loader::{load_model, ClassModel, LoadError, ModelFile, TypeParamModel};
use genera_types::{render_type, GenericDeclaration, GenericsResolver, PrimitiveType, Type, TypeEnv};
use pretty_assertions::assert_eq;

use super::load_toml;

#[test]
fn self_referential_bounds_and_forward_references() {
    let model = load_toml(
        r#"
[[classes]]
name = "com.example.Leaf"
extends = "com.example.Node<com.example.Leaf>"

[[classes]]
name = "com.example.Node"
type_params = [{ name = "T", bounds = ["Node<T>", "Comparable<T>"] }]
"#,
    );
    let store = model.store();
    let node = model.class("com.example.Node").unwrap();
    let leaf = model.class("Leaf").unwrap();

    let t = store.class(node).unwrap().type_params[0];
    let bounds = &store.type_param(t).unwrap().upper_bounds;
    assert_eq!(bounds[0], Type::parameterized(node, vec![Type::Variable(t)]));
    assert_eq!(render_type(store, &bounds[1]), "Comparable<T>");
    assert_eq!(
        store.type_param(t).unwrap().owner,
        Some(GenericDeclaration::Class(node))
    );

    let resolver = GenericsResolver::new(store);
    let ctx = resolver.resolve(leaf).unwrap().type_of(node).unwrap();
    assert_eq!(ctx.generic(0).unwrap(), &Type::class(leaf));
}

#[test]
fn method_variables_shadow_class_variables() {
    let model = load_toml(
        r#"
[[classes]]
name = "com.example.Box"
type_params = [{ name = "T" }]

[[classes.methods]]
name = "shadow"
type_params = [{ name = "T", bounds = ["CharSequence"] }]
params = ["T", "java.util.List<? super T>"]
returns = "T[]"

[[classes.methods]]
name = "plain"
params = ["T..."]
"#,
    );
    let store = model.store();
    let class = store.class(model.class("Box").unwrap()).unwrap();
    let class_t = class.type_params[0];
    let shadow = &class.methods[0];
    let method_t = shadow.type_params[0];

    assert_ne!(class_t, method_t);
    assert_eq!(shadow.params[0], Type::Variable(method_t));
    assert_eq!(shadow.return_type, Type::GenericArray(Box::new(Type::Variable(method_t))));
    assert!(matches!(
        store.type_param(method_t).unwrap().owner,
        Some(GenericDeclaration::Method(_))
    ));

    let plain = &class.methods[1];
    assert_eq!(plain.params[0], Type::GenericArray(Box::new(Type::Variable(class_t))));
    assert_eq!(plain.return_type, Type::primitive(PrimitiveType::Void));
}

#[test]
fn inner_classes_see_enclosing_variables() {
    let model = load_toml(
        r#"
[[classes]]
name = "com.example.Outer"
type_params = [{ name = "T" }]

[[classes]]
name = "com.example.Outer$Inner"
enclosing = "com.example.Outer"

[[classes.fields]]
name = "value"
type = "T"
"#,
    );
    let store = model.store();
    let outer = model.class("Outer").unwrap();
    let inner = model.class("Outer.Inner").unwrap();
    let outer_t = store.class(outer).unwrap().type_params[0];

    let def = store.class(inner).unwrap();
    assert_eq!(def.enclosing, Some(outer));
    assert_eq!(def.fields[0].ty, Type::Variable(outer_t));

    let owned = model.parse_type("Outer<String>.Inner").unwrap();
    assert_eq!(render_type(store, &owned), "Outer<String>.Inner");
}

#[test]
fn static_nested_classes_do_not_capture_variables() {
    let file = ModelFile::from_toml_str(
        r#"
[[classes]]
name = "com.example.Outer"
type_params = [{ name = "T" }]

[[classes]]
name = "com.example.Outer$Nested"
enclosing = "com.example.Outer"
is_static = true
implements = ["java.lang.Comparable<T>"]
"#,
    )
    .unwrap();

    let err = load_model(&file).unwrap_err();
    match err {
        LoadError::UnknownVariable { name, context } => {
            assert_eq!(name, "T");
            assert!(context.starts_with("class com.example.Outer$Nested"), "{context}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn supertypes_default_by_kind() {
    let model = load_toml(
        r#"
[[classes]]
name = "com.example.Shape"
kind = "interface"

[[classes]]
name = "com.example.Square"
implements = ["Shape"]
"#,
    );
    let store = model.store();
    let shape = store.class(model.class("Shape").unwrap()).unwrap();
    let square = store.class(model.class("Square").unwrap()).unwrap();

    assert_eq!(shape.super_class, None);
    assert_eq!(square.super_class, Some(Type::object(store)));
    assert_eq!(square.interfaces, vec![Type::class(model.class("Shape").unwrap())]);
}

#[test]
fn declaration_errors() {
    let duplicate = ModelFile {
        classes: vec![ClassModel::new("com.example.A"), ClassModel::new("com.example.A")],
    };
    assert!(matches!(
        load_model(&duplicate).unwrap_err(),
        LoadError::DuplicateClass(name) if name == "com.example.A"
    ));

    let mut unknown = ClassModel::new("com.example.A");
    unknown.extends = Some("com.example.Missing".into());
    let err = load_model(&ModelFile { classes: vec![unknown] }).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown class `com.example.Missing` in class com.example.A `com.example.Missing`"
    );

    let mut malformed = ClassModel::new("com.example.A");
    malformed.type_params = vec![TypeParamModel {
        name: "T".into(),
        bounds: vec!["java.util.List<".into()],
    }];
    assert!(matches!(
        load_model(&ModelFile { classes: vec![malformed] }).unwrap_err(),
        LoadError::MalformedSignature { .. }
    ));
}

#[test]
fn ambiguous_simple_names_need_qualification() {
    let model = load_toml(
        r#"
[[classes]]
name = "com.first.Item"

[[classes]]
name = "com.second.Item"
"#,
    );

    assert!(matches!(
        model.class("Item").unwrap_err(),
        LoadError::UnknownClass { .. }
    ));
    assert!(model.class("com.second.Item").is_ok());
}
