use genera_types::{
    common_type, is_assignable, is_more_specific, resolve_raw_generics, resolve_type_variables,
    ClassDef, ClassKind, GenericsMap, Type, TypeEnv, TypeParamDef, TypeStore,
};
use proptest::collection::vec;
use proptest::prelude::*;

use super::{class, generic, object, ty};

const PROPTEST_CASES: u32 = 128;

const LEAVES: &[&str] = &[
    "java.lang.Object",
    "java.lang.Number",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Double",
    "java.lang.String",
    "java.lang.Boolean",
];

/// Type expression over the minimal JDK, independent of any store.
#[derive(Clone, Debug)]
enum Shape {
    Leaf(usize),
    Variable,
    List(Box<Shape>),
    ArrayList(Box<Shape>),
    Array(Box<Shape>),
    Extends(Vec<Shape>),
    Super(Box<Shape>),
}

impl Shape {
    fn build(&self, env: &TypeStore, var: &Type) -> Type {
        match self {
            Shape::Leaf(index) => ty(env, LEAVES[*index]),
            Shape::Variable => var.clone(),
            Shape::List(inner) => generic(env, "java.util.List", vec![inner.build(env, var)]),
            Shape::ArrayList(inner) => {
                generic(env, "java.util.ArrayList", vec![inner.build(env, var)])
            }
            Shape::Array(inner) => Type::array(inner.build(env, var)),
            Shape::Extends(bounds) => {
                Type::wildcard_extends(bounds.iter().map(|b| b.build(env, var)).collect())
            }
            Shape::Super(lower) => {
                Type::wildcard_super(lower.build(env, var), env.well_known().object)
            }
        }
    }
}

fn arb_leaf(with_variables: bool) -> BoxedStrategy<Shape> {
    if with_variables {
        prop_oneof![
            4 => (0..LEAVES.len()).prop_map(Shape::Leaf),
            1 => Just(Shape::Variable),
        ]
        .boxed()
    } else {
        (0..LEAVES.len()).prop_map(Shape::Leaf).boxed()
    }
}

fn arb_shape(with_variables: bool) -> impl Strategy<Value = Shape> {
    arb_leaf(with_variables).prop_recursive(3, 8, 1, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::List(Box::new(s))),
            inner.clone().prop_map(|s| Shape::ArrayList(Box::new(s))),
            inner.prop_map(|s| Shape::Array(Box::new(s))),
        ]
    })
}

/// Like [`arb_shape`], with `? extends A & B` and `? super A` at any depth.
fn arb_wildcard_shape(with_variables: bool) -> impl Strategy<Value = Shape> {
    arb_leaf(with_variables).prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::List(Box::new(s))),
            inner.clone().prop_map(|s| Shape::ArrayList(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Array(Box::new(s))),
            vec(inner.clone(), 1..3).prop_map(Shape::Extends),
            inner.prop_map(|s| Shape::Super(Box::new(s))),
        ]
    })
}

/// A plain shape, or a wildcard whose bounds are classes other than `Object`.
fn arb_top_level_wildcard() -> impl Strategy<Value = Shape> {
    let bound = (1..LEAVES.len()).prop_map(Shape::Leaf);
    prop_oneof![
        2 => arb_shape(false),
        1 => vec(bound.clone(), 1..3).prop_map(Shape::Extends),
        1 => bound.prop_map(|s| Shape::Super(Box::new(s))),
    ]
}

fn env_with_variable() -> (TypeStore, Type) {
    let mut env = TypeStore::with_minimal_jdk();
    let t = env.add_type_param("T", vec![]);
    (env, Type::Variable(t))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn substitution_is_idempotent(shape in arb_shape(true), value in arb_shape(false)) {
        let (env, var) = env_with_variable();
        let ty = shape.build(&env, &var);
        let generics = GenericsMap::from([("T".to_string(), value.build(&env, &var))]);

        let once = resolve_type_variables(&env, &ty, &generics).unwrap();
        let twice = resolve_type_variables(&env, &once, &generics).unwrap();
        prop_assert!(!once.has_variables());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn substitution_keeps_wildcard_bounds(
        shape in arb_wildcard_shape(true),
        value in arb_wildcard_shape(false),
    ) {
        let (env, var) = env_with_variable();
        let ty = shape.build(&env, &var);
        let generics = GenericsMap::from([("T".to_string(), value.build(&env, &var))]);

        let once = resolve_type_variables(&env, &ty, &generics).unwrap();
        let twice = resolve_type_variables(&env, &once, &generics).unwrap();
        prop_assert!(!once.has_variables());
        prop_assert_eq!(&once, &twice);
        if let (Type::Wildcard(before), Type::Wildcard(after)) = (&ty, &once) {
            prop_assert_eq!(before.upper.len(), after.upper.len());
            prop_assert_eq!(before.lower.is_some(), after.lower.is_some());
        }
    }

    #[test]
    fn common_type_is_symmetric(
        one in arb_shape(false),
        two in arb_shape(false),
        all_interfaces in any::<bool>(),
    ) {
        let env = TypeStore::with_minimal_jdk();
        let object = Type::object(&env);
        let one = one.build(&env, &object);
        let two = two.build(&env, &object);

        let forward = common_type(&env, &one, &two, all_interfaces).unwrap();
        let backward = common_type(&env, &two, &one, all_interfaces).unwrap();
        prop_assert_eq!(&forward, &backward);
        prop_assert!(is_assignable(&env, &one, &forward).unwrap());
    }

    #[test]
    fn common_type_of_wildcards_is_symmetric(
        one in arb_top_level_wildcard(),
        two in arb_top_level_wildcard(),
        all_interfaces in any::<bool>(),
    ) {
        let env = TypeStore::with_minimal_jdk();
        let object = Type::object(&env);
        let one = one.build(&env, &object);
        let two = two.build(&env, &object);

        let forward = common_type(&env, &one, &two, all_interfaces).unwrap();
        let backward = common_type(&env, &two, &one, all_interfaces).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn specificity_is_antisymmetric(
        one in arb_wildcard_shape(false),
        two in arb_wildcard_shape(false),
    ) {
        let env = TypeStore::with_minimal_jdk();
        let object = Type::object(&env);
        let one = one.build(&env, &object);
        let two = two.build(&env, &object);

        if let (Ok(forward), Ok(backward)) = (
            is_more_specific(&env, &one, &two),
            is_more_specific(&env, &two, &one),
        ) {
            prop_assert!(!(forward && backward), "both directions more specific");
        }
    }

    #[test]
    fn class_is_more_specific_than_a_wildcard_above_it(index in 1..LEAVES.len()) {
        let env = TypeStore::with_minimal_jdk();
        let bound = ty(&env, LEAVES[index]);
        let wildcard = Type::wildcard_super(bound.clone(), env.well_known().object);

        prop_assert!(is_more_specific(&env, &bound, &wildcard).unwrap());
        prop_assert!(!is_more_specific(&env, &wildcard, &bound).unwrap());
        prop_assert!(is_assignable(&env, &bound, &wildcard).unwrap());
    }

    #[test]
    fn lower_bounds_compare_inverted(one in 1..LEAVES.len(), two in 1..LEAVES.len()) {
        let env = TypeStore::with_minimal_jdk();
        let object = env.well_known().object;
        let one_lower = ty(&env, LEAVES[one]);
        let two_lower = ty(&env, LEAVES[two]);
        let one_super = Type::wildcard_super(one_lower.clone(), object);
        let two_super = Type::wildcard_super(two_lower.clone(), object);

        if let Ok(true) = is_more_specific(&env, &one_lower, &two_lower) {
            prop_assert!(is_more_specific(&env, &two_super, &one_super).unwrap());
            prop_assert!(!is_more_specific(&env, &one_super, &two_super).unwrap());
        }
    }

    #[test]
    fn multi_bound_variables_resolve_to_every_bound(
        bounds in vec(arb_shape(false), 1..4),
        self_bounded in any::<bool>(),
    ) {
        let mut env = TypeStore::with_minimal_jdk();
        let comparable = class(&env, "java.lang.Comparable");
        let t = env.add_type_param("T", vec![]);

        let object = object(&env);
        let mut declared: Vec<Type> = bounds.iter().map(|b| b.build(&env, &object)).collect();
        let mut expected = declared.clone();
        if self_bounded {
            // `T extends ... & Comparable<T>`: the self reference is seen as Object.
            declared.push(Type::parameterized(comparable, vec![Type::Variable(t)]));
            expected.push(Type::parameterized(comparable, vec![object.clone()]));
        }
        env.define_type_param(t, TypeParamDef {
            name: "T".to_string(),
            upper_bounds: declared,
            owner: None,
        });
        let holder = env.add_class(ClassDef {
            type_params: vec![t],
            ..ClassDef::new("com.example.Holder", ClassKind::Class)
        });

        let raw = resolve_raw_generics(&env, holder)["T"].clone();
        prop_assert!(!raw.has_variables());
        match expected.as_slice() {
            [single] => {
                prop_assert_eq!(&raw, single);
            }
            _ => {
                prop_assert_eq!(&raw, &Type::wildcard_extends(expected.clone()));
            }
        }
        prop_assert_eq!(
            resolve_type_variables(&env, &raw, &GenericsMap::new()).unwrap(),
            raw.clone()
        );
        for bound in &expected {
            prop_assert!(is_assignable(&env, &raw, bound).unwrap(), "{:?}", bound);
        }
    }
}
