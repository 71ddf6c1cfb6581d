use crate::class::PrimitiveType;
use crate::store::{
    ClassDef, ClassId, ClassKind, FieldDef, MethodDef, TypeEnv, TypeParamDef, TypeStore,
};
use crate::ty::Type;

impl TypeStore {
    /// A store pre-populated with the handful of `java.lang`/`java.util` types tests and the CLI
    /// need: boxed primitives, `Comparable`, `Enum` and the core collection interfaces with a few
    /// implementations.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::default();
        let wk = *store.well_known();
        let object = Type::class(wk.object);
        let serializable = Type::class(wk.serializable);
        let cloneable = Type::class(wk.cloneable);

        let comparable_t = store.add_type_param("T", vec![]);
        let comparable = store.add_class(ClassDef {
            type_params: vec![comparable_t],
            methods: vec![MethodDef {
                name: "compareTo".into(),
                type_params: vec![],
                params: vec![Type::Variable(comparable_t)],
                return_type: Type::primitive(PrimitiveType::Int),
                is_static: false,
            }],
            ..ClassDef::new("java.lang.Comparable", ClassKind::Interface)
        });
        let comparable_of = |id: ClassId| Type::parameterized(comparable, vec![Type::class(id)]);

        let char_sequence =
            store.add_class(ClassDef::new("java.lang.CharSequence", ClassKind::Interface));

        let string = store.intern_class_id("java.lang.String");
        store.define_class(
            string,
            ClassDef {
                super_class: Some(object.clone()),
                interfaces: vec![
                    serializable.clone(),
                    comparable_of(string),
                    Type::class(char_sequence),
                ],
                ..ClassDef::new("java.lang.String", ClassKind::Class)
            },
        );

        let number = store.add_class(ClassDef {
            super_class: Some(object.clone()),
            interfaces: vec![serializable.clone()],
            ..ClassDef::new("java.lang.Number", ClassKind::Class)
        });

        for (name, parent) in [
            ("java.lang.Boolean", None),
            ("java.lang.Character", None),
            ("java.lang.Byte", Some(number)),
            ("java.lang.Short", Some(number)),
            ("java.lang.Integer", Some(number)),
            ("java.lang.Long", Some(number)),
            ("java.lang.Float", Some(number)),
            ("java.lang.Double", Some(number)),
        ] {
            let id = store.intern_class_id(name);
            let mut interfaces = vec![comparable_of(id)];
            if parent.is_none() {
                interfaces.insert(0, serializable.clone());
            }
            store.define_class(
                id,
                ClassDef {
                    super_class: Some(parent.map_or_else(|| object.clone(), Type::class)),
                    interfaces,
                    ..ClassDef::new(name, ClassKind::Class)
                },
            );
        }
        store.add_class(ClassDef {
            super_class: Some(object.clone()),
            ..ClassDef::new("java.lang.Void", ClassKind::Class)
        });

        // class Enum<E extends Enum<E>> implements Comparable<E>, Serializable
        let enum_id = store.intern_class_id("java.lang.Enum");
        let enum_e = store.add_type_param("E", vec![]);
        store.define_type_param(
            enum_e,
            TypeParamDef {
                name: "E".into(),
                upper_bounds: vec![Type::parameterized(enum_id, vec![Type::Variable(enum_e)])],
                owner: None,
            },
        );
        store.define_class(
            enum_id,
            ClassDef {
                type_params: vec![enum_e],
                super_class: Some(object.clone()),
                interfaces: vec![
                    Type::parameterized(comparable, vec![Type::Variable(enum_e)]),
                    serializable.clone(),
                ],
                methods: vec![MethodDef {
                    name: "name".into(),
                    type_params: vec![],
                    params: vec![],
                    return_type: Type::class(string),
                    is_static: false,
                }],
                ..ClassDef::new("java.lang.Enum", ClassKind::Class)
            },
        );

        let iterable_t = store.add_type_param("T", vec![]);
        let iterable = store.add_class(ClassDef {
            type_params: vec![iterable_t],
            ..ClassDef::new("java.lang.Iterable", ClassKind::Interface)
        });

        let collection_e = store.add_type_param("E", vec![]);
        let collection = store.add_class(ClassDef {
            type_params: vec![collection_e],
            interfaces: vec![Type::parameterized(iterable, vec![Type::Variable(collection_e)])],
            methods: vec![MethodDef {
                name: "add".into(),
                type_params: vec![],
                params: vec![Type::Variable(collection_e)],
                return_type: Type::primitive(PrimitiveType::Boolean),
                is_static: false,
            }],
            ..ClassDef::new("java.util.Collection", ClassKind::Interface)
        });

        let list_e = store.add_type_param("E", vec![]);
        let list = store.add_class(ClassDef {
            type_params: vec![list_e],
            interfaces: vec![Type::parameterized(collection, vec![Type::Variable(list_e)])],
            methods: vec![MethodDef {
                name: "get".into(),
                type_params: vec![],
                params: vec![Type::primitive(PrimitiveType::Int)],
                return_type: Type::Variable(list_e),
                is_static: false,
            }],
            ..ClassDef::new("java.util.List", ClassKind::Interface)
        });

        let set_e = store.add_type_param("E", vec![]);
        let set = store.add_class(ClassDef {
            type_params: vec![set_e],
            interfaces: vec![Type::parameterized(collection, vec![Type::Variable(set_e)])],
            ..ClassDef::new("java.util.Set", ClassKind::Interface)
        });

        let map_k = store.add_type_param("K", vec![]);
        let map_v = store.add_type_param("V", vec![]);
        let map = store.add_class(ClassDef {
            type_params: vec![map_k, map_v],
            methods: vec![MethodDef {
                name: "get".into(),
                type_params: vec![],
                params: vec![object.clone()],
                return_type: Type::Variable(map_v),
                is_static: false,
            }],
            ..ClassDef::new("java.util.Map", ClassKind::Interface)
        });

        let random_access =
            store.add_class(ClassDef::new("java.util.RandomAccess", ClassKind::Interface));

        let abstract_collection_e = store.add_type_param("E", vec![]);
        let abstract_collection = store.add_class(ClassDef {
            type_params: vec![abstract_collection_e],
            super_class: Some(object.clone()),
            interfaces: vec![Type::parameterized(
                collection,
                vec![Type::Variable(abstract_collection_e)],
            )],
            ..ClassDef::new("java.util.AbstractCollection", ClassKind::Class)
        });

        let abstract_list_e = store.add_type_param("E", vec![]);
        let abstract_list = store.add_class(ClassDef {
            type_params: vec![abstract_list_e],
            super_class: Some(Type::parameterized(
                abstract_collection,
                vec![Type::Variable(abstract_list_e)],
            )),
            interfaces: vec![Type::parameterized(list, vec![Type::Variable(abstract_list_e)])],
            ..ClassDef::new("java.util.AbstractList", ClassKind::Class)
        });

        let array_list_e = store.add_type_param("E", vec![]);
        store.add_class(ClassDef {
            type_params: vec![array_list_e],
            super_class: Some(Type::parameterized(
                abstract_list,
                vec![Type::Variable(array_list_e)],
            )),
            interfaces: vec![
                Type::parameterized(list, vec![Type::Variable(array_list_e)]),
                Type::class(random_access),
                cloneable.clone(),
                serializable.clone(),
            ],
            fields: vec![FieldDef {
                name: "elementData".into(),
                ty: Type::array(object.clone()),
                is_static: false,
            }],
            ..ClassDef::new("java.util.ArrayList", ClassKind::Class)
        });

        let hash_set_e = store.add_type_param("E", vec![]);
        store.add_class(ClassDef {
            type_params: vec![hash_set_e],
            super_class: Some(Type::parameterized(
                abstract_collection,
                vec![Type::Variable(hash_set_e)],
            )),
            interfaces: vec![
                Type::parameterized(set, vec![Type::Variable(hash_set_e)]),
                cloneable.clone(),
                serializable.clone(),
            ],
            ..ClassDef::new("java.util.HashSet", ClassKind::Class)
        });

        let hash_map_k = store.add_type_param("K", vec![]);
        let hash_map_v = store.add_type_param("V", vec![]);
        store.add_class(ClassDef {
            type_params: vec![hash_map_k, hash_map_v],
            super_class: Some(object.clone()),
            interfaces: vec![
                Type::parameterized(
                    map,
                    vec![Type::Variable(hash_map_k), Type::Variable(hash_map_v)],
                ),
                cloneable,
                serializable,
            ],
            ..ClassDef::new("java.util.HashMap", ClassKind::Class)
        });

        store
    }
}
