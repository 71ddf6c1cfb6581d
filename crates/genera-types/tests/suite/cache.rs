use std::sync::Arc;

use genera_types::{CachePolicy, GenericsResolver, TypeStore};

use super::class;

#[test]
fn resolver_reuses_cached_hierarchies() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let resolver = GenericsResolver::new(&env);

    let first = resolver.hierarchy(array_list).unwrap();
    let second = resolver.hierarchy(array_list).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resolver.cache().len(), 1);

    // Pruned and explicitly parameterized hierarchies bypass the cache.
    let list = class(&env, "java.util.List");
    resolver.resolve_ignoring(array_list, &[list]).unwrap();
    assert_eq!(resolver.cache().len(), 1);

    resolver.cache().clear();
    assert!(resolver.cache().is_empty());
}

#[test]
fn cache_can_be_toggled_at_runtime() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let resolver = GenericsResolver::with_policy(&env, CachePolicy::disabled());

    resolver.resolve(array_list).unwrap();
    assert!(resolver.cache().is_empty());

    resolver.cache().policy().set_enabled(true);
    resolver.resolve(array_list).unwrap();
    assert_eq!(resolver.cache().len(), 1);

    resolver.cache().policy().set_enabled(false);
    let hash_map = class(&env, "java.util.HashMap");
    resolver.resolve(hash_map).unwrap();
    assert_eq!(resolver.cache().len(), 1);
}

#[test]
fn concurrent_lookups_share_one_hierarchy() {
    let env = TypeStore::with_minimal_jdk();
    let array_list = class(&env, "java.util.ArrayList");
    let resolver = GenericsResolver::new(&env);

    let hierarchies: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| resolver.hierarchy(array_list).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(resolver.cache().len(), 1);
    assert!(hierarchies.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}
