use std::sync::Arc;

use ferrous_registrar::{
    erase, ActivationError, Constructor, Lifetime, Registrar, RegistrationIntent, ServiceResolver, ServiceResolverExt,
    TypeDescriptor, TypeKey, TypeUniverse,
};

#[test]
fn test_self_circular_dependency() {
    struct SelfReferencing;

    let service = TypeKey::of::<SelfReferencing>();
    let mut registrar = Registrar::new(TypeUniverse::new());
    let inner = service.clone();
    registrar.add_factory(service.clone(), Lifetime::Transient, move |r| {
        r.resolve(&inner, None)?;
        Ok(erase(Arc::new(SelfReferencing)))
    });
    let composition = registrar.build().unwrap();

    match composition.activator().resolve(&service, None) {
        Err(ActivationError::Circular(path)) => {
            assert_eq!(path, vec![service.clone(), service]);
        }
        other => panic!("Expected Circular error, got {:?}", other.err()),
    }
}

#[test]
fn test_three_level_circular() {
    struct X;
    struct Y;
    struct Z;

    let (x, y, z) = (TypeKey::of::<X>(), TypeKey::of::<Y>(), TypeKey::of::<Z>());
    let mut registrar = Registrar::new(TypeUniverse::new());
    for (service, next) in [(x.clone(), y.clone()), (y.clone(), z.clone()), (z.clone(), x.clone())] {
        registrar.add_factory(service, Lifetime::Singleton, move |r| r.resolve(&next, None));
    }
    let composition = registrar.build().unwrap();

    let err = composition.activator().resolve(&x, None).unwrap_err();
    assert_eq!(err, ActivationError::Circular(vec![x.clone(), y, z, x]));
    assert!(err.to_string().starts_with("Circular dependency: "));
}

#[test]
fn test_circular_with_traits() {
    trait ServiceA: Send + Sync {}
    trait ServiceB: Send + Sync {}

    struct ImplA;
    struct ImplB;
    impl ServiceA for ImplA {}
    impl ServiceB for ImplB {}

    let mut universe = TypeUniverse::new();
    universe
        .insert(TypeDescriptor::abstraction::<dyn ServiceA>())
        .insert(TypeDescriptor::abstraction::<dyn ServiceB>())
        .insert(
            TypeDescriptor::implementation::<ImplA>().implements::<dyn ServiceA>().constructor(
                Constructor::new()
                    .param::<dyn ServiceB>()
                    .activate(|_| Ok(erase(Arc::new(ImplA) as Arc<dyn ServiceA>))),
            ),
        )
        .insert(
            TypeDescriptor::implementation::<ImplB>().implements::<dyn ServiceB>().constructor(
                Constructor::new()
                    .param::<dyn ServiceA>()
                    .activate(|_| Ok(erase(Arc::new(ImplB) as Arc<dyn ServiceB>))),
            ),
        );

    let mut registrar = Registrar::new(universe);
    registrar
        .register(RegistrationIntent::singleton::<ImplA>())
        .register(RegistrationIntent::singleton::<ImplB>());
    let composition = registrar.build().unwrap();

    let result = composition.activator().get::<Arc<dyn ServiceA>>(&TypeKey::of::<dyn ServiceA>());
    assert_eq!(
        result.err(),
        Some(ActivationError::Circular(vec![
            TypeKey::of::<dyn ServiceA>(),
            TypeKey::of::<dyn ServiceB>(),
            TypeKey::of::<dyn ServiceA>(),
        ]))
    );

    // The validator sees the same cycle statically.
    assert!(composition.dependency_graph().has_cycles());
}

#[test]
fn test_keyed_and_unkeyed_bindings_are_distinct_frames() {
    trait Store: Send + Sync {
        fn describe(&self) -> String;
    }
    struct MemoryStore;
    struct CachedStore(Arc<dyn Store>);
    impl Store for MemoryStore {
        fn describe(&self) -> String {
            "memory".into()
        }
    }
    impl Store for CachedStore {
        fn describe(&self) -> String {
            format!("cached({})", self.0.describe())
        }
    }

    let mut universe = TypeUniverse::new();
    universe
        .insert(TypeDescriptor::abstraction::<dyn Store>())
        .insert(
            TypeDescriptor::implementation::<MemoryStore>()
                .implements::<dyn Store>()
                .constructor(Constructor::new().activate(|_| Ok(erase(Arc::new(MemoryStore) as Arc<dyn Store>)))),
        )
        .insert(
            TypeDescriptor::implementation::<CachedStore>().implements::<dyn Store>().constructor(
                Constructor::new().param::<dyn Store>().activate(|args| {
                    let inner: Arc<dyn Store> = args.get(0)?;
                    Ok(erase(Arc::new(CachedStore(inner)) as Arc<dyn Store>))
                }),
            ),
        );

    let mut registrar = Registrar::new(universe);
    registrar
        .register(RegistrationIntent::transient::<MemoryStore>())
        .register(RegistrationIntent::transient::<CachedStore>().keyed("cached"));
    let composition = registrar.build().unwrap();

    let store: Arc<dyn Store> = composition
        .activator()
        .get_keyed(&TypeKey::of::<dyn Store>(), &"cached".into())
        .unwrap();
    assert_eq!(store.describe(), "cached(memory)");
}

#[test]
fn test_failed_resolution_leaves_resolver_usable() {
    struct Looping;
    struct Healthy;

    let looping = TypeKey::of::<Looping>();
    let healthy = TypeKey::of::<Healthy>();
    let mut registrar = Registrar::new(TypeUniverse::new());
    let again = looping.clone();
    registrar
        .add_factory(looping.clone(), Lifetime::Transient, move |r| r.resolve(&again, None))
        .add_factory(healthy.clone(), Lifetime::Transient, |_| Ok(erase(42u32)));
    let composition = registrar.build().unwrap();

    let activator = composition.activator();
    assert!(matches!(activator.resolve(&looping, None), Err(ActivationError::Circular(_))));
    assert_eq!(activator.get::<u32>(&healthy).unwrap(), 42);
}

#[test]
fn test_depth_exceeded() {
    const CHAIN: usize = 1100;

    // Deep activation recursion needs more than the default test stack.
    let handle = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(|| {
            let mut registrar = Registrar::new(TypeUniverse::new());
            for i in 0..CHAIN {
                let next = TypeKey::named(format!("chain::Link{}", i + 1));
                registrar.add_factory(
                    TypeKey::named(format!("chain::Link{}", i)),
                    Lifetime::Transient,
                    move |r| r.resolve(&next, None),
                );
            }
            let composition = registrar.build().unwrap();
            composition.activator().resolve(&TypeKey::named("chain::Link0"), None)
        })
        .unwrap();

    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ActivationError::DepthExceeded(_))));
}
