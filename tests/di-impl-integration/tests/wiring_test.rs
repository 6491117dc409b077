//! 依赖解析与注入的集成测试

mod common;

use common::{init_test_logger, register};
use di_abstractions::{BeanDefinition, ParamDescriptor};
use di_impl::BeanFactory;
use infrastructure_common::{BeanError, RegistrationKind, TypeToken};
use std::sync::Arc;

trait Store: Send + Sync {
    fn kind(&self) -> &'static str;
}

trait Repository: Store {
    fn find(&self, id: u32) -> Option<String>;
}

#[derive(Debug, Default)]
struct MemoryRepository;

impl Store for MemoryRepository {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

impl Repository for MemoryRepository {
    fn find(&self, id: u32) -> Option<String> {
        (id == 1).then(|| "alice".to_string())
    }
}

#[derive(Debug, Default)]
struct CacheStore;

impl Store for CacheStore {
    fn kind(&self) -> &'static str {
        "cache"
    }
}

fn memory_repository() -> BeanDefinition {
    BeanDefinition::builder::<MemoryRepository>("memoryRepository")
        .default_constructor(MemoryRepository::default)
        .provides_with::<dyn Repository, _, _>(
            |repo| repo as Arc<dyn Repository>,
            |node| node.provides::<dyn Store, _>(|repo| repo as Arc<dyn Store>),
        )
        .build()
}

fn cache_store() -> BeanDefinition {
    BeanDefinition::builder::<CacheStore>("cacheStore")
        .default_constructor(CacheStore::default)
        .provides::<dyn Store, _>(|cache| cache as Arc<dyn Store>)
        .build()
}

// A -> B -> C，构造函数注入 + 字段注入
struct C;

#[derive(Default)]
struct B {
    c: Option<Arc<C>>,
}

struct A {
    b: Arc<B>,
}

#[test]
fn test_acyclic_chain_shares_cached_singletons() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<A>("A")
            .constructor("new", vec![ParamDescriptor::required::<B>()], |args| {
                Ok(A {
                    b: args.required::<B>(0)?,
                })
            })
            .build(),
    );
    register(
        &factory,
        BeanDefinition::builder::<B>("B")
            .default_constructor(B::default)
            .field::<C, _>("c", |b, c| b.c = Some(c))
            .build(),
    );
    register(&factory, BeanDefinition::builder::<C>("C").default_constructor(|| C).build());

    let a = factory.get_named::<A>("A").unwrap();
    let b = factory.get_named::<B>("B").unwrap();
    let c = factory.get_typed::<C>().unwrap();
    assert!(Arc::ptr_eq(&a.b, &b));
    assert!(Arc::ptr_eq(b.c.as_ref().unwrap(), &c));
    assert_eq!(factory.registry().singleton_names(), vec!["C", "B", "A"]);
}

#[test]
fn test_singleton_identity_and_prototype_distinctness() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(&factory, memory_repository());
    register(
        &factory,
        BeanDefinition::builder::<CacheStore>("scratch")
            .prototype()
            .default_constructor(CacheStore::default)
            .build(),
    );

    let first = factory.get("memoryRepository").unwrap();
    let second = factory.get("memoryRepository").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let one = factory.get("scratch").unwrap();
    let two = factory.get("scratch").unwrap();
    let three = factory.get("scratch").unwrap();
    assert!(!Arc::ptr_eq(&one, &two));
    assert!(!Arc::ptr_eq(&two, &three));
    assert!(!factory.registry().contains_singleton("scratch"));
}

#[test]
fn test_ambiguous_lookup_lists_exact_candidates() {
    init_test_logger();
    let factory = BeanFactory::new();
    for name in ["stringBean1", "stringBean2"] {
        register(
            &factory,
            BeanDefinition::builder::<String>(name)
                .default_constructor(move || name.to_string())
                .build(),
        );
    }

    let error = factory.get_by_type(&TypeToken::of::<String>()).unwrap_err();
    match error {
        BeanError::AmbiguousBean { candidates, .. } => {
            assert_eq!(candidates, vec!["stringBean1", "stringBean2"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(factory.get_typed::<String>().is_err());
    assert_eq!(factory.get_all::<String>().unwrap().len(), 2);
}

#[derive(Default)]
struct Reporter {
    store: Option<Arc<dyn Store>>,
}

#[test]
fn test_optional_dependency_left_unset() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<Reporter>("reporter")
            .default_constructor(Reporter::default)
            .optional_field::<dyn Store, _>("store", |reporter, store| reporter.store = Some(store))
            .build(),
    );

    let reporter = factory.get_typed::<Reporter>().unwrap();
    assert!(reporter.store.is_none());
}

#[test]
fn test_required_dependency_missing_fails_injection() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<Reporter>("reporter")
            .default_constructor(Reporter::default)
            .field::<dyn Store, _>("store", |reporter, store| reporter.store = Some(store))
            .build(),
    );

    let error = factory.get("reporter").unwrap_err();
    match error {
        BeanError::DependencyInjectionFailure { bean, member, type_name, source, .. } => {
            assert_eq!(bean, "reporter");
            assert_eq!(member, "store");
            assert!(type_name.contains("Store"));
            assert!(matches!(*source, BeanError::NoSuchBeanDefinition { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!factory.registry().is_in_creation("reporter"));
    assert_eq!(factory.stats().creation_failures, 1);
}

#[test]
fn test_duplicate_registration_keeps_first_index() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<String>("shared")
            .default_constructor(|| "first".to_string())
            .build(),
    );

    let duplicate = factory.register_bean_definition(
        "shared",
        BeanDefinition::builder::<u64>("shared")
            .default_constructor(|| 7)
            .build(),
    );
    assert!(matches!(
        duplicate,
        Err(BeanError::DuplicateRegistration { kind: RegistrationKind::Definition, .. })
    ));
    assert!(factory.registry().names_for_type(&TypeToken::of::<u64>()).is_empty());
    assert_eq!(
        factory.registry().names_for_type(&TypeToken::of::<String>()),
        vec!["shared"]
    );
    assert_eq!(*factory.get_named::<String>("shared").unwrap(), "first");
}

#[test]
fn test_resolution_through_declared_ancestry() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(&factory, memory_repository());
    register(&factory, cache_store());

    let repository = factory.get_typed::<dyn Repository>().unwrap();
    assert_eq!(repository.find(1).as_deref(), Some("alice"));
    assert_eq!(repository.kind(), "memory");

    let kinds: Vec<&str> = factory
        .get_all::<dyn Store>()
        .unwrap()
        .iter()
        .map(|store| store.kind())
        .collect();
    assert_eq!(kinds, vec!["memory", "cache"]);

    match factory.get_typed::<dyn Store>() {
        Err(error) => assert_eq!(error.candidates().map(<[String]>::len), Some(2)),
        Ok(store) => panic!("expected ambiguity, got {}", store.kind()),
    }
}

struct Greeting {
    text: String,
}

#[test]
fn test_marked_constructor_and_method_injection() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(&factory, memory_repository());
    register(
        &factory,
        BeanDefinition::builder::<Greeting>("greeting")
            .default_constructor(|| Greeting {
                text: "default".to_string(),
            })
            .injected_constructor(
                "with_repository",
                vec![ParamDescriptor::required::<dyn Repository>()],
                |args| {
                    let repository = args.required::<dyn Repository>(0)?;
                    Ok(Greeting {
                        text: format!("hello {}", repository.find(1).unwrap_or_default()),
                    })
                },
            )
            .method(
                "decorate",
                vec![
                    ParamDescriptor::required::<dyn Repository>(),
                    ParamDescriptor::optional::<CacheStore>(),
                ],
                |greeting, args| {
                    if !args.is_present(1) {
                        greeting.text.push('!');
                    }
                    Ok(())
                },
            )
            .build(),
    );

    assert_eq!(factory.get_typed::<Greeting>().unwrap().text, "hello alice!");
}

#[test]
fn test_dependency_failure_propagates_unwrapped() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<A>("A")
            .constructor("new", vec![ParamDescriptor::required::<B>()], |args| {
                Ok(A {
                    b: args.required::<B>(0)?,
                })
            })
            .build(),
    );
    register(
        &factory,
        BeanDefinition::builder::<B>("B")
            .constructor("new", Vec::new(), |_| Err("connection refused".into()))
            .build(),
    );

    match factory.get("A").unwrap_err() {
        BeanError::BeanCreationFailure { name, source } => {
            assert_eq!(name, "B");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!factory.registry().is_in_creation("A"));
    assert!(!factory.registry().is_in_creation("B"));
}

#[test]
fn test_ambiguous_constructor_names_bean() {
    init_test_logger();
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<C>("C")
            .injected_constructor("first", Vec::new(), |_| Ok(C))
            .injected_constructor("second", Vec::new(), |_| Ok(C))
            .build(),
    );

    match factory.get("C").unwrap_err() {
        BeanError::DependencyInjectionFailure { bean, source, .. } => {
            assert_eq!(bean, "C");
            assert!(matches!(*source, BeanError::AmbiguousConstructor { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_bean_lookups() {
    init_test_logger();
    let factory = BeanFactory::new();
    assert!(matches!(
        factory.get("ghost"),
        Err(BeanError::NoSuchBeanDefinition { .. })
    ));
    assert!(matches!(
        factory.get_by_type(&TypeToken::of::<MemoryRepository>()),
        Err(BeanError::NoSuchBeanDefinition { .. })
    ));
    assert!(factory.type_of("ghost").is_none());
    assert!(factory.remove_bean_definition("ghost").is_err());
}
