//! 生命周期与后处理器的集成测试

mod common;

use common::{init_test_logger, register, EventLog};
use di_abstractions::{Bean, BeanDefinition, BeanPostProcessor, ContainerConfig, ParamDescriptor};
use di_impl::{BeanFactory, BeanFactoryBuilder};
use infrastructure_common::{BeanError, BeanResult};
use std::sync::Arc;

trait Service: Send + Sync {
    fn label(&self) -> String;
}

struct Worker {
    label: String,
    log: EventLog,
}

impl Service for Worker {
    fn label(&self) -> String {
        self.label.clone()
    }
}

fn worker_definition(name: &'static str, log: &EventLog) -> BeanDefinition {
    let constructor_log = log.clone();
    let start_log = log.clone();
    let stop_log = log.clone();
    BeanDefinition::builder::<Worker>(name)
        .constructor("new", Vec::new(), move |_| {
            Ok(Worker {
                label: name.to_string(),
                log: constructor_log.clone(),
            })
        })
        .provides::<dyn Service, _>(|worker| worker as Arc<dyn Service>)
        .on_start("start", move |worker| {
            start_log.record(format!("start:{}", worker.label));
            Ok(())
        })
        .on_stop("stop", move |worker| {
            stop_log.record(format!("stop:{}", worker.label));
            Ok(())
        })
        .build()
}

#[test]
fn test_start_hook_runs_on_get_and_stop_hook_on_destroy() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("worker", &log));

    let worker = factory.get_named::<Worker>("worker").unwrap();
    assert_eq!(log.events(), vec!["start:worker"]);
    assert_eq!(worker.log.events(), log.events());

    assert!(factory.destroy("worker"));
    assert_eq!(log.events(), vec!["start:worker", "stop:worker"]);
    assert!(!factory.registry().contains_singleton("worker"));
    assert!(!factory.destroy("worker"));
}

struct Consumer;

trait Managed: Send + Sync {}

impl Managed for Consumer {}

#[test]
fn test_destroy_all_runs_in_reverse_creation_order() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("first", &log));
    register(&factory, worker_definition("second", &log));
    let consumer_log = log.clone();
    register(
        &factory,
        BeanDefinition::builder::<Consumer>("consumer")
            .constructor("new", Vec::new(), |_| Ok(Consumer))
            .depends_on("second")
            .depends_on("first")
            .on_stop("stop", move |_| {
                consumer_log.record("stop:consumer");
                Ok(())
            })
            .build(),
    );

    factory.get("consumer").unwrap();
    assert_eq!(
        factory.registry().singleton_names(),
        vec!["second", "first", "consumer"]
    );

    log.clear();
    factory.destroy_all();
    assert_eq!(
        log.events(),
        vec!["stop:consumer", "stop:first", "stop:second"]
    );
    assert_eq!(factory.stats().cached_singletons, 0);
}

#[test]
fn test_ancestor_hooks_run_before_own_hooks() {
    init_test_logger();
    let log = EventLog::new();
    let (base_log, own_log) = (log.clone(), log.clone());
    let factory = BeanFactory::new();
    register(
        &factory,
        BeanDefinition::builder::<Consumer>("consumer")
            .constructor("new", Vec::new(), |_| Ok(Consumer))
            .on_start("own", move |_| {
                own_log.record("own");
                Ok(())
            })
            .provides_with::<dyn Managed, _, _>(
                |consumer| consumer as Arc<dyn Managed>,
                |node| {
                    node.on_start("base", move |_| {
                        base_log.record("base");
                        Ok(())
                    })
                },
            )
            .build(),
    );

    factory.get("consumer").unwrap();
    assert_eq!(log.events(), vec!["base", "own"]);
}

/// 记录调用顺序，并把 `greeter` 替换为包装后的实例
struct Decorator {
    id: &'static str,
    log: EventLog,
}

impl BeanPostProcessor for Decorator {
    fn before_init(&self, bean: Bean, name: &str) -> BeanResult<Bean> {
        self.log.record(format!("{}.before:{name}", self.id));
        Ok(bean)
    }

    fn after_init(&self, bean: Bean, name: &str) -> BeanResult<Bean> {
        self.log.record(format!("{}.after:{name}", self.id));
        if name != "greeter" {
            return Ok(bean);
        }
        let Some(worker) = bean.downcast_ref::<Worker>() else {
            return Ok(bean);
        };
        let wrapped: Arc<dyn Service> = Arc::new(Worker {
            label: format!("{}({})", self.id, worker.label),
            log: worker.log.clone(),
        });
        Ok(di_abstractions::into_view(wrapped))
    }

    fn name(&self) -> &str {
        self.id
    }
}

#[test]
fn test_post_processors_run_in_registration_order_and_replace_bean() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactoryBuilder::new()
        .definition(worker_definition("greeter", &log))
        .post_processor(Arc::new(Decorator {
            id: "p1",
            log: log.clone(),
        }))
        .post_processor(Arc::new(Decorator {
            id: "p2",
            log: log.clone(),
        }))
        .build()
        .unwrap();
    assert_eq!(factory.post_processor_count(), 3);

    let raw = factory.get("greeter").unwrap();
    assert_eq!(
        log.events(),
        vec![
            "p1.before:greeter",
            "p2.before:greeter",
            "start:greeter",
            "p1.after:greeter",
            "p2.after:greeter",
        ]
    );

    // 被替换后缓存的是包装对象
    assert!(raw.downcast_ref::<Worker>().is_none());
    let service = factory.get_named::<dyn Service>("greeter").unwrap();
    assert_eq!(service.label(), "p1(greeter)");
    assert!(Arc::ptr_eq(&raw, &factory.get("greeter").unwrap()));
}

struct Failing;

impl BeanPostProcessor for Failing {
    fn after_init(&self, _bean: Bean, _name: &str) -> BeanResult<Bean> {
        Err(BeanError::no_such_bean("auditLog"))
    }
}

#[test]
fn test_post_processor_error_propagates_unchanged() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("worker", &log));
    factory.add_post_processor(Arc::new(Failing));

    match factory.get("worker").unwrap_err() {
        BeanError::NoSuchBeanDefinition { target } => assert_eq!(target, "auditLog"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!factory.registry().contains_singleton("worker"));
    assert_eq!(factory.stats().creation_failures, 1);
}

struct Client {
    service: Arc<dyn Service>,
}

#[test]
fn test_replaced_bean_is_injected_into_dependents() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactoryBuilder::new()
        .definition(worker_definition("greeter", &log))
        .definition(
            BeanDefinition::builder::<Client>("client")
                .constructor("new", vec![ParamDescriptor::required::<dyn Service>()], |args| {
                    Ok(Client {
                        service: args.required::<dyn Service>(0)?,
                    })
                })
                .build(),
        )
        .post_processor(Arc::new(Decorator {
            id: "proxy",
            log: log.clone(),
        }))
        .build()
        .unwrap();

    let client = factory.get_named::<Client>("client").unwrap();
    assert_eq!(client.service.label(), "proxy(greeter)");
    let direct = factory.get_named::<dyn Service>("greeter").unwrap();
    assert!(Arc::ptr_eq(&client.service, &direct));
}

#[test]
fn test_same_type_definitions_run_their_own_hooks() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("primary", &log));
    register(&factory, worker_definition("backup", &log));

    factory.get("primary").unwrap();
    factory.get("backup").unwrap();
    assert_eq!(log.events(), vec!["start:primary", "start:backup"]);
}

#[test]
fn test_reregistered_definition_uses_new_hooks() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("worker", &log));
    factory.get("worker").unwrap();
    factory.remove_bean_definition("worker").unwrap();

    let replacement_log = log.clone();
    register(
        &factory,
        BeanDefinition::builder::<Worker>("worker")
            .constructor("new", Vec::new(), {
                let log = log.clone();
                move |_| {
                    Ok(Worker {
                        label: "worker".into(),
                        log: log.clone(),
                    })
                }
            })
            .on_start("warm_up", move |_| {
                replacement_log.record("warm_up");
                Ok(())
            })
            .build(),
    );
    factory.get("worker").unwrap();
    assert_eq!(log.events(), vec!["start:worker", "stop:worker", "warm_up"]);
}

#[test]
fn test_stop_hook_failures_are_swallowed_and_counted() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("healthy", &log));
    register(
        &factory,
        BeanDefinition::builder::<Consumer>("broken")
            .constructor("new", Vec::new(), |_| Ok(Consumer))
            .on_stop("stop", |_| Err("socket already closed".into()))
            .build(),
    );

    factory.get("healthy").unwrap();
    factory.get("broken").unwrap();
    factory.destroy_all();

    assert!(log.events().contains(&"stop:healthy".to_string()));
    let stats = factory.stats();
    assert_eq!(stats.destroy_failures, 1);
    assert_eq!(stats.cached_singletons, 0);
}

#[test]
fn test_pre_instantiation_respects_lazy_and_depends_on() {
    init_test_logger();
    let log = EventLog::new();
    let lazy_log = log.clone();
    let factory = BeanFactoryBuilder::new()
        .with_config(ContainerConfig::default().with_pre_instantiation(true))
        .definition(
            BeanDefinition::builder::<Consumer>("consumer")
                .constructor("new", Vec::new(), |_| Ok(Consumer))
                .depends_on("backend")
                .build(),
        )
        .definition(worker_definition("backend", &log))
        .definition(
            BeanDefinition::builder::<Worker>("lazy")
                .lazy_init(true)
                .constructor("new", Vec::new(), move |_| {
                    lazy_log.record("lazy created");
                    Ok(Worker {
                        label: "lazy".into(),
                        log: lazy_log.clone(),
                    })
                })
                .build(),
        )
        .definition(
            BeanDefinition::builder::<Worker>("proto")
                .prototype()
                .constructor("new", Vec::new(), |_| Err("never created eagerly".into()))
                .build(),
        )
        .build()
        .unwrap();

    assert_eq!(factory.registry().singleton_names(), vec!["backend", "consumer"]);
    assert_eq!(log.events(), vec!["start:backend"]);
    assert_eq!(factory.pre_instantiate_singletons().unwrap(), 0);

    factory.get("lazy").unwrap();
    assert!(log.events().contains(&"lazy created".to_string()));
}

#[test]
fn test_remove_definition_destroys_singleton_first() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("worker", &log));
    factory.get("worker").unwrap();

    let removed = factory.remove_bean_definition("worker").unwrap();
    assert_eq!(removed.name(), "worker");
    assert_eq!(log.events(), vec!["start:worker", "stop:worker"]);
    assert!(!factory.contains_bean("worker"));
    assert!(factory.get_all::<dyn Service>().unwrap().is_empty());
}

#[test]
fn test_close_runs_stop_hooks_once() {
    init_test_logger();
    let log = EventLog::new();
    let factory = BeanFactory::new();
    register(&factory, worker_definition("worker", &log));
    register(
        &factory,
        BeanDefinition::builder::<Consumer>("user")
            .constructor("new", vec![ParamDescriptor::required::<dyn Service>()], |args| {
                args.required::<dyn Service>(0)?;
                Ok(Consumer)
            })
            .build(),
    );
    factory.get("user").unwrap();

    factory.close();
    factory.close();
    assert_eq!(log.events(), vec!["start:worker", "stop:worker"]);
    assert!(factory.is_closed());
    assert_eq!(factory.stats().registered_definitions, 0);
}
