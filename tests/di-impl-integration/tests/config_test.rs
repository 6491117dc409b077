//! 容器配置的集成测试

mod common;

use common::init_test_logger;
use di_abstractions::{BeanDefinition, ContainerConfig, CreationPolicy};
use di_impl::{BeanFactoryBuilder, LoggingConfig};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_config_deserializes_from_host_document() -> anyhow::Result<()> {
    let document = json!({
        "container": {
            "enable_circular_dependency_detection": false,
            "pre_instantiate_singletons": true,
            "creation_policy": "fail_fast",
            "creation_wait_timeout_ms": 1500
        }
    });

    let config: ContainerConfig = serde_json::from_value(document["container"].clone())?;
    assert!(!config.enable_circular_dependency_detection);
    assert!(config.pre_instantiate_singletons);
    assert_eq!(config.creation_policy, CreationPolicy::FailFast);
    assert_eq!(config.creation_wait_timeout(), Duration::from_millis(1500));
    Ok(())
}

#[test]
fn test_config_round_trip_keeps_defaults() -> anyhow::Result<()> {
    let config: ContainerConfig = serde_json::from_str("{}")?;
    assert_eq!(config, ContainerConfig::default());

    let text = serde_json::to_string(&config)?;
    assert!(text.contains("\"block_and_wait\""));
    let back: ContainerConfig = serde_json::from_str(&text)?;
    assert_eq!(back, config);
    Ok(())
}

#[test]
fn test_unknown_policy_is_rejected() {
    let result = serde_json::from_str::<ContainerConfig>(r#"{ "creation_policy": "retry" }"#);
    assert!(result.is_err());
}

#[derive(Default)]
struct Cache;

#[test]
fn test_builder_applies_config() -> anyhow::Result<()> {
    init_test_logger();
    let config: ContainerConfig =
        serde_json::from_str(r#"{ "pre_instantiate_singletons": true }"#)?;

    let factory = BeanFactoryBuilder::new()
        .with_config(config)
        .with_logging(LoggingConfig::default())
        .definition(
            BeanDefinition::builder::<Cache>("cache")
                .default_constructor(Cache::default)
                .description("进程内缓存")
                .build(),
        )
        .build()?;

    assert_eq!(factory.config().creation_policy, CreationPolicy::BlockAndWait);
    assert!(factory.registry().contains_singleton("cache"));
    assert_eq!(
        factory.registry().definition("cache").and_then(|d| d.description().map(str::to_string)),
        Some("进程内缓存".to_string())
    );

    let stats = factory.stats();
    assert_eq!(stats.registered_definitions, 1);
    assert_eq!(stats.created_instances, 1);
    Ok(())
}
