//! Bean 工厂构建器

use crate::factory::BeanFactory;
use crate::logging::{init_logging, LoggingConfig};
use di_abstractions::{Bean, BeanDefinition, BeanPostProcessor, ContainerConfig};
use infrastructure_common::BeanResult;
use std::sync::Arc;
use tracing::{debug, info};

/// Bean 工厂构建器
///
/// 收集配置、定义、单例与后处理器，`build` 时按顺序注册，
/// 再根据配置执行循环依赖检测和单例预实例化。
#[derive(Default)]
pub struct BeanFactoryBuilder {
    config: ContainerConfig,
    definitions: Vec<BeanDefinition>,
    singletons: Vec<(String, Bean)>,
    processors: Vec<Arc<dyn BeanPostProcessor>>,
    logging: Option<LoggingConfig>,
}

impl BeanFactoryBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加 Bean 定义，以定义自身的名称注册
    pub fn definition(mut self, definition: BeanDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// 添加外部单例
    pub fn singleton(mut self, name: impl Into<String>, instance: Bean) -> Self {
        self.singletons.push((name.into(), instance));
        self
    }

    /// 添加后处理器
    pub fn post_processor(mut self, processor: Arc<dyn BeanPostProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// 构建时初始化日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 构建工厂
    pub fn build(self) -> BeanResult<BeanFactory> {
        // 只有在明确配置了日志时才初始化，测试中重复初始化会被忽略
        if let Some(logging) = &self.logging {
            if let Err(error) = init_logging(logging) {
                debug!("跳过日志初始化: {}", error);
            }
        }
        info!("开始构建 Bean 工厂");

        let factory = BeanFactory::with_config(self.config.clone());
        for processor in self.processors {
            factory.add_post_processor(processor);
        }
        let definition_count = self.definitions.len();
        for definition in self.definitions {
            let name = definition.name().to_string();
            factory.register_bean_definition(&name, definition)?;
        }
        for (name, instance) in self.singletons {
            factory.register_singleton(&name, instance)?;
        }

        if self.config.enable_circular_dependency_detection {
            factory.validate_dependencies()?;
        }
        if self.config.pre_instantiate_singletons {
            factory.pre_instantiate_singletons()?;
        }

        info!("构建 Bean 工厂完成, 注册了 {} 个 Bean 定义", definition_count);
        Ok(factory)
    }
}

impl std::fmt::Debug for BeanFactoryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactoryBuilder")
            .field("config", &self.config)
            .field("definitions", &self.definitions.len())
            .field("singletons", &self.singletons.len())
            .field("processors", &self.processors.len())
            .field("logging", &self.logging)
            .finish()
    }
}
