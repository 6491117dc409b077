//! Bean 工厂
//!
//! 编排一次 Bean 创建的完整流程：
//!
//! ```text
//! Registered -> InCreation -> Instantiated -> Populated -> Initialized -> Cached
//!                    \______________________ Failed ______________________/
//! ```
//!
//! 原型作用域在 `Initialized` 之后直接返回，不进入缓存。无论成功失败，
//! 创建中标记都由 [`CreationGuard`](crate::registry::CreationGuard) 释放。

use crate::detector::{CircularDependencyDetector, DependencyNode};
use crate::injector::{
    ConstructorInjector, DependencyResolver, FieldInjector, MethodInjector,
};
use crate::lifecycle::LifecycleProcessor;
use crate::registry::BeanRegistry;
use di_abstractions::{
    view_as, Bean, BeanDefinition, BeanPostProcessor, BeanProvider, ContainerConfig,
    ContainerStats,
};
use infrastructure_common::{BeanError, BeanResult, CreationState, TypeToken};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct FactoryCounters {
    created: AtomicUsize,
    creation_failures: AtomicUsize,
    destroy_failures: AtomicUsize,
}

/// Bean 工厂
pub struct BeanFactory {
    registry: Arc<BeanRegistry>,
    config: ContainerConfig,
    processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    lifecycle: Arc<LifecycleProcessor>,
    constructor_injector: ConstructorInjector,
    field_injector: FieldInjector,
    method_injector: MethodInjector,
    counters: FactoryCounters,
    closed: AtomicBool,
}

impl BeanFactory {
    /// 使用默认配置创建工厂
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建工厂，生命周期处理器总是第一个后处理器
    pub fn with_config(config: ContainerConfig) -> Self {
        let registry = Arc::new(BeanRegistry::new());
        let lifecycle = Arc::new(LifecycleProcessor::new(Arc::clone(&registry)));
        let first: Arc<dyn BeanPostProcessor> = lifecycle.clone();
        info!("创建 Bean 工厂, 并发策略: {:?}", config.creation_policy);
        Self {
            registry,
            config,
            processors: RwLock::new(vec![first]),
            lifecycle,
            constructor_injector: ConstructorInjector::new(),
            field_injector: FieldInjector::new(),
            method_injector: MethodInjector::new(),
            counters: FactoryCounters::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// 注册表
    pub fn registry(&self) -> &Arc<BeanRegistry> {
        &self.registry
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    // ---- 注册 ----

    /// 注册 Bean 定义
    pub fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> BeanResult<()> {
        self.registry.register_definition(name, Arc::new(definition))
    }

    /// 注册外部创建的单例实例
    pub fn register_singleton(&self, name: &str, instance: Bean) -> BeanResult<()> {
        self.registry.register_singleton(name, instance)?;
        info!("注册外部单例: {}", name);
        Ok(())
    }

    /// 追加后处理器（排在已注册的处理器之后）
    pub fn add_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        info!(
            "注册后处理器: {} (order {})",
            processor.name(),
            processor.order()
        );
        self.processors.write().push(processor);
    }

    /// 后处理器数量（含生命周期处理器）
    pub fn post_processor_count(&self) -> usize {
        self.processors.read().len()
    }

    /// 移除 Bean 定义；已缓存的单例先按销毁流程处理
    pub fn remove_bean_definition(&self, name: &str) -> BeanResult<Arc<BeanDefinition>> {
        self.destroy(name);
        let removed = self
            .registry
            .remove_definition(name)
            .ok_or_else(|| BeanError::no_such_bean(name))?;
        self.lifecycle.evict(name);
        info!("移除 Bean 定义: {}", name);
        Ok(removed)
    }

    // ---- 查询 ----

    /// 按名称获取 Bean，必要时创建
    ///
    /// 失败只在最外层调用处计数一次，依赖链上的每一层不重复计数
    pub fn get(&self, name: &str) -> BeanResult<Bean> {
        if let Some(bean) = self.registry.get_singleton(name) {
            return Ok(bean);
        }
        let definition = self
            .registry
            .definition(name)
            .ok_or_else(|| BeanError::no_such_bean(name))?;

        self.create(&definition).map_err(|error| {
            if !self.registry.is_creating_on_current_thread() {
                self.counters.creation_failures.fetch_add(1, Ordering::Relaxed);
            }
            debug!("Bean {} 状态: {:?}, 原因: {}", name, CreationState::Failed, error);
            error
        })
    }

    /// 按类型获取唯一的 Bean
    pub fn get_by_type(&self, token: &TypeToken) -> BeanResult<Bean> {
        let name = self.unique_name_for(token)?;
        self.get(&name)
    }

    /// 按类型获取唯一的 Bean，返回该类型的 `Arc`
    pub fn get_typed<T: ?Sized + 'static>(&self) -> BeanResult<Arc<T>> {
        let token = TypeToken::of::<T>();
        let name = self.unique_name_for(&token)?;
        self.get_named::<T>(&name)
    }

    /// 按名称获取 Bean 在类型 `T` 下的视图
    ///
    /// 定义无法转换的实例（后处理器返回的包装对象、没有定义的外部单例）
    /// 只有本身就是 `T` 的视图时才能这样读取
    pub fn get_named<T: ?Sized + 'static>(&self, name: &str) -> BeanResult<Arc<T>> {
        let bean = self.get(name)?;
        let token = TypeToken::of::<T>();
        let view = match self.registry.definition(name) {
            Some(definition) => definition.view(&token, &bean).unwrap_or(bean),
            None => bean,
        };
        view_as::<T>(&view)
            .ok_or_else(|| BeanError::TypeMismatch {
                name: name.to_string(),
                expected: token.name.to_string(),
            })
    }

    /// 满足类型 `T` 的全部 Bean（注册顺序）
    pub fn get_all<T: ?Sized + 'static>(&self) -> BeanResult<Vec<Arc<T>>> {
        let token = TypeToken::of::<T>();
        self.registry
            .names_for_type(&token)
            .iter()
            .map(|name| self.get_named::<T>(name))
            .collect()
    }

    /// 是否存在定义或单例
    pub fn contains_bean(&self, name: &str) -> bool {
        self.registry.contains_definition(name) || self.registry.contains_singleton(name)
    }

    /// 是否为单例；只有实例没有定义的外部单例也算单例
    pub fn is_singleton(&self, name: &str) -> BeanResult<bool> {
        match self.registry.definition(name) {
            Some(definition) => Ok(definition.is_singleton()),
            None if self.registry.contains_singleton(name) => Ok(true),
            None => Err(BeanError::no_such_bean(name)),
        }
    }

    /// 是否为原型
    pub fn is_prototype(&self, name: &str) -> BeanResult<bool> {
        self.is_singleton(name).map(|singleton| !singleton)
    }

    /// 声明类型
    pub fn type_of(&self, name: &str) -> Option<TypeToken> {
        self.registry
            .definition(name)
            .map(|definition| definition.bean_type())
    }

    fn unique_name_for(&self, token: &TypeToken) -> BeanResult<String> {
        let mut names = self.registry.names_for_type(token);
        match names.len() {
            0 => Err(BeanError::no_such_bean(token.name)),
            1 => Ok(names.remove(0)),
            _ => Err(BeanError::AmbiguousBean {
                target: token.name.to_string(),
                candidates: names,
            }),
        }
    }

    // ---- 创建 ----

    fn create(&self, definition: &BeanDefinition) -> BeanResult<Bean> {
        let name = definition.name();
        debug!("Bean {} 状态: {:?}", name, CreationState::Registered);

        let _guard = self.registry.begin_creation(
            name,
            self.config.creation_policy,
            self.config.creation_wait_timeout(),
        )?;
        if definition.is_singleton() {
            // 等待期间可能已由其他线程创建完成
            if let Some(bean) = self.registry.get_singleton(name) {
                return Ok(bean);
            }
        }
        debug!("Bean {} 状态: {:?}", name, CreationState::InCreation);

        for dependency in definition.depends_on() {
            self.create_prerequisite(name, dependency)?;
        }

        let resolver = DependencyResolver::new(&self.registry, Some(self));
        let mut raw = self.constructor_injector.instantiate(definition, &resolver)?;
        debug!("Bean {} 状态: {:?}", name, CreationState::Instantiated);

        self.field_injector.inject(definition, raw.as_mut(), &resolver)?;
        self.method_injector.inject(definition, raw.as_mut(), &resolver)?;
        debug!("Bean {} 状态: {:?}", name, CreationState::Populated);

        let bean = self.apply_post_processors(Bean::from(raw), name)?;
        debug!("Bean {} 状态: {:?}", name, CreationState::Initialized);

        if definition.is_singleton() {
            self.registry.register_singleton(name, Arc::clone(&bean))?;
            debug!("Bean {} 状态: {:?}", name, CreationState::Cached);
        }
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        Ok(bean)
    }

    fn create_prerequisite(&self, name: &str, dependency: &str) -> BeanResult<()> {
        if !self.contains_bean(dependency) {
            return Err(BeanError::DependencyInjectionFailure {
                bean: name.to_string(),
                member: dependency.to_string(),
                injection_point: "前置 Bean".to_string(),
                type_name: dependency.to_string(),
                source: Box::new(BeanError::no_such_bean(dependency)),
            });
        }
        self.get(dependency).map(|_| ())
    }

    fn apply_post_processors(&self, bean: Bean, name: &str) -> BeanResult<Bean> {
        let processors = self.processors.read().clone();

        let mut current = bean;
        for processor in &processors {
            current = processor
                .before_init(current, name)
                .map_err(|error| processor_failure(error, name))?;
        }
        for processor in &processors {
            current = processor
                .after_init(current, name)
                .map_err(|error| processor_failure(error, name))?;
        }
        Ok(current)
    }

    /// 预先创建全部非延迟单例（注册顺序，`depends_on` 优先），返回本次创建的数量
    pub fn pre_instantiate_singletons(&self) -> BeanResult<usize> {
        let mut created = 0;
        for definition in self.registry.definitions() {
            if !definition.is_singleton() || definition.is_lazy_init() {
                continue;
            }
            if self.registry.contains_singleton(definition.name()) {
                continue;
            }
            self.get(definition.name())?;
            created += 1;
        }
        info!("预实例化单例完成: {} 个", created);
        Ok(created)
    }

    // ---- 依赖检查 ----

    /// 检测全部定义的循环依赖，存在循环时返回第一个循环
    pub fn validate_dependencies(&self) -> BeanResult<()> {
        let cycles = self.detect_circular_dependencies();
        match cycles.into_iter().next() {
            Some(first) => Err(BeanError::circular(first)),
            None => {
                info!("依赖验证通过: {} 个 Bean 定义", self.registry.definition_count());
                Ok(())
            }
        }
    }

    /// 从指定 Bean 出发是否可达循环依赖
    pub fn has_circular_dependency(&self, name: &str) -> bool {
        CircularDependencyDetector::new(&self.registry).has_circular_dependency(name)
    }

    /// 全部循环依赖路径
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<String>> {
        CircularDependencyDetector::new(&self.registry).detect_circular_dependencies()
    }

    /// 当前的静态依赖图
    pub fn dependency_graph(&self) -> Vec<DependencyNode> {
        CircularDependencyDetector::new(&self.registry).dependency_graph()
    }

    // ---- 销毁 ----

    /// 销毁单例：执行销毁前处理后移出缓存，返回是否存在该单例
    ///
    /// 销毁阶段的错误只记录日志和计数，不会传播
    pub fn destroy(&self, name: &str) -> bool {
        let Some(bean) = self.registry.get_singleton(name) else {
            return false;
        };

        let processors = self.processors.read().clone();
        for processor in &processors {
            for failure in processor.before_destruction(&bean, name) {
                self.counters.destroy_failures.fetch_add(1, Ordering::Relaxed);
                error!("销毁 Bean 失败: {} ({}), 原因: {}", name, processor.name(), failure);
            }
        }

        self.registry.remove_singleton(name);
        debug!("销毁单例: {}", name);
        true
    }

    /// 按创建顺序的逆序销毁全部单例
    pub fn destroy_all(&self) {
        let names = self.registry.singleton_names();
        let destroyed = names
            .iter()
            .rev()
            .filter(|name| self.destroy(name))
            .count();
        info!("销毁全部单例: {} 个", destroyed);
    }

    /// 关闭容器：销毁全部单例并清空注册表，重复调用无副作用
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.destroy_all();
        self.registry.clear();
        self.lifecycle.clear();
        info!("Bean 工厂已关闭");
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 统计信息快照
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            registered_definitions: self.registry.definition_count(),
            cached_singletons: self.registry.singleton_count(),
            created_instances: self.counters.created.load(Ordering::Relaxed),
            creation_failures: self.counters.creation_failures.load(Ordering::Relaxed),
            destroy_failures: self.counters.destroy_failures.load(Ordering::Relaxed),
        }
    }
}

/// 后处理器返回的已是容器错误，原样传播
fn processor_failure(error: BeanError, name: &str) -> BeanError {
    warn!("后处理器处理 Bean 失败: {}, 原因: {}", name, error);
    error
}

impl Default for BeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanProvider for BeanFactory {
    fn get_bean(&self, name: &str) -> BeanResult<Bean> {
        self.get(name)
    }
}

impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactory")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("post_processors", &self.post_processor_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
