//! 生命周期处理器
//!
//! 以后处理器的形式执行启动和停止钩子。钩子挂在各自的定义上，
//! 元数据按 Bean 名称收集一次并缓存，定义被替换后重新收集。

use crate::registry::BeanRegistry;
use dashmap::DashMap;
use di_abstractions::{Bean, BeanDefinition, BeanPostProcessor, HookDescriptor};
use infrastructure_common::{BeanError, BeanResult, HookPhase};
use std::sync::Arc;
use tracing::{debug, trace};

/// 某个定义的生命周期钩子（祖先类型在前）
#[derive(Debug, Default)]
pub struct LifecycleMetadata {
    /// 启动钩子
    pub start: Vec<HookDescriptor>,
    /// 停止钩子
    pub stop: Vec<HookDescriptor>,
}

impl LifecycleMetadata {
    fn scan(definition: &BeanDefinition) -> Self {
        let (start, stop): (Vec<HookDescriptor>, Vec<HookDescriptor>) = definition
            .lifecycle_hooks()
            .iter()
            .cloned()
            .partition(|hook| hook.phase == HookPhase::Start);
        Self { start, stop }
    }

    /// 是否没有任何钩子
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.stop.is_empty()
    }
}

/// 生命周期处理器，在每个容器中第一个注册
pub struct LifecycleProcessor {
    registry: Arc<BeanRegistry>,
    metadata: DashMap<String, CachedHooks>,
}

struct CachedHooks {
    definition: Arc<BeanDefinition>,
    metadata: Arc<LifecycleMetadata>,
}

impl LifecycleProcessor {
    /// 创建处理器
    pub fn new(registry: Arc<BeanRegistry>) -> Self {
        Self {
            registry,
            metadata: DashMap::new(),
        }
    }

    /// 获取（必要时收集）某个 Bean 的钩子元数据
    ///
    /// 缓存项记录收集时的定义，同名 Bean 重新注册后不会沿用旧钩子
    pub fn metadata_for(&self, name: &str, definition: &Arc<BeanDefinition>) -> Arc<LifecycleMetadata> {
        if let Some(cached) = self.metadata.get(name) {
            if Arc::ptr_eq(&cached.definition, definition) {
                return Arc::clone(&cached.metadata);
            }
        }
        let scanned = Arc::new(LifecycleMetadata::scan(definition));
        trace!(
            "收集生命周期钩子: {} ({}, start {}, stop {})",
            name,
            definition.bean_type(),
            scanned.start.len(),
            scanned.stop.len()
        );
        self.metadata.insert(
            name.to_string(),
            CachedHooks {
                definition: Arc::clone(definition),
                metadata: Arc::clone(&scanned),
            },
        );
        scanned
    }

    /// 丢弃某个 Bean 的缓存元数据
    pub fn evict(&self, name: &str) {
        self.metadata.remove(name);
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.metadata.clear();
    }

    /// 已缓存元数据的 Bean 数量
    pub fn cached_count(&self) -> usize {
        self.metadata.len()
    }

    fn metadata_by_name(&self, name: &str) -> Option<(Arc<BeanDefinition>, Arc<LifecycleMetadata>)> {
        let definition = self.registry.definition(name)?;
        let metadata = self.metadata_for(name, &definition);
        Some((definition, metadata))
    }

    fn validate(definition: &BeanDefinition, hook: &HookDescriptor) -> BeanResult<()> {
        let reason = if hook.is_static {
            "生命周期方法不能是静态方法".to_string()
        } else if hook.parameter_count > 0 {
            format!("生命周期方法不能有参数, 声明了 {} 个", hook.parameter_count)
        } else {
            return Ok(());
        };
        Err(BeanError::InvalidLifecycleMethod {
            type_name: definition.bean_type().name.to_string(),
            method: hook.name.clone(),
            reason,
        })
    }

    fn run(definition: &BeanDefinition, hook: &HookDescriptor, bean: &Bean, name: &str) -> BeanResult<()> {
        Self::validate(definition, hook)?;
        debug!("执行{}钩子: {}::{}", hook.phase, name, hook.name);
        hook.invoke(&**bean)
            .map_err(|error| BeanError::from_user(name, error))
    }
}

impl std::fmt::Debug for LifecycleProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleProcessor")
            .field("cached_beans", &self.metadata.len())
            .finish_non_exhaustive()
    }
}

impl BeanPostProcessor for LifecycleProcessor {
    fn after_init(&self, bean: Bean, name: &str) -> BeanResult<Bean> {
        let Some((definition, metadata)) = self.metadata_by_name(name) else {
            return Ok(bean);
        };
        for hook in &metadata.start {
            Self::run(&definition, hook, &bean, name)?;
        }
        Ok(bean)
    }

    fn before_destruction(&self, bean: &Bean, name: &str) -> Vec<BeanError> {
        let Some((definition, metadata)) = self.metadata_by_name(name) else {
            return Vec::new();
        };
        metadata
            .stop
            .iter()
            .filter_map(|hook| Self::run(&definition, hook, bean, name).err())
            .collect()
    }

    fn name(&self) -> &str {
        "LifecycleProcessor"
    }

    fn order(&self) -> i32 {
        i32::MIN
    }
}
