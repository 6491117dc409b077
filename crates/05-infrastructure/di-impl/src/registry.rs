//! Bean 注册表
//!
//! 维护名称→定义、名称→单例、类型→名称集合三个索引，以及创建中集合。

use di_abstractions::{Bean, BeanDefinition, CreationPolicy};
use infrastructure_common::{BeanError, BeanResult, RegistrationKind, TypeToken};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 按注册顺序保存的定义表
#[derive(Default)]
struct DefinitionTable {
    by_name: HashMap<String, Arc<BeanDefinition>>,
    order: Vec<String>,
}

/// 按创建顺序保存的单例缓存
#[derive(Default)]
struct SingletonCache {
    by_name: HashMap<String, Bean>,
    order: Vec<String>,
}

/// Bean 注册表
#[derive(Default)]
pub struct BeanRegistry {
    definitions: RwLock<DefinitionTable>,
    singletons: RwLock<SingletonCache>,
    type_index: RwLock<HashMap<TypeToken, Vec<String>>>,
    in_creation: Mutex<HashMap<String, ThreadId>>,
    creation_finished: Condvar,
}

impl BeanRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Bean 定义并按祖先链建立类型索引
    pub fn register_definition(&self, name: &str, definition: Arc<BeanDefinition>) -> BeanResult<()> {
        if name.trim().is_empty() {
            return Err(BeanError::invalid_argument("Bean 名称不能为空"));
        }
        if definition.name() != name {
            return Err(BeanError::invalid_argument(format!(
                "注册名称 {name} 与定义名称 {} 不一致",
                definition.name()
            )));
        }

        let mut definitions = self.definitions.write();
        if definitions.by_name.contains_key(name) {
            return Err(BeanError::DuplicateRegistration {
                name: name.to_string(),
                kind: RegistrationKind::Definition,
            });
        }

        let tokens = definition.type_tokens();
        {
            let mut index = self.type_index.write();
            for token in tokens {
                let names = index.entry(*token).or_default();
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }

        info!(
            "注册 Bean 定义: {} ({}, {:?}, {} 个类型)",
            name,
            definition.bean_type(),
            definition.scope(),
            tokens.len()
        );
        definitions.by_name.insert(name.to_string(), definition);
        definitions.order.push(name.to_string());
        Ok(())
    }

    /// 移除 Bean 定义，同时清理类型索引与单例
    ///
    /// 创建中标记归正在创建的一方所有，由它的 [`CreationGuard`] 释放
    pub fn remove_definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        let removed = {
            let mut definitions = self.definitions.write();
            let removed = definitions.by_name.remove(name)?;
            definitions.order.retain(|existing| existing != name);
            removed
        };

        {
            let mut index = self.type_index.write();
            for token in removed.type_tokens() {
                if let Some(names) = index.get_mut(token) {
                    names.retain(|existing| existing != name);
                    if names.is_empty() {
                        index.remove(token);
                    }
                }
            }
        }

        self.remove_singleton(name);
        debug!("移除 Bean 定义: {}", name);
        Some(removed)
    }

    /// 获取 Bean 定义
    pub fn definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.definitions.read().by_name.get(name).cloned()
    }

    /// 是否包含定义
    pub fn contains_definition(&self, name: &str) -> bool {
        self.definitions.read().by_name.contains_key(name)
    }

    /// 全部定义名称（注册顺序）
    pub fn definition_names(&self) -> Vec<String> {
        self.definitions.read().order.clone()
    }

    /// 全部定义（注册顺序）
    pub fn definitions(&self) -> Vec<Arc<BeanDefinition>> {
        let definitions = self.definitions.read();
        definitions
            .order
            .iter()
            .filter_map(|name| definitions.by_name.get(name).cloned())
            .collect()
    }

    /// 定义数量
    pub fn definition_count(&self) -> usize {
        self.definitions.read().order.len()
    }

    /// 满足指定类型的全部名称（注册顺序）
    pub fn names_for_type(&self, token: &TypeToken) -> Vec<String> {
        self.type_index
            .read()
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// 生成指定 Bean 在某个类型下的视图
    pub fn view(&self, name: &str, token: &TypeToken, bean: &Bean) -> Option<Bean> {
        self.definition(name)?.view(token, bean)
    }

    /// 注册单例实例（只写一次）
    pub fn register_singleton(&self, name: &str, instance: Bean) -> BeanResult<()> {
        if name.trim().is_empty() {
            return Err(BeanError::invalid_argument("单例名称不能为空"));
        }
        let mut singletons = self.singletons.write();
        if singletons.by_name.contains_key(name) {
            return Err(BeanError::DuplicateRegistration {
                name: name.to_string(),
                kind: RegistrationKind::Singleton,
            });
        }
        singletons.by_name.insert(name.to_string(), instance);
        singletons.order.push(name.to_string());
        debug!("缓存单例: {}", name);
        Ok(())
    }

    /// 获取单例实例
    pub fn get_singleton(&self, name: &str) -> Option<Bean> {
        self.singletons.read().by_name.get(name).cloned()
    }

    /// 是否包含单例
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().by_name.contains_key(name)
    }

    /// 移除单例实例
    pub fn remove_singleton(&self, name: &str) -> Option<Bean> {
        let mut singletons = self.singletons.write();
        let removed = singletons.by_name.remove(name)?;
        singletons.order.retain(|existing| existing != name);
        Some(removed)
    }

    /// 全部单例名称（创建顺序）
    pub fn singleton_names(&self) -> Vec<String> {
        self.singletons.read().order.clone()
    }

    /// 单例数量
    pub fn singleton_count(&self) -> usize {
        self.singletons.read().order.len()
    }

    /// 标记名称为创建中，已在创建中时立即失败
    pub fn before_creation(&self, name: &str) -> BeanResult<()> {
        let mut in_creation = self.in_creation.lock();
        if in_creation.contains_key(name) {
            return Err(BeanError::circular(vec![name.to_string()]));
        }
        in_creation.insert(name.to_string(), thread::current().id());
        Ok(())
    }

    /// 清除创建中标记并唤醒等待者
    pub fn after_creation(&self, name: &str) {
        let removed = self.in_creation.lock().remove(name).is_some();
        if removed {
            self.creation_finished.notify_all();
        }
    }

    /// 是否处于创建中
    pub fn is_in_creation(&self, name: &str) -> bool {
        self.in_creation.lock().contains_key(name)
    }

    /// 当前线程是否还有尚未结束的创建（即处于某个外层创建之中）
    pub fn is_creating_on_current_thread(&self) -> bool {
        let current = thread::current().id();
        self.in_creation.lock().values().any(|owner| *owner == current)
    }

    /// 按策略进入创建区，返回的守卫在离开作用域时清除标记
    pub fn begin_creation(
        &self,
        name: &str,
        policy: CreationPolicy,
        timeout: Duration,
    ) -> BeanResult<CreationGuard<'_>> {
        if policy == CreationPolicy::FailFast {
            self.before_creation(name)?;
            return Ok(CreationGuard::new(self, name));
        }

        let current = thread::current().id();
        let deadline = Instant::now() + timeout;
        let mut in_creation = self.in_creation.lock();
        while let Some(&owner) = in_creation.get(name) {
            if owner == current {
                return Err(BeanError::circular(vec![name.to_string()]));
            }
            debug!("等待其他线程完成创建: {}", name);
            if self
                .creation_finished
                .wait_until(&mut in_creation, deadline)
                .timed_out()
                && in_creation.contains_key(name)
            {
                warn!("等待创建超时, 可能存在跨线程循环依赖: {}", name);
                return Err(BeanError::circular(vec![name.to_string()]));
            }
        }
        in_creation.insert(name.to_string(), current);
        Ok(CreationGuard::new(self, name))
    }

    /// 清空全部索引
    pub fn clear(&self) {
        let mut definitions = self.definitions.write();
        let mut index = self.type_index.write();
        let mut singletons = self.singletons.write();
        definitions.by_name.clear();
        definitions.order.clear();
        index.clear();
        singletons.by_name.clear();
        singletons.order.clear();
        self.in_creation.lock().clear();
        self.creation_finished.notify_all();
        info!("清空 Bean 注册表");
    }
}

impl std::fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("definitions", &self.definition_names())
            .field("singletons", &self.singleton_names())
            .field("in_creation", &self.in_creation.lock().len())
            .finish()
    }
}

/// 创建中标记守卫
///
/// 无论创建成功还是失败，离开作用域时都会清除标记
pub struct CreationGuard<'a> {
    registry: &'a BeanRegistry,
    name: String,
}

impl<'a> CreationGuard<'a> {
    fn new(registry: &'a BeanRegistry, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
        }
    }

    /// 守卫的 Bean 名称
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        self.registry.after_creation(&self.name);
    }
}
