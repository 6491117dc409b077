//! 容器配置与统计信息

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 并发创建同名 Bean 时的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationPolicy {
    /// 其他线程等待首个创建者完成后读取缓存；同一线程重入视为循环依赖
    #[default]
    BlockAndWait,
    /// 名称处于创建中时立即失败
    FailFast,
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 构建容器时是否执行循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 构建容器时是否预先创建非延迟单例
    pub pre_instantiate_singletons: bool,
    /// 并发创建策略
    pub creation_policy: CreationPolicy,
    /// 等待其他线程完成创建的超时时间（毫秒）
    pub creation_wait_timeout_ms: u64,
}

impl ContainerConfig {
    /// 等待超时时间
    pub fn creation_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.creation_wait_timeout_ms)
    }

    /// 设置并发创建策略
    pub fn with_creation_policy(mut self, policy: CreationPolicy) -> Self {
        self.creation_policy = policy;
        self
    }

    /// 设置等待超时时间
    pub fn with_creation_wait_timeout(mut self, timeout: Duration) -> Self {
        self.creation_wait_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 设置是否预先创建单例
    pub fn with_pre_instantiation(mut self, enabled: bool) -> Self {
        self.pre_instantiate_singletons = enabled;
        self
    }

    /// 设置是否执行循环依赖检测
    pub fn with_circular_dependency_detection(mut self, enabled: bool) -> Self {
        self.enable_circular_dependency_detection = enabled;
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            pre_instantiate_singletons: false,
            creation_policy: CreationPolicy::BlockAndWait,
            creation_wait_timeout_ms: 5000,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 已注册定义数量
    pub registered_definitions: usize,
    /// 已缓存单例数量
    pub cached_singletons: usize,
    /// 成功创建的实例数量（含原型）
    pub created_instances: usize,
    /// 创建失败次数
    pub creation_failures: usize,
    /// 销毁阶段被吞掉的错误数量
    pub destroy_failures: usize,
}
