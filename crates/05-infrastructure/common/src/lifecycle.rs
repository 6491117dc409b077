//! Bean 作用域与生命周期状态

use serde::{Deserialize, Serialize};

/// Bean 作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 单例模式 - 容器生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 原型模式 - 每次请求都创建新实例
    Prototype,
}

impl Scope {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

/// 单次创建尝试的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    /// 已注册定义
    Registered,
    /// 创建中（已加入创建中集合）
    InCreation,
    /// 已实例化
    Instantiated,
    /// 已完成字段与方法注入
    Populated,
    /// 已执行初始化后处理
    Initialized,
    /// 已放入单例缓存
    Cached,
    /// 创建失败
    Failed,
}

/// 生命周期钩子阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// 初始化后执行
    Start,
    /// 销毁前执行
    Stop,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}
