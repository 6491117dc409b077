//! 错误类型定义

use thiserror::Error;

/// 用户代码（构造函数、setter、生命周期钩子）返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 容器错误类型
#[derive(Error, Debug)]
pub enum BeanError {
    #[error("参数无效: {message}")]
    InvalidArgument { message: String },

    #[error("找不到 Bean 定义: {target}")]
    NoSuchBeanDefinition { target: String },

    #[error("Bean 不唯一: {target}, 候选: {candidates:?}")]
    AmbiguousBean {
        target: String,
        candidates: Vec<String>,
    },

    #[error("重复注册{kind}: {name}")]
    DuplicateRegistration { name: String, kind: RegistrationKind },

    #[error("依赖注入失败: {bean}.{member} 的 {injection_point} ({type_name}), 原因: {source}")]
    DependencyInjectionFailure {
        bean: String,
        member: String,
        injection_point: String,
        type_name: String,
        #[source]
        source: Box<BeanError>,
    },

    #[error("存在多个标记为注入点的构造函数: {type_name} {constructors:?}")]
    AmbiguousConstructor {
        type_name: String,
        constructors: Vec<String>,
    },

    #[error("生命周期方法无效: {type_name}::{method}, 原因: {reason}")]
    InvalidLifecycleMethod {
        type_name: String,
        method: String,
        reason: String,
    },

    #[error("检测到循环依赖: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("Bean 创建失败: {name}, 原因: {source}")]
    BeanCreationFailure {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("Bean 类型不匹配: {name}, 期望 {expected}")]
    TypeMismatch { name: String, expected: String },
}

/// 重复注册的对象种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    /// Bean 定义
    Definition,
    /// 单例实例
    Singleton,
}

impl std::fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition => f.write_str("Bean 定义"),
            Self::Singleton => f.write_str("单例"),
        }
    }
}

impl BeanError {
    /// 创建参数无效错误
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// 创建找不到定义错误
    pub fn no_such_bean(target: impl Into<String>) -> Self {
        Self::NoSuchBeanDefinition {
            target: target.into(),
        }
    }

    /// 创建循环依赖错误
    pub fn circular(path: Vec<String>) -> Self {
        Self::CircularDependency { path }
    }

    /// 将用户代码返回的错误转换为容器错误
    ///
    /// 用户代码透传出来的 `BeanError` 原样返回，其余错误包装为 `BeanCreationFailure`
    pub fn from_user(name: &str, error: BoxError) -> Self {
        match error.downcast::<BeanError>() {
            Ok(bean_error) => *bean_error,
            Err(other) => Self::BeanCreationFailure {
                name: name.to_string(),
                source: other,
            },
        }
    }

    /// 是否为创建失败包装
    pub fn is_creation_failure(&self) -> bool {
        matches!(self, Self::BeanCreationFailure { .. })
    }

    /// 循环依赖路径（仅循环依赖错误）
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularDependency { path } => Some(path),
            _ => None,
        }
    }

    /// 歧义候选列表（仅歧义错误）
    pub fn candidates(&self) -> Option<&[String]> {
        match self {
            Self::AmbiguousBean { candidates, .. } => Some(candidates),
            _ => None,
        }
    }
}

/// 结果类型别名
pub type BeanResult<T> = Result<T, BeanError>;
