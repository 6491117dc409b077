//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义 Bean 定义模型和容器扩展点。
//!
//! ## 核心接口
//!
//! - [`BeanDefinition`] - Bean 定义及其构建器
//! - [`BeanPostProcessor`] - 初始化前后的扩展点
//! - [`BeanProvider`] - 注入器回调容器的接口
//! - [`ContainerConfig`] - 容器配置

pub mod container;
pub mod definition;
pub mod processor;
pub mod resolver;

pub use container::*;
pub use definition::*;
pub use processor::*;
pub use resolver::*;
