//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn IoC 容器各层共用的基础类型。
//!
//! ## 核心类型
//!
//! - [`BeanError`] - 容器错误分类
//! - [`TypeToken`] - 类型令牌，用声明代替运行时反射
//! - [`Scope`] - Bean 作用域
//! - [`CreationState`] - 单次创建尝试的状态机
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 显式声明类型能力，不依赖反射
//! - 容器是显式的值，不存在全局注册表

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
