//! # 依赖注入具体实现
//!
//! 提供 Bean 注册表、三种依赖注入器、循环依赖检测器、生命周期处理器
//! 以及负责编排创建流程的 Bean 工厂。
//!
//! ## 示例
//!
//! ```
//! use di_abstractions::{BeanDefinition, ParamDescriptor};
//! use di_impl::BeanFactoryBuilder;
//! use std::sync::Arc;
//!
//! struct Repository;
//! struct Service {
//!     repository: Arc<Repository>,
//! }
//!
//! let factory = BeanFactoryBuilder::new()
//!     .definition(
//!         BeanDefinition::builder::<Repository>("repository")
//!             .default_constructor(|| Repository)
//!             .build(),
//!     )
//!     .definition(
//!         BeanDefinition::builder::<Service>("service")
//!             .constructor("new", vec![ParamDescriptor::required::<Repository>()], |args| {
//!                 Ok(Service { repository: args.required(0)? })
//!             })
//!             .build(),
//!     )
//!     .build()?;
//!
//! let service = factory.get_typed::<Service>()?;
//! let repository = factory.get_typed::<Repository>()?;
//! assert!(Arc::ptr_eq(&service.repository, &repository));
//! # Ok::<(), infrastructure_common::BeanError>(())
//! ```

pub mod builder;
pub mod detector;
pub mod factory;
pub mod injector;
pub mod lifecycle;
pub mod logging;
pub mod registry;

pub use builder::BeanFactoryBuilder;
pub use detector::{CircularDependencyDetector, DependencyNode};
pub use factory::BeanFactory;
pub use injector::{
    ConstructorInjector, DependencyResolver, FieldInjector, InjectionPoint, MethodInjector,
};
pub use lifecycle::{LifecycleMetadata, LifecycleProcessor};
pub use logging::{init_logging, LoggingConfig};
pub use registry::{BeanRegistry, CreationGuard};
