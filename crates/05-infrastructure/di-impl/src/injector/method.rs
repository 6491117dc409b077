//! 方法注入器

use super::DependencyResolver;
use di_abstractions::BeanDefinition;
use infrastructure_common::{BeanError, BeanResult};
use std::any::Any;
use tracing::trace;

/// 方法注入器
///
/// 每个注入方法先解析全部参数再调用；任何必需参数解析失败时方法不会被调用
#[derive(Debug, Default, Clone, Copy)]
pub struct MethodInjector;

impl MethodInjector {
    /// 创建注入器
    pub fn new() -> Self {
        Self
    }

    /// 依次调用全部注入方法，返回调用次数
    pub fn inject(
        &self,
        definition: &BeanDefinition,
        instance: &mut (dyn Any + Send + Sync),
        resolver: &DependencyResolver<'_>,
    ) -> BeanResult<usize> {
        let mut invoked = 0;
        for method in definition.methods() {
            let args = resolver.resolve_params(definition.name(), &method.name, &method.params)?;
            method
                .invoke(instance, &args)
                .map_err(|error| BeanError::from_user(definition.name(), error))?;
            trace!("调用注入方法: {}.{} {:?}", definition.name(), method.name, args);
            invoked += 1;
        }
        Ok(invoked)
    }
}
