//! 字段注入器

use super::{DependencyResolver, InjectionPoint};
use di_abstractions::BeanDefinition;
use infrastructure_common::{BeanError, BeanResult};
use std::any::Any;
use tracing::trace;

/// 字段注入器
///
/// 按声明顺序写入可注入字段；可选字段未解析到依赖时保持原值
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldInjector;

impl FieldInjector {
    /// 创建注入器
    pub fn new() -> Self {
        Self
    }

    /// 注入全部字段，返回实际写入的字段数
    pub fn inject(
        &self,
        definition: &BeanDefinition,
        instance: &mut (dyn Any + Send + Sync),
        resolver: &DependencyResolver<'_>,
    ) -> BeanResult<usize> {
        let mut injected = 0;
        for field in definition.fields() {
            let at = InjectionPoint::field(definition.name(), &field.name);
            let Some(value) = resolver.resolve(&field.token, field.required, &at)? else {
                continue;
            };
            field
                .set(instance, value)
                .map_err(|error| BeanError::from_user(definition.name(), error))?;
            trace!("注入字段: {}.{}", definition.name(), field.name);
            injected += 1;
        }
        Ok(injected)
    }
}
