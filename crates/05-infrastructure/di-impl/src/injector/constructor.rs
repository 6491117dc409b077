//! 构造函数注入器

use super::DependencyResolver;
use di_abstractions::{BeanDefinition, ConstructorDescriptor, RawBean};
use infrastructure_common::{BeanError, BeanResult};
use tracing::debug;

/// 构造函数注入器
///
/// 选择规则：唯一的显式注入点 > 无参构造函数 > 参数最少者（同数取声明在前者）
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorInjector;

impl ConstructorInjector {
    /// 创建注入器
    pub fn new() -> Self {
        Self
    }

    /// 选择要调用的构造函数，不解析任何参数
    pub fn select_constructor(definition: &BeanDefinition) -> BeanResult<&ConstructorDescriptor> {
        let constructors = definition.constructors();

        let marked: Vec<&ConstructorDescriptor> =
            constructors.iter().filter(|ctor| ctor.marked).collect();
        match marked.as_slice() {
            [single] => return Ok(single),
            [] => {}
            _ => {
                return Err(BeanError::AmbiguousConstructor {
                    type_name: definition.bean_type().name.to_string(),
                    constructors: marked.iter().map(|ctor| ctor.name.clone()).collect(),
                })
            }
        }

        if let Some(no_arg) = constructors.iter().find(|ctor| ctor.params.is_empty()) {
            return Ok(no_arg);
        }

        constructors
            .iter()
            .min_by_key(|ctor| ctor.arity())
            .ok_or_else(|| BeanError::BeanCreationFailure {
                name: definition.name().to_string(),
                source: format!("{} 没有声明构造函数", definition.bean_type()).into(),
            })
    }

    /// 解析参数并调用构造函数，得到尚未注入的原始实例
    pub fn instantiate(
        &self,
        definition: &BeanDefinition,
        resolver: &DependencyResolver<'_>,
    ) -> BeanResult<RawBean> {
        let constructor = Self::select_constructor(definition).map_err(|error| match error {
            BeanError::AmbiguousConstructor { .. } => BeanError::DependencyInjectionFailure {
                bean: definition.name().to_string(),
                member: "<constructor>".to_string(),
                injection_point: "构造函数".to_string(),
                type_name: definition.bean_type().name.to_string(),
                source: Box::new(error),
            },
            other => other,
        })?;
        debug!(
            "实例化 {}: 使用构造函数 {} ({} 个参数)",
            definition.name(),
            constructor.name,
            constructor.arity()
        );

        let args = resolver.resolve_params(definition.name(), &constructor.name, &constructor.params)?;
        constructor
            .invoke(&args)
            .map_err(|error| BeanError::from_user(definition.name(), error))
    }
}
