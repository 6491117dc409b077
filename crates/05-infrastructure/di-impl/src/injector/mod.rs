//! 依赖注入器
//!
//! 三种注入器共用同一条解析规则：按类型查询索引，零个候选视必需与否报错或缺省，
//! 多个候选一律报歧义，唯一候选优先取单例缓存，否则经 [`BeanProvider`] 递归创建。

mod constructor;
mod field;
mod method;

pub use constructor::ConstructorInjector;
pub use field::FieldInjector;
pub use method::MethodInjector;

use crate::registry::BeanRegistry;
use di_abstractions::{Bean, BeanProvider, ParamDescriptor, ResolvedArgs};
use infrastructure_common::{BeanError, BeanResult, TypeToken};
use tracing::trace;

/// 注入点描述，用于错误报告
#[derive(Debug, Clone)]
pub struct InjectionPoint<'p> {
    /// 所属 Bean
    pub bean: &'p str,
    /// 成员（构造函数、字段或方法）名称
    pub member: &'p str,
    /// 成员内的位置，例如 "参数 #0" 或 "字段"
    pub position: String,
}

impl<'p> InjectionPoint<'p> {
    /// 参数注入点
    pub fn parameter(bean: &'p str, member: &'p str, index: usize) -> Self {
        Self {
            bean,
            member,
            position: format!("参数 #{index}"),
        }
    }

    /// 字段注入点
    pub fn field(bean: &'p str, member: &'p str) -> Self {
        Self {
            bean,
            member,
            position: "字段".to_string(),
        }
    }

    fn failure(&self, token: &TypeToken, source: BeanError) -> BeanError {
        BeanError::DependencyInjectionFailure {
            bean: self.bean.to_string(),
            member: self.member.to_string(),
            injection_point: self.position.clone(),
            type_name: token.name.to_string(),
            source: Box::new(source),
        }
    }
}

/// 共享的依赖解析规则
#[derive(Clone, Copy)]
pub struct DependencyResolver<'a> {
    registry: &'a BeanRegistry,
    provider: Option<&'a dyn BeanProvider>,
}

impl<'a> DependencyResolver<'a> {
    /// 创建解析器；未接入容器时只能解析已缓存的单例
    pub fn new(registry: &'a BeanRegistry, provider: Option<&'a dyn BeanProvider>) -> Self {
        Self { registry, provider }
    }

    /// 解析一个依赖，返回其在 `token` 类型下的视图
    ///
    /// 无候选或歧义包装为 `DependencyInjectionFailure`；
    /// 递归创建依赖时产生的错误原样传播。
    pub fn resolve(
        &self,
        token: &TypeToken,
        required: bool,
        at: &InjectionPoint<'_>,
    ) -> BeanResult<Option<Bean>> {
        let mut candidates = self.registry.names_for_type(token);
        let name = match candidates.len() {
            0 if required => return Err(at.failure(token, BeanError::no_such_bean(token.name))),
            0 => {
                trace!("可选依赖未找到: {}.{} ({})", at.bean, at.member, token);
                return Ok(None);
            }
            1 => candidates.remove(0),
            _ => {
                return Err(at.failure(
                    token,
                    BeanError::AmbiguousBean {
                        target: token.name.to_string(),
                        candidates,
                    },
                ))
            }
        };

        let bean = match self.registry.get_singleton(&name) {
            Some(bean) => bean,
            None => match self.provider {
                Some(provider) => provider.get_bean(&name)?,
                None if required => {
                    return Err(at.failure(token, BeanError::no_such_bean(name)));
                }
                None => return Ok(None),
            },
        };

        // 后处理器替换过的实例无法经定义转换，原样交给注入点按类型读取
        Ok(Some(self.registry.view(&name, token, &bean).unwrap_or(bean)))
    }

    /// 按声明顺序解析一组参数
    pub fn resolve_params(
        &self,
        bean: &str,
        member: &str,
        params: &[ParamDescriptor],
    ) -> BeanResult<ResolvedArgs> {
        let mut values = Vec::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            let at = InjectionPoint::parameter(bean, member, index);
            values.push(self.resolve(&param.token, param.required, &at)?);
        }
        Ok(ResolvedArgs::new(
            values,
            params.iter().map(|param| param.token).collect(),
        ))
    }
}
