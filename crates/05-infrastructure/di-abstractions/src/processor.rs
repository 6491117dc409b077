//! Bean 后处理器扩展点
//!
//! 在 Bean 初始化前后以及销毁前提供钩子，代理织入等外部子系统通过它替换实例

use crate::resolver::Bean;
use infrastructure_common::{BeanError, BeanResult};

/// Bean 后处理器 trait
///
/// 处理器按注册顺序执行：先对所有处理器调用 `before_init`，再对所有处理器调用
/// `after_init`。两者都可以返回一个不同的实例（例如包装后的代理），容器不区分
/// 缓存的是原始实例还是包装实例。
pub trait BeanPostProcessor: Send + Sync {
    /// 初始化之前调用
    fn before_init(&self, bean: Bean, _name: &str) -> BeanResult<Bean> {
        Ok(bean)
    }

    /// 初始化之后调用
    fn after_init(&self, bean: Bean, _name: &str) -> BeanResult<Bean> {
        Ok(bean)
    }

    /// 销毁之前调用
    ///
    /// 返回的错误由容器记录，不会中断销毁流程
    fn before_destruction(&self, _bean: &Bean, _name: &str) -> Vec<BeanError> {
        Vec::new()
    }

    /// 处理器名称（用于日志和调试）
    fn name(&self) -> &str {
        "BeanPostProcessor"
    }

    /// 排序值，仅用于诊断输出；执行顺序始终是注册顺序
    fn order(&self) -> i32 {
        0
    }
}
