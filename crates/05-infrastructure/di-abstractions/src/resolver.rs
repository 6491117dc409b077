//! Bean 解析抽象接口
//!
//! 注入器通过 [`BeanProvider`] 回调容器，解析结果以"视图"形式传递给用户代码

use infrastructure_common::{BeanResult, BoxError, TypeToken};
use std::any::Any;
use std::sync::Arc;

/// 容器中的 Bean 实例
pub type Bean = Arc<dyn Any + Send + Sync>;

/// 尚未共享的原始实例，注入阶段仍可变
pub type RawBean = Box<dyn Any + Send + Sync>;

/// Bean 提供者 trait
///
/// 注入器解析到唯一候选但单例缓存未命中时，通过它递归创建依赖
pub trait BeanProvider: Send + Sync {
    /// 按名称获取（必要时创建）Bean
    fn get_bean(&self, name: &str) -> BeanResult<Bean>;
}

/// 把 `Arc<T>` 包装为视图
///
/// 视图是持有 `Arc<T>` 的 `Bean`，`T` 可以是 `dyn Trait`
pub fn into_view<T>(value: Arc<T>) -> Bean
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// 从视图中取出 `Arc<T>`
pub fn view_as<T: ?Sized + 'static>(view: &Bean) -> Option<Arc<T>> {
    view.downcast_ref::<Arc<T>>().cloned()
}

/// 已解析的参数列表
///
/// 顺序与声明的参数顺序一致，可选且未解析到的参数为 `None`
#[derive(Clone, Default)]
pub struct ResolvedArgs {
    values: Vec<Option<Bean>>,
    tokens: Vec<TypeToken>,
}

impl ResolvedArgs {
    /// 创建参数列表
    pub fn new(values: Vec<Option<Bean>>, tokens: Vec<TypeToken>) -> Self {
        debug_assert_eq!(values.len(), tokens.len());
        Self { values, tokens }
    }

    /// 空参数列表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 第 `index` 个参数是否已解析
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    /// 取出必需参数
    pub fn required<T: ?Sized + 'static>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        let declared = self
            .tokens
            .get(index)
            .map_or("<none>", |token| token.name);
        match self.values.get(index) {
            Some(Some(view)) => view_as::<T>(view).ok_or_else(|| {
                format!(
                    "参数 #{index} 声明为 {declared}, 无法作为 {} 读取",
                    std::any::type_name::<T>()
                )
                .into()
            }),
            Some(None) => Err(format!("参数 #{index} ({declared}) 未解析").into()),
            None => Err(format!("参数 #{index} 越界, 共 {} 个参数", self.values.len()).into()),
        }
    }

    /// 取出可选参数
    pub fn optional<T: ?Sized + 'static>(&self, index: usize) -> Option<Arc<T>> {
        self.values
            .get(index)
            .and_then(Option::as_ref)
            .and_then(view_as::<T>)
    }
}

impl std::fmt::Debug for ResolvedArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .tokens
            .iter()
            .zip(&self.values)
            .map(|(token, value)| {
                let state = if value.is_some() { "resolved" } else { "absent" };
                format!("{}={state}", token.short_name())
            })
            .collect();
        f.debug_list().entries(entries).finish()
    }
}
