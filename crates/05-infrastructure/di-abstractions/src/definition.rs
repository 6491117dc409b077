//! Bean 定义
//!
//! Bean 定义在构建时声明自身满足的类型（含祖先类型与能力）以及全部注入元数据，
//! 容器据此完成索引、注入与生命周期回调，不需要运行时反射。

use crate::resolver::{into_view, Bean, RawBean, ResolvedArgs};
use infrastructure_common::{BoxError, HookPhase, Scope, TypeToken};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 视图转换函数：把具体实例转换为某个类型的视图
pub type ViewCaster = Arc<dyn Fn(&Bean) -> Option<Bean> + Send + Sync>;

/// 构造函数
pub type ConstructorFn = Arc<dyn Fn(&ResolvedArgs) -> Result<RawBean, BoxError> + Send + Sync>;

/// 字段写入函数
pub type FieldSetter =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), Bean) -> Result<(), BoxError> + Send + Sync>;

/// 注入方法调用函数
pub type MethodInvoker =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), &ResolvedArgs) -> Result<(), BoxError> + Send + Sync>;

/// 生命周期钩子调用函数
pub type HookInvoker = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;

/// 参数描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// 依赖类型
    pub token: TypeToken,
    /// 是否必需
    pub required: bool,
}

impl ParamDescriptor {
    /// 必需参数
    pub fn required<T: ?Sized + 'static>() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            required: true,
        }
    }

    /// 可选参数
    pub fn optional<T: ?Sized + 'static>() -> Self {
        Self {
            token: TypeToken::of::<T>(),
            required: false,
        }
    }
}

/// 构造函数描述符
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// 构造函数名称
    pub name: String,
    /// 参数列表
    pub params: Vec<ParamDescriptor>,
    /// 是否显式标记为注入点
    pub marked: bool,
    factory: ConstructorFn,
}

impl ConstructorDescriptor {
    /// 调用构造函数
    pub fn invoke(&self, args: &ResolvedArgs) -> Result<RawBean, BoxError> {
        (self.factory)(args)
    }

    /// 参数个数
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("marked", &self.marked)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 可注入字段描述符
#[derive(Clone)]
pub struct FieldDescriptor {
    /// 字段名称
    pub name: String,
    /// 字段类型
    pub token: TypeToken,
    /// 是否必需
    pub required: bool,
    setter: FieldSetter,
}

impl FieldDescriptor {
    /// 写入字段
    pub fn set(&self, instance: &mut (dyn Any + Send + Sync), value: Bean) -> Result<(), BoxError> {
        (self.setter)(instance, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("token", &self.token)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// 可注入方法描述符
#[derive(Clone)]
pub struct MethodDescriptor {
    /// 方法名称
    pub name: String,
    /// 参数列表
    pub params: Vec<ParamDescriptor>,
    invoker: MethodInvoker,
}

impl MethodDescriptor {
    /// 调用方法
    pub fn invoke(
        &self,
        instance: &mut (dyn Any + Send + Sync),
        args: &ResolvedArgs,
    ) -> Result<(), BoxError> {
        (self.invoker)(instance, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// 生命周期钩子描述符
///
/// `parameter_count` 和 `is_static` 由元数据发现方如实填写，
/// 不合法的钩子在第一次执行时才会报错。
#[derive(Clone)]
pub struct HookDescriptor {
    /// 方法名称
    pub name: String,
    /// 执行阶段
    pub phase: HookPhase,
    /// 声明的参数个数
    pub parameter_count: usize,
    /// 是否为静态方法
    pub is_static: bool,
    invoker: HookInvoker,
}

impl HookDescriptor {
    /// 创建钩子描述符
    pub fn new<T, F>(name: impl Into<String>, phase: HookPhase, hook: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        let invoker: HookInvoker = Arc::new(move |instance: &(dyn Any + Send + Sync)| {
            let target = instance.downcast_ref::<T>().ok_or_else(|| -> BoxError {
                format!(
                    "钩子 {method} 的目标不是 {}",
                    std::any::type_name::<T>()
                )
                .into()
            })?;
            hook(target)
        });
        Self {
            name,
            phase,
            parameter_count: 0,
            is_static: false,
            invoker,
        }
    }

    /// 设置声明的参数个数
    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }

    /// 标记为静态方法
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// 执行钩子
    pub fn invoke(&self, instance: &(dyn Any + Send + Sync)) -> Result<(), BoxError> {
        (self.invoker)(instance)
    }
}

impl fmt::Debug for HookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDescriptor")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("parameter_count", &self.parameter_count)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// 类型层级节点
///
/// 一个节点对应祖先链上的一层：自身令牌、视图转换、本层声明的钩子以及上层类型。
#[derive(Clone)]
pub struct TypeNode {
    /// 类型令牌
    pub token: TypeToken,
    caster: ViewCaster,
    hooks: Vec<HookDescriptor>,
    supertypes: Vec<TypeNode>,
}

impl TypeNode {
    /// 上层类型
    pub fn supertypes(&self) -> &[TypeNode] {
        &self.supertypes
    }

    /// 本层声明的钩子
    pub fn hooks(&self) -> &[HookDescriptor] {
        &self.hooks
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("token", &self.token)
            .field("hooks", &self.hooks)
            .field("supertypes", &self.supertypes)
            .finish()
    }
}

fn caster_for<T, U, C>(cast: C) -> ViewCaster
where
    T: Send + Sync + 'static,
    U: ?Sized + Send + Sync + 'static,
    C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
{
    Arc::new(move |bean: &Bean| {
        bean.clone()
            .downcast::<T>()
            .ok()
            .map(|concrete| into_view(cast(concrete)))
    })
}

/// 类型层级节点构建器
pub struct TypeNodeBuilder<T> {
    node: TypeNode,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeNodeBuilder<T> {
    fn new<U, C>(cast: C) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        Self {
            node: TypeNode {
                token: TypeToken::of::<U>(),
                caster: caster_for::<T, U, C>(cast),
                hooks: Vec::new(),
                supertypes: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 声明上层类型
    pub fn provides<U, C>(mut self, cast: C) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        self.node.supertypes.push(Self::new::<U, C>(cast).node);
        self
    }

    /// 声明上层类型及其祖先
    pub fn provides_with<U, C, F>(mut self, cast: C, ancestry: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
        F: FnOnce(TypeNodeBuilder<T>) -> TypeNodeBuilder<T>,
    {
        let child = ancestry(Self::new::<U, C>(cast));
        self.node.supertypes.push(child.node);
        self
    }

    /// 在本层声明启动钩子
    pub fn on_start<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.node
            .hooks
            .push(HookDescriptor::new::<T, F>(name, HookPhase::Start, hook));
        self
    }

    /// 在本层声明停止钩子
    pub fn on_stop<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.node
            .hooks
            .push(HookDescriptor::new::<T, F>(name, HookPhase::Stop, hook));
        self
    }

    /// 在本层声明任意钩子描述符
    pub fn hook(mut self, hook: HookDescriptor) -> Self {
        self.node.hooks.push(hook);
        self
    }
}

/// 祖先链展开结果，首次使用时计算一次
struct TypeClosure {
    tokens: Vec<TypeToken>,
    casters: HashMap<TypeId, ViewCaster>,
    hooks: Vec<HookDescriptor>,
}

impl TypeClosure {
    fn scan(root: &TypeNode) -> Self {
        let mut closure = Self {
            tokens: Vec::new(),
            casters: HashMap::new(),
            hooks: Vec::new(),
        };
        let mut seen = HashSet::new();
        closure.walk(root, &mut seen);
        closure
    }

    fn walk(&mut self, node: &TypeNode, seen: &mut HashSet<TypeId>) {
        if !seen.insert(node.token.id) {
            return;
        }
        self.tokens.push(node.token);
        self.casters.insert(node.token.id, node.caster.clone());
        for supertype in &node.supertypes {
            self.walk(supertype, seen);
        }
        // 上层类型的钩子先于本层执行
        self.hooks.extend(node.hooks.iter().cloned());
    }
}

/// Bean 定义
pub struct BeanDefinition {
    name: String,
    bean_type: TypeNode,
    scope: Scope,
    constructors: Vec<ConstructorDescriptor>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    description: Option<String>,
    lazy_init: bool,
    depends_on: Vec<String>,
    closure: OnceCell<TypeClosure>,
}

impl BeanDefinition {
    /// 创建定义构建器
    pub fn builder<T: Send + Sync + 'static>(name: impl Into<String>) -> BeanDefinitionBuilder<T> {
        BeanDefinitionBuilder::new(name)
    }

    /// Bean 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 声明类型
    pub fn bean_type(&self) -> TypeToken {
        self.bean_type.token
    }

    /// 声明类型的层级节点
    pub fn type_node(&self) -> &TypeNode {
        &self.bean_type
    }

    /// 作用域
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// 是否为单例
    pub fn is_singleton(&self) -> bool {
        self.scope.is_singleton()
    }

    /// 构造函数（声明顺序）
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// 可注入字段
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// 可注入方法
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// 描述
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// 是否延迟初始化
    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    /// 显式声明的前置 Bean
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    fn closure(&self) -> &TypeClosure {
        self.closure.get_or_init(|| {
            tracing::trace!("展开类型层级: {} ({})", self.name, self.bean_type.token);
            TypeClosure::scan(&self.bean_type)
        })
    }

    /// 满足的全部类型（自身、祖先及能力，已去重）
    pub fn type_tokens(&self) -> &[TypeToken] {
        &self.closure().tokens
    }

    /// 是否满足指定类型
    pub fn satisfies(&self, token: &TypeToken) -> bool {
        self.closure().casters.contains_key(&token.id)
    }

    /// 生成实例在指定类型下的视图
    pub fn view(&self, token: &TypeToken, bean: &Bean) -> Option<Bean> {
        self.closure()
            .casters
            .get(&token.id)
            .and_then(|caster| caster(bean))
    }

    /// 全部生命周期钩子（祖先在前）
    pub fn lifecycle_hooks(&self) -> &[HookDescriptor] {
        &self.closure().hooks
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("bean_type", &self.bean_type.token)
            .field("scope", &self.scope)
            .field("constructors", &self.constructors)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("lazy_init", &self.lazy_init)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// Bean 定义构建器
pub struct BeanDefinitionBuilder<T> {
    name: String,
    root: TypeNodeBuilder<T>,
    scope: Scope,
    constructors: Vec<ConstructorDescriptor>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    description: Option<String>,
    lazy_init: bool,
    depends_on: Vec<String>,
}

impl<T: Send + Sync + 'static> BeanDefinitionBuilder<T> {
    /// 创建新的构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: TypeNodeBuilder::new::<T, _>(|bean: Arc<T>| bean),
            scope: Scope::Singleton,
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            description: None,
            lazy_init: false,
            depends_on: Vec::new(),
        }
    }

    /// 设置作用域
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// 设置为原型作用域
    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    /// 设置描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 设置延迟初始化
    pub fn lazy_init(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    /// 添加前置 Bean
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 声明满足的类型（祖先或能力）
    pub fn provides<U, C>(mut self, cast: C) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        self.root = self.root.provides::<U, C>(cast);
        self
    }

    /// 声明满足的类型及其祖先
    pub fn provides_with<U, C, F>(mut self, cast: C, ancestry: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
        F: FnOnce(TypeNodeBuilder<T>) -> TypeNodeBuilder<T>,
    {
        self.root = self.root.provides_with::<U, C, F>(cast, ancestry);
        self
    }

    fn push_constructor<F>(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamDescriptor>,
        marked: bool,
        factory: F,
    ) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let factory: ConstructorFn =
            Arc::new(move |args: &ResolvedArgs| factory(args).map(|value| Box::new(value) as RawBean));
        self.constructors.push(ConstructorDescriptor {
            name: name.into(),
            params,
            marked,
            factory,
        });
        self
    }

    /// 添加构造函数
    pub fn constructor<F>(self, name: impl Into<String>, params: Vec<ParamDescriptor>, factory: F) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(name, params, false, factory)
    }

    /// 添加显式标记为注入点的构造函数
    pub fn injected_constructor<F>(
        self,
        name: impl Into<String>,
        params: Vec<ParamDescriptor>,
        factory: F,
    ) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(name, params, true, factory)
    }

    /// 添加无参构造函数
    pub fn default_constructor<F>(self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.push_constructor("new", Vec::new(), false, move |_| Ok(factory()))
    }

    fn push_field<D, F>(mut self, name: impl Into<String>, required: bool, setter: F) -> Self
    where
        D: ?Sized + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let name = name.into();
        let field = name.clone();
        let setter: FieldSetter = Arc::new(move |instance: &mut (dyn Any + Send + Sync), value: Bean| {
            let target = instance.downcast_mut::<T>().ok_or_else(|| -> BoxError {
                format!("字段 {field} 的目标不是 {}", std::any::type_name::<T>()).into()
            })?;
            let dependency = crate::resolver::view_as::<D>(&value).ok_or_else(|| -> BoxError {
                format!("字段 {field} 的值不是 {}", std::any::type_name::<D>()).into()
            })?;
            setter(target, dependency);
            Ok(())
        });
        self.fields.push(FieldDescriptor {
            name,
            token: TypeToken::of::<D>(),
            required,
            setter,
        });
        self
    }

    /// 添加必需字段
    pub fn field<D, F>(self, name: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.push_field::<D, F>(name, true, setter)
    }

    /// 添加可选字段，未解析到依赖时保持原值
    pub fn optional_field<D, F>(self, name: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.push_field::<D, F>(name, false, setter)
    }

    /// 添加注入方法
    pub fn method<F>(mut self, name: impl Into<String>, params: Vec<ParamDescriptor>, method: F) -> Self
    where
        F: Fn(&mut T, &ResolvedArgs) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method_name = name.clone();
        let invoker: MethodInvoker = Arc::new(
            move |instance: &mut (dyn Any + Send + Sync), args: &ResolvedArgs| {
                let target = instance.downcast_mut::<T>().ok_or_else(|| -> BoxError {
                    format!(
                        "方法 {method_name} 的目标不是 {}",
                        std::any::type_name::<T>()
                    )
                    .into()
                })?;
                method(target, args)
            },
        );
        self.methods.push(MethodDescriptor {
            name,
            params,
            invoker,
        });
        self
    }

    /// 声明启动钩子
    pub fn on_start<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.root = self.root.on_start(name, hook);
        self
    }

    /// 声明停止钩子
    pub fn on_stop<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.root = self.root.on_stop(name, hook);
        self
    }

    /// 声明任意钩子描述符
    pub fn hook(mut self, hook: HookDescriptor) -> Self {
        self.root = self.root.hook(hook);
        self
    }

    /// 构建定义
    pub fn build(self) -> BeanDefinition {
        BeanDefinition {
            name: self.name,
            bean_type: self.root.node,
            scope: self.scope,
            constructors: self.constructors,
            fields: self.fields,
            methods: self.methods,
            description: self.description,
            lazy_init: self.lazy_init,
            depends_on: self.depends_on,
            closure: OnceCell::new(),
        }
    }
}
