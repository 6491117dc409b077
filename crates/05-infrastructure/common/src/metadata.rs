//! 元数据定义
//!
//! 提供类型令牌，替代运行时反射

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型令牌
///
/// 标识一个具体类型或一个能力（trait object）。相等性与哈希只取决于 `TypeId`，
/// 名称仅用于诊断输出。
#[derive(Clone, Copy)]
pub struct TypeToken {
    /// 类型ID
    pub id: TypeId,
    /// 类型全名
    pub name: &'static str,
}

impl TypeToken {
    /// 从类型获取类型令牌，支持 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let name = self.name.split('<').next().unwrap_or(self.name);
        let short = name.rsplit("::").next().unwrap_or(name);
        match short.strip_prefix("dyn ") {
            Some(rest) => rest,
            None => short,
        }
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
