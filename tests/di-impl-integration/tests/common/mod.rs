//! 集成测试共享工具

#![allow(dead_code)]

use di_abstractions::BeanDefinition;
use di_impl::{init_logging, BeanFactory, LoggingConfig};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志，多次调用只生效一次
pub fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        init_logging(&LoggingConfig::development().with_filter("debug")).ok(); // 忽略初始化失败的错误
    });
}

/// 按发生顺序记录事件
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// 以定义自身的名称注册
pub fn register(factory: &BeanFactory, definition: BeanDefinition) {
    let name = definition.name().to_string();
    factory
        .register_bean_definition(&name, definition)
        .unwrap_or_else(|error| panic!("注册 {name} 失败: {error}"));
}
