//! 循环依赖检测器
//!
//! 只读取定义中的依赖元数据构建静态依赖图，不创建任何实例。

use crate::injector::ConstructorInjector;
use crate::registry::BeanRegistry;
use di_abstractions::BeanDefinition;
use infrastructure_common::TypeToken;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// 依赖图节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Bean 名称
    pub name: String,
    /// 依赖的 Bean 名称（去重，按发现顺序）
    pub dependencies: Vec<String>,
}

/// 循环依赖检测器
#[derive(Debug)]
pub struct CircularDependencyDetector<'a> {
    registry: &'a BeanRegistry,
}

impl<'a> CircularDependencyDetector<'a> {
    /// 创建检测器
    pub fn new(registry: &'a BeanRegistry) -> Self {
        Self { registry }
    }

    /// 构建依赖图（注册顺序）
    ///
    /// 边来自选中的构造函数参数、可注入字段、注入方法参数以及 `depends_on`；
    /// 只有唯一匹配的类型才形成边，缺失或歧义的引用留给运行时报告。
    pub fn dependency_graph(&self) -> Vec<DependencyNode> {
        self.registry
            .definitions()
            .iter()
            .map(|definition| DependencyNode {
                name: definition.name().to_string(),
                dependencies: self.edges_of(definition),
            })
            .collect()
    }

    fn edges_of(&self, definition: &BeanDefinition) -> Vec<String> {
        let mut tokens: Vec<TypeToken> = Vec::new();
        match ConstructorInjector::select_constructor(definition) {
            Ok(constructor) => tokens.extend(constructor.params.iter().map(|param| param.token)),
            Err(error) => debug!("依赖图跳过构造函数: {}, 原因: {}", definition.name(), error),
        }
        tokens.extend(definition.fields().iter().map(|field| field.token));
        tokens.extend(
            definition
                .methods()
                .iter()
                .flat_map(|method| method.params.iter().map(|param| param.token)),
        );

        let mut edges: Vec<String> = Vec::new();
        let mut push = |target: String| {
            if !edges.contains(&target) {
                edges.push(target);
            }
        };
        for token in &tokens {
            let mut candidates = self.registry.names_for_type(token);
            if candidates.len() == 1 {
                push(candidates.remove(0));
            }
        }
        for name in definition.depends_on() {
            if self.registry.contains_definition(name) {
                push(name.clone());
            }
        }
        edges
    }

    /// 检测全部循环，每个循环以重复的起点结尾
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<String>> {
        let graph = self.dependency_graph();
        let adjacency = adjacency(&graph);
        let mut search = CycleSearch::new(&adjacency);
        for node in &graph {
            if !search.visited.contains(node.name.as_str()) {
                search.visit(&node.name);
            }
        }

        for cycle in &search.cycles {
            warn!("检测到循环依赖: {}", cycle.join(" -> "));
        }
        search.cycles
    }

    /// 从指定 Bean 出发是否可达某个循环
    pub fn has_circular_dependency(&self, name: &str) -> bool {
        let graph = self.dependency_graph();
        let adjacency = adjacency(&graph);
        if !adjacency.contains_key(name) {
            return false;
        }
        let mut search = CycleSearch::new(&adjacency);
        search.stop_at_first = true;
        search.visit(name);
        !search.cycles.is_empty()
    }
}

fn adjacency(graph: &[DependencyNode]) -> HashMap<&str, &[String]> {
    graph
        .iter()
        .map(|node| (node.name.as_str(), node.dependencies.as_slice()))
        .collect()
}

/// 带递归栈的深度优先搜索
struct CycleSearch<'g> {
    adjacency: &'g HashMap<&'g str, &'g [String]>,
    visited: HashSet<&'g str>,
    stack: Vec<&'g str>,
    cycles: Vec<Vec<String>>,
    stop_at_first: bool,
}

impl<'g> CycleSearch<'g> {
    fn new(adjacency: &'g HashMap<&'g str, &'g [String]>) -> Self {
        Self {
            adjacency,
            visited: HashSet::new(),
            stack: Vec::new(),
            cycles: Vec::new(),
            stop_at_first: false,
        }
    }

    fn visit(&mut self, name: &'g str) {
        self.visited.insert(name);
        self.stack.push(name);

        let dependencies = self.adjacency.get(name).copied().unwrap_or_default();
        for target in dependencies {
            if self.stop_at_first && !self.cycles.is_empty() {
                break;
            }
            let target = target.as_str();
            if let Some(position) = self.stack.iter().position(|entry| *entry == target) {
                let mut cycle: Vec<String> =
                    self.stack[position..].iter().map(|entry| (*entry).to_string()).collect();
                cycle.push(target.to_string());
                self.cycles.push(cycle);
            } else if !self.visited.contains(target) {
                self.visit(target);
            }
        }

        self.stack.pop();
    }
}
