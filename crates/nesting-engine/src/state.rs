//! 状态抽象与状态注册表

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// 状态机的状态类型
///
/// 通常是一个无数据的 `enum`。`name()` 返回稳定的名称，
/// 用作遥测载荷和日志字段。
pub trait MachineState: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;
}

/// 状态 handler：返回 `Some(next)` 表示立即转换，`None` 表示停留
pub type Handler<S, C> = Box<dyn Fn(&mut C) -> Option<S> + Send>;

/// 进入 / 退出钩子
pub type Hook<C> = Box<dyn Fn(&mut C) + Send>;

/// 单个状态的注册项
pub struct StateEntry<S, C> {
    state: S,
    handler: Option<Handler<S, C>>,
    on_enter: Option<Hook<C>>,
    on_exit: Option<Hook<C>>,
}

impl<S: MachineState, C> StateEntry<S, C> {
    pub fn new(state: S) -> Self {
        StateEntry {
            state,
            handler: None,
            on_enter: None,
            on_exit: None,
        }
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut C) -> Option<S> + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C) + Send + 'static,
    {
        self.on_enter = Some(Box::new(hook));
        self
    }

    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C) + Send + 'static,
    {
        self.on_exit = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn handler(&self) -> Option<&Handler<S, C>> {
        self.handler.as_ref()
    }

    pub(crate) fn enter(&self, context: &mut C) {
        if let Some(hook) = &self.on_enter {
            hook(context);
        }
    }

    pub(crate) fn exit(&self, context: &mut C) {
        if let Some(hook) = &self.on_exit {
            hook(context);
        }
    }
}

/// 状态注册表
pub struct StateRegistry<S, C> {
    entries: HashMap<S, StateEntry<S, C>>,
}

impl<S: MachineState, C> StateRegistry<S, C> {
    pub fn new() -> Self {
        StateRegistry {
            entries: HashMap::new(),
        }
    }

    /// 注册状态（同一状态重复注册时覆盖旧项）
    pub fn register(&mut self, entry: StateEntry<S, C>) {
        if self.entries.insert(entry.state, entry).is_some() {
            tracing::debug!("State registry: replaced existing entry");
        }
    }

    pub fn get(&self, state: &S) -> Option<&StateEntry<S, C>> {
        self.entries.get(state)
    }

    pub fn contains(&self, state: &S) -> bool {
        self.entries.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: MachineState, C> Default for StateRegistry<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Phase {
        A,
        B,
    }

    impl MachineState for Phase {
        fn name(&self) -> &'static str {
            match self {
                Phase::A => "A",
                Phase::B => "B",
            }
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry: StateRegistry<Phase, Vec<&'static str>> = StateRegistry::new();
        registry.register(
            StateEntry::new(Phase::A)
                .with_handler(|_| Some(Phase::B))
                .on_enter(|log: &mut Vec<&'static str>| log.push("enter A")),
        );

        assert!(registry.contains(&Phase::A));
        assert!(!registry.contains(&Phase::B));
        assert_eq!(registry.len(), 1);

        let entry = registry.get(&Phase::A).unwrap();
        let mut log = Vec::new();
        entry.enter(&mut log);
        entry.exit(&mut log); // 未设置 on_exit，无操作
        assert_eq!(log, vec!["enter A"]);

        let handler = entry.handler().unwrap();
        assert_eq!(handler(&mut log), Some(Phase::B));
    }

    #[test]
    fn test_registry_replaces_entry() {
        let mut registry: StateRegistry<Phase, ()> = StateRegistry::new();
        registry.register(StateEntry::new(Phase::A).with_handler(|_| Some(Phase::B)));
        registry.register(StateEntry::new(Phase::A).with_handler(|_| None));
        assert_eq!(registry.len(), 1);
        let handler = registry.get(&Phase::A).unwrap().handler().unwrap();
        assert_eq!(handler(&mut ()), None);
    }
}
