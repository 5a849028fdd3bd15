//! Builder 模式实现
//!
//! 提供链式构造 [`StateMachine`] 的方式。

use crate::error::EngineError;
use crate::handle::{Command, MachineHandle, Shared};
use crate::machine::{FaultHook, StateMachine, TickHook};
use crate::publisher::{StatePublisher, TransitionObserver};
use crate::rules::TransitionRules;
use crate::state::{MachineState, StateRegistry};
use arc_swap::ArcSwapOption;
use crossbeam_channel::{Receiver, unbounded};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 未指定 topic 时使用的默认值
pub const DEFAULT_STATE_TOPIC: &str = "STATE_MACHINE_STATE";

/// 状态机 Builder（链式构造）
///
/// 句柄在 `new()` 时就已创建，可以在构建上下文之前通过
/// [`handle`](Self::handle) 取出，让 handler 能够停止循环。
///
/// # 必需组件
///
/// - 初始状态
/// - 转换规则
/// - 状态注册表
/// - 上下文
///
/// 缺少任一组件时 `build()` 返回 [`EngineError::MissingComponent`]。
pub struct StateMachineBuilder<S: MachineState, C> {
    initial_state: Option<S>,
    rules: Option<TransitionRules<S>>,
    registry: Option<StateRegistry<S, C>>,
    context: Option<C>,
    broker: Option<Arc<dyn StatePublisher>>,
    topic: Option<String>,
    fault_state: Option<S>,
    fault_hook: Option<FaultHook<S, C>>,
    observers: Vec<Arc<dyn TransitionObserver<S>>>,
    tick_hook: Option<TickHook<S, C>>,
    handle: MachineHandle<S>,
    commands: Receiver<Command<S>>,
}

impl<S: MachineState, C> StateMachineBuilder<S, C> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let shared = Arc::new(Shared {
            state: ArcSwapOption::empty(),
            running: AtomicBool::new(false),
        });
        StateMachineBuilder {
            initial_state: None,
            rules: None,
            registry: None,
            context: None,
            broker: None,
            topic: None,
            fault_state: None,
            fault_hook: None,
            observers: Vec::new(),
            tick_hook: None,
            handle: MachineHandle {
                shared,
                commands: tx,
            },
            commands: rx,
        }
    }

    /// 将要构建的状态机的控制句柄
    pub fn handle(&self) -> MachineHandle<S> {
        self.handle.clone()
    }

    pub fn with_initial_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn with_transition_rules(mut self, rules: TransitionRules<S>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_state_registry(mut self, registry: StateRegistry<S, C>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// 设置遥测发布端
    pub fn with_message_broker(mut self, broker: Arc<dyn StatePublisher>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// 设置遥测 topic（默认 [`DEFAULT_STATE_TOPIC`]）
    pub fn with_state_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// handler panic 时强制进入的故障状态
    ///
    /// 未设置时，handler panic 会直接结束执行循环。
    pub fn with_fault_state(mut self, state: S) -> Self {
        self.fault_state = Some(state);
        self
    }

    /// handler panic 后、进入故障状态前在执行线程上调用
    ///
    /// 用于把 panic 信息记录到上下文中。
    pub fn on_fault<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, S, &str) + Send + 'static,
    {
        self.fault_hook = Some(Box::new(hook));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver<S>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 每个节拍结束后在执行线程上调用
    pub fn with_tick_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(S, &C) + Send + 'static,
    {
        self.tick_hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Result<StateMachine<S, C>, EngineError> {
        let initial_state = self
            .initial_state
            .ok_or(EngineError::MissingComponent("initial state"))?;
        let rules = self
            .rules
            .ok_or(EngineError::MissingComponent("transition rules"))?;
        let registry = self
            .registry
            .ok_or(EngineError::MissingComponent("state registry"))?;
        let context = self
            .context
            .ok_or(EngineError::MissingComponent("context"))?;

        self.handle
            .shared
            .state
            .store(Some(Arc::new(initial_state)));

        Ok(StateMachine::from_parts(
            initial_state,
            rules,
            registry,
            context,
            self.broker,
            self.topic.unwrap_or_else(|| DEFAULT_STATE_TOPIC.to_string()),
            self.fault_state,
            self.fault_hook,
            self.observers,
            self.tick_hook,
            self.handle,
            self.commands,
        ))
    }
}

impl<S: MachineState, C> Default for StateMachineBuilder<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
