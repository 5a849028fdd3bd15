//! 可执行状态机
//!
//! # 执行循环
//!
//! 每个节拍按顺序执行：
//!
//! 1. 应用控制线程排队的转换请求（逐条校验）
//! 2. 执行当前状态的 handler；`Some(next)` 立即转换，`None` 停留
//! 3. 调用 tick hook
//! 4. `spin_sleep` 等待 `delay`（`delay` 为零且 handler 停留时至少等待
//!    [`IDLE_BACKOFF`]）
//!
//! 循环在 [`MachineHandle::stop_execution`] 被调用、或当前状态
//! 没有注册 handler 时结束。handler panic 被捕获，先交给 fault hook
//! 记录，再转换到故障状态。

use crate::error::EngineError;
use crate::handle::{Command, MachineHandle};
use crate::publisher::{StatePublisher, TransitionObserver};
use crate::rules::TransitionRules;
use crate::state::{MachineState, StateRegistry};
use crossbeam_channel::Receiver;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

/// 每个节拍结束后的回调
pub type TickHook<S, C> = Box<dyn Fn(S, &C) + Send>;

/// handler panic 后、进入故障状态前的回调：`(context, 发生 panic 的状态, panic 信息)`
pub type FaultHook<S, C> = Box<dyn Fn(&mut C, S, &str) + Send>;

/// `delay` 为零时，停留节拍之间的最小等待
pub const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// handler 执行结果
enum TickOutcome<S> {
    Stay,
    Next(S),
    Panicked(String),
    NoHandler,
}

/// 可执行状态机
///
/// 由 [`StateMachineBuilder`](crate::StateMachineBuilder) 构建，
/// 拥有上下文和当前状态。整个状态机可以移动到执行线程上运行。
pub struct StateMachine<S: MachineState, C> {
    current: S,
    rules: TransitionRules<S>,
    registry: StateRegistry<S, C>,
    context: C,
    broker: Option<Arc<dyn StatePublisher>>,
    topic: String,
    fault_state: Option<S>,
    fault_hook: Option<FaultHook<S, C>>,
    observers: Vec<Arc<dyn TransitionObserver<S>>>,
    tick_hook: Option<TickHook<S, C>>,
    handle: MachineHandle<S>,
    commands: Receiver<Command<S>>,
}

impl<S: MachineState, C> StateMachine<S, C> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        initial: S,
        rules: TransitionRules<S>,
        registry: StateRegistry<S, C>,
        context: C,
        broker: Option<Arc<dyn StatePublisher>>,
        topic: String,
        fault_state: Option<S>,
        fault_hook: Option<FaultHook<S, C>>,
        observers: Vec<Arc<dyn TransitionObserver<S>>>,
        tick_hook: Option<TickHook<S, C>>,
        handle: MachineHandle<S>,
        commands: Receiver<Command<S>>,
    ) -> Self {
        StateMachine {
            current: initial,
            rules,
            registry,
            context,
            broker,
            topic,
            fault_state,
            fault_hook,
            observers,
            tick_hook,
            handle,
            commands,
        }
    }

    pub fn current_state(&self) -> S {
        self.current
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// 取回上下文（销毁状态机）
    pub fn into_context(self) -> C {
        self.context
    }

    pub fn handle(&self) -> MachineHandle<S> {
        self.handle.clone()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn rules(&self) -> &TransitionRules<S> {
        &self.rules
    }

    /// 校验并执行转换
    ///
    /// 非法转换返回 [`EngineError::InvalidTransition`]，状态不变，
    /// 也不触发任何钩子。
    pub fn transition(&mut self, target: S) -> Result<(), EngineError> {
        let from = self.current;
        if !self.rules.allows(from, target) {
            return Err(EngineError::InvalidTransition {
                from: from.name(),
                to: target.name(),
            });
        }
        self.apply_transition(from, target);
        Ok(())
    }

    /// 执行转换：`on_exit(from)` → 更新状态 → `on_enter(to)` → 发布
    fn apply_transition(&mut self, from: S, to: S) {
        if let Some(entry) = self.registry.get(&from) {
            entry.exit(&mut self.context);
        }

        self.current = to;
        self.handle.shared.state.store(Some(Arc::new(to)));
        debug!("Transition: {} -> {}", from.name(), to.name());

        if let Some(entry) = self.registry.get(&to) {
            entry.enter(&mut self.context);
        }

        if let Some(broker) = &self.broker {
            broker.publish(&self.topic, to.name());
        }
        for observer in &self.observers {
            observer.on_transition(from, to);
        }
    }

    /// 启动执行循环（阻塞当前线程）
    ///
    /// # 参数
    ///
    /// - `delay`: 每个节拍之后的等待时间
    ///
    /// # 错误
    ///
    /// 循环已在运行时返回 [`EngineError::AlreadyRunning`]。
    pub fn start_execution(&mut self, delay: Duration) -> Result<(), EngineError> {
        if self.handle.shared.running.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyRunning);
        }
        info!("Execution loop started in state {}", self.current.name());

        while self.handle.is_running() {
            self.apply_pending_requests();
            if !self.handle.is_running() {
                break;
            }

            let stayed = self.run_tick();

            if self.handle.is_running() {
                if !delay.is_zero() {
                    spin_sleep::sleep(delay);
                } else if stayed {
                    spin_sleep::sleep(IDLE_BACKOFF);
                }
            }
        }

        self.handle.stop_execution();
        info!("Execution loop stopped in state {}", self.current.name());
        Ok(())
    }

    /// 停止执行循环（等同于 `handle().stop_execution()`）
    pub fn stop_execution(&self) {
        self.handle.stop_execution();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// 在调用线程上执行一个节拍（先应用排队的请求），不等待
    ///
    /// 不要求执行循环处于运行状态，适合单步驱动状态机。
    pub fn step(&mut self) {
        self.apply_pending_requests();
        self.run_tick();
    }

    /// 应用控制线程排队的转换请求，不执行 handler
    pub fn apply_pending_requests(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Transition(target) => {
                    if let Err(e) = self.transition(target) {
                        warn!("Rejected requested transition: {}", e);
                    } else {
                        info!("Applied requested transition to {}", target.name());
                    }
                },
            }
        }
    }

    /// 执行当前状态的 handler 并处理结果；返回 handler 是否要求停留
    fn run_tick(&mut self) -> bool {
        let state = self.current;
        let outcome = {
            let _span = info_span!("state", name = state.name()).entered();
            self.run_handler(state)
        };
        let stayed = matches!(outcome, TickOutcome::Stay);

        match outcome {
            TickOutcome::Stay => {},
            TickOutcome::Next(next) => {
                if let Err(e) = self.transition(next) {
                    warn!("Handler for {} returned rejected target: {}", state.name(), e);
                }
            },
            TickOutcome::Panicked(message) => {
                error!("Handler for {} panicked: {}", state.name(), message);
                if let Some(hook) = &self.fault_hook {
                    hook(&mut self.context, state, &message);
                }
                match self.fault_state {
                    Some(fault) if fault != state => self.apply_transition(state, fault),
                    _ => {
                        error!("No recoverable fault state, stopping execution loop");
                        self.handle.stop_execution();
                    },
                }
            },
            TickOutcome::NoHandler => {
                info!("No handler registered for {}, stopping", state.name());
                self.handle.stop_execution();
            },
        }

        if let Some(hook) = &self.tick_hook {
            hook(self.current, &self.context);
        }
        stayed
    }

    fn run_handler(&mut self, state: S) -> TickOutcome<S> {
        let Some(handler) = self.registry.get(&state).and_then(|entry| entry.handler()) else {
            return TickOutcome::NoHandler;
        };
        let context = &mut self.context;
        match catch_unwind(AssertUnwindSafe(|| handler(context))) {
            Ok(Some(next)) => TickOutcome::Next(next),
            Ok(None) => TickOutcome::Stay,
            Err(payload) => TickOutcome::Panicked(panic_message(payload.as_ref())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
