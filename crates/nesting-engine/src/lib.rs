//! # Nesting Engine - 通用可执行状态机
//!
//! 与具体业务无关的状态机引擎：
//!
//! - **转换规则**: 每个状态的合法后继集合，非法转换被拒绝且不改变状态
//! - **状态注册表**: 每个状态的 `handler` / `on_enter` / `on_exit`
//! - **执行循环**: 在调用线程上反复执行当前状态的 handler，
//!   handler 返回的状态由循环统一完成转换（每个节拍唯一的修改点）
//! - **控制句柄**: 其他线程通过 [`MachineHandle`] 读取状态快照、
//!   排队转换请求、停止循环
//! - **遥测**: 每次转换向 broker 和观察者发布 `(topic, state_name)`
//!
//! # 示例
//!
//! ```rust
//! use nesting_engine::{MachineState, StateEntry, StateMachineBuilder, StateRegistry, TransitionRules};
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Light { Red, Green }
//!
//! impl MachineState for Light {
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Light::Red => "RED",
//!             Light::Green => "GREEN",
//!         }
//!     }
//! }
//!
//! let builder = StateMachineBuilder::<Light, u32>::new();
//! let handle = builder.handle();
//!
//! let mut registry = StateRegistry::new();
//! registry.register(StateEntry::new(Light::Red).with_handler(|ticks: &mut u32| {
//!     *ticks += 1;
//!     Some(Light::Green)
//! }));
//! let stopper = handle.clone();
//! registry.register(StateEntry::new(Light::Green).with_handler(move |_: &mut u32| {
//!     stopper.stop_execution();
//!     None
//! }));
//!
//! let mut machine = builder
//!     .with_initial_state(Light::Red)
//!     .with_transition_rules(TransitionRules::new().allow(Light::Red, Light::Green))
//!     .with_state_registry(registry)
//!     .with_context(0u32)
//!     .build()
//!     .unwrap();
//!
//! machine.start_execution(Duration::ZERO).unwrap();
//! assert_eq!(machine.current_state(), Light::Green);
//! assert_eq!(*machine.context(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod handle;
pub mod machine;
pub mod publisher;
pub mod rules;
pub mod state;

pub use builder::{DEFAULT_STATE_TOPIC, StateMachineBuilder};
pub use error::EngineError;
pub use handle::MachineHandle;
pub use machine::{FaultHook, IDLE_BACKOFF, StateMachine, TickHook};
pub use publisher::{
    ChannelPublisher, LogPublisher, StateMessage, StatePublisher, TransitionObserver,
};
pub use rules::TransitionRules;
pub use state::{MachineState, StateEntry, StateRegistry};
