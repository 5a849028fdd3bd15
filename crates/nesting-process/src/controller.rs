//! 状态机装配与跨线程控制
//!
//! [`setup_state_machine`] 把 22 个状态的 handler、转换表、上下文和遥测
//! 组装成一台 [`PickAndPlaceMachine`]，同时返回一个可克隆的
//! [`PickAndPlaceController`]。状态机交给执行线程独占，控制器留给其他线程：
//! 所有状态修改都经由引擎的命令通道，由执行线程在节拍之间应用。

use crate::application::{Application, PICK_AND_PLACE_TOPIC};
use crate::context::PickAndPlaceContext;
use crate::error::NestingError;
use crate::flags::ControlFlags;
use crate::handlers;
use crate::rules::pick_and_place_rules;
use crate::state::PickAndPlaceState;
use nesting_engine::{MachineHandle, StateEntry, StateMachine, StateMachineBuilder, StateRegistry};
use nesting_model::Workpiece;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type PickAndPlaceMachine = StateMachine<PickAndPlaceState, PickAndPlaceContext>;

/// 为所有状态注册 handler
pub fn create_state_registry() -> StateRegistry<PickAndPlaceState, PickAndPlaceContext> {
    let mut registry = StateRegistry::new();
    for state in PickAndPlaceState::ALL {
        registry.register(
            StateEntry::new(state)
                .with_handler(move |ctx: &mut PickAndPlaceContext| handlers::handle(state, ctx))
                .on_enter(move |_: &mut PickAndPlaceContext| debug!("Entering {}", state)),
        );
    }
    registry
}

/// 组装状态机
///
/// # 参数
///
/// - `application`: 协作者与配置
/// - `workpieces`: 本次操作参与匹配的模板
/// - `on_tick`: 每个节拍结束后在执行线程上调用，用于发布状态快照
///
/// # 错误
///
/// 配置校验失败返回 [`NestingError::Config`]，引擎构建失败返回
/// [`NestingError::Engine`]。
pub fn setup_state_machine<F>(
    application: &Application,
    workpieces: Vec<Workpiece>,
    on_tick: F,
) -> Result<(PickAndPlaceMachine, PickAndPlaceController), NestingError>
where
    F: Fn(PickAndPlaceState, &PickAndPlaceContext) + Send + 'static,
{
    application
        .config
        .validate()
        .map_err(|e| NestingError::Config(e.to_string()))?;

    let flags = Arc::new(ControlFlags::new());
    let builder = StateMachineBuilder::new();
    let handle = builder.handle();

    let mut context = PickAndPlaceContext::new(application, workpieces, flags.clone());
    context.attach_execution(handle.clone());

    let mut builder = builder
        .with_initial_state(PickAndPlaceState::Initializing)
        .with_transition_rules(pick_and_place_rules())
        .with_state_registry(create_state_registry())
        .with_context(context)
        .with_state_topic(PICK_AND_PLACE_TOPIC)
        .with_fault_state(PickAndPlaceState::Error)
        .on_fault(|ctx: &mut PickAndPlaceContext, state, message| {
            ctx.record_error(format!("{}: {}", state, message));
        })
        .with_tick_hook(on_tick);
    if let Some(broker) = application.broker() {
        builder = builder.with_message_broker(broker);
    }

    let machine = builder.build()?;
    Ok((machine, PickAndPlaceController { handle, flags }))
}

/// 运行中操作的控制器
///
/// 可克隆、可跨线程使用（例如 Ctrl-C 处理器）。
#[derive(Clone)]
pub struct PickAndPlaceController {
    handle: MachineHandle<PickAndPlaceState>,
    flags: Arc<ControlFlags>,
}

impl PickAndPlaceController {
    pub fn current_state(&self) -> Option<PickAndPlaceState> {
        self.handle.current_state()
    }

    pub fn is_paused(&self) -> bool {
        self.current_state() == Some(PickAndPlaceState::Paused)
    }

    pub fn pause_requested(&self) -> bool {
        self.flags.pause_requested()
    }

    /// 请求暂停
    ///
    /// 只设置标志，当前状态的 handler 在下一次检查时转入 `PAUSED`，
    /// 并记录该状态作为恢复目标。终态和停止流程中不能暂停。
    pub fn pause(&self) -> bool {
        use PickAndPlaceState::*;
        match self.current_state() {
            Some(state @ (Paused | Stopped | CleaningUp | DroppingGripper | Completed | Error)) => {
                warn!("Cannot pause in state {}", state);
                false
            },
            Some(state) => {
                if self.flags.stop_requested() {
                    warn!("Stop already requested, ignoring pause");
                    return false;
                }
                self.flags.request_pause(state);
                info!("Pause requested in state {}", state);
                true
            },
            None => false,
        }
    }

    /// 从 `PAUSED` 恢复到暂停前的状态
    ///
    /// 被打断的状态从头重新执行。
    pub fn resume(&self) -> bool {
        if !self.is_paused() {
            warn!("Resume ignored, operation is not paused");
            return false;
        }
        let Some(target) = self.flags.resume_from_pause() else {
            warn!("No state recorded before pause, cannot resume");
            return false;
        };
        match self.handle.request_transition(target) {
            Ok(()) => {
                info!("Resuming to {}", target);
                true
            },
            Err(e) => {
                warn!("Failed to request resume: {}", e);
                false
            },
        }
    }

    /// 请求停止：走 `STOPPED → CLEANING_UP → DROPPING_GRIPPER → COMPLETED`
    pub fn stop(&self) -> bool {
        self.flags.request_stop();
        match self.handle.request_transition(PickAndPlaceState::Stopped) {
            Ok(()) => {
                info!("Stop requested");
                true
            },
            Err(e) => {
                warn!("Failed to request stop: {}", e);
                false
            },
        }
    }

    /// 急停：直接进入 `ERROR`，不执行清理
    pub fn emergency_stop(&self) -> bool {
        self.flags.request_emergency_stop();
        match self.handle.request_transition(PickAndPlaceState::Error) {
            Ok(()) => {
                warn!("Emergency stop requested");
                true
            },
            Err(e) => {
                warn!("Failed to request emergency stop: {}", e);
                false
            },
        }
    }

    /// 立即结束执行循环（不经过任何状态）
    pub fn stop_execution_loop(&self) {
        self.handle.stop_execution();
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }
}
