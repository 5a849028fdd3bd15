//! 跨线程控制句柄

use crate::error::EngineError;
use crate::state::MachineState;
use arc_swap::ArcSwapOption;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 发送给执行循环的控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command<S> {
    /// 在下一个节拍开始前执行转换（与其他转换一样校验）
    Transition(S),
}

/// 执行线程与控制线程共享的状态
pub(crate) struct Shared<S> {
    pub(crate) state: ArcSwapOption<S>,
    pub(crate) running: AtomicBool,
}

/// 状态机控制句柄
///
/// 可克隆、`Send + Sync`。这是其他线程访问状态机的唯一方式：
///
/// - [`current_state`](Self::current_state) 读取无锁快照
/// - [`request_transition`](Self::request_transition) 把转换排队，
///   由执行循环在节拍之间应用，执行线程始终是状态的唯一写者
/// - [`stop_execution`](Self::stop_execution) 让循环在当前节拍结束后退出
pub struct MachineHandle<S> {
    pub(crate) shared: Arc<Shared<S>>,
    pub(crate) commands: Sender<Command<S>>,
}

impl<S> Clone for MachineHandle<S> {
    fn clone(&self) -> Self {
        MachineHandle {
            shared: self.shared.clone(),
            commands: self.commands.clone(),
        }
    }
}

impl<S: MachineState> MachineHandle<S> {
    /// 当前状态快照（状态机构建前为 `None`）
    pub fn current_state(&self) -> Option<S> {
        self.shared.state.load().as_deref().copied()
    }

    /// 请求转换到 `target`
    ///
    /// 仅入队，不等待执行；非法转换由执行循环拒绝并记录警告。
    pub fn request_transition(&self, target: S) -> Result<(), EngineError> {
        self.commands
            .send(Command::Transition(target))
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// 停止执行循环
    pub fn stop_execution(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// 执行循环是否在运行
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}
