//! 跨线程控制标志
//!
//! 控制线程（操作门面、Ctrl-C 处理器）写入，执行线程在每个 handler
//! 入口读取。全部为原子操作，不持有锁。

use crate::state::PickAndPlaceState;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// 没有记录暂停前状态
const NO_STATE: u8 = u8::MAX;

/// 暂停/停止控制标志
#[derive(Debug)]
pub struct ControlFlags {
    pause_requested: AtomicBool,
    stop_requested: AtomicBool,
    emergency: AtomicBool,
    /// 暂停前所在的状态（`NO_STATE` 表示无）
    resume_target: AtomicU8,
}

impl ControlFlags {
    pub fn new() -> Self {
        ControlFlags {
            pause_requested: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            emergency: AtomicBool::new(false),
            resume_target: AtomicU8::new(NO_STATE),
        }
    }

    /// 请求暂停，并记录恢复时返回的状态
    pub fn request_pause(&self, state: PickAndPlaceState) {
        self.resume_target.store(state.into(), Ordering::Release);
        self.pause_requested.store(true, Ordering::Release);
    }

    /// 请求停止（清除暂停请求）
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.pause_requested.store(false, Ordering::Release);
    }

    /// 急停：停止并标记为急停
    pub fn request_emergency_stop(&self) {
        self.emergency.store(true, Ordering::Release);
        self.request_stop();
    }

    /// 清除暂停请求并取出恢复目标
    pub fn resume_from_pause(&self) -> Option<PickAndPlaceState> {
        self.pause_requested.store(false, Ordering::Release);
        let raw = self.resume_target.swap(NO_STATE, Ordering::AcqRel);
        PickAndPlaceState::try_from(raw).ok()
    }

    /// 查看恢复目标（不清除）
    pub fn resume_target(&self) -> Option<PickAndPlaceState> {
        PickAndPlaceState::try_from(self.resume_target.load(Ordering::Acquire)).ok()
    }

    pub fn pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::Acquire)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.load(Ordering::Acquire)
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new()
    }
}
