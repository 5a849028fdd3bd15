//! Mock 机器人与换装台

use crate::error::HalError;
use crate::robot::{GripperManager, MOTION_OK, MotionParams, RobotService};
use crossbeam_channel::{Receiver, Sender, bounded};
use nesting_model::{Pose, ToolId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// 闸门放行的最长等待时间，防止测试死锁
const GATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct RobotState {
    current_tool: Option<ToolId>,
    moves: Vec<Pose>,
    pickups: Vec<ToolId>,
    drops: Vec<ToolId>,
    /// (第 N 次运动, 返回码)
    failing_move: Option<(usize, i32)>,
}

struct GateSlot {
    at_move: usize,
    reached: Sender<()>,
    release: Receiver<()>,
}

/// 运动闸门
///
/// 第 N 次 `move_to_position` 调用到达时通知测试线程，
/// 然后阻塞直到测试线程调用 [`MoveGate::release`]。
/// 用于在执行线程处于某个运动指令中时注入控制命令。
pub struct MoveGate {
    reached: Receiver<()>,
    release: Sender<()>,
}

impl MoveGate {
    /// 等待执行线程到达闸门
    pub fn wait_reached(&self, timeout: Duration) -> bool {
        self.reached.recv_timeout(timeout).is_ok()
    }

    /// 放行
    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

/// Mock 机器人
pub struct MockRobot {
    state: Mutex<RobotState>,
    gate: Mutex<Option<GateSlot>>,
    z_min: f64,
    capture_failures: AtomicUsize,
    capture_moves: AtomicUsize,
    calibration_moves: AtomicUsize,
    fail_pickup: AtomicBool,
    fail_drop: AtomicBool,
    fail_verify: AtomicBool,
}

impl MockRobot {
    pub fn new() -> Self {
        MockRobot {
            state: Mutex::new(RobotState::default()),
            gate: Mutex::new(None),
            z_min: 20.0,
            capture_failures: AtomicUsize::new(0),
            capture_moves: AtomicUsize::new(0),
            calibration_moves: AtomicUsize::new(0),
            fail_pickup: AtomicBool::new(false),
            fail_drop: AtomicBool::new(false),
            fail_verify: AtomicBool::new(false),
        }
    }

    /// 设置安全 Z 下限
    pub fn with_z_min(mut self, z_min: f64) -> Self {
        self.z_min = z_min;
        self
    }

    /// 设置初始安装的夹爪
    pub fn with_tool(self, tool: Option<ToolId>) -> Self {
        self.state.lock().current_tool = tool;
        self
    }

    /// 第 `nth` 次（从 1 开始）`move_to_position` 返回 `code`
    pub fn fail_move(&self, nth: usize, code: i32) {
        self.state.lock().failing_move = Some((nth, code));
    }

    /// 接下来 `count` 次移动到拍照位失败
    pub fn fail_capture_moves(&self, count: usize) {
        self.capture_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_pickups(&self) {
        self.fail_pickup.store(true, Ordering::SeqCst);
    }

    pub fn fail_drops(&self) {
        self.fail_drop.store(true, Ordering::SeqCst);
    }

    pub fn fail_verification(&self) {
        self.fail_verify.store(true, Ordering::SeqCst);
    }

    /// 在第 `nth` 次 `move_to_position` 处设置闸门
    pub fn gate_move(&self, nth: usize) -> MoveGate {
        let (reached_tx, reached_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        *self.gate.lock() = Some(GateSlot {
            at_move: nth,
            reached: reached_tx,
            release: release_rx,
        });
        MoveGate {
            reached: reached_rx,
            release: release_tx,
        }
    }

    /// 所有 `move_to_position` 的目标位姿（按调用顺序）
    pub fn moves(&self) -> Vec<Pose> {
        self.state.lock().moves.clone()
    }

    pub fn move_count(&self) -> usize {
        self.state.lock().moves.len()
    }

    pub fn capture_moves(&self) -> usize {
        self.capture_moves.load(Ordering::SeqCst)
    }

    pub fn calibration_moves(&self) -> usize {
        self.calibration_moves.load(Ordering::SeqCst)
    }

    /// 取夹爪记录
    pub fn pickups(&self) -> Vec<ToolId> {
        self.state.lock().pickups.clone()
    }

    /// 放夹爪记录
    pub fn drops(&self) -> Vec<ToolId> {
        self.state.lock().drops.clone()
    }

    fn pass_gate(&self, move_index: usize) {
        let slot = {
            let mut gate = self.gate.lock();
            match gate.as_ref() {
                Some(slot) if slot.at_move == move_index => gate.take(),
                _ => None,
            }
        };
        if let Some(slot) = slot {
            debug!("MockRobot: move {} reached gate, waiting for release", move_index);
            let _ = slot.reached.send(());
            if slot.release.recv_timeout(GATE_TIMEOUT).is_err() {
                warn!("MockRobot: gate at move {} was never released", move_index);
            }
        }
    }
}

impl Default for MockRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotService for MockRobot {
    fn move_to_position(&self, pose: &Pose, _params: &MotionParams) -> i32 {
        let (index, code) = {
            let mut state = self.state.lock();
            state.moves.push(*pose);
            let index = state.moves.len();
            let code = match state.failing_move {
                Some((nth, code)) if nth == index => code,
                _ => MOTION_OK,
            };
            (index, code)
        };
        debug!("MockRobot: move {} to {} -> {}", index, pose, code);
        self.pass_gate(index);
        code
    }

    fn move_to_calibration_position(&self) -> i32 {
        self.calibration_moves.fetch_add(1, Ordering::SeqCst);
        MOTION_OK
    }

    fn move_to_capture_position(&self) -> i32 {
        self.capture_moves.fetch_add(1, Ordering::SeqCst);
        let remaining = self.capture_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.capture_failures.store(remaining - 1, Ordering::SeqCst);
            return -1;
        }
        MOTION_OK
    }

    fn current_tool(&self) -> Option<ToolId> {
        self.state.lock().current_tool
    }

    fn safety_z_min(&self) -> f64 {
        self.z_min
    }
}

impl GripperManager for MockRobot {
    fn pickup_gripper(&self, tool: ToolId) -> Result<(), HalError> {
        if self.fail_pickup.load(Ordering::SeqCst) {
            return Err(HalError::Gripper {
                tool,
                reason: "injected pickup failure".into(),
            });
        }
        let mut state = self.state.lock();
        if let Some(mounted) = state.current_tool {
            return Err(HalError::Gripper {
                tool,
                reason: format!("gripper {} is still mounted", mounted),
            });
        }
        state.current_tool = Some(tool);
        state.pickups.push(tool);
        Ok(())
    }

    fn drop_off_gripper(&self, tool: ToolId) -> Result<(), HalError> {
        if self.fail_drop.load(Ordering::SeqCst) {
            return Err(HalError::Gripper {
                tool,
                reason: "injected drop-off failure".into(),
            });
        }
        let mut state = self.state.lock();
        if state.current_tool != Some(tool) {
            return Err(HalError::Gripper {
                tool,
                reason: "gripper is not mounted".into(),
            });
        }
        state.current_tool = None;
        state.drops.push(tool);
        Ok(())
    }

    fn verify_gripper_change(&self, expected: ToolId) -> bool {
        !self.fail_verify.load(Ordering::SeqCst) && self.current_tool() == Some(expected)
    }
}
