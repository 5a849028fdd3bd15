//! 生命周期 handler：初始化、空闲、暂停、停止清理、终态

use super::fail;
use crate::context::PickAndPlaceContext;
use crate::result::TerminationReason;
use crate::state::PickAndPlaceState::{self, *};
use tracing::{error, info};

pub(super) fn handle_initializing(_ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    Some(Idle)
}

pub(super) fn handle_idle(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if ctx.stop_requested() {
        return Some(Stopped);
    }
    Some(MovingToCapturePosition)
}

/// 停留，直到控制线程请求恢复或停止
pub(super) fn handle_paused(_ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    None
}

pub(super) fn handle_stopped(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    info!("Operation stopped, cleaning up");
    ctx.request_stop();
    ctx.set_termination(TerminationReason::StoppedByUser);
    Some(CleaningUp)
}

pub(super) fn handle_cleaning_up(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    ctx.reset_for_new_cycle();
    Some(DroppingGripper)
}

pub(super) fn handle_dropping_gripper(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    match ctx.release_hardware() {
        Ok(()) => Some(Completed),
        Err(e) => fail(ctx, e),
    }
}

pub(super) fn handle_completed(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Err(e) = ctx.release_hardware() {
        error!("Failed to release hardware on completion: {}", e);
        ctx.record_error(e.to_string());
    }
    ctx.set_termination(TerminationReason::BatchExhausted);
    info!("Operation completed, {} workpieces placed", ctx.count);
    ctx.stop_execution();
    None
}

/// 终态：记录原因、关闭激光和真空泵并结束循环，不移动机器人
pub(super) fn handle_error(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    ctx.switch_off_tools();
    if ctx.flags().is_emergency() {
        ctx.force_termination(TerminationReason::EmergencyStop);
        error!("Emergency stop");
    } else {
        ctx.set_termination(TerminationReason::Fault);
        error!(
            "Operation failed: {}",
            ctx.last_error.as_deref().unwrap_or("unknown error")
        );
    }
    ctx.stop_execution();
    None
}
