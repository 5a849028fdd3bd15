//! 状态 handler
//!
//! 每个 handler 都是 `fn(&mut PickAndPlaceContext) -> Option<PickAndPlaceState>`：
//! 返回 `Some(next)` 请求转换，`None` 表示停留在当前状态。handler 从不
//! 直接调用 `transition`，由执行循环统一完成转换。
//!
//! 流水线 handler 在入口先检查暂停/停止请求，这是唯一的取消点；
//! 已经开始的硬件调用不会被打断。

mod gripper;
mod lifecycle;
mod vision;
mod workpiece;

use crate::context::PickAndPlaceContext;
use crate::error::NestingError;
use crate::state::PickAndPlaceState::{self, *};

/// 执行 `state` 对应的 handler
pub fn handle(state: PickAndPlaceState, ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    match state {
        Initializing => lifecycle::handle_initializing(ctx),
        Idle => lifecycle::handle_idle(ctx),
        MovingToCapturePosition => vision::handle_moving_to_capture_position(ctx),
        SettingUpVisionCapture => vision::handle_setting_up_vision_capture(ctx),
        DetectingContours => vision::handle_detecting_contours(ctx),
        FilteringContours => vision::handle_filtering_contours(ctx),
        MatchingWorkpieces => vision::handle_matching_workpieces(ctx),
        ProcessingWorkpiece => workpiece::handle_processing_workpiece(ctx),
        CalculatingPickupPosition => workpiece::handle_calculating_pickup_position(ctx),
        CalculatingPlacementPosition => workpiece::handle_calculating_placement_position(ctx),
        ChangingGripper => gripper::handle_changing_gripper(ctx),
        VerifyingGripper => gripper::handle_verifying_gripper(ctx),
        MeasuringHeight => gripper::handle_measuring_height(ctx),
        ExecutingPickAndPlace => workpiece::handle_executing_pick_and_place(ctx),
        UpdatingDebugInfo => workpiece::handle_updating_debug_info(ctx),
        CheckingForMoreWorkpieces => workpiece::handle_checking_for_more_workpieces(ctx),
        Paused => lifecycle::handle_paused(ctx),
        Stopped => lifecycle::handle_stopped(ctx),
        CleaningUp => lifecycle::handle_cleaning_up(ctx),
        DroppingGripper => lifecycle::handle_dropping_gripper(ctx),
        Completed => lifecycle::handle_completed(ctx),
        Error => lifecycle::handle_error(ctx),
    }
}

/// 入口处的暂停/停止检查
///
/// 暂停优先：记录当前状态作为恢复目标并进入 `PAUSED`。
fn interrupted(state: PickAndPlaceState, ctx: &PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if ctx.pause_requested() {
        ctx.request_pause(state);
        return Some(Paused);
    }
    if ctx.stop_requested() {
        return Some(Stopped);
    }
    None
}

/// 记录错误并进入 `ERROR`
fn fail(ctx: &mut PickAndPlaceContext, error: NestingError) -> Option<PickAndPlaceState> {
    ctx.record_error(error.to_string());
    Some(Error)
}
