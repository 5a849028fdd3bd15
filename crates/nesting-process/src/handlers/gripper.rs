//! 夹爪与测高 handler

use super::{fail, interrupted};
use crate::context::PickAndPlaceContext;
use crate::error::NestingError;
use crate::state::PickAndPlaceState::{self, *};
use tracing::info;

pub(super) fn handle_changing_gripper(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(ChangingGripper, ctx) {
        return Some(next);
    }
    let Some(gripper) = ctx.required_gripper else {
        return fail(ctx, NestingError::MissingData("required gripper"));
    };
    let target = gripper.tool_id();

    if ctx.robot_workflow.current_tool() == Some(target) {
        info!("Gripper {} already mounted", gripper);
        ctx.current_gripper_id = Some(target);
        return Some(MeasuringHeight);
    }

    match ctx.robot_workflow.swap_gripper(target) {
        Ok(()) => {
            ctx.current_gripper_id = Some(target);
            Some(VerifyingGripper)
        },
        Err(e) => fail(ctx, e),
    }
}

pub(super) fn handle_verifying_gripper(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(VerifyingGripper, ctx) {
        return Some(next);
    }
    let Some(gripper) = ctx.required_gripper else {
        return fail(ctx, NestingError::MissingData("required gripper"));
    };
    match ctx.robot_workflow.verify_gripper(gripper.tool_id()) {
        Ok(()) => Some(MeasuringHeight),
        Err(e) => fail(ctx, e),
    }
}

/// 测高在 `EXECUTING_PICK_AND_PLACE` 中完成，这里只是一个可暂停的关口
pub(super) fn handle_measuring_height(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(MeasuringHeight, ctx) {
        return Some(next);
    }
    Some(ExecutingPickAndPlace)
}
