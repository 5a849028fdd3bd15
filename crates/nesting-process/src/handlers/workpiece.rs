//! 单工件 handler：取下一个匹配 → 拾取/放置计算 → 执行 → 记录 → 检查

use super::{fail, interrupted};
use crate::context::PickAndPlaceContext;
use crate::error::NestingError;
use crate::result::TerminationReason;
use crate::state::PickAndPlaceState::{self, *};
use nesting_hal::PlacementOutcome;
use tracing::{error, info, warn};

pub(super) fn handle_processing_workpiece(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(ProcessingWorkpiece, ctx) {
        return Some(next);
    }
    if ctx.error_budget_exhausted() {
        error!("Error budget exhausted ({} errors)", ctx.error_count);
        ctx.set_termination(TerminationReason::ErrorBudgetExhausted);
        return Some(Error);
    }

    let Some((found, orientation)) = ctx.next_workpiece() else {
        return Some(CheckingForMoreWorkpieces);
    };
    info!(
        "Processing workpiece {}/{}: {} with {} gripper",
        ctx.current_match_index + 1,
        ctx.matches.len(),
        found.workpiece.name,
        found.gripper()
    );
    ctx.required_gripper = Some(found.gripper());
    ctx.current_orientation = orientation;
    ctx.current_match = Some(found);
    Some(CalculatingPickupPosition)
}

pub(super) fn handle_calculating_pickup_position(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(CalculatingPickupPosition, ctx) {
        return Some(next);
    }
    let Some(found) = ctx.current_match.clone() else {
        return fail(ctx, NestingError::MissingData("current match"));
    };

    let pixel = match ctx.placement_workflow.determine_pickup_point(&found) {
        Ok(point) => point,
        Err(e) => return fail(ctx, e),
    };
    let homography = ctx.vision.camera_to_robot_matrix();
    let (for_height, flat) = ctx.placement_workflow.transform_centroids(&homography, pixel);

    let plan = match ctx.pickup.calculate_pickup_positions(
        flat,
        ctx.match_height,
        ctx.current_orientation,
        found.gripper(),
        ctx.process.rz_orientation,
    ) {
        Ok(plan) => plan,
        Err(e) => return fail(ctx, NestingError::from(e)),
    };

    ctx.current_centroid = Some(pixel);
    ctx.robot_pickup_point = Some(flat);
    ctx.centroid_for_height_measure = Some(for_height);
    ctx.pickup_positions = Some(plan.positions);
    ctx.height_measure_position = Some(plan.height_measure_position);
    ctx.pickup_height = plan.pickup_height;
    Some(CalculatingPlacementPosition)
}

pub(super) fn handle_calculating_placement_position(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(CalculatingPlacementPosition, ctx) {
        return Some(next);
    }
    let (Some(found), Some(centroid), Some(positions)) = (
        ctx.current_match.clone(),
        ctx.current_centroid,
        ctx.pickup_positions,
    ) else {
        return fail(ctx, NestingError::MissingData("pickup geometry"));
    };

    match ctx.placement.calculate_placement_positions(
        &found,
        centroid,
        ctx.current_orientation,
        ctx.pickup_height,
        found.gripper(),
    ) {
        PlacementOutcome::Placed(placement) => {
            ctx.current_placement = Some((*placement).with_pickup_positions(positions));
            Some(ChangingGripper)
        },
        PlacementOutcome::PlaneFull => {
            info!("Placement plane is full");
            ctx.set_termination(TerminationReason::PlaneFull);
            Some(Completed)
        },
        PlacementOutcome::Failed(message) => {
            warn!(
                "Skipping workpiece {}: placement failed: {}",
                ctx.current_match_index + 1,
                message
            );
            ctx.record_error(format!("Placement failed: {}", message));
            ctx.advance_to_next_workpiece();
            Some(ProcessingWorkpiece)
        },
    }
}

pub(super) fn handle_executing_pick_and_place(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(ExecutingPickAndPlace, ctx) {
        return Some(next);
    }
    let (Some(placement), Some(gripper), Some(centroid)) = (
        ctx.current_placement.clone(),
        ctx.required_gripper,
        ctx.centroid_for_height_measure,
    ) else {
        return fail(ctx, NestingError::MissingData("placement"));
    };

    let result = ctx.placement_workflow.execute_workpiece_placement(
        &placement,
        gripper,
        centroid,
        ctx.process.rz_orientation,
    );
    match result {
        Ok(()) => Some(UpdatingDebugInfo),
        Err(e) => {
            warn!(
                "Skipping workpiece {}: {}",
                ctx.current_match_index + 1,
                e
            );
            ctx.record_error(e.to_string());
            ctx.advance_to_next_workpiece();
            Some(ProcessingWorkpiece)
        },
    }
}

pub(super) fn handle_updating_debug_info(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(UpdatingDebugInfo, ctx) {
        return Some(next);
    }
    ctx.record_placement();
    info!(
        "Placed workpiece {}/{} (total placed: {})",
        ctx.current_match_index + 1,
        ctx.matches.len(),
        ctx.count
    );
    ctx.advance_to_next_workpiece();

    if ctx.has_more_workpieces_in_batch() {
        Some(ProcessingWorkpiece)
    } else {
        Some(CheckingForMoreWorkpieces)
    }
}

pub(super) fn handle_checking_for_more_workpieces(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(CheckingForMoreWorkpieces, ctx) {
        return Some(next);
    }
    if ctx.is_plane_full() {
        info!("Placement plane is full");
        ctx.set_termination(TerminationReason::PlaneFull);
        return Some(Completed);
    }
    if ctx.consecutive_empty_detections >= ctx.process.max_empty_detections {
        info!(
            "No matches in {} consecutive cycles, finishing",
            ctx.consecutive_empty_detections
        );
        ctx.set_termination(TerminationReason::NoMatchesAfterRetries);
        return Some(Completed);
    }
    if ctx.error_budget_exhausted() {
        error!("Error budget exhausted ({} errors)", ctx.error_count);
        ctx.set_termination(TerminationReason::ErrorBudgetExhausted);
        return Some(Error);
    }

    ctx.reset_for_new_cycle();
    Some(MovingToCapturePosition)
}
