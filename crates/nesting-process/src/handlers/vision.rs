//! 视觉流水线 handler：拍照位 → 拍照 → 检测 → 过滤 → 匹配

use super::{fail, interrupted};
use crate::context::PickAndPlaceContext;
use crate::error::NestingError;
use crate::result::TerminationReason;
use crate::state::PickAndPlaceState::{self, *};
use tracing::info;

pub(super) fn handle_moving_to_capture_position(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(MovingToCapturePosition, ctx) {
        return Some(next);
    }
    match ctx.robot_workflow.move_to_capture_position() {
        Ok(()) => Some(SettingUpVisionCapture),
        Err(e) => fail(ctx, e),
    }
}

pub(super) fn handle_setting_up_vision_capture(
    ctx: &mut PickAndPlaceContext,
) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(SettingUpVisionCapture, ctx) {
        return Some(next);
    }
    match ctx.vision_workflow.setup_vision_capture() {
        Ok(()) => Some(DetectingContours),
        Err(e) => fail(ctx, NestingError::from(e)),
    }
}

pub(super) fn handle_detecting_contours(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(DetectingContours, ctx) {
        return Some(next);
    }
    let (max_retries, delay) = (ctx.process.max_retries, ctx.process.retry_delay());
    match ctx.vision_workflow.get_contours_with_retries(max_retries, delay) {
        Some(contours) => {
            ctx.current_contours = contours;
            Some(FilteringContours)
        },
        None => {
            info!("Nothing left to pick, finishing");
            ctx.set_termination(TerminationReason::NothingDetected);
            Some(Completed)
        },
    }
}

pub(super) fn handle_filtering_contours(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(FilteringContours, ctx) {
        return Some(next);
    }
    let processed = ctx
        .vision_workflow
        .process_detected_contours(ctx.current_contours.clone());
    ctx.filtered_contours = ctx.vision_workflow.filter_contours_by_pickup_area(processed);
    Some(MatchingWorkpieces)
}

pub(super) fn handle_matching_workpieces(ctx: &mut PickAndPlaceContext) -> Option<PickAndPlaceState> {
    if let Some(next) = interrupted(MatchingWorkpieces, ctx) {
        return Some(next);
    }
    let outcome = match ctx
        .vision_workflow
        .match_contours_to_workpieces(ctx.templates(), &ctx.filtered_contours)
    {
        Ok(outcome) => outcome,
        Err(e) => return fail(ctx, NestingError::from(e)),
    };

    if outcome.is_empty() {
        ctx.consecutive_empty_detections += 1;
        info!(
            "No workpieces matched ({} consecutive empty cycles)",
            ctx.consecutive_empty_detections
        );
        return Some(CheckingForMoreWorkpieces);
    }

    ctx.matches = outcome.matches;
    ctx.orientations = outcome.orientations;
    ctx.current_match_index = 0;
    ctx.consecutive_empty_detections = 0;
    ctx.workpiece_found = true;
    Some(ProcessingWorkpiece)
}
