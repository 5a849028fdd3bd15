//! 转换规则表

use crate::state::PickAndPlaceState::{self, *};
use nesting_engine::TransitionRules;

/// 每个流水线状态的正常后继
const PIPELINE: [(PickAndPlaceState, &[PickAndPlaceState]); 14] = [
    (MovingToCapturePosition, &[SettingUpVisionCapture]),
    (SettingUpVisionCapture, &[DetectingContours]),
    (DetectingContours, &[FilteringContours, Completed]),
    (FilteringContours, &[MatchingWorkpieces]),
    (
        MatchingWorkpieces,
        &[ProcessingWorkpiece, CheckingForMoreWorkpieces],
    ),
    (
        ProcessingWorkpiece,
        &[CalculatingPickupPosition, CheckingForMoreWorkpieces],
    ),
    (CalculatingPickupPosition, &[CalculatingPlacementPosition]),
    (
        CalculatingPlacementPosition,
        // 放置失败跳过当前工件
        &[ChangingGripper, Completed, ProcessingWorkpiece],
    ),
    (ChangingGripper, &[VerifyingGripper, MeasuringHeight]),
    (VerifyingGripper, &[MeasuringHeight]),
    (MeasuringHeight, &[ExecutingPickAndPlace]),
    (
        ExecutingPickAndPlace,
        // 执行失败跳过当前工件
        &[UpdatingDebugInfo, ProcessingWorkpiece],
    ),
    (
        UpdatingDebugInfo,
        &[ProcessingWorkpiece, CheckingForMoreWorkpieces],
    ),
    (
        CheckingForMoreWorkpieces,
        &[MovingToCapturePosition, Completed],
    ),
];

/// 构建拾取-放置流程的转换规则
///
/// 每个流水线状态除正常后继外还可以转到 `PAUSED`、`STOPPED`、`ERROR`；
/// `PAUSED` 可以回到任意流水线状态。
pub fn pick_and_place_rules() -> TransitionRules<PickAndPlaceState> {
    let mut rules = TransitionRules::new()
        .allow_all(Initializing, [Idle, Error])
        .allow_all(Idle, [MovingToCapturePosition, Error, Stopped]);

    for (from, successors) in PIPELINE {
        rules = rules
            .allow_all(from, successors.iter().copied())
            .allow_all(from, [Paused, Stopped, Error]);
    }

    rules
        .allow_all(Paused, PickAndPlaceState::ACTIVE)
        .allow_all(Paused, [Paused, Stopped, Completed, Idle, Error])
        .allow_all(Stopped, [CleaningUp, Completed, Idle, Error])
        .allow_all(CleaningUp, [DroppingGripper, Completed, Error])
        .allow_all(DroppingGripper, [Completed, Error])
        .allow_all(Completed, [Idle, Error])
        .allow_all(Error, [Error, Idle, Initializing])
}
