//! 拾取-放置流程状态
//!
//! 22 个状态分为三组：
//!
//! - **生命周期**: `INITIALIZING`, `IDLE`, `PAUSED`, `STOPPED`, `CLEANING_UP`,
//!   `DROPPING_GRIPPER`, `COMPLETED`, `ERROR`
//! - **流水线**（活动状态）: 从 `MOVING_TO_CAPTURE_POSITION` 到
//!   `CHECKING_FOR_MORE_WORKPIECES` 的 14 个状态，均可被暂停
//! - **终态**: `COMPLETED`, `ERROR`
//!
//! 状态以 `u8` 表示，便于在 `AtomicU8` 中保存暂停前的状态。

use nesting_engine::MachineState;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use std::fmt;

/// 拾取-放置流程状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoPrimitive, TryFromPrimitive,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PickAndPlaceState {
    Initializing = 0,
    Idle = 1,
    MovingToCapturePosition = 2,
    SettingUpVisionCapture = 3,
    DetectingContours = 4,
    FilteringContours = 5,
    MatchingWorkpieces = 6,
    ProcessingWorkpiece = 7,
    CalculatingPickupPosition = 8,
    CalculatingPlacementPosition = 9,
    ChangingGripper = 10,
    VerifyingGripper = 11,
    MeasuringHeight = 12,
    ExecutingPickAndPlace = 13,
    UpdatingDebugInfo = 14,
    CheckingForMoreWorkpieces = 15,
    Paused = 16,
    Stopped = 17,
    CleaningUp = 18,
    DroppingGripper = 19,
    Completed = 20,
    Error = 21,
}

impl PickAndPlaceState {
    /// 全部状态（声明顺序）
    pub const ALL: [PickAndPlaceState; 22] = [
        PickAndPlaceState::Initializing,
        PickAndPlaceState::Idle,
        PickAndPlaceState::MovingToCapturePosition,
        PickAndPlaceState::SettingUpVisionCapture,
        PickAndPlaceState::DetectingContours,
        PickAndPlaceState::FilteringContours,
        PickAndPlaceState::MatchingWorkpieces,
        PickAndPlaceState::ProcessingWorkpiece,
        PickAndPlaceState::CalculatingPickupPosition,
        PickAndPlaceState::CalculatingPlacementPosition,
        PickAndPlaceState::ChangingGripper,
        PickAndPlaceState::VerifyingGripper,
        PickAndPlaceState::MeasuringHeight,
        PickAndPlaceState::ExecutingPickAndPlace,
        PickAndPlaceState::UpdatingDebugInfo,
        PickAndPlaceState::CheckingForMoreWorkpieces,
        PickAndPlaceState::Paused,
        PickAndPlaceState::Stopped,
        PickAndPlaceState::CleaningUp,
        PickAndPlaceState::DroppingGripper,
        PickAndPlaceState::Completed,
        PickAndPlaceState::Error,
    ];

    /// 流水线状态（可暂停、可恢复）
    pub const ACTIVE: [PickAndPlaceState; 14] = [
        PickAndPlaceState::MovingToCapturePosition,
        PickAndPlaceState::SettingUpVisionCapture,
        PickAndPlaceState::DetectingContours,
        PickAndPlaceState::FilteringContours,
        PickAndPlaceState::MatchingWorkpieces,
        PickAndPlaceState::ProcessingWorkpiece,
        PickAndPlaceState::CalculatingPickupPosition,
        PickAndPlaceState::CalculatingPlacementPosition,
        PickAndPlaceState::ChangingGripper,
        PickAndPlaceState::VerifyingGripper,
        PickAndPlaceState::MeasuringHeight,
        PickAndPlaceState::ExecutingPickAndPlace,
        PickAndPlaceState::UpdatingDebugInfo,
        PickAndPlaceState::CheckingForMoreWorkpieces,
    ];

    /// 遥测与日志中使用的名称
    pub const fn name(self) -> &'static str {
        match self {
            PickAndPlaceState::Initializing => "INITIALIZING",
            PickAndPlaceState::Idle => "IDLE",
            PickAndPlaceState::MovingToCapturePosition => "MOVING_TO_CAPTURE_POSITION",
            PickAndPlaceState::SettingUpVisionCapture => "SETTING_UP_VISION_CAPTURE",
            PickAndPlaceState::DetectingContours => "DETECTING_CONTOURS",
            PickAndPlaceState::FilteringContours => "FILTERING_CONTOURS",
            PickAndPlaceState::MatchingWorkpieces => "MATCHING_WORKPIECES",
            PickAndPlaceState::ProcessingWorkpiece => "PROCESSING_WORKPIECE",
            PickAndPlaceState::CalculatingPickupPosition => "CALCULATING_PICKUP_POSITION",
            PickAndPlaceState::CalculatingPlacementPosition => "CALCULATING_PLACEMENT_POSITION",
            PickAndPlaceState::ChangingGripper => "CHANGING_GRIPPER",
            PickAndPlaceState::VerifyingGripper => "VERIFYING_GRIPPER",
            PickAndPlaceState::MeasuringHeight => "MEASURING_HEIGHT",
            PickAndPlaceState::ExecutingPickAndPlace => "EXECUTING_PICK_AND_PLACE",
            PickAndPlaceState::UpdatingDebugInfo => "UPDATING_DEBUG_INFO",
            PickAndPlaceState::CheckingForMoreWorkpieces => "CHECKING_FOR_MORE_WORKPIECES",
            PickAndPlaceState::Paused => "PAUSED",
            PickAndPlaceState::Stopped => "STOPPED",
            PickAndPlaceState::CleaningUp => "CLEANING_UP",
            PickAndPlaceState::DroppingGripper => "DROPPING_GRIPPER",
            PickAndPlaceState::Completed => "COMPLETED",
            PickAndPlaceState::Error => "ERROR",
        }
    }

    /// 按名称解析（大小写不敏感）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(name))
    }

    /// 是否为流水线状态
    pub fn is_active(self) -> bool {
        let id = u8::from(self);
        (u8::from(PickAndPlaceState::MovingToCapturePosition)
            ..=u8::from(PickAndPlaceState::CheckingForMoreWorkpieces))
            .contains(&id)
    }

    /// 是否为终态（`COMPLETED` / `ERROR`）
    pub fn is_terminal(self) -> bool {
        matches!(self, PickAndPlaceState::Completed | PickAndPlaceState::Error)
    }
}

impl MachineState for PickAndPlaceState {
    fn name(&self) -> &'static str {
        PickAndPlaceState::name(*self)
    }
}

impl fmt::Display for PickAndPlaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
