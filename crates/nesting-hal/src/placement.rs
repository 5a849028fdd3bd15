//! 拾取与放置几何服务

use crate::error::HalError;
use nesting_model::{
    DropOffPositions, Gripper, GripperOffset, Match, PickupPositions, Point2, Pose,
    WorkpiecePlacement,
};

/// 拾取计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupPlan {
    /// 接近 → 接触 → 抬升
    pub positions: PickupPositions,
    /// 测高位姿
    pub height_measure_position: Pose,
    /// 估算的拾取高度（毫米）
    pub pickup_height: f64,
}

/// 拾取位姿计算器
pub trait PickupCalculator: Send + Sync {
    /// # 参数
    ///
    /// - `robot_point`: 机器人坐标系下的拾取点（已叠加末端偏移）
    /// - `match_height`: 名义工件厚度
    /// - `orientation`: 工件旋转角（度）
    /// - `gripper`: 使用的夹爪
    /// - `rz_orientation`: 末端 RZ 基准姿态（度）
    fn calculate_pickup_positions(
        &self,
        robot_point: Point2,
        match_height: f64,
        orientation: f64,
        gripper: Gripper,
        rz_orientation: f64,
    ) -> Result<PickupPlan, HalError>;
}

/// 放置计算结果
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// 成功分配到放置位
    Placed(Box<WorkpiecePlacement>),
    /// 放置平面已满
    PlaneFull,
    /// 本工件无法放置（其余工件仍可尝试）
    Failed(String),
}

/// 放置（排样）服务
///
/// 成功返回 `Placed` 即视为该位置已被占用。
pub trait PlacementService: Send + Sync {
    fn calculate_placement_positions(
        &self,
        workpiece: &Match,
        centroid: Point2,
        orientation: f64,
        pickup_height: f64,
        gripper: Gripper,
    ) -> PlacementOutcome;

    /// 平面是否已满
    fn is_full(&self) -> bool;
}

/// 夹爪偏移服务
pub trait GripperOffsetService: Send + Sync {
    fn offset(&self, gripper: Gripper) -> GripperOffset;

    /// 对两个放置点叠加夹爪 X/Y 偏移
    fn apply_to_drop_offs(
        &self,
        gripper: Gripper,
        drop_offs: DropOffPositions,
    ) -> DropOffPositions {
        let offset = self.offset(gripper);
        DropOffPositions {
            position1: drop_offs.position1.translated(offset.x, offset.y),
            position2: drop_offs.position2.translated(offset.x, offset.y),
        }
    }
}
