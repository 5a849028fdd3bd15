//! 默认几何服务
//!
//! 未在 [`Application`](crate::Application) 中提供自定义实现时使用。

use nesting_hal::{GripperOffsetService, HalError, PickupCalculator, PickupPlan, RobotService};
use nesting_model::{Gripper, GripperOffset, GrippersConfig, PickupPositions, Point2, Pose};
use std::sync::Arc;

/// 竖直下降式拾取
///
/// 接近点在接触点正上方 `descent_offset` 毫米，抬升点与接近点重合：
///
/// ```text
/// approach ──┐        ┌── lift
///            │        │
///            └ contact┘
/// ```
///
/// 接触高度 = 安全 Z 下限 + 夹爪 Z 补偿 + 名义工件厚度。执行阶段会用实测
/// 高度替换接触点的 Z。
pub struct DescentPickupCalculator {
    robot: Arc<dyn RobotService>,
    grippers: GrippersConfig,
    descent_offset: f64,
}

impl DescentPickupCalculator {
    pub fn new(robot: Arc<dyn RobotService>, grippers: GrippersConfig, descent_offset: f64) -> Self {
        DescentPickupCalculator {
            robot,
            grippers,
            descent_offset,
        }
    }
}

impl PickupCalculator for DescentPickupCalculator {
    fn calculate_pickup_positions(
        &self,
        robot_point: Point2,
        match_height: f64,
        orientation: f64,
        gripper: Gripper,
        rz_orientation: f64,
    ) -> Result<PickupPlan, HalError> {
        if !(robot_point.x.is_finite() && robot_point.y.is_finite()) {
            return Err(HalError::device(
                "pickup-calculator",
                format!("non-finite pickup point ({}, {})", robot_point.x, robot_point.y),
            ));
        }

        let contact_z =
            self.robot.safety_z_min() + self.grippers.offset_for(gripper).z + match_height;
        let contact = Pose::new(
            robot_point.x,
            robot_point.y,
            contact_z,
            180.0,
            0.0,
            rz_orientation + orientation,
        );
        let approach = contact.with_z(contact_z + self.descent_offset);

        Ok(PickupPlan {
            positions: PickupPositions {
                approach,
                contact,
                lift: approach,
            },
            height_measure_position: approach,
            pickup_height: contact_z,
        })
    }
}

/// 从 `[grippers]` 配置读取夹爪偏移
pub struct ConfigGripperOffsets {
    config: GrippersConfig,
}

impl ConfigGripperOffsets {
    pub fn new(config: GrippersConfig) -> Self {
        ConfigGripperOffsets { config }
    }
}

impl GripperOffsetService for ConfigGripperOffsets {
    fn offset(&self, gripper: Gripper) -> GripperOffset {
        self.config.offset_for(gripper)
    }
}
