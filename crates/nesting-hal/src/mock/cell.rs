//! 完整的 Mock 工作站

use super::{MockLaserHeight, MockMatcher, MockPlane, MockRobot, MockSwitch, MockVision};
use crate::collaborators::Collaborators;
use std::sync::Arc;

/// 默认的 Mock 测高结果（毫米）
const DEFAULT_HEIGHT_MM: f64 = 3.0;

/// 由全部 mock 组成的工作站
///
/// 字段保留具体类型，测试可以在运行前注入故障、运行后检查调用记录。
pub struct MockCell {
    pub robot: Arc<MockRobot>,
    pub vision: Arc<MockVision>,
    pub matcher: Arc<MockMatcher>,
    pub plane: Arc<MockPlane>,
    pub laser_height: Arc<MockLaserHeight>,
    pub pump: Arc<MockSwitch>,
    pub laser: Arc<MockSwitch>,
}

impl MockCell {
    /// 创建放置平面容量为 `plane_capacity` 的工作站
    pub fn new(plane_capacity: usize) -> Self {
        MockCell {
            robot: Arc::new(MockRobot::new()),
            vision: Arc::new(MockVision::new()),
            matcher: Arc::new(MockMatcher::new()),
            plane: Arc::new(MockPlane::new(plane_capacity)),
            laser_height: Arc::new(MockLaserHeight::new(DEFAULT_HEIGHT_MM)),
            pump: Arc::new(MockSwitch::new("pump")),
            laser: Arc::new(MockSwitch::new("laser")),
        }
    }

    /// 以 trait object 形式导出
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            robot: self.robot.clone(),
            grippers: self.robot.clone(),
            vision: self.vision.clone(),
            laser_height: self.laser_height.clone(),
            matcher: self.matcher.clone(),
            placement: self.plane.clone(),
            pump: self.pump.clone(),
            laser: self.laser.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GripperManager, RobotService};

    #[test]
    fn test_robot_and_grippers_share_state() {
        let cell = MockCell::new(1);
        let collaborators = cell.collaborators();
        collaborators.grippers.pickup_gripper(1).unwrap();
        assert_eq!(collaborators.robot.current_tool(), Some(1));
        assert_eq!(cell.robot.pickups(), vec![1]);
    }
}
