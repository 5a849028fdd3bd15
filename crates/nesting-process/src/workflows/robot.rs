//! 机器人工作流：拍照位、夹爪换装、硬件释放

use crate::error::NestingError;
use nesting_hal::{GripperManager, HalError, MOTION_OK, RobotService, Switchable};
use nesting_model::{MotionConfig, ToolId};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct RobotWorkflow {
    robot: Arc<dyn RobotService>,
    grippers: Arc<dyn GripperManager>,
    laser: Arc<dyn Switchable>,
    capture_retries: u32,
    capture_retry_delay: Duration,
}

impl RobotWorkflow {
    pub fn new(
        robot: Arc<dyn RobotService>,
        grippers: Arc<dyn GripperManager>,
        laser: Arc<dyn Switchable>,
        motion: &MotionConfig,
    ) -> Self {
        RobotWorkflow {
            robot,
            grippers,
            laser,
            capture_retries: motion.capture_retries.max(1),
            capture_retry_delay: motion.capture_retry_delay(),
        }
    }

    pub fn current_tool(&self) -> Option<ToolId> {
        self.robot.current_tool()
    }

    /// 移动到拍照位（有限次重试）
    ///
    /// 全部失败时关闭激光并返回最后一次的状态码。
    pub fn move_to_capture_position(&self) -> Result<(), NestingError> {
        let mut code = MOTION_OK;
        for attempt in 1..=self.capture_retries {
            code = self.robot.move_to_capture_position();
            if code == MOTION_OK {
                debug!("Reached capture position (attempt {})", attempt);
                return Ok(());
            }
            warn!(
                "Move to capture position failed with code {} (attempt {}/{})",
                code, attempt, self.capture_retries
            );
            if attempt < self.capture_retries && !self.capture_retry_delay.is_zero() {
                thread::sleep(self.capture_retry_delay);
            }
        }

        self.laser_off();
        Err(NestingError::CapturePosition {
            attempts: self.capture_retries,
            code,
        })
    }

    /// 放下当前夹爪（如果有）并取 `target`
    ///
    /// 失败时关闭激光。
    pub fn swap_gripper(&self, target: ToolId) -> Result<(), NestingError> {
        let result = self.try_swap(target);
        if result.is_err() {
            self.laser_off();
        }
        result
    }

    fn try_swap(&self, target: ToolId) -> Result<(), NestingError> {
        if let Some(mounted) = self.robot.current_tool() {
            info!("Dropping off gripper {}", mounted);
            self.grippers
                .drop_off_gripper(mounted)
                .map_err(|e| gripper_error(target, e))?;
        }
        info!("Picking up gripper {}", target);
        self.grippers
            .pickup_gripper(target)
            .map_err(|e| gripper_error(target, e))
    }

    /// 确认 `target` 已安装，失败时关闭激光
    pub fn verify_gripper(&self, target: ToolId) -> Result<(), NestingError> {
        if self.grippers.verify_gripper_change(target) {
            info!("Gripper {} verified", target);
            return Ok(());
        }
        self.laser_off();
        Err(NestingError::GripperChange {
            target,
            reason: format!(
                "verification failed, mounted tool is {:?}",
                self.robot.current_tool()
            ),
        })
    }

    /// 放下夹爪并关闭激光
    ///
    /// 放夹爪失败时激光仍会关闭，然后返回该错误。
    pub fn release_hardware(&self) -> Result<(), NestingError> {
        let dropped = match self.robot.current_tool() {
            Some(mounted) => {
                info!("Releasing gripper {}", mounted);
                self.grippers
                    .drop_off_gripper(mounted)
                    .map_err(|e| gripper_error(mounted, e))
            },
            None => Ok(()),
        };
        self.laser_off();
        dropped
    }

    /// 关闭激光（失败只记录日志）
    pub fn laser_off(&self) {
        if let Err(e) = self.laser.turn_off() {
            error!("Failed to turn off laser: {}", e);
        }
    }
}

fn gripper_error(target: ToolId, source: HalError) -> NestingError {
    NestingError::GripperChange {
        target,
        reason: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nesting_hal::mock::{MockRobot, MockSwitch};

    fn motion() -> MotionConfig {
        MotionConfig {
            capture_retries: 3,
            capture_retry_delay_ms: 0,
            ..MotionConfig::default()
        }
    }

    fn workflow(robot: Arc<MockRobot>, laser: Arc<MockSwitch>) -> RobotWorkflow {
        RobotWorkflow::new(robot.clone(), robot, laser, &motion())
    }

    #[test]
    fn test_capture_position_retries() {
        let robot = Arc::new(MockRobot::new());
        let laser = Arc::new(MockSwitch::new("laser"));
        robot.fail_capture_moves(2);

        workflow(robot.clone(), laser.clone())
            .move_to_capture_position()
            .unwrap();
        assert_eq!(robot.capture_moves(), 3);
        assert_eq!(laser.off_count(), 0);
    }

    #[test]
    fn test_capture_position_gives_up_and_turns_laser_off() {
        let robot = Arc::new(MockRobot::new());
        let laser = Arc::new(MockSwitch::new("laser"));
        robot.fail_capture_moves(10);

        let err = workflow(robot.clone(), laser.clone())
            .move_to_capture_position()
            .unwrap_err();
        assert_eq!(err, NestingError::CapturePosition { attempts: 3, code: -1 });
        assert_eq!(robot.capture_moves(), 3);
        assert_eq!(laser.off_count(), 1);
    }

    #[test]
    fn test_swap_drops_mounted_gripper_first() {
        let robot = Arc::new(MockRobot::new().with_tool(Some(1)));
        let laser = Arc::new(MockSwitch::new("laser"));
        let wf = workflow(robot.clone(), laser.clone());

        wf.swap_gripper(2).unwrap();
        wf.verify_gripper(2).unwrap();
        assert_eq!(robot.drops(), vec![1]);
        assert_eq!(robot.pickups(), vec![2]);
        assert_eq!(laser.off_count(), 0);
    }

    #[test]
    fn test_swap_failure_turns_laser_off() {
        let robot = Arc::new(MockRobot::new());
        let laser = Arc::new(MockSwitch::new("laser"));
        robot.fail_pickups();

        let err = workflow(robot, laser.clone()).swap_gripper(1).unwrap_err();
        assert!(matches!(err, NestingError::GripperChange { target: 1, .. }));
        assert_eq!(laser.off_count(), 1);
    }

    #[test]
    fn test_verification_failure_turns_laser_off() {
        let robot = Arc::new(MockRobot::new());
        let laser = Arc::new(MockSwitch::new("laser"));
        robot.fail_verification();
        let wf = workflow(robot, laser.clone());

        wf.swap_gripper(2).unwrap();
        assert!(wf.verify_gripper(2).is_err());
        assert_eq!(laser.off_count(), 1);
    }

    #[test]
    fn test_release_without_gripper_only_turns_laser_off() {
        let robot = Arc::new(MockRobot::new());
        let laser = Arc::new(MockSwitch::new("laser"));
        workflow(robot.clone(), laser.clone())
            .release_hardware()
            .unwrap();
        assert!(robot.drops().is_empty());
        assert_eq!(laser.off_count(), 1);
    }

    #[test]
    fn test_release_reports_drop_failure_after_laser_off() {
        let robot = Arc::new(MockRobot::new().with_tool(Some(2)));
        let laser = Arc::new(MockSwitch::new("laser"));
        robot.fail_drops();
        let result = workflow(robot, laser.clone()).release_hardware();
        assert!(result.is_err());
        assert_eq!(laser.off_count(), 1);
    }
}
