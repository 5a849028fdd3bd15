//! 放置执行工作流
//!
//! 负责从匹配结果推导拾取点，以及执行完整的拾取-放置动作序列：
//!
//! ```text
//! 泵开 → 3 个拾取点 → 中间路径点 → 2 个放置点 → 泵关 → 标定位
//! ```
//!
//! 任一运动返回非零状态码都会中止序列，并在报告失败前关闭真空泵。

use crate::error::{NestingError, SequenceStep};
use crate::workflows::measurement::MeasurementWorkflow;
use nesting_hal::{GripperOffsetService, HalError, MotionParams, RobotService, Switchable};
use nesting_model::{
    DropOffPositions, Gripper, GrippersConfig, Homography, Match, MotionConfig, PickupPositions,
    Point2, Pose, VisionConfig, WorkpiecePlacement,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct PlacementWorkflow {
    robot: Arc<dyn RobotService>,
    pump: Arc<dyn Switchable>,
    offsets: Arc<dyn GripperOffsetService>,
    grippers: GrippersConfig,
    motion: MotionConfig,
    params: MotionParams,
    vision: VisionConfig,
    measurement: MeasurementWorkflow,
}

impl PlacementWorkflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        robot: Arc<dyn RobotService>,
        pump: Arc<dyn Switchable>,
        offsets: Arc<dyn GripperOffsetService>,
        grippers: GrippersConfig,
        motion: MotionConfig,
        vision: VisionConfig,
        measurement: MeasurementWorkflow,
    ) -> Self {
        PlacementWorkflow {
            params: MotionParams::from_config(&motion),
            robot,
            pump,
            offsets,
            grippers,
            motion,
            vision,
            measurement,
        }
    }

    pub fn measurement(&self) -> &MeasurementWorkflow {
        &self.measurement
    }

    /// 拾取点（像素）：模板声明的拾取点，否则为轮廓质心
    pub fn determine_pickup_point(&self, found: &Match) -> Result<Point2, NestingError> {
        found
            .pickup_point()
            .or_else(|| found.main_contour().centroid())
            .ok_or(NestingError::MissingData("contour centroid"))
    }

    /// 把像素拾取点变换到机器人坐标系
    ///
    /// 返回 `(测高用, 拾取用)`：测高使用未叠加末端偏移的点，
    /// 拾取使用叠加偏移后的点。
    pub fn transform_centroids(&self, homography: &Homography, pixel: Point2) -> (Point2, Point2) {
        let for_height = homography.apply(pixel);
        let flat = homography.apply_with_offset(
            pixel,
            self.vision.end_effector_offset_x,
            self.vision.end_effector_offset_y,
        );
        debug!(
            "Pickup point ({:.2}, {:.2}) px -> ({:.3}, {:.3}) mm, height sample at ({:.3}, {:.3}) mm",
            pixel.x, pixel.y, flat.x, flat.y, for_height.x, for_height.y
        );
        (for_height, flat)
    }

    /// 测高并执行一个工件的拾取-放置
    ///
    /// # 参数
    ///
    /// - `placement`: 放置服务给出的结果（必须已附带拾取路径点）
    /// - `gripper`: 当前安装的夹爪
    /// - `centroid_for_height`: 机器人坐标系下未叠加偏移的质心
    /// - `rz_orientation`: 末端 RZ 基准姿态
    pub fn execute_workpiece_placement(
        &self,
        placement: &WorkpiecePlacement,
        gripper: Gripper,
        centroid_for_height: Point2,
        rz_orientation: f64,
    ) -> Result<(), NestingError> {
        let pickups = placement
            .pickup_positions
            .ok_or(NestingError::MissingData("pickup positions"))?;

        let sample_point = self
            .measurement
            .prepare_height_measurement_position(centroid_for_height, rz_orientation);
        let measured_height = self.measurement.measure_workpiece_height(&sample_point)?;

        let drop_offs = self
            .offsets
            .apply_to_drop_offs(gripper, placement.drop_off_positions);
        self.execute_pick_and_place_sequence(pickups, drop_offs, measured_height, gripper)
    }

    /// 执行动作序列，失败时强制关闭真空泵
    pub fn execute_pick_and_place_sequence(
        &self,
        pickups: PickupPositions,
        drop_offs: DropOffPositions,
        measured_height: f64,
        gripper: Gripper,
    ) -> Result<(), NestingError> {
        let result = self.run_sequence(pickups, drop_offs, measured_height, gripper);
        if let Err(e) = &result {
            error!("Pick-and-place aborted: {}", e);
            self.pump_off();
        }
        result
    }

    /// 关闭真空泵（失败只记录日志）
    pub fn pump_off(&self) {
        if let Err(e) = self.pump.turn_off() {
            error!("Failed to turn off pump: {}", e);
        }
    }

    fn run_sequence(
        &self,
        pickups: PickupPositions,
        drop_offs: DropOffPositions,
        measured_height: f64,
        gripper: Gripper,
    ) -> Result<(), NestingError> {
        let z_min = self.robot.safety_z_min();

        self.pump
            .turn_on()
            .map_err(NestingError::at_step(SequenceStep::PumpOn))?;

        for (index, waypoint) in pickups.to_array().into_iter().enumerate() {
            let mut target = waypoint;
            if index == PickupPositions::CONTACT_INDEX {
                target.z = self.contact_z(z_min, gripper, measured_height);
            }
            self.move_to(&target)
                .map_err(NestingError::at_step(SequenceStep::Pickup(index)))?;
        }

        self.move_to(&self.intermediate_waypoint(z_min))
            .map_err(NestingError::at_step(SequenceStep::Waypoint))?;

        let (first, second) = drop_offs.to_tuple();
        self.move_to(&first)
            .map_err(NestingError::at_step(SequenceStep::DropOff(1)))?;
        self.move_to(&second)
            .map_err(NestingError::at_step(SequenceStep::DropOff(2)))?;

        self.pump
            .turn_off()
            .map_err(NestingError::at_step(SequenceStep::PumpOff))?;

        HalError::check_motion(self.robot.move_to_calibration_position())
            .map_err(NestingError::at_step(SequenceStep::Home))?;

        info!("Pick-and-place sequence completed");
        Ok(())
    }

    /// 接触点 Z = 安全下限 + 夹爪 Z 补偿 + 实测高度
    pub fn contact_z(&self, z_min: f64, gripper: Gripper, measured_height: f64) -> f64 {
        z_min + self.grippers.offset_for(gripper).z + measured_height
    }

    pub fn intermediate_waypoint(&self, z_min: f64) -> Pose {
        Pose::new(
            self.motion.intermediate_x,
            self.motion.intermediate_y,
            z_min + self.motion.intermediate_z_above_min,
            180.0,
            0.0,
            0.0,
        )
    }

    fn move_to(&self, pose: &Pose) -> Result<(), HalError> {
        debug!("Moving to {}", pose);
        HalError::check_motion(self.robot.move_to_position(pose, &self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ConfigGripperOffsets;
    use nesting_hal::mock::{MockLaserHeight, MockRobot, MockSwitch, MockVision};
    use nesting_model::{Contour, Dimensions, MeasurementConfig, Workpiece};

    struct Rig {
        robot: Arc<MockRobot>,
        pump: Arc<MockSwitch>,
        laser: Arc<MockSwitch>,
        workflow: PlacementWorkflow,
    }

    fn rig() -> Rig {
        let robot = Arc::new(MockRobot::new().with_z_min(20.0));
        let pump = Arc::new(MockSwitch::new("pump"));
        let laser = Arc::new(MockSwitch::new("laser"));
        let motion = MotionConfig::default();
        let measurement = MeasurementWorkflow::new(
            robot.clone(),
            Arc::new(MockVision::new()),
            Arc::new(MockLaserHeight::new(5.0)),
            laser.clone(),
            MotionParams::from_config(&motion),
            MeasurementConfig {
                settle_delay_ms: 0,
                ..MeasurementConfig::default()
            },
        );
        let workflow = PlacementWorkflow::new(
            robot.clone(),
            pump.clone(),
            Arc::new(ConfigGripperOffsets::new(GrippersConfig::default())),
            GrippersConfig::default(),
            motion,
            VisionConfig::default(),
            measurement,
        );
        Rig {
            robot,
            pump,
            laser,
            workflow,
        }
    }

    fn pickups() -> PickupPositions {
        let contact = Pose::new(100.0, 50.0, 37.0, 180.0, 0.0, 90.0);
        PickupPositions {
            approach: contact.with_z(187.0),
            contact,
            lift: contact.with_z(187.0),
        }
    }

    fn placement() -> WorkpiecePlacement {
        let drop = Pose::new(300.0, -200.0, 40.0, 180.0, 0.0, 90.0);
        WorkpiecePlacement {
            pickup_positions: Some(pickups()),
            drop_off_positions: DropOffPositions {
                position1: drop.with_z(140.0),
                position2: drop,
            },
            footprint: Contour::rectangle(Point2::new(0.0, 0.0), 10.0, 10.0),
            dimensions: Dimensions {
                width: 10.0,
                height: 10.0,
            },
            source_contour: Contour::rectangle(Point2::new(0.0, 0.0), 10.0, 10.0),
        }
    }

    #[test]
    fn test_full_sequence_order_and_z_correction() {
        let rig = rig();
        rig.workflow
            .execute_workpiece_placement(&placement(), Gripper::Single, Point2::new(10.0, 20.0), 90.0)
            .unwrap();

        let moves = rig.robot.moves();
        // 测高 + 3 拾取 + 中间点 + 2 放置
        assert_eq!(moves.len(), 7);
        assert_eq!((moves[0].x, moves[0].y, moves[0].z), (-20.0, 10.0, 350.0));

        // 接触点：20 + 19 (单吸盘) + (5.0 + 2.0)
        assert!((moves[2].z - 46.0).abs() < 1e-9);
        assert_eq!(moves[1].z, 187.0);
        assert_eq!(moves[3].z, 187.0);

        let waypoint = moves[4];
        assert_eq!((waypoint.x, waypoint.y, waypoint.z), (-317.997, 261.207, 170.0));

        // 放置点叠加夹爪 X/Y 偏移
        assert!((moves[5].x - 400.429).abs() < 1e-9);
        assert!((moves[6].y - (-198.009)).abs() < 1e-9);
        assert_eq!(moves[6].z, 40.0);

        assert_eq!(rig.robot.calibration_moves(), 1);
        assert_eq!(rig.pump.on_count(), 1);
        assert_eq!(rig.pump.off_count(), 1);
        assert!(!rig.pump.is_on());
        assert!(!rig.laser.is_on());
    }

    #[test]
    fn test_aborts_on_first_failed_move_and_releases_pump() {
        let rig = rig();
        // 第 1 次为测高位，第 3 次为接触点
        rig.robot.fail_move(3, -2);

        let err = rig
            .workflow
            .execute_workpiece_placement(&placement(), Gripper::Double, Point2::new(0.0, 0.0), 90.0)
            .unwrap_err();
        assert_eq!(
            err,
            NestingError::Sequence {
                step: SequenceStep::Pickup(1),
                source: HalError::Motion { code: -2 },
            }
        );
        assert_eq!(rig.robot.move_count(), 3);
        assert_eq!(rig.robot.calibration_moves(), 0);
        assert!(!rig.pump.is_on());
    }

    #[test]
    fn test_drop_off_failure_releases_pump() {
        let rig = rig();
        let drop_offs = placement().drop_off_positions;
        rig.robot.fail_move(5, -9);
        let err = rig
            .workflow
            .execute_pick_and_place_sequence(pickups(), drop_offs, 3.0, Gripper::Single)
            .unwrap_err();
        assert!(matches!(
            err,
            NestingError::Sequence {
                step: SequenceStep::DropOff(1),
                ..
            }
        ));
        assert!(!rig.pump.is_on());
    }

    #[test]
    fn test_pump_failure_stops_before_motion() {
        let rig = rig();
        rig.pump.fail_turn_on();
        let drop_offs = placement().drop_off_positions;
        let result =
            rig.workflow
                .execute_pick_and_place_sequence(pickups(), drop_offs, 3.0, Gripper::Single);
        assert!(result.is_err());
        assert_eq!(rig.robot.move_count(), 0);
    }

    #[test]
    fn test_measurement_failure_skips_motion_sequence() {
        let rig = rig();
        rig.robot.fail_move(1, -1);
        let result = rig.workflow.execute_workpiece_placement(
            &placement(),
            Gripper::Single,
            Point2::new(0.0, 0.0),
            90.0,
        );
        assert!(result.is_err());
        assert_eq!(rig.pump.on_count(), 0);
        assert_eq!(rig.robot.move_count(), 1);
    }

    #[test]
    fn test_missing_pickup_positions() {
        let rig = rig();
        let mut bare = placement();
        bare.pickup_positions = None;
        let err = rig
            .workflow
            .execute_workpiece_placement(&bare, Gripper::Single, Point2::new(0.0, 0.0), 90.0)
            .unwrap_err();
        assert_eq!(err, NestingError::MissingData("pickup positions"));
        assert_eq!(rig.robot.move_count(), 0);
    }

    #[test]
    fn test_pickup_point_prefers_declared_point() {
        let rig = rig();
        let contour = Contour::rectangle(Point2::new(0.0, 0.0), 10.0, 10.0);
        let plain = Arc::new(Workpiece::new("plain", Gripper::Single, contour.clone()));
        let declared = Arc::new(
            Workpiece::new("declared", Gripper::Single, contour.clone())
                .with_pickup_point(Point2::new(2.0, 3.0)),
        );

        let centroid = rig
            .workflow
            .determine_pickup_point(&Match::new(plain, contour.clone()))
            .unwrap();
        assert!((centroid.x - 5.0).abs() < 1e-9 && (centroid.y - 5.0).abs() < 1e-9);

        let point = rig
            .workflow
            .determine_pickup_point(&Match::new(declared, contour))
            .unwrap();
        assert_eq!(point, Point2::new(2.0, 3.0));
    }

    #[test]
    fn test_transform_applies_offset_only_to_flat_point() {
        let rig = rig();
        let (for_height, flat) = rig
            .workflow
            .transform_centroids(&Homography::identity(), Point2::new(10.0, 10.0));
        assert_eq!(for_height, Point2::new(10.0, 10.0));
        assert!((flat.x - 9.959).abs() < 1e-9);
        assert!((flat.y - 86.859).abs() < 1e-9);
    }
}
