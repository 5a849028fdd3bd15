//! 激光测高工作流
//!
//! 测量期间激光器必须在任何退出路径上关闭，由 [`LaserGuard`] 保证
//! （包括 panic 展开）。

use crate::error::NestingError;
use nesting_hal::{HalError, LaserHeightService, MotionParams, RobotService, Switchable, VisionService};
use nesting_model::{MeasurementConfig, Point2, Pose};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// 作用域结束时关闭激光
struct LaserGuard<'a> {
    laser: &'a dyn Switchable,
}

impl Drop for LaserGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.laser.turn_off() {
            error!("Failed to turn off laser after measurement: {}", e);
        }
    }
}

pub struct MeasurementWorkflow {
    robot: Arc<dyn RobotService>,
    vision: Arc<dyn VisionService>,
    laser_height: Arc<dyn LaserHeightService>,
    laser: Arc<dyn Switchable>,
    motion: MotionParams,
    config: MeasurementConfig,
}

impl MeasurementWorkflow {
    pub fn new(
        robot: Arc<dyn RobotService>,
        vision: Arc<dyn VisionService>,
        laser_height: Arc<dyn LaserHeightService>,
        laser: Arc<dyn Switchable>,
        motion: MotionParams,
        config: MeasurementConfig,
    ) -> Self {
        MeasurementWorkflow {
            robot,
            vision,
            laser_height,
            laser,
            motion,
            config,
        }
    }

    /// 测高位姿
    ///
    /// 机器人坐标系质心（未叠加末端偏移）逆时针旋转 90°：
    /// `x' = -y, y' = x`，高度为 `measurement_height`。
    pub fn prepare_height_measurement_position(&self, centroid: Point2, rz_orientation: f64) -> Pose {
        Pose::new(
            -centroid.y,
            centroid.x,
            self.config.measurement_height,
            180.0,
            0.0,
            rz_orientation,
        )
    }

    /// 在 `position` 处测量工件高度（已加固定补偿）
    ///
    /// 步骤：移动 → 开激光 → 等待稳定 → 丢弃若干帧 → 取一帧 → 测高 → 关激光。
    ///
    /// # 错误
    ///
    /// 运动失败、激光打开失败、取不到图像或测高失败。
    /// 任何情况下返回前激光都已关闭。
    pub fn measure_workpiece_height(&self, position: &Pose) -> Result<f64, NestingError> {
        let _guard = LaserGuard {
            laser: self.laser.as_ref(),
        };

        info!("Moving to height measurement position {}", position);
        HalError::check_motion(self.robot.move_to_position(position, &self.motion))?;

        self.laser.turn_on()?;
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            thread::sleep(settle);
        }

        for _ in 0..self.config.discard_frames {
            let _ = self.vision.get_latest_frame();
        }
        let frame = self
            .vision
            .get_latest_frame()
            .ok_or_else(|| NestingError::Measurement("no camera frame available".into()))?;
        debug!("Measuring height on frame {}", frame.sequence);

        let reading = self.laser_height.measure_height(&frame)?;
        let height = reading.height_mm + self.config.height_adjustment;
        info!(
            "Measured height {:.3} mm (raw {:.3} mm, pixel metric {:.2})",
            height, reading.height_mm, reading.pixel_metric
        );
        Ok(height)
    }
}
