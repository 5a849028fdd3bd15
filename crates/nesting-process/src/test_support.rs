//! 单元测试辅助

use crate::application::Application;
use crate::context::PickAndPlaceContext;
use crate::flags::ControlFlags;
use nesting_hal::mock::MockCell;
use nesting_model::{Contour, Gripper, NestingConfig, Point2, Workpiece};
use std::sync::Arc;

/// 所有等待时间为零的配置
pub(crate) fn fast_config() -> NestingConfig {
    let mut config = NestingConfig::default();
    config.process.retry_delay_ms = 0;
    config.process.loop_delay_ms = 0;
    config.process.max_retries = 2;
    config.motion.capture_retry_delay_ms = 0;
    config.measurement.settle_delay_ms = 0;
    config
}

pub(crate) fn square(x: f64, y: f64, side: f64) -> Contour {
    Contour::rectangle(Point2::new(x, y), side, side)
}

/// 20×20 的双吸盘模板
pub(crate) fn plate() -> Workpiece {
    Workpiece::new("plate", Gripper::Double, square(0.0, 0.0, 20.0))
}

pub(crate) fn context(cell: &MockCell) -> PickAndPlaceContext {
    let application = Application::new(cell.collaborators(), fast_config());
    PickAndPlaceContext::new(&application, vec![plate()], Arc::new(ControlFlags::new()))
}
