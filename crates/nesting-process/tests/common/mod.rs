//! 集成测试共享辅助

#![allow(dead_code)]

use nesting_hal::mock::MockCell;
use nesting_model::{Contour, Gripper, NestingConfig, Point2, Workpiece};
use nesting_process::{Application, PickAndPlaceOperation};
use std::time::{Duration, Instant};

/// 控制命令测试的最长等待时间
pub const WAIT: Duration = Duration::from_secs(5);

/// 每个工件的 `move_to_position` 次数：测高 1 + 拾取 3 + 中间点 1 + 放置 2
pub const MOVES_PER_WORKPIECE: usize = 7;

/// 测高之后的第一个拾取运动
pub const FIRST_PICK_MOVE: usize = 2;

/// 所有等待时间为零的配置
pub fn fast_config() -> NestingConfig {
    let mut config = NestingConfig::default();
    config.process.retry_delay_ms = 0;
    config.process.loop_delay_ms = 0;
    config.process.max_retries = 2;
    config.process.wait_timeout_ms = Some(10_000);
    config.motion.capture_retry_delay_ms = 0;
    config.measurement.settle_delay_ms = 0;
    config
}

/// 暂停测试用：循环间隔 1 ms
pub fn paced_config() -> NestingConfig {
    let mut config = fast_config();
    config.process.loop_delay_ms = 1;
    config
}

pub fn square(x: f64, y: f64, side: f64) -> Contour {
    Contour::rectangle(Point2::new(x, y), side, side)
}

/// 20×20 的双吸盘模板
pub fn plate() -> Workpiece {
    Workpiece::new("plate", Gripper::Double, square(0.0, 0.0, 20.0))
}

/// `count` 个与模板匹配的轮廓，沿 X 轴间隔 50 像素
pub fn plates(count: usize) -> Vec<Contour> {
    (0..count)
        .map(|i| square(100.0 + i as f64 * 50.0, 100.0, 20.0))
        .collect()
}

pub fn application(cell: &MockCell, config: NestingConfig) -> Application {
    Application::new(cell.collaborators(), config)
}

/// 轮询直到条件成立
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// 以默认快配置运行一次完整操作
pub fn run(cell: &MockCell) -> (PickAndPlaceOperation, nesting_process::OperationResult) {
    let application = application(cell, fast_config());
    let mut operation = PickAndPlaceOperation::new();
    let result = operation.start(&application, vec![plate()]);
    (operation, result)
}
