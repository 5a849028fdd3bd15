//! 模拟命令
//!
//! 在内存中的 Mock 工作站上运行完整的拾取-放置流程：相机按批次返回
//! 预设轮廓，放置平面有固定容量，机器人、真空泵和激光器记录所有调用。

use super::config::load_config;
use anyhow::{Context, Result};
use clap::Args;
use nesting_engine::LogPublisher;
use nesting_hal::mock::MockCell;
use nesting_model::{Contour, Gripper, NestingConfig, Point2, Workpiece};
use nesting_process::{
    Application, OperationResult, OperationStatus, PickAndPlaceController, PickAndPlaceOperation,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// 同一批次中轮廓的间距（像素）
const SPACING: f64 = 80.0;

/// 模拟命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 配置文件（缺省时使用默认配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 含工件的拍照批次数
    #[arg(long, default_value_t = 2)]
    pub batches: usize,

    /// 每批工件数
    #[arg(long, default_value_t = 3)]
    pub batch_size: usize,

    /// 放置平面容量
    #[arg(long, default_value_t = 5)]
    pub plane_capacity: usize,

    /// 批次之后只出现无法识别的碎屑的周期数
    #[arg(long, default_value_t = 0)]
    pub empty_cycles: usize,

    /// 启动后多少毫秒请求停止
    #[arg(long)]
    pub stop_after_ms: Option<u64>,

    /// 所有等待时间清零
    #[arg(long)]
    pub fast: bool,

    /// 以 JSON 输出结果
    #[arg(long)]
    pub json: bool,
}

/// 一次模拟的结果
pub struct Simulation {
    pub result: OperationResult,
    pub status: OperationStatus,
    pub cell: MockCell,
}

impl SimulateCommand {
    pub fn execute(&self) -> Result<OperationResult> {
        let simulation = self.run(true)?;
        self.report(&simulation)?;
        Ok(simulation.result)
    }

    /// 运行模拟
    ///
    /// `interactive` 为真时安装 Ctrl-C 处理器（每个进程只能安装一次）。
    pub fn run(&self, interactive: bool) -> Result<Simulation> {
        let config = self.load_config()?;
        let wait_timeout = config.process.wait_timeout();
        let cell = self.build_cell();
        let application =
            Application::new(cell.collaborators(), config).with_message_broker(Arc::new(LogPublisher));

        info!(
            "Simulating {} batches of {} workpieces, plane capacity {}",
            self.batches, self.batch_size, self.plane_capacity
        );

        let mut operation = PickAndPlaceOperation::new();
        let controller = operation
            .launch(&application, templates())
            .context("Failed to launch operation")?;

        if interactive {
            install_interrupt_handler(controller.clone())?;
        }
        if let Some(ms) = self.stop_after_ms {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(ms));
                info!("Stop timer elapsed after {} ms", ms);
                controller.stop();
            });
        }

        let result = operation.wait_for_completion(wait_timeout);
        let status = operation.operation_status();
        Ok(Simulation {
            result,
            status,
            cell,
        })
    }

    fn load_config(&self) -> Result<NestingConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if self.fast {
            config.process.retry_delay_ms = 0;
            config.process.loop_delay_ms = 0;
            config.motion.capture_retry_delay_ms = 0;
            config.measurement.settle_delay_ms = 0;
        }
        Ok(config)
    }

    fn build_cell(&self) -> MockCell {
        let cell = MockCell::new(self.plane_capacity);
        for batch in 0..self.batches {
            cell.vision.push_batch(scatter(batch, self.batch_size));
        }
        for _ in 0..self.empty_cycles {
            cell.vision.push_batch(vec![debris()]);
        }
        cell
    }

    fn report(&self, simulation: &Simulation) -> Result<()> {
        if self.json {
            let report = serde_json::json!({
                "result": simulation.result,
                "status": simulation.status,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let result = &simulation.result;
        let cell = &simulation.cell;
        let icon = if result.success { "✅" } else { "❌" };
        println!("{} {}", icon, result.message);
        if let Some(state) = result.final_state {
            println!("   final state:     {}", state);
        }
        if let Some(reason) = result.reason {
            println!("   reason:          {}", reason);
        }
        println!("   errors:          {}", simulation.status.summary.error_count);
        println!(
            "   plane slots:     {}/{}",
            cell.plane.placed(),
            cell.plane.capacity()
        );
        println!("   robot moves:     {}", cell.robot.move_count());
        println!(
            "   gripper changes: picked {:?}, dropped {:?}",
            cell.robot.pickups(),
            cell.robot.drops()
        );
        Ok(())
    }
}

/// 第一次 Ctrl-C 请求停止，第二次急停
fn install_interrupt_handler(controller: PickAndPlaceController) -> Result<()> {
    let presses = AtomicUsize::new(0);
    ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) == 0 {
            warn!("Interrupt received, stopping (press Ctrl-C again for emergency stop)");
            controller.stop();
        } else {
            warn!("Second interrupt, emergency stop");
            controller.emergency_stop();
        }
    })
    .context("Failed to set Ctrl-C handler")
}

/// 模拟用的两种工件模板
pub fn templates() -> Vec<Workpiece> {
    vec![
        Workpiece::new("plate", Gripper::Double, rectangle(0.0, 0.0, 40.0, 40.0)),
        Workpiece::new("strip", Gripper::Single, rectangle(0.0, 0.0, 90.0, 12.0)),
    ]
}

/// 第 `batch` 批：`count` 个工件，plate 与 strip 交替
fn scatter(batch: usize, count: usize) -> Vec<Contour> {
    (0..count)
        .map(|i| {
            let x = 100.0 + i as f64 * SPACING;
            let y = 100.0 + batch as f64 * 10.0;
            if i % 2 == 0 {
                rectangle(x, y, 40.0, 40.0)
            } else {
                rectangle(x, y, 90.0, 12.0)
            }
        })
        .collect()
}

/// 面积远小于任何模板的碎屑
fn debris() -> Contour {
    rectangle(500.0, 500.0, 4.0, 4.0)
}

fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Contour {
    Contour::rectangle(Point2::new(x, y), width, height)
}
