//! 应用：协作者 + 配置

use crate::services::{ConfigGripperOffsets, DescentPickupCalculator};
use nesting_engine::StatePublisher;
use nesting_hal::{Collaborators, GripperOffsetService, PickupCalculator};
use nesting_model::NestingConfig;
use std::sync::Arc;

/// 拾取-放置状态遥测的 topic
pub const PICK_AND_PLACE_TOPIC: &str = "PICK_AND_PLACE_STATE";

/// 一次操作所需的全部外部依赖
///
/// # 示例
///
/// ```rust,ignore
/// let application = Application::new(cell.collaborators(), NestingConfig::default())
///     .with_message_broker(Arc::new(LogPublisher));
/// ```
#[derive(Clone)]
pub struct Application {
    pub collaborators: Collaborators,
    pub config: NestingConfig,
    pickup_calculator: Option<Arc<dyn PickupCalculator>>,
    gripper_offsets: Option<Arc<dyn GripperOffsetService>>,
    broker: Option<Arc<dyn StatePublisher>>,
}

impl Application {
    pub fn new(collaborators: Collaborators, config: NestingConfig) -> Self {
        Application {
            collaborators,
            config,
            pickup_calculator: None,
            gripper_offsets: None,
            broker: None,
        }
    }

    /// 替换默认的 [`DescentPickupCalculator`]
    pub fn with_pickup_calculator(mut self, calculator: Arc<dyn PickupCalculator>) -> Self {
        self.pickup_calculator = Some(calculator);
        self
    }

    /// 替换默认的 [`ConfigGripperOffsets`]
    pub fn with_gripper_offsets(mut self, offsets: Arc<dyn GripperOffsetService>) -> Self {
        self.gripper_offsets = Some(offsets);
        self
    }

    /// 每次状态转换都发布到 `broker`（topic 为 [`PICK_AND_PLACE_TOPIC`]）
    pub fn with_message_broker(mut self, broker: Arc<dyn StatePublisher>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn pickup_calculator(&self) -> Arc<dyn PickupCalculator> {
        match &self.pickup_calculator {
            Some(calculator) => calculator.clone(),
            None => Arc::new(DescentPickupCalculator::new(
                self.collaborators.robot.clone(),
                self.config.grippers.clone(),
                self.config.process.descent_height_offset,
            )),
        }
    }

    pub fn gripper_offsets(&self) -> Arc<dyn GripperOffsetService> {
        match &self.gripper_offsets {
            Some(offsets) => offsets.clone(),
            None => Arc::new(ConfigGripperOffsets::new(self.config.grippers.clone())),
        }
    }

    pub fn broker(&self) -> Option<Arc<dyn StatePublisher>> {
        self.broker.clone()
    }
}
