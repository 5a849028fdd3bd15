//! # Nesting HAL - 外部协作者抽象层
//!
//! 拾取-放置流程依赖的所有硬件与算法服务都以 trait 的形式定义在这里，
//! 流程层只持有 `Arc<dyn Trait>`，不关心具体实现。
//!
//! ## 协作者
//!
//! - [`RobotService`] - 机器人运动
//! - [`GripperManager`] - 夹爪换装台
//! - [`Switchable`] - 真空泵 / 激光器开关
//! - [`VisionService`] - 相机、轮廓检测、标定矩阵
//! - [`LaserHeightService`] - 激光三角测高
//! - [`WorkpieceMatcher`] - 轮廓与模板匹配
//! - [`PickupCalculator`] / [`PlacementService`] / [`GripperOffsetService`] - 几何计算
//!
//! [`Collaborators`] 把一个工作站的全部协作者打包传给流程层。
//!
//! ## Mock 实现
//!
//! 启用 `mock` feature 后，[`mock`] 模块提供可脚本化的内存实现，
//! 供测试和 `nesting-cli simulate` 使用。

pub mod collaborators;
pub mod error;
pub mod placement;
pub mod robot;
pub mod tools;
pub mod vision;

#[cfg(feature = "mock")]
pub mod mock;

pub use collaborators::Collaborators;
pub use error::HalError;
pub use placement::{
    GripperOffsetService, PickupCalculator, PickupPlan, PlacementOutcome, PlacementService,
};
pub use robot::{GripperManager, MOTION_OK, MotionParams, RobotService};
pub use tools::Switchable;
pub use vision::{
    Frame, HeightReading, LaserHeightService, MatchOutcome, VisionService, WorkpieceMatcher,
};
