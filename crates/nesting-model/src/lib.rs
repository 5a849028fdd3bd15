//! # Nesting Model - 共享数据结构
//!
//! **依赖原则**: 纯数据和纯函数，不依赖任何硬件抽象。
//!
//! ## 包含模块
//!
//! - `geometry` - 位姿、轮廓、单应性变换
//! - `gripper` - 夹爪类型与偏移量
//! - `workpiece` - 工件模板、匹配结果、放置结果
//! - `config` - 工作站配置（TOML）

pub mod config;
pub mod geometry;
pub mod gripper;
pub mod workpiece;

// 重新导出常用类型
pub use config::{
    ConfigError, GrippersConfig, MeasurementConfig, MotionConfig, NestingConfig, ProcessConfig,
    VisionConfig,
};
pub use geometry::{Contour, Homography, Point2, Pose};
pub use gripper::{Gripper, GripperOffset, ToolId};
pub use workpiece::{
    Dimensions, DropOffPositions, Match, PickupPositions, PlacedRecord, Workpiece,
    WorkpiecePlacement,
};
