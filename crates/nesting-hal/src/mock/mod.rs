//! Mock 协作者（仅在 `mock` feature 下编译）
//!
//! 所有 mock 都是内存实现，通过 `&self` 方法在运行中注入故障，
//! 并记录调用次数供测试断言。它们是测试替身，不包含真实算法：
//!
//! - [`MockRobot`] 同时实现 [`RobotService`](crate::RobotService) 和
//!   [`GripperManager`](crate::GripperManager)，共享"当前夹爪"状态
//! - [`MockVision`] 按脚本逐批返回轮廓
//! - [`MockMatcher`] 按面积把轮廓配对到模板
//! - [`MockPlane`] 把工件依次放入固定数量的槽位
//! - [`MockCell`] 把以上全部组装成一个工作站
//!
//! # 示例
//!
//! ```rust
//! use nesting_hal::mock::MockRobot;
//! use nesting_hal::{GripperManager, RobotService};
//!
//! let robot = MockRobot::new();
//! robot.pickup_gripper(2).unwrap();
//! assert_eq!(robot.current_tool(), Some(2));
//! ```

mod cell;
mod placement;
mod robot;
mod tools;
mod vision;

pub use cell::MockCell;
pub use placement::MockPlane;
pub use robot::{MockRobot, MoveGate};
pub use tools::MockSwitch;
pub use vision::{MockLaserHeight, MockMatcher, MockVision};
