//! # Nesting Process - 拾取-放置流程
//!
//! 在 [`nesting_engine`] 之上实现 22 个状态的拾取-放置流程：
//!
//! ```text
//! IDLE → MOVING_TO_CAPTURE_POSITION → SETTING_UP_VISION_CAPTURE → DETECTING_CONTOURS
//!      → FILTERING_CONTOURS → MATCHING_WORKPIECES → PROCESSING_WORKPIECE
//!      → CALCULATING_PICKUP_POSITION → CALCULATING_PLACEMENT_POSITION
//!      → CHANGING_GRIPPER → VERIFYING_GRIPPER → MEASURING_HEIGHT
//!      → EXECUTING_PICK_AND_PLACE → UPDATING_DEBUG_INFO → CHECKING_FOR_MORE_WORKPIECES
//! ```
//!
//! ## 模块
//!
//! - [`state`] / [`rules`] - 状态枚举与转换表
//! - [`context`] - 单次操作的可变数据
//! - [`handlers`] - 每个状态的 handler
//! - [`workflows`] - 视觉、机器人、测高、放置的多步硬件序列
//! - [`controller`] - 状态机装配与跨线程控制
//! - [`operation`] - 生命周期门面（启动、等待、暂停、停止、急停）
//!
//! # 示例
//!
//! ```rust,ignore
//! use nesting_process::{Application, PickAndPlaceOperation};
//!
//! let application = Application::new(collaborators, config);
//! let mut operation = PickAndPlaceOperation::new();
//! let controller = operation.launch(&application, workpieces)?;
//!
//! // 其他线程可以随时暂停或停止
//! std::thread::spawn(move || controller.stop());
//!
//! let result = operation.wait_for_completion(None);
//! println!("{}", result.message);
//! ```

pub mod application;
pub mod context;
pub mod controller;
pub mod error;
pub mod flags;
pub mod handlers;
pub mod operation;
pub mod result;
pub mod rules;
pub mod services;
pub mod state;
pub mod workflows;

#[cfg(test)]
mod test_support;

pub use application::{Application, PICK_AND_PLACE_TOPIC};
pub use context::PickAndPlaceContext;
pub use controller::{
    PickAndPlaceController, PickAndPlaceMachine, create_state_registry, setup_state_machine,
};
pub use error::{NestingError, SequenceStep};
pub use flags::ControlFlags;
pub use operation::PickAndPlaceOperation;
pub use result::{OperationResult, OperationStatus, OperationSummary, TerminationReason};
pub use rules::pick_and_place_rules;
pub use services::{ConfigGripperOffsets, DescentPickupCalculator};
pub use state::PickAndPlaceState;
