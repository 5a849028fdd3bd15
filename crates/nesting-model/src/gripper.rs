//! 夹爪类型
//!
//! 工作站上的末端执行器通过换装台切换。单吸盘和双吸盘夹爪的
//! Z 向补偿不同，因此拾取时的接触高度依赖夹爪类型。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 工具 ID（机器人控制器侧的原始编号）
pub type ToolId = u8;

/// 夹爪类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum Gripper {
    /// 单吸盘夹爪
    Single = 1,
    /// 双吸盘夹爪
    Double = 2,
}

impl Gripper {
    /// 控制器侧工具 ID
    pub fn tool_id(self) -> ToolId {
        self.into()
    }

    /// 从控制器工具 ID 解析
    ///
    /// 未知 ID（例如激光工具）返回 `None`。
    pub fn from_tool_id(id: ToolId) -> Option<Self> {
        Gripper::try_from(id).ok()
    }
}

impl fmt::Display for Gripper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gripper::Single => write!(f, "single({})", self.tool_id()),
            Gripper::Double => write!(f, "double({})", self.tool_id()),
        }
    }
}

/// 单个夹爪的位置偏移（毫米）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GripperOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
