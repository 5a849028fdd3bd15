//! 协作者层错误类型定义

use nesting_model::ToolId;
use thiserror::Error;

/// 协作者层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalError {
    /// 运动指令返回非零状态码
    #[error("Motion command failed with status code {code}")]
    Motion { code: i32 },

    /// 设备故障（泵、激光器等）
    #[error("Device '{device}' failed: {reason}")]
    Device { device: String, reason: String },

    /// 图像采集失败
    #[error("Frame capture failed: {0}")]
    Capture(String),

    /// 夹爪换装失败
    #[error("Gripper {tool} operation failed: {reason}")]
    Gripper { tool: ToolId, reason: String },

    /// 不支持的夹爪 ID
    #[error("Unsupported gripper id: {0}")]
    UnsupportedGripper(ToolId),

    /// 模板匹配失败
    #[error("Matching failed: {0}")]
    Matching(String),

    /// 高度测量失败
    #[error("Height measurement failed: {0}")]
    Measurement(String),
}

impl HalError {
    /// 将控制器状态码转换为结果（0 表示成功）
    pub fn check_motion(code: i32) -> Result<(), HalError> {
        if code == crate::robot::MOTION_OK {
            Ok(())
        } else {
            Err(HalError::Motion { code })
        }
    }

    pub fn device(device: impl Into<String>, reason: impl Into<String>) -> Self {
        HalError::Device {
            device: device.into(),
            reason: reason.into(),
        }
    }
}
