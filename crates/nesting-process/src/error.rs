//! 流程层错误类型定义

use nesting_engine::EngineError;
use nesting_hal::HalError;
use nesting_model::ToolId;
use std::fmt;
use thiserror::Error;

/// 拾取-放置动作序列中的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    PumpOn,
    /// 拾取路径点（0..3）
    Pickup(usize),
    /// 固定中间路径点
    Waypoint,
    /// 放置点（1 或 2）
    DropOff(usize),
    PumpOff,
    /// 回到标定位
    Home,
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceStep::PumpOn => write!(f, "pump on"),
            SequenceStep::Pickup(i) => write!(f, "pickup waypoint {}", i),
            SequenceStep::Waypoint => write!(f, "intermediate waypoint"),
            SequenceStep::DropOff(i) => write!(f, "drop-off {}", i),
            SequenceStep::PumpOff => write!(f, "pump off"),
            SequenceStep::Home => write!(f, "calibration position"),
        }
    }
}

/// 流程层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NestingError {
    /// 协作者调用失败
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 状态机错误
    #[error("State machine error: {0}")]
    Engine(#[from] EngineError),

    /// 配置校验失败
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 上下文缺少当前步骤需要的数据
    #[error("Missing {0} on context")]
    MissingData(&'static str),

    /// 拍照位不可达
    #[error("Failed to reach capture position after {attempts} attempts (last code {code})")]
    CapturePosition { attempts: u32, code: i32 },

    /// 夹爪换装或校验失败
    #[error("Gripper change to {target} failed: {reason}")]
    GripperChange { target: ToolId, reason: String },

    /// 测高失败
    #[error("Height measurement failed: {0}")]
    Measurement(String),

    /// 拾取-放置动作序列中断
    #[error("Pick-and-place sequence failed at {step}: {source}")]
    Sequence {
        step: SequenceStep,
        #[source]
        source: HalError,
    },

    /// 执行线程无法启动或异常退出
    #[error("Execution worker failed: {0}")]
    Worker(String),
}

impl NestingError {
    /// 包装动作序列中某一步的失败
    pub fn at_step(step: SequenceStep) -> impl FnOnce(HalError) -> NestingError {
        move |source| NestingError::Sequence { step, source }
    }
}
