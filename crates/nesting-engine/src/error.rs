//! 引擎层错误类型定义

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 目标状态不在当前状态的合法后继集合中
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// 构建时缺少必需组件
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    /// 执行循环已在运行
    #[error("Execution loop is already running")]
    AlreadyRunning,

    /// 命令通道已关闭（状态机已被销毁）
    #[error("Command channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidTransition {
            from: "IDLE",
            to: "PAUSED",
        };
        assert_eq!(err.to_string(), "Invalid transition: IDLE -> PAUSED");

        let err = EngineError::MissingComponent("context");
        assert!(err.to_string().contains("context"));
    }
}
