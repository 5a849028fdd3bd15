//! 操作结果与状态快照

use crate::state::PickAndPlaceState;
use serde::Serialize;
use std::fmt;

/// 操作结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// 放置平面已满
    PlaneFull,
    /// 重试后仍未检测到任何轮廓
    NothingDetected,
    /// 连续多个周期没有匹配
    NoMatchesAfterRetries,
    /// 没有更具体原因的正常结束
    BatchExhausted,
    /// 错误次数达到上限
    ErrorBudgetExhausted,
    /// 不可恢复的故障
    Fault,
    /// 用户停止
    StoppedByUser,
    /// 急停
    EmergencyStop,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::PlaneFull => "plane full",
            TerminationReason::NothingDetected => "nothing detected",
            TerminationReason::NoMatchesAfterRetries => "no matches after retries",
            TerminationReason::BatchExhausted => "batch exhausted",
            TerminationReason::ErrorBudgetExhausted => "error budget exhausted",
            TerminationReason::Fault => "fault",
            TerminationReason::StoppedByUser => "stopped by user",
            TerminationReason::EmergencyStop => "emergency stop",
        };
        f.write_str(text)
    }
}

/// 上下文摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSummary {
    pub workpieces_placed: usize,
    /// 是否曾经找到过工件
    pub workpiece_found: bool,
    pub plane_full: bool,
    pub current_batch_size: usize,
    pub current_match_index: usize,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub paused: bool,
    pub stop_requested: bool,
}

/// 执行线程每个节拍后发布的快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationStatus {
    pub state: Option<PickAndPlaceState>,
    #[serde(flatten)]
    pub summary: OperationSummary,
}

/// 操作结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub workpieces_placed: usize,
    pub final_state: Option<PickAndPlaceState>,
    pub reason: Option<TerminationReason>,
}

impl OperationResult {
    /// 未进入执行循环的失败（初始化失败、超时等）
    pub fn failure(message: impl Into<String>, workpieces_placed: usize) -> Self {
        OperationResult {
            success: false,
            message: message.into(),
            workpieces_placed,
            final_state: None,
            reason: None,
        }
    }

    /// 由执行循环结束时的状态生成结果
    ///
    /// 消息总是包含结束类别和已放置数量。
    pub fn from_final_state(
        state: PickAndPlaceState,
        reason: TerminationReason,
        summary: &OperationSummary,
    ) -> Self {
        let placed = summary.workpieces_placed;
        let (success, message) = match (state, reason) {
            (PickAndPlaceState::Completed, TerminationReason::StoppedByUser) => (
                false,
                format!("Nesting stopped by user. Placed {} workpieces.", placed),
            ),
            (PickAndPlaceState::Completed, reason) => (
                true,
                format!(
                    "Nesting completed successfully ({}). Placed {} workpieces.",
                    reason, placed
                ),
            ),
            (PickAndPlaceState::Error, reason) => (
                false,
                format!(
                    "Nesting failed ({}): {}. Placed {} workpieces.",
                    reason,
                    summary.last_error.as_deref().unwrap_or("unknown error"),
                    placed
                ),
            ),
            (state, _) => (
                false,
                format!("Nesting interrupted in state {}. Placed {} workpieces.", state, placed),
            ),
        };

        OperationResult {
            success,
            message,
            workpieces_placed: placed,
            final_state: Some(state),
            reason: Some(reason),
        }
    }
}
