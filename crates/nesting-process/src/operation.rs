//! 拾取-放置操作门面
//!
//! [`PickAndPlaceOperation`] 管理一次操作的完整生命周期：
//!
//! 1. 构建状态机并转入 `IDLE`
//! 2. 在名为 `pick-and-place` 的后台线程上运行执行循环
//! 3. 执行线程每个节拍后把 [`OperationStatus`] 写入无锁快照
//! 4. 循环结束时通过完成通道发送 [`OperationResult`]
//!
//! 控制请求（暂停、恢复、停止、急停）可以在任意线程上通过
//! [`PickAndPlaceController`] 发出。
//!
//! # 示例
//!
//! ```rust,ignore
//! let mut operation = PickAndPlaceOperation::new();
//! let result = operation.start(&application, workpieces);
//! println!("{}", result.message);
//! ```

use crate::application::Application;
use crate::controller::{PickAndPlaceController, setup_state_machine};
use crate::error::NestingError;
use crate::result::{OperationResult, OperationStatus, TerminationReason};
use crate::state::PickAndPlaceState;
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use nesting_engine::EngineError;
use nesting_model::Workpiece;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

pub struct PickAndPlaceOperation {
    controller: Option<PickAndPlaceController>,
    status: Arc<ArcSwap<OperationStatus>>,
    completion: Option<Receiver<OperationResult>>,
    result: Option<OperationResult>,
    worker: Option<JoinHandle<()>>,
}

impl PickAndPlaceOperation {
    pub fn new() -> Self {
        PickAndPlaceOperation {
            controller: None,
            status: Arc::new(ArcSwap::from_pointee(OperationStatus::default())),
            completion: None,
            result: None,
            worker: None,
        }
    }

    /// 启动操作并阻塞直到结束
    ///
    /// 等待时间由 `process.wait_timeout_ms` 决定（`None` 表示无限等待）。
    /// 初始化失败不会抛出，而是返回 `success = false` 的结果。
    pub fn start(
        &mut self,
        application: &Application,
        workpieces: Vec<Workpiece>,
    ) -> OperationResult {
        if let Err(e) = self.launch(application, workpieces) {
            error!("Failed to initialize state machine: {}", e);
            let result =
                OperationResult::failure(format!("Failed to initialize state machine: {}", e), 0);
            self.result = Some(result.clone());
            return result;
        }
        self.wait_for_completion(application.config.process.wait_timeout())
    }

    /// 非阻塞启动
    ///
    /// 返回时执行线程已经创建；返回的控制器可以交给其他线程。
    ///
    /// # 错误
    ///
    /// - 上一次操作仍在运行：[`EngineError::AlreadyRunning`]
    /// - 配置非法或状态机构建失败：[`NestingError::Config`] / [`NestingError::Engine`]
    /// - 线程创建失败：[`NestingError::Worker`]
    pub fn launch(
        &mut self,
        application: &Application,
        workpieces: Vec<Workpiece>,
    ) -> Result<PickAndPlaceController, NestingError> {
        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            return Err(EngineError::AlreadyRunning.into());
        }
        self.join_worker();
        self.result = None;
        self.completion = None;
        self.controller = None;

        let status = Arc::new(ArcSwap::from_pointee(OperationStatus::default()));
        let snapshot = status.clone();
        let (mut machine, controller) =
            setup_state_machine(application, workpieces, move |state, ctx| {
                snapshot.store(Arc::new(OperationStatus {
                    state: Some(state),
                    summary: ctx.operation_summary(),
                }));
            })?;

        machine.transition(PickAndPlaceState::Idle)?;
        status.store(Arc::new(OperationStatus {
            state: Some(machine.current_state()),
            summary: machine.context().operation_summary(),
        }));

        let (tx, rx) = bounded(1);
        let delay = application.config.process.loop_delay();
        let worker = thread::Builder::new()
            .name("pick-and-place".into())
            .spawn(move || {
                let outcome = machine.start_execution(delay);
                let state = machine.current_state();
                let summary = machine.context().operation_summary();
                let result = match outcome {
                    Ok(()) => {
                        let reason = machine
                            .context()
                            .termination_reason()
                            .unwrap_or(fallback_reason(state));
                        OperationResult::from_final_state(state, reason, &summary)
                    },
                    Err(e) => OperationResult::failure(
                        format!("Execution loop failed: {}", e),
                        summary.workpieces_placed,
                    ),
                };
                info!("{}", result.message);
                let _ = tx.send(result);
            })
            .map_err(|e| NestingError::Worker(e.to_string()))?;

        info!("Pick-and-place operation launched");
        self.status = status;
        self.completion = Some(rx);
        self.worker = Some(worker);
        self.controller = Some(controller.clone());
        Ok(controller)
    }

    /// 等待执行循环结束
    ///
    /// # 参数
    ///
    /// - `timeout`: `None` 表示无限等待
    ///
    /// 超时返回 `success = false` 的结果，操作继续运行，可以再次等待。
    pub fn wait_for_completion(&mut self, timeout: Option<Duration>) -> OperationResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let Some(completion) = &self.completion else {
            return OperationResult::failure("Operation has not been started", 0);
        };

        let received = match timeout {
            Some(timeout) => completion.recv_timeout(timeout),
            None => completion.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let result = match received {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let status = self.operation_status();
                let state = status
                    .state
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string());
                warn!("Timed out waiting for completion in state {}", state);
                return OperationResult::failure(
                    format!(
                        "Timed out after {:?} waiting for completion (state {})",
                        timeout.unwrap_or_default(),
                        state
                    ),
                    status.summary.workpieces_placed,
                );
            },
            Err(RecvTimeoutError::Disconnected) => {
                error!("Execution worker exited without a result");
                OperationResult::failure(
                    "Execution worker exited without a result",
                    self.operation_status().summary.workpieces_placed,
                )
            },
        };

        self.result = Some(result.clone());
        self.join_worker();
        result
    }

    /// 暂停（已暂停时等同于恢复）
    pub fn pause(&self) -> bool {
        match &self.controller {
            Some(controller) if controller.is_paused() => controller.resume(),
            Some(controller) => controller.pause(),
            None => false,
        }
    }

    pub fn resume(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.resume())
    }

    pub fn stop(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.stop())
    }

    pub fn emergency_stop(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.emergency_stop())
    }

    pub fn controller(&self) -> Option<PickAndPlaceController> {
        self.controller.clone()
    }

    pub fn current_state(&self) -> Option<PickAndPlaceState> {
        self.controller.as_ref().and_then(|c| c.current_state())
    }

    /// 最近一个节拍结束时的快照
    pub fn operation_status(&self) -> OperationStatus {
        OperationStatus::clone(&self.status.load())
    }

    pub fn is_paused(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.is_paused())
    }

    /// 执行循环是否已在终态结束
    pub fn is_completed(&self) -> bool {
        if self.result.is_some() {
            return true;
        }
        self.controller.as_ref().is_some_and(|c| {
            !c.is_running() && c.current_state().is_some_and(PickAndPlaceState::is_terminal)
        })
    }

    /// 最终结果（等待完成之后才有）
    pub fn result(&self) -> Option<&OperationResult> {
        self.result.as_ref()
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("Pick-and-place worker panicked");
        }
    }
}

impl Default for PickAndPlaceOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PickAndPlaceOperation {
    fn drop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        if let Some(controller) = &self.controller
            && controller.is_running()
        {
            warn!("Dropping a running operation, stopping execution loop");
            controller.stop_execution_loop();
        }
        self.join_worker();
    }
}

/// 上下文没有记录结束原因时，按最终状态推断
fn fallback_reason(state: PickAndPlaceState) -> TerminationReason {
    match state {
        PickAndPlaceState::Completed => TerminationReason::BatchExhausted,
        PickAndPlaceState::Error => TerminationReason::Fault,
        _ => TerminationReason::StoppedByUser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fast_config, plate};
    use nesting_hal::mock::MockCell;

    #[test]
    fn test_wait_before_start() {
        let mut operation = PickAndPlaceOperation::new();
        let result = operation.wait_for_completion(Some(Duration::from_millis(10)));
        assert!(!result.success);
        assert!(!operation.is_completed());
        assert_eq!(operation.current_state(), None);
    }

    #[test]
    fn test_init_failure_is_reported() {
        let cell = MockCell::new(1);
        let mut config = fast_config();
        config.process.max_errors = 0;
        let application = Application::new(cell.collaborators(), config);

        let mut operation = PickAndPlaceOperation::new();
        let result = operation.start(&application, vec![plate()]);
        assert!(!result.success);
        assert!(result.message.starts_with("Failed to initialize state machine"));
        assert_eq!(result.workpieces_placed, 0);
    }

    #[test]
    fn test_nothing_detected_completes() {
        let cell = MockCell::new(1);
        let application = Application::new(cell.collaborators(), fast_config());

        let mut operation = PickAndPlaceOperation::new();
        let result = operation.start(&application, vec![plate()]);

        assert!(result.success, "{}", result.message);
        assert_eq!(result.final_state, Some(PickAndPlaceState::Completed));
        assert_eq!(result.reason, Some(TerminationReason::NothingDetected));
        assert!(operation.is_completed());

        let status = operation.operation_status();
        assert_eq!(status.state, Some(PickAndPlaceState::Completed));
        assert_eq!(status.summary.error_count, 0);
    }

    #[test]
    fn test_fallback_reason() {
        assert_eq!(
            fallback_reason(PickAndPlaceState::Completed),
            TerminationReason::BatchExhausted
        );
        assert_eq!(fallback_reason(PickAndPlaceState::Error), TerminationReason::Fault);
    }
}
