//! 流程上下文
//!
//! 每次操作创建一个上下文，移动到执行线程后由 handler 独占读写。
//! 其他线程只能通过 [`ControlFlags`] 写入暂停/停止请求，并通过状态快照
//! 读取 [`OperationSummary`]。
//!
//! # 数据分层
//!
//! - **周期数据**: 轮廓、匹配结果、游标，由 [`reset_for_new_cycle`](PickAndPlaceContext::reset_for_new_cycle) 清空
//! - **工件数据**: 当前匹配、拾取/放置几何，由 [`reset_for_new_workpiece`](PickAndPlaceContext::reset_for_new_workpiece) 清空
//! - **计数器**: 已放置数量、连续空检测次数、错误计数，贯穿整个操作

use crate::application::Application;
use crate::error::NestingError;
use crate::flags::ControlFlags;
use crate::result::{OperationSummary, TerminationReason};
use crate::state::PickAndPlaceState;
use crate::workflows::{MeasurementWorkflow, PlacementWorkflow, RobotWorkflow, VisionWorkflow};
use nesting_engine::MachineHandle;
use nesting_hal::{MotionParams, PickupCalculator, PlacementService, VisionService};
use nesting_model::{
    Contour, Gripper, Match, PickupPositions, PlacedRecord, Point2, Pose, ProcessConfig, ToolId,
    Workpiece, WorkpiecePlacement,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct PickAndPlaceContext {
    pub(crate) vision: Arc<dyn VisionService>,
    pub(crate) placement: Arc<dyn PlacementService>,
    pub(crate) pickup: Arc<dyn PickupCalculator>,
    pub(crate) vision_workflow: VisionWorkflow,
    pub(crate) robot_workflow: RobotWorkflow,
    pub(crate) placement_workflow: PlacementWorkflow,
    pub(crate) process: ProcessConfig,
    pub(crate) match_height: f64,
    templates: Vec<Arc<Workpiece>>,

    // 周期数据
    pub current_contours: Vec<Contour>,
    pub filtered_contours: Vec<Contour>,
    pub matches: Vec<Match>,
    /// 与 `matches` 一一对应
    pub orientations: Vec<f64>,
    pub current_match_index: usize,

    // 工件数据
    pub current_match: Option<Match>,
    pub current_orientation: f64,
    /// 像素坐标系拾取点
    pub current_centroid: Option<Point2>,
    /// 机器人坐标系拾取点（已叠加末端偏移）
    pub robot_pickup_point: Option<Point2>,
    /// 机器人坐标系拾取点（未叠加偏移，用于测高）
    pub centroid_for_height_measure: Option<Point2>,
    pub pickup_positions: Option<PickupPositions>,
    pub height_measure_position: Option<Pose>,
    pub pickup_height: f64,
    pub current_placement: Option<WorkpiecePlacement>,
    pub required_gripper: Option<Gripper>,
    pub current_gripper_id: Option<ToolId>,

    // 计数器
    pub count: usize,
    pub workpiece_found: bool,
    pub consecutive_empty_detections: u32,
    pub error_count: u32,
    pub last_error: Option<String>,
    placed_records: Vec<PlacedRecord>,

    flags: Arc<ControlFlags>,
    execution: Option<MachineHandle<PickAndPlaceState>>,
    hardware_released: bool,
    termination: Option<TerminationReason>,
}

impl PickAndPlaceContext {
    /// 由应用和预选模板创建上下文
    pub fn new(
        application: &Application,
        workpieces: Vec<Workpiece>,
        flags: Arc<ControlFlags>,
    ) -> Self {
        let c = &application.collaborators;
        let config = &application.config;
        let params = MotionParams::from_config(&config.motion);

        let measurement = MeasurementWorkflow::new(
            c.robot.clone(),
            c.vision.clone(),
            c.laser_height.clone(),
            c.laser.clone(),
            params,
            config.measurement.clone(),
        );

        PickAndPlaceContext {
            vision: c.vision.clone(),
            placement: c.placement.clone(),
            pickup: application.pickup_calculator(),
            vision_workflow: VisionWorkflow::new(
                c.vision.clone(),
                c.matcher.clone(),
                config.vision.pickup_area_contour(),
            ),
            robot_workflow: RobotWorkflow::new(
                c.robot.clone(),
                c.grippers.clone(),
                c.laser.clone(),
                &config.motion,
            ),
            placement_workflow: PlacementWorkflow::new(
                c.robot.clone(),
                c.pump.clone(),
                application.gripper_offsets(),
                config.grippers.clone(),
                config.motion.clone(),
                config.vision.clone(),
                measurement,
            ),
            process: config.process.clone(),
            match_height: config.measurement.match_height,
            templates: workpieces.into_iter().map(Arc::new).collect(),
            current_contours: Vec::new(),
            filtered_contours: Vec::new(),
            matches: Vec::new(),
            orientations: Vec::new(),
            current_match_index: 0,
            current_match: None,
            current_orientation: 0.0,
            current_centroid: None,
            robot_pickup_point: None,
            centroid_for_height_measure: None,
            pickup_positions: None,
            height_measure_position: None,
            pickup_height: 0.0,
            current_placement: None,
            required_gripper: None,
            current_gripper_id: None,
            count: 0,
            workpiece_found: false,
            consecutive_empty_detections: 0,
            error_count: 0,
            last_error: None,
            placed_records: Vec::new(),
            flags,
            execution: None,
            hardware_released: false,
            termination: None,
        }
    }

    /// 关联执行循环句柄，终态 handler 用它结束循环
    pub(crate) fn attach_execution(&mut self, handle: MachineHandle<PickAndPlaceState>) {
        self.execution = Some(handle);
    }

    pub fn templates(&self) -> &[Arc<Workpiece>] {
        &self.templates
    }

    pub fn flags(&self) -> &Arc<ControlFlags> {
        &self.flags
    }

    pub fn process_config(&self) -> &ProcessConfig {
        &self.process
    }

    // ==================== 游标 ====================

    pub fn has_more_workpieces_in_batch(&self) -> bool {
        self.current_match_index < self.matches.len()
    }

    /// 游标处的匹配及其方向
    pub fn next_workpiece(&self) -> Option<(Match, f64)> {
        let found = self.matches.get(self.current_match_index)?.clone();
        let orientation = match self.orientations.get(self.current_match_index) {
            Some(o) => *o,
            None => {
                warn!(
                    "No orientation for match {}, assuming 0",
                    self.current_match_index
                );
                0.0
            },
        };
        Some((found, orientation))
    }

    /// 游标前进一位并清空工件数据
    pub fn advance_to_next_workpiece(&mut self) {
        self.current_match_index += 1;
        self.reset_for_new_workpiece();
    }

    pub fn reset_for_new_workpiece(&mut self) {
        self.current_match = None;
        self.current_orientation = 0.0;
        self.current_centroid = None;
        self.robot_pickup_point = None;
        self.centroid_for_height_measure = None;
        self.pickup_positions = None;
        self.height_measure_position = None;
        self.pickup_height = 0.0;
        self.current_placement = None;
        self.required_gripper = None;
    }

    /// 清空周期数据（计数器保留）
    pub fn reset_for_new_cycle(&mut self) {
        self.current_contours.clear();
        self.filtered_contours.clear();
        self.matches.clear();
        self.orientations.clear();
        self.current_match_index = 0;
        self.reset_for_new_workpiece();
    }

    // ==================== 结束条件 ====================

    pub fn is_plane_full(&self) -> bool {
        self.placement.is_full()
    }

    pub fn error_budget_exhausted(&self) -> bool {
        self.error_count >= self.process.max_errors
    }

    pub fn should_continue_operation(&self) -> bool {
        self.consecutive_empty_detections < self.process.max_empty_detections
            && !self.stop_requested()
            && !self.is_plane_full()
            && !self.error_budget_exhausted()
    }

    // ==================== 错误 ====================

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error_count += 1;
        error!("Error #{}: {}", self.error_count, message);
        self.last_error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ==================== 控制标志 ====================

    pub fn request_pause(&self, state: PickAndPlaceState) {
        info!("Pausing in {}", state);
        self.flags.request_pause(state);
    }

    pub fn request_stop(&self) {
        self.flags.request_stop();
    }

    pub fn resume_from_pause(&self) -> Option<PickAndPlaceState> {
        self.flags.resume_from_pause()
    }

    pub fn pause_requested(&self) -> bool {
        self.flags.pause_requested()
    }

    pub fn stop_requested(&self) -> bool {
        self.flags.stop_requested()
    }

    // ==================== 结束 ====================

    /// 记录结束原因（先记录者优先）
    pub fn set_termination(&mut self, reason: TerminationReason) {
        if self.termination.is_none() {
            self.termination = Some(reason);
        }
    }

    /// 覆盖结束原因
    pub(crate) fn force_termination(&mut self, reason: TerminationReason) {
        self.termination = Some(reason);
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// 放下夹爪并关闭激光（每次操作最多执行一次）
    pub fn release_hardware(&mut self) -> Result<(), NestingError> {
        if self.hardware_released {
            return Ok(());
        }
        self.hardware_released = true;
        let result = self.robot_workflow.release_hardware();
        self.current_gripper_id = None;
        result
    }

    /// 关闭激光和真空泵，不移动机器人
    pub fn switch_off_tools(&self) {
        self.robot_workflow.laser_off();
        self.placement_workflow.pump_off();
    }

    pub fn hardware_released(&self) -> bool {
        self.hardware_released
    }

    /// 结束执行循环
    pub(crate) fn stop_execution(&self) {
        if let Some(handle) = &self.execution {
            handle.stop_execution();
        }
    }

    // ==================== 记录 ====================

    /// 记录一次成功放置
    pub fn record_placement(&mut self) {
        self.count += 1;
        let record =
            PlacedRecord::from_placement(self.current_placement.as_ref(), self.current_match_index + 1);
        self.placed_records.push(record);
    }

    pub fn placed_records(&self) -> &[PlacedRecord] {
        &self.placed_records
    }

    pub fn operation_summary(&self) -> OperationSummary {
        OperationSummary {
            workpieces_placed: self.count,
            workpiece_found: self.workpiece_found,
            plane_full: self.is_plane_full(),
            current_batch_size: self.matches.len(),
            current_match_index: self.current_match_index,
            error_count: self.error_count,
            last_error: self.last_error.clone(),
            paused: self.pause_requested(),
            stop_requested: self.stop_requested(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, plate, square};
    use nesting_hal::mock::MockCell;

    fn with_batch(ctx: &mut PickAndPlaceContext, n: usize) {
        let template = Arc::new(plate());
        ctx.matches = (0..n)
            .map(|i| Match::new(template.clone(), square(i as f64 * 50.0, 0.0, 20.0)))
            .collect();
        ctx.orientations = (0..n).map(|i| i as f64 * 10.0).collect();
    }

    #[test]
    fn test_cursor_walks_batch() {
        let cell = MockCell::new(10);
        let mut ctx = context(&cell);
        with_batch(&mut ctx, 2);

        assert!(ctx.has_more_workpieces_in_batch());
        let (_, orientation) = ctx.next_workpiece().unwrap();
        assert_eq!(orientation, 0.0);

        ctx.current_orientation = 5.0;
        ctx.advance_to_next_workpiece();
        assert_eq!(ctx.current_orientation, 0.0);
        assert_eq!(ctx.next_workpiece().unwrap().1, 10.0);

        ctx.advance_to_next_workpiece();
        assert!(!ctx.has_more_workpieces_in_batch());
        assert!(ctx.next_workpiece().is_none());
    }

    #[test]
    fn test_cycle_reset_keeps_counters() {
        let cell = MockCell::new(10);
        let mut ctx = context(&cell);
        with_batch(&mut ctx, 3);
        ctx.current_match_index = 2;
        ctx.count = 4;
        ctx.consecutive_empty_detections = 1;
        ctx.record_error("boom");

        ctx.reset_for_new_cycle();
        assert!(ctx.matches.is_empty());
        assert!(ctx.orientations.is_empty());
        assert_eq!(ctx.current_match_index, 0);
        assert_eq!(ctx.count, 4);
        assert_eq!(ctx.consecutive_empty_detections, 1);
        assert_eq!(ctx.error_count, 1);
    }

    #[test]
    fn test_should_continue_conditions() {
        let cell = MockCell::new(10);
        let mut ctx = context(&cell);
        assert!(ctx.should_continue_operation());

        ctx.consecutive_empty_detections = ctx.process.max_empty_detections;
        assert!(!ctx.should_continue_operation());
        ctx.consecutive_empty_detections = 0;

        ctx.error_count = ctx.process.max_errors;
        assert!(ctx.error_budget_exhausted());
        assert!(!ctx.should_continue_operation());
        ctx.error_count = 0;

        ctx.request_stop();
        assert!(!ctx.should_continue_operation());
    }

    #[test]
    fn test_plane_full_stops_operation() {
        let cell = MockCell::new(0);
        let ctx = context(&cell);
        assert!(ctx.is_plane_full());
        assert!(!ctx.should_continue_operation());
    }

    #[test]
    fn test_record_and_clear_error() {
        let cell = MockCell::new(1);
        let mut ctx = context(&cell);
        ctx.record_error("first");
        ctx.record_error("second");
        assert_eq!(ctx.error_count, 2);
        assert_eq!(ctx.last_error.as_deref(), Some("second"));
        ctx.clear_error();
        assert_eq!(ctx.last_error, None);
        // 清除不重置计数
        assert_eq!(ctx.error_count, 2);
    }

    #[test]
    fn test_pause_records_resume_target() {
        let cell = MockCell::new(1);
        let ctx = context(&cell);
        ctx.request_pause(PickAndPlaceState::FilteringContours);
        assert!(ctx.operation_summary().paused);
        assert_eq!(
            ctx.resume_from_pause(),
            Some(PickAndPlaceState::FilteringContours)
        );
        assert!(!ctx.pause_requested());
    }

    #[test]
    fn test_release_hardware_runs_once() {
        let cell = MockCell::new(1);
        let mut ctx = context(&cell);
        ctx.release_hardware().unwrap();
        ctx.release_hardware().unwrap();
        assert_eq!(cell.laser.off_count(), 1);
        assert!(ctx.hardware_released());
    }

    #[test]
    fn test_placement_record_uses_one_based_index() {
        let cell = MockCell::new(1);
        let mut ctx = context(&cell);
        ctx.current_match_index = 2;
        ctx.record_placement();
        assert_eq!(ctx.count, 1);
        assert_eq!(ctx.placed_records()[0].match_index, 3);
        assert_eq!(ctx.placed_records()[0].footprint, None);
    }

    #[test]
    fn test_termination_first_reason_wins() {
        let cell = MockCell::new(1);
        let mut ctx = context(&cell);
        ctx.set_termination(TerminationReason::PlaneFull);
        ctx.set_termination(TerminationReason::Fault);
        assert_eq!(ctx.termination_reason(), Some(TerminationReason::PlaneFull));
        ctx.force_termination(TerminationReason::EmergencyStop);
        assert_eq!(
            ctx.termination_reason(),
            Some(TerminationReason::EmergencyStop)
        );
    }
}
