//! Mock 放置平面

use crate::placement::{PlacementOutcome, PlacementService};
use nesting_model::{
    Contour, Dimensions, DropOffPositions, Gripper, Match, Point2, Pose, WorkpiecePlacement,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 槽位间距（毫米）
const SLOT_PITCH: f64 = 120.0;
/// 第一个放置点相对最终放置点的抬升（毫米）
const DROP_APPROACH: f64 = 100.0;

/// Mock 放置平面
///
/// 沿 X 轴排列 `capacity` 个槽位，按调用顺序依次占用。
pub struct MockPlane {
    capacity: usize,
    origin: Pose,
    placed: AtomicUsize,
    failures: Mutex<VecDeque<String>>,
}

impl MockPlane {
    pub fn new(capacity: usize) -> Self {
        MockPlane {
            capacity,
            origin: Pose::new(300.0, -200.0, 40.0, 180.0, 0.0, 90.0),
            placed: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// 下一次计算返回 `Failed(message)`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().push_back(message.into());
    }

    /// 已占用槽位数
    pub fn placed(&self) -> usize {
        self.placed.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl PlacementService for MockPlane {
    fn calculate_placement_positions(
        &self,
        workpiece: &Match,
        _centroid: Point2,
        orientation: f64,
        _pickup_height: f64,
        _gripper: Gripper,
    ) -> PlacementOutcome {
        if let Some(message) = self.failures.lock().pop_front() {
            return PlacementOutcome::Failed(message);
        }

        let slot = self.placed.load(Ordering::SeqCst);
        if slot >= self.capacity {
            return PlacementOutcome::PlaneFull;
        }
        self.placed.store(slot + 1, Ordering::SeqCst);

        let (width, height) = workpiece.main_contour().bounding_size();
        let mut target = self.origin.translated(slot as f64 * SLOT_PITCH, 0.0);
        target.rz += orientation;

        let footprint = Contour::rectangle(
            Point2::new(target.x - width / 2.0, target.y - height / 2.0),
            width,
            height,
        );

        PlacementOutcome::Placed(Box::new(WorkpiecePlacement {
            pickup_positions: None,
            drop_off_positions: DropOffPositions {
                position1: target.with_z(target.z + DROP_APPROACH),
                position2: target,
            },
            footprint,
            dimensions: Dimensions { width, height },
            source_contour: workpiece.main_contour().clone(),
        }))
    }

    fn is_full(&self) -> bool {
        self.placed() >= self.capacity
    }
}
