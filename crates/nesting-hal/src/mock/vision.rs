//! Mock 视觉：相机、测高、匹配

use crate::error::HalError;
use crate::vision::{
    Frame, HeightReading, LaserHeightService, MatchOutcome, VisionService, WorkpieceMatcher,
};
use nesting_model::{Contour, Homography, Match, Workpiece};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Mock 相机
///
/// 每次 `get_contours` 弹出一批脚本轮廓；脚本耗尽后返回重复批次
/// （若设置）或空列表。
pub struct MockVision {
    batches: Mutex<VecDeque<Vec<Contour>>>,
    repeat: Mutex<Option<Vec<Contour>>>,
    homography: Homography,
    frame_seq: AtomicU64,
    no_frames: AtomicBool,
    arm_calls: AtomicUsize,
    contour_requests: AtomicUsize,
}

impl MockVision {
    pub fn new() -> Self {
        MockVision {
            batches: Mutex::new(VecDeque::new()),
            repeat: Mutex::new(None),
            homography: Homography::identity(),
            frame_seq: AtomicU64::new(0),
            no_frames: AtomicBool::new(false),
            arm_calls: AtomicUsize::new(0),
            contour_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_homography(mut self, homography: Homography) -> Self {
        self.homography = homography;
        self
    }

    /// 追加一批轮廓
    pub fn push_batch(&self, contours: Vec<Contour>) {
        self.batches.lock().push_back(contours);
    }

    /// 脚本耗尽后始终返回该批次
    pub fn repeat_batch(&self, contours: Vec<Contour>) {
        *self.repeat.lock() = Some(contours);
    }

    /// 之后 `get_latest_frame` 全部返回 `None`
    pub fn drop_frames(&self) {
        self.no_frames.store(true, Ordering::SeqCst);
    }

    /// 已提供的帧数
    pub fn frames_served(&self) -> u64 {
        self.frame_seq.load(Ordering::SeqCst)
    }

    pub fn arm_count(&self) -> usize {
        self.arm_calls.load(Ordering::SeqCst)
    }

    pub fn contour_requests(&self) -> usize {
        self.contour_requests.load(Ordering::SeqCst)
    }
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new()
    }
}

impl VisionService for MockVision {
    fn arm_capture(&self) -> Result<(), HalError> {
        self.arm_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_contours(&self) -> Result<Vec<Contour>, HalError> {
        self.contour_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(batch) = self.batches.lock().pop_front() {
            return Ok(batch);
        }
        Ok(self.repeat.lock().clone().unwrap_or_default())
    }

    fn camera_to_robot_matrix(&self) -> Homography {
        self.homography
    }

    fn get_latest_frame(&self) -> Option<Frame> {
        if self.no_frames.load(Ordering::SeqCst) {
            return None;
        }
        let sequence = self.frame_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Frame {
            sequence,
            width: 4,
            height: 4,
            data: vec![0; 4 * 4 * 3],
        })
    }
}

/// Mock 激光测高
pub struct MockLaserHeight {
    height_mm: Mutex<f64>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockLaserHeight {
    pub fn new(height_mm: f64) -> Self {
        MockLaserHeight {
            height_mm: Mutex::new(height_mm),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_height(&self, height_mm: f64) {
        *self.height_mm.lock() = height_mm;
    }

    pub fn fail_measurements(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LaserHeightService for MockLaserHeight {
    fn measure_height(&self, frame: &Frame) -> Result<HeightReading, HalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HalError::Measurement(format!(
                "no laser line in frame {}",
                frame.sequence
            )));
        }
        let height_mm = *self.height_mm.lock();
        Ok(HeightReading {
            height_mm,
            pixel_metric: height_mm * 10.0,
        })
    }
}

/// Mock 匹配器
///
/// 轮廓与面积最接近的模板配对，相对面积差超过容差则视为未匹配。
/// 方向固定为 0°。
pub struct MockMatcher {
    tolerance: f64,
    fail_next: AtomicBool,
    calls: AtomicUsize,
}

impl MockMatcher {
    pub fn new() -> Self {
        MockMatcher {
            tolerance: 0.2,
            fail_next: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// 相对面积容差（默认 0.2）
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 下一次匹配返回错误
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn best_template<'a>(
        &self,
        templates: &'a [Arc<Workpiece>],
        contour: &Contour,
    ) -> Option<&'a Arc<Workpiece>> {
        let area = contour.area();
        templates
            .iter()
            .filter_map(|t| {
                let reference = t.contour.area();
                if reference <= 0.0 {
                    return None;
                }
                let diff = (area - reference).abs() / reference;
                (diff <= self.tolerance).then_some((diff, t))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, t)| t)
    }
}

impl Default for MockMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkpieceMatcher for MockMatcher {
    fn match_contours(
        &self,
        templates: &[Arc<Workpiece>],
        contours: &[Contour],
    ) -> Result<MatchOutcome, HalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(HalError::Matching("injected matcher failure".into()));
        }

        let mut outcome = MatchOutcome::default();
        for contour in contours {
            match self.best_template(templates, contour) {
                Some(template) => {
                    outcome
                        .matches
                        .push(Match::new(template.clone(), contour.clone()));
                    outcome.orientations.push(0.0);
                },
                None => outcome.unmatched.push(contour.clone()),
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nesting_model::{Gripper, Point2};

    fn rect(w: f64, h: f64) -> Contour {
        Contour::rectangle(Point2::new(0.0, 0.0), w, h)
    }

    #[test]
    fn test_vision_script_then_repeat() {
        let vision = MockVision::new();
        vision.push_batch(vec![rect(1.0, 1.0)]);
        vision.repeat_batch(vec![rect(2.0, 2.0), rect(3.0, 3.0)]);

        assert_eq!(vision.get_contours().unwrap().len(), 1);
        assert_eq!(vision.get_contours().unwrap().len(), 2);
        assert_eq!(vision.get_contours().unwrap().len(), 2);
        assert_eq!(vision.contour_requests(), 3);
    }

    #[test]
    fn test_frames_are_sequenced() {
        let vision = MockVision::new();
        assert_eq!(vision.get_latest_frame().unwrap().sequence, 1);
        assert_eq!(vision.get_latest_frame().unwrap().sequence, 2);
        vision.drop_frames();
        assert!(vision.get_latest_frame().is_none());
        assert_eq!(vision.frames_served(), 2);
    }

    #[test]
    fn test_matcher_by_area() {
        let small = Arc::new(Workpiece::new("small", Gripper::Single, rect(10.0, 10.0)));
        let large = Arc::new(Workpiece::new("large", Gripper::Double, rect(40.0, 20.0)));
        let templates = vec![small, large];

        let outcome = MockMatcher::new()
            .match_contours(&templates, &[rect(10.0, 10.5), rect(40.0, 21.0), rect(2.0, 2.0)])
            .unwrap();

        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.orientations.len(), 2);
        assert_eq!(outcome.matches[0].workpiece.name, "small");
        assert_eq!(outcome.matches[1].gripper(), Gripper::Double);
        assert_eq!(outcome.unmatched.len(), 1);
    }

    #[test]
    fn test_matcher_injected_failure_is_one_shot() {
        let matcher = MockMatcher::new();
        matcher.fail_next();
        assert!(matcher.match_contours(&[], &[]).is_err());
        assert!(matcher.match_contours(&[], &[]).is_ok());
    }

    #[test]
    fn test_laser_height() {
        let sensor = MockLaserHeight::new(4.5);
        let reading = sensor.measure_height(&Frame::default()).unwrap();
        assert_eq!(reading.height_mm, 4.5);
        sensor.fail_measurements();
        assert!(sensor.measure_height(&Frame::default()).is_err());
        assert_eq!(sensor.calls(), 2);
    }
}
