//! 视觉工作流：拍照、轮廓检测、区域过滤、模板匹配

use nesting_hal::{HalError, MatchOutcome, VisionService, WorkpieceMatcher};
use nesting_model::{Contour, Workpiece};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 构成多边形所需的最少点数
const MIN_CONTOUR_POINTS: usize = 3;

pub struct VisionWorkflow {
    vision: Arc<dyn VisionService>,
    matcher: Arc<dyn WorkpieceMatcher>,
    /// 拾取区域（像素），`None` 表示不过滤
    pickup_area: Option<Contour>,
}

impl VisionWorkflow {
    pub fn new(
        vision: Arc<dyn VisionService>,
        matcher: Arc<dyn WorkpieceMatcher>,
        pickup_area: Option<Contour>,
    ) -> Self {
        VisionWorkflow {
            vision,
            matcher,
            pickup_area,
        }
    }

    pub fn vision(&self) -> &Arc<dyn VisionService> {
        &self.vision
    }

    pub fn setup_vision_capture(&self) -> Result<(), HalError> {
        self.vision.arm_capture()
    }

    /// 获取轮廓，空结果或出错时重试
    ///
    /// # 参数
    ///
    /// - `max_retries`: 最多尝试次数
    /// - `retry_delay`: 两次尝试之间的等待
    ///
    /// 所有尝试都没有得到轮廓时返回 `None`。
    pub fn get_contours_with_retries(
        &self,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Option<Vec<Contour>> {
        for attempt in 1..=max_retries {
            match self.vision.get_contours() {
                Ok(contours) if !contours.is_empty() => {
                    info!("Detected {} contours (attempt {})", contours.len(), attempt);
                    return Some(contours);
                },
                Ok(_) => debug!("No contours detected (attempt {}/{})", attempt, max_retries),
                Err(e) => warn!("Contour detection failed (attempt {}/{}): {}", attempt, max_retries, e),
            }
            if attempt < max_retries && !retry_delay.is_zero() {
                thread::sleep(retry_delay);
            }
        }
        info!("No contours after {} attempts", max_retries);
        None
    }

    /// 丢弃退化轮廓（少于 3 个点或面积为零）
    pub fn process_detected_contours(&self, contours: Vec<Contour>) -> Vec<Contour> {
        let before = contours.len();
        let kept: Vec<Contour> = contours
            .into_iter()
            .filter(|c| c.len() >= MIN_CONTOUR_POINTS && c.area() > 0.0)
            .collect();
        if kept.len() < before {
            debug!("Dropped {} degenerate contours", before - kept.len());
        }
        kept
    }

    /// 只保留质心位于拾取区域内的轮廓
    pub fn filter_contours_by_pickup_area(&self, contours: Vec<Contour>) -> Vec<Contour> {
        let Some(area) = &self.pickup_area else {
            return contours;
        };
        let before = contours.len();
        let kept: Vec<Contour> = contours
            .into_iter()
            .filter(|c| c.centroid().is_some_and(|p| area.contains(p)))
            .collect();
        info!("{} of {} contours inside pickup area", kept.len(), before);
        kept
    }

    pub fn match_contours_to_workpieces(
        &self,
        templates: &[Arc<Workpiece>],
        contours: &[Contour],
    ) -> Result<MatchOutcome, HalError> {
        let outcome = self.matcher.match_contours(templates, contours)?;
        info!(
            "Matched {} contours ({} unmatched)",
            outcome.matches.len(),
            outcome.unmatched.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nesting_hal::mock::{MockMatcher, MockVision};
    use nesting_model::{Gripper, Point2};

    fn square(x: f64, y: f64, side: f64) -> Contour {
        Contour::rectangle(Point2::new(x, y), side, side)
    }

    fn workflow(vision: Arc<MockVision>, area: Option<Contour>) -> VisionWorkflow {
        VisionWorkflow::new(vision, Arc::new(MockMatcher::new()), area)
    }

    #[test]
    fn test_retries_until_contours_appear() {
        let vision = Arc::new(MockVision::new());
        vision.push_batch(vec![]);
        vision.push_batch(vec![]);
        vision.push_batch(vec![square(0.0, 0.0, 10.0)]);

        let contours = workflow(vision.clone(), None)
            .get_contours_with_retries(5, Duration::ZERO)
            .unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(vision.contour_requests(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let vision = Arc::new(MockVision::new());
        let result = workflow(vision.clone(), None).get_contours_with_retries(4, Duration::ZERO);
        assert!(result.is_none());
        assert_eq!(vision.contour_requests(), 4);
    }

    #[test]
    fn test_degenerate_contours_dropped() {
        let wf = workflow(Arc::new(MockVision::new()), None);
        let line = Contour::new(vec![Point2::new(0.0, 0.0), Point2::new(5.0, 0.0)]);
        let kept = wf.process_detected_contours(vec![line, square(0.0, 0.0, 2.0)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_pickup_area_filter() {
        let area = square(0.0, 0.0, 100.0);
        let wf = workflow(Arc::new(MockVision::new()), Some(area));
        let inside = square(10.0, 10.0, 10.0);
        let outside = square(200.0, 200.0, 10.0);
        let kept = wf.filter_contours_by_pickup_area(vec![inside.clone(), outside]);
        assert_eq!(kept, vec![inside]);
    }

    #[test]
    fn test_no_pickup_area_keeps_everything() {
        let wf = workflow(Arc::new(MockVision::new()), None);
        let kept = wf.filter_contours_by_pickup_area(vec![
            square(10.0, 10.0, 10.0),
            square(1e6, 1e6, 10.0),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_match_against_templates() {
        let wf = workflow(Arc::new(MockVision::new()), None);
        let template = Arc::new(Workpiece::new("plate", Gripper::Double, square(0.0, 0.0, 10.0)));
        let outcome = wf
            .match_contours_to_workpieces(
                &[template],
                &[square(50.0, 50.0, 10.0), square(0.0, 0.0, 40.0)],
            )
            .unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.orientations.len(), 1);
        assert_eq!(outcome.unmatched.len(), 1);
    }
}
