//! 视觉相关接口：相机、激光测高、模板匹配

use crate::error::HalError;
use nesting_model::{Contour, Homography, Match, Workpiece};
use std::sync::Arc;

/// 相机图像帧
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// 帧序号（单调递增）
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// RGB 像素数据
    pub data: Vec<u8>,
}

/// 视觉服务
pub trait VisionService: Send + Sync {
    /// 准备下一次拍照（触发曝光、清空缓存）
    fn arm_capture(&self) -> Result<(), HalError>;

    /// 获取当前场景中的轮廓
    ///
    /// 空列表表示本次未检测到任何轮廓，调用方负责重试。
    fn get_contours(&self) -> Result<Vec<Contour>, HalError>;

    /// 相机 → 机器人的单应性矩阵
    fn camera_to_robot_matrix(&self) -> Homography;

    /// 最新的一帧图像
    fn get_latest_frame(&self) -> Option<Frame>;
}

/// 激光测高结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightReading {
    /// 工件高度（毫米）
    pub height_mm: f64,
    /// 激光线在图像中的原始偏移（像素）
    pub pixel_metric: f64,
}

/// 激光三角测高服务
pub trait LaserHeightService: Send + Sync {
    fn measure_height(&self, frame: &Frame) -> Result<HeightReading, HalError>;
}

/// 匹配输出
///
/// `matches` 与 `orientations` 一一对应。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub matches: Vec<Match>,
    /// 每个匹配相对模板的旋转角（度）
    pub orientations: Vec<f64>,
    /// 未能匹配任何模板的轮廓
    pub unmatched: Vec<Contour>,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// 轮廓-模板匹配器
pub trait WorkpieceMatcher: Send + Sync {
    fn match_contours(
        &self,
        templates: &[Arc<Workpiece>],
        contours: &[Contour],
    ) -> Result<MatchOutcome, HalError>;
}
