//! 工件数据结构
//!
//! - `Workpiece`: 预先选定的工件模板
//! - `Match`: 检测到的轮廓与模板的配对
//! - `WorkpiecePlacement`: 一次拾取-放置所需的全部几何数据
//! - `PlacedRecord`: 已放置工件的诊断记录

use crate::geometry::{Contour, Point2, Pose};
use crate::gripper::Gripper;
use std::sync::Arc;

/// 工件模板
#[derive(Debug, Clone, PartialEq)]
pub struct Workpiece {
    /// 模板名称
    pub name: String,
    /// 拾取所需的夹爪
    pub gripper: Gripper,
    /// 模板声明的拾取点（像素），`None` 表示使用轮廓质心
    pub pickup_point: Option<Point2>,
    /// 名义厚度（毫米）
    pub height: f64,
    /// 模板轮廓
    pub contour: Contour,
}

impl Workpiece {
    pub fn new(name: impl Into<String>, gripper: Gripper, contour: Contour) -> Self {
        Workpiece {
            name: name.into(),
            gripper,
            pickup_point: None,
            height: 3.0,
            contour,
        }
    }

    /// 设置声明的拾取点
    pub fn with_pickup_point(mut self, point: Point2) -> Self {
        self.pickup_point = Some(point);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }
}

/// 匹配结果：检测轮廓 + 识别出的模板
///
/// 方向（度）不在此结构中，而是保存在上下文的并行列表里，
/// 与匹配器的输出格式保持一致。
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// 被识别的模板（多个匹配共享同一模板）
    pub workpiece: Arc<Workpiece>,
    /// 场景中检测到的轮廓（像素）
    pub contour: Contour,
}

impl Match {
    pub fn new(workpiece: Arc<Workpiece>, contour: Contour) -> Self {
        Match { workpiece, contour }
    }

    /// 主轮廓
    pub fn main_contour(&self) -> &Contour {
        &self.contour
    }

    pub fn gripper(&self) -> Gripper {
        self.workpiece.gripper
    }

    /// 模板声明的拾取点
    pub fn pickup_point(&self) -> Option<Point2> {
        self.workpiece.pickup_point
    }
}

/// 拾取路径点：接近 → 接触 → 抬升
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupPositions {
    pub approach: Pose,
    pub contact: Pose,
    pub lift: Pose,
}

impl PickupPositions {
    /// 接触点在序列中的下标
    pub const CONTACT_INDEX: usize = 1;

    /// 转换为执行顺序的路径点数组
    pub fn to_array(self) -> [Pose; 3] {
        [self.approach, self.contact, self.lift]
    }
}

/// 放置路径点（两段下降）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropOffPositions {
    pub position1: Pose,
    pub position2: Pose,
}

impl DropOffPositions {
    pub fn to_tuple(self) -> (Pose, Pose) {
        (self.position1, self.position2)
    }
}

/// 工件外形尺寸（毫米）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// 一次拾取-放置的完整几何数据
///
/// 由放置服务生成；拾取路径点在拾取计算完成后附加。
#[derive(Debug, Clone, PartialEq)]
pub struct WorkpiecePlacement {
    /// 拾取路径点
    pub pickup_positions: Option<PickupPositions>,
    /// 放置路径点
    pub drop_off_positions: DropOffPositions,
    /// 在放置平面上的占位外形（毫米）
    pub footprint: Contour,
    /// 外形尺寸
    pub dimensions: Dimensions,
    /// 来源轮廓（像素）
    pub source_contour: Contour,
}

impl WorkpiecePlacement {
    pub fn with_pickup_positions(mut self, positions: PickupPositions) -> Self {
        self.pickup_positions = Some(positions);
        self
    }
}

/// 已放置工件的诊断记录
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRecord {
    /// 平面上的占位外形，缺失时为 `None`
    pub footprint: Option<Contour>,
    /// 第一个放置点
    pub drop_position: Pose,
    pub dimensions: Dimensions,
    /// 批次内序号（从 1 开始）
    pub match_index: usize,
}

impl PlacedRecord {
    /// 由放置结果生成记录；放置结果缺失时生成占位记录
    pub fn from_placement(placement: Option<&WorkpiecePlacement>, match_index: usize) -> Self {
        match placement {
            Some(p) => PlacedRecord {
                footprint: Some(p.footprint.clone()),
                drop_position: p.drop_off_positions.position1,
                dimensions: p.dimensions,
                match_index,
            },
            None => PlacedRecord {
                footprint: None,
                drop_position: Pose::default(),
                dimensions: Dimensions::default(),
                match_index,
            },
        }
    }
}
