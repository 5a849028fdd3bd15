//! 几何类型
//!
//! 提供机器人位姿、像素空间轮廓以及相机到机器人的单应性变换。
//!
//! # 坐标约定
//!
//! - 像素空间：相机图像坐标（像素），原点在左上角
//! - 机器人空间：基座坐标系（毫米 + 度）
//!
//! # 示例
//!
//! ```rust
//! use nesting_model::geometry::{Contour, Homography, Point2};
//!
//! let square = Contour::new(vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(10.0, 0.0),
//!     Point2::new(10.0, 10.0),
//!     Point2::new(0.0, 10.0),
//! ]);
//! let centroid = square.centroid().unwrap();
//! let robot = Homography::identity().apply(centroid);
//! assert_eq!(robot, Point2::new(5.0, 5.0));
//! ```

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 二维点（像素或毫米，视上下文而定）
pub type Point2 = nalgebra::Point2<f64>;

/// 面积阈值：低于此值的轮廓视为退化
const DEGENERATE_AREA: f64 = 1e-9;

/// 机器人笛卡尔位姿（毫米 + 度）
///
/// 与机器人控制器的原生格式 `[x, y, z, rx, ry, rz]` 一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Pose {
    /// 创建新的位姿
    pub const fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Pose {
            x,
            y,
            z,
            rx,
            ry,
            rz,
        }
    }

    /// 从控制器原生数组构造
    pub const fn from_array(values: [f64; 6]) -> Self {
        Pose::new(
            values[0], values[1], values[2], values[3], values[4], values[5],
        )
    }

    /// 转换为控制器原生数组
    pub const fn to_array(self) -> [f64; 6] {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
    }

    /// 替换 Z 坐标，返回新位姿
    pub const fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }

    /// 平移 X/Y，返回新位姿
    pub const fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.x += dx;
        self.y += dy;
        self
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}, {:.3}, {:.1}, {:.1}, {:.1}]",
            self.x, self.y, self.z, self.rx, self.ry, self.rz
        )
    }
}

/// 像素空间闭合轮廓
///
/// 点序列首尾隐式相连。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    points: Vec<Point2>,
}

impl Contour {
    /// 从点序列创建轮廓
    pub fn new(points: Vec<Point2>) -> Self {
        Contour { points }
    }

    /// 轴对齐矩形（测试和仿真常用）
    pub fn rectangle(origin: Point2, width: f64, height: f64) -> Self {
        Contour::new(vec![
            origin,
            Point2::new(origin.x + width, origin.y),
            Point2::new(origin.x + width, origin.y + height),
            Point2::new(origin.x, origin.y + height),
        ])
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 有符号面积（鞋带公式），逆时针为正
    fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            acc += p.x * q.y - q.x * p.y;
        }
        acc / 2.0
    }

    /// 轮廓面积（像素²）
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// 轮廓质心
    ///
    /// 退化轮廓（面积为 0，例如共线点）回退为顶点平均值；
    /// 空轮廓返回 `None`。
    pub fn centroid(&self) -> Option<Point2> {
        if self.points.is_empty() {
            return None;
        }

        let area = self.signed_area();
        if area.abs() < DEGENERATE_AREA {
            let n = self.points.len() as f64;
            let (sx, sy) = self
                .points
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Some(Point2::new(sx / n, sy / n));
        }

        let n = self.points.len();
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        let factor = 1.0 / (6.0 * area);
        Some(Point2::new(cx * factor, cy * factor))
    }

    /// 轴对齐包围盒尺寸 `(width, height)`
    pub fn bounding_size(&self) -> (f64, f64) {
        if self.points.is_empty() {
            return (0.0, 0.0);
        }
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        (max_x - min_x, max_y - min_y)
    }

    /// 点是否在多边形内部（射线法，边界上的点视为不确定）
    pub fn contains(&self, point: Point2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > point.y) != (pj.y > point.y) {
                let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

impl From<Vec<[f64; 2]>> for Contour {
    fn from(points: Vec<[f64; 2]>) -> Self {
        Contour::new(points.into_iter().map(|[x, y]| Point2::new(x, y)).collect())
    }
}

/// 相机 → 机器人单应性变换（3×3 射影矩阵）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Homography(matrix)
    }

    /// 单位变换
    pub fn identity() -> Self {
        Homography(Matrix3::identity())
    }

    /// 从行优先数组构造
    pub fn from_row_slice(values: &[f64; 9]) -> Self {
        Homography(Matrix3::from_row_slice(values))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// 对单个点应用射影变换
    ///
    /// 齐次分量为 0 时（点映射到无穷远）原样返回 x/y 分量。
    pub fn apply(&self, point: Point2) -> Point2 {
        let v = self.0 * Vector3::new(point.x, point.y, 1.0);
        if v.z.abs() < f64::EPSILON {
            tracing::warn!(
                "Homography maps ({:.3}, {:.3}) to infinity, using affine part",
                point.x,
                point.y
            );
            return Point2::new(v.x, v.y);
        }
        Point2::new(v.x / v.z, v.y / v.z)
    }

    /// 应用变换后叠加末端执行器偏移（毫米）
    pub fn apply_with_offset(&self, point: Point2, offset_x: f64, offset_y: f64) -> Point2 {
        let p = self.apply(point);
        Point2::new(p.x + offset_x, p.y + offset_y)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Homography::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Contour {
        Contour::rectangle(Point2::new(0.0, 0.0), 1.0, 1.0)
    }

    #[test]
    fn test_pose_array_conversion() {
        let pose = Pose::new(1.0, 2.0, 3.0, 180.0, 0.0, 90.0);
        assert_eq!(pose.to_array(), [1.0, 2.0, 3.0, 180.0, 0.0, 90.0]);
        assert_eq!(Pose::from_array(pose.to_array()), pose);
    }

    #[test]
    fn test_pose_with_z_and_translate() {
        let pose = Pose::new(1.0, 2.0, 3.0, 180.0, 0.0, 90.0);
        let moved = pose.with_z(10.0).translated(5.0, -1.0);
        assert_eq!(moved, Pose::new(6.0, 1.0, 10.0, 180.0, 0.0, 90.0));
        // 原值不变
        assert_eq!(pose.z, 3.0);
    }

    #[test]
    fn test_contour_area_and_centroid() {
        let rect = Contour::rectangle(Point2::new(10.0, 20.0), 4.0, 2.0);
        assert!((rect.area() - 8.0).abs() < 1e-12);
        assert_eq!(rect.centroid(), Some(Point2::new(12.0, 21.0)));
        assert_eq!(rect.bounding_size(), (4.0, 2.0));
    }

    #[test]
    fn test_centroid_orientation_independent() {
        // 顺时针与逆时针得到同一质心
        let mut points = unit_square().points().to_vec();
        points.reverse();
        let cw = Contour::new(points);
        assert_eq!(cw.centroid(), unit_square().centroid());
    }

    #[test]
    fn test_degenerate_centroid_falls_back_to_mean() {
        let line = Contour::from(vec![[0.0, 0.0], [2.0, 0.0], [4.0, 0.0]]);
        assert_eq!(line.centroid(), Some(Point2::new(2.0, 0.0)));
        assert_eq!(Contour::default().centroid(), None);
    }

    #[test]
    fn test_contains() {
        let square = Contour::rectangle(Point2::new(0.0, 0.0), 10.0, 10.0);
        assert!(square.contains(Point2::new(5.0, 5.0)));
        assert!(!square.contains(Point2::new(15.0, 5.0)));
        assert!(!square.contains(Point2::new(-0.1, 5.0)));
    }

    #[test]
    fn test_homography_translation_and_scale() {
        // x' = 2x + 10, y' = 3y - 5
        let h = Homography::from_row_slice(&[2.0, 0.0, 10.0, 0.0, 3.0, -5.0, 0.0, 0.0, 1.0]);
        assert_eq!(h.apply(Point2::new(1.0, 2.0)), Point2::new(12.0, 1.0));
        assert_eq!(
            h.apply_with_offset(Point2::new(1.0, 2.0), 0.5, -0.5),
            Point2::new(12.5, 0.5)
        );
    }

    #[test]
    fn test_homography_projective_division() {
        // w = 2 → 所有坐标减半
        let h = Homography::from_row_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0]);
        assert_eq!(h.apply(Point2::new(4.0, 6.0)), Point2::new(2.0, 3.0));
    }
}
