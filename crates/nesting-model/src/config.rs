//! # 工作站配置
//!
//! 拾取-放置流程的全部可调参数，使用 TOML 持久化。
//!
//! 默认值与现场标定后的数值一致，缺失的字段自动取默认值：
//!
//! ```toml
//! [process]
//! max_empty_detections = 5
//!
//! [grippers]
//! double_gripper_z_offset = 15.0
//! ```

use crate::geometry::{Contour, Point2};
use crate::gripper::{Gripper, GripperOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 工作站总配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestingConfig {
    /// 流程控制参数
    pub process: ProcessConfig,
    /// 夹爪偏移
    pub grippers: GrippersConfig,
    /// 运动参数
    pub motion: MotionConfig,
    /// 高度测量参数
    pub measurement: MeasurementConfig,
    /// 视觉参数
    pub vision: VisionConfig,
}

impl NestingConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: NestingConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 校验参数范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.process;
        if p.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "process.max_retries must be at least 1".into(),
            ));
        }
        if p.max_empty_detections == 0 {
            return Err(ConfigError::Invalid(
                "process.max_empty_detections must be at least 1".into(),
            ));
        }
        if p.max_errors == 0 {
            return Err(ConfigError::Invalid(
                "process.max_errors must be at least 1".into(),
            ));
        }
        if self.motion.velocity <= 0.0 || self.motion.acceleration <= 0.0 {
            return Err(ConfigError::Invalid(
                "motion.velocity and motion.acceleration must be positive".into(),
            ));
        }
        if self.motion.capture_retries == 0 {
            return Err(ConfigError::Invalid(
                "motion.capture_retries must be at least 1".into(),
            ));
        }
        if let Some(area) = &self.vision.pickup_area
            && area.len() < 3
        {
            return Err(ConfigError::Invalid(format!(
                "vision.pickup_area needs at least 3 vertices, got {}",
                area.len()
            )));
        }
        Ok(())
    }
}

/// 流程控制参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// 轮廓检测最大尝试次数
    pub max_retries: u32,
    /// 轮廓检测重试间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 连续空检测次数上限
    pub max_empty_detections: u32,
    /// 错误次数上限
    pub max_errors: u32,
    /// 末端 RZ 姿态（度）
    pub rz_orientation: f64,
    /// 接近点相对接触点的抬升高度（毫米）
    pub descent_height_offset: f64,
    /// 状态机循环间隔（毫秒）
    pub loop_delay_ms: u64,
    /// 等待完成的超时（毫秒），`None` 表示无限等待
    pub wait_timeout_ms: Option<u64>,
}

impl ProcessConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_delay_ms: 1000,
            max_empty_detections: 3,
            max_errors: 5,
            rz_orientation: 90.0,
            descent_height_offset: 150.0,
            loop_delay_ms: 100,
            wait_timeout_ms: None,
        }
    }
}

/// 夹爪偏移配置（毫米）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrippersConfig {
    pub gripper_x_offset: f64,
    pub gripper_y_offset: f64,
    pub double_gripper_z_offset: f64,
    pub single_gripper_z_offset: f64,
}

impl GrippersConfig {
    /// 指定夹爪的完整偏移
    pub fn offset_for(&self, gripper: Gripper) -> GripperOffset {
        let z = match gripper {
            Gripper::Single => self.single_gripper_z_offset,
            Gripper::Double => self.double_gripper_z_offset,
        };
        GripperOffset {
            x: self.gripper_x_offset,
            y: self.gripper_y_offset,
            z,
        }
    }
}

impl Default for GrippersConfig {
    fn default() -> Self {
        Self {
            gripper_x_offset: 100.429,
            gripper_y_offset: 1.991,
            double_gripper_z_offset: 14.0,
            single_gripper_z_offset: 19.0,
        }
    }
}

/// 运动参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// 工具坐标系编号
    pub tool: i32,
    /// 用户（工件）坐标系编号
    pub user: i32,
    /// 全局速度
    pub velocity: f64,
    /// 全局加速度
    pub acceleration: f64,
    /// 移动到拍照位的最大尝试次数
    pub capture_retries: u32,
    /// 拍照位重试间隔（毫秒）
    pub capture_retry_delay_ms: u64,
    /// 拾取与放置之间的中间路径点 X
    pub intermediate_x: f64,
    /// 中间路径点 Y
    pub intermediate_y: f64,
    /// 中间路径点相对安全下限 `z_min` 的高度
    pub intermediate_z_above_min: f64,
}

impl MotionConfig {
    pub fn capture_retry_delay(&self) -> Duration {
        Duration::from_millis(self.capture_retry_delay_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tool: 0,
            user: 0,
            velocity: 30.0,
            acceleration: 30.0,
            capture_retries: 3,
            capture_retry_delay_ms: 1000,
            intermediate_x: -317.997,
            intermediate_y: 261.207,
            intermediate_z_above_min: 150.0,
        }
    }
}

/// 激光测高参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// 测量位姿的 Z 高度（毫米）
    pub measurement_height: f64,
    /// 测量值的固定补偿（毫米）
    pub height_adjustment: f64,
    /// 激光打开后的稳定时间（毫秒）
    pub settle_delay_ms: u64,
    /// 等待自动曝光稳定而丢弃的帧数
    pub discard_frames: u32,
    /// 拾取计算使用的名义工件厚度（毫米）
    pub match_height: f64,
}

impl MeasurementConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            measurement_height: 350.0,
            height_adjustment: 2.0,
            settle_delay_ms: 1000,
            discard_frames: 5,
            match_height: 3.0,
        }
    }
}

/// 视觉参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// 末端执行器 X 偏移（毫米，叠加在单应性结果上）
    pub end_effector_offset_x: f64,
    /// 末端执行器 Y 偏移（毫米）
    pub end_effector_offset_y: f64,
    /// 拾取区域多边形（像素），`None` 表示全视野
    pub pickup_area: Option<Vec<[f64; 2]>>,
}

impl VisionConfig {
    /// 拾取区域轮廓
    pub fn pickup_area_contour(&self) -> Option<Contour> {
        self.pickup_area.as_ref().map(|points| {
            Contour::new(points.iter().map(|[x, y]| Point2::new(*x, *y)).collect())
        })
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            end_effector_offset_x: -0.041,
            end_effector_offset_y: 76.859,
            pickup_area: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NestingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.process.max_empty_detections, 3);
        assert_eq!(config.process.max_errors, 5);
        assert_eq!(config.measurement.discard_frames, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NestingConfig = toml::from_str(
            r#"
[process]
max_empty_detections = 7

[grippers]
double_gripper_z_offset = 15.5
"#,
        )
        .unwrap();
        assert_eq!(config.process.max_empty_detections, 7);
        assert_eq!(config.process.max_retries, 10);
        assert_eq!(config.grippers.double_gripper_z_offset, 15.5);
        assert_eq!(config.grippers.single_gripper_z_offset, 19.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nesting.toml");

        let mut config = NestingConfig::default();
        config.process.loop_delay_ms = 5;
        config.vision.pickup_area = Some(vec![[0.0, 0.0], [640.0, 0.0], [640.0, 480.0]]);
        config.save_to_file(&path).unwrap();

        let loaded = NestingConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = NestingConfig::default();
        config.process.max_retries = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = NestingConfig::default();
        config.vision.pickup_area = Some(vec![[0.0, 0.0], [1.0, 1.0]]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pickup_area"));
    }

    #[test]
    fn test_gripper_offsets() {
        let grippers = GrippersConfig::default();
        assert_eq!(grippers.offset_for(Gripper::Single).z, 19.0);
        assert_eq!(grippers.offset_for(Gripper::Double).z, 14.0);
        assert_eq!(grippers.offset_for(Gripper::Double).x, 100.429);
    }

    #[test]
    fn test_load_missing_file() {
        let err = NestingConfig::load_from_file("/nonexistent/nesting.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
