//! 机器人运动与夹爪换装接口

use crate::error::HalError;
use nesting_model::{MotionConfig, Pose, ToolId};

/// 运动成功的状态码
pub const MOTION_OK: i32 = 0;

/// 单次运动指令的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// 工具坐标系编号
    pub tool: i32,
    /// 用户（工件）坐标系编号
    pub user: i32,
    pub velocity: f64,
    pub acceleration: f64,
    /// 是否阻塞等待到位
    pub wait: bool,
}

impl MotionParams {
    /// 由运动配置生成（等待到位）
    pub fn from_config(config: &MotionConfig) -> Self {
        MotionParams {
            tool: config.tool,
            user: config.user,
            velocity: config.velocity,
            acceleration: config.acceleration,
            wait: true,
        }
    }
}

/// 机器人运动服务
///
/// 所有方法返回控制器原生状态码，`0` 表示成功。
/// 实现必须是线程安全的：执行线程调用运动指令，控制线程只读取状态。
pub trait RobotService: Send + Sync {
    /// 直线/关节运动到指定位姿
    fn move_to_position(&self, pose: &Pose, params: &MotionParams) -> i32;

    /// 回到标定（原点）位姿
    fn move_to_calibration_position(&self) -> i32;

    /// 移动到拍照位
    fn move_to_capture_position(&self) -> i32;

    /// 当前安装的工具 ID，`None` 表示未安装夹爪
    fn current_tool(&self) -> Option<ToolId>;

    /// 安全限位的 Z 下限（毫米）
    fn safety_z_min(&self) -> f64;
}

/// 夹爪换装台
pub trait GripperManager: Send + Sync {
    /// 从换装台取夹爪
    fn pickup_gripper(&self, tool: ToolId) -> Result<(), HalError>;

    /// 把夹爪放回换装台
    fn drop_off_gripper(&self, tool: ToolId) -> Result<(), HalError>;

    /// 校验换装后的夹爪是否为期望值
    fn verify_gripper_change(&self, expected: ToolId) -> bool;
}
