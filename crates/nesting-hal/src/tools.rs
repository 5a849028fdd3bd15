//! 开关类执行器（真空泵、激光器）

use crate::error::HalError;

/// 可开关的执行器
///
/// `turn_on` / `turn_off` 必须幂等：重复关闭一个已关闭的设备不是错误。
pub trait Switchable: Send + Sync {
    /// 设备名称（日志用）
    fn name(&self) -> &str;

    fn turn_on(&self) -> Result<(), HalError>;

    fn turn_off(&self) -> Result<(), HalError>;
}
