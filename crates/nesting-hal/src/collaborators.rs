//! 协作者集合

use crate::placement::PlacementService;
use crate::robot::{GripperManager, RobotService};
use crate::tools::Switchable;
use crate::vision::{LaserHeightService, VisionService, WorkpieceMatcher};
use std::sync::Arc;

/// 一个工作站的全部外部协作者
///
/// 在一次操作期间由执行线程独占使用。
#[derive(Clone)]
pub struct Collaborators {
    pub robot: Arc<dyn RobotService>,
    pub grippers: Arc<dyn GripperManager>,
    pub vision: Arc<dyn VisionService>,
    pub laser_height: Arc<dyn LaserHeightService>,
    pub matcher: Arc<dyn WorkpieceMatcher>,
    pub placement: Arc<dyn PlacementService>,
    pub pump: Arc<dyn Switchable>,
    pub laser: Arc<dyn Switchable>,
}
