//! 工作流：对协作者调用的组合
//!
//! handler 负责"下一步去哪"，工作流负责"这一步怎么做"。工作流不读写
//! 上下文，只接收参数并返回结果，因此可以脱离状态机单独测试。

pub mod measurement;
pub mod placement;
pub mod robot;
pub mod vision;

pub use measurement::MeasurementWorkflow;
pub use placement::PlacementWorkflow;
pub use robot::RobotWorkflow;
pub use vision::VisionWorkflow;
