//! 机械臂客户端接口
//!
//! 本 crate 提供控制核心所需的全部机械臂词汇：
//! - 强类型单位（`Rad`、`Deg`、`RadPerSecond`、`Ampere`）
//! - 关节索引与定长关节数组（`Joint`、`JointArray`）
//! - 末端位姿（`CartesianPose`）
//! - 机械臂端口抽象（[`ActuatorPort`]）与状态快照（[`ArmState`]）
//! - 时钟抽象（[`Clock`]）
//! - 进程内模拟器（[`SimulatedArm`]）
//!
//! 启用 `mock` feature 后额外提供 [`mock`] 模块中的测试替身。

pub mod clock;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod port;
pub mod sim;
pub mod types;

// 重新导出常用类型
pub use clock::{Clock, MonotonicClock};
pub use error::RobotError;
pub use port::{ActuatorPort, ArmState, ServoParams};
pub use sim::SimulatedArm;
pub use types::*;
