//! # Sweep Tools - 共享数据结构和算法
//!
//! **依赖原则**: 不依赖任何其他 workspace crate，只包含纯数据结构和纯函数
//!
//! ## 包含模块
//!
//! - `trace` - 轨迹录制格式（运动 / 电流 / 末端位姿三类样本）
//! - `statistics` - 统计算法（纯函数，可选）
//!
//! ## Feature Flags
//!
//! - `default` - 无默认 features
//! - `full` - 启用所有功能（包含 statistics）
//! - `statistics` - 启用统计模块
//!
//! ## 使用示例
//!
//! ```toml
//! # apps/cli/Cargo.toml - 需要统计
//! [dependencies]
//! sweep-tools = { workspace = true, features = ["full"] }
//!
//! # crates/sweep-control/Cargo.toml - 只需要数据结构
//! [dependencies]
//! sweep-tools = { workspace = true }
//! ```

pub mod trace;

// ⭐ 可选模块（通过 feature flags 控制）
#[cfg(feature = "statistics")]
pub mod statistics;

// 重新导出常用类型
pub use trace::{
    MotionSample, PowerSample, TcpSample, TraceFile, TraceKind, TraceMetadata, TracePaths,
    TraceRow, TraceSet,
};
