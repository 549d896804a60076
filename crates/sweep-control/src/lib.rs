//! # Sweep Control - 振荡扫描控制核心
//!
//! 以固定频率驱动 6 轴机械臂沿解析振荡轨迹运动，每个关节独立做 PID 误差修正，
//! 同时录制运动、电流和末端位姿轨迹。
//!
//! ## 模块
//!
//! - `config` - 会话配置（TOML）与校验
//! - `trajectory` - 振荡轨迹生成（纯函数）
//! - `pid` - 单关节 PID 与按关节索引的 PID 集合
//! - `control_loop` - 单个 tick 的控制逻辑
//! - `session` - 会话阶段状态机（Homing → Tracking → Returning）
//! - `telemetry` - 录制接收端与后台录制线程
//!
//! ## Feature Flags
//!
//! - `realtime` - 跟踪阶段提升控制线程优先级

pub mod config;
pub mod control_loop;
pub mod pid;
pub mod session;
pub mod telemetry;
pub mod trajectory;

// 重新导出常用类型
pub use config::{
    ConfigError, MotionLimits, Oscillation, OscillationConfig, Pacing, PidConfig, PidGains,
    ServoConfig, SessionConfig, TelemetryConfig, ValidatedConfig, Waveform,
};
pub use control_loop::{ControlLoop, TickSample};
pub use pid::{JointPid, PidBank};
pub use session::{
    Homing, Phase, Returning, Session, SessionError, SessionReport, Tracking, TrackingStats,
    run_session,
};
pub use telemetry::{TelemetryError, TelemetryRecord, TelemetryRecorder, TelemetrySink};
pub use trajectory::TrajectoryGenerator;
