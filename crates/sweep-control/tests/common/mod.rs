//! 集成测试公共工具

#![allow(dead_code)]

use sweep_client::mock::{ManualClock, MockArm};
use sweep_client::{ArmState, CartesianPose, JointArray, Rad};
use sweep_control::{SessionConfig, ValidatedConfig};
use sweep_tools::{TraceMetadata, TraceSet};

/// 基准为零、无稳定等待的配置
pub fn zero_base_config(duration_s: f64) -> SessionConfig {
    SessionConfig {
        duration_s,
        settle_s: 0.0,
        base_deg: vec![0.0; 6],
        ..SessionConfig::default()
    }
}

/// 所有振幅为 0
pub fn without_motion(mut cfg: SessionConfig) -> SessionConfig {
    for osc in &mut cfg.oscillation {
        osc.amplitude_deg = 0.0;
    }
    cfg
}

pub fn validated(cfg: SessionConfig) -> ValidatedConfig {
    cfg.validate().expect("test config must be valid")
}

/// 所有读数为零的机械臂桩
pub fn zero_arm() -> MockArm {
    MockArm::new(ArmState::at_rest(JointArray::splat(Rad(0.0)), CartesianPose::ORIGIN))
}

pub fn empty_traces(config: &ValidatedConfig) -> TraceSet {
    TraceSet::new(TraceMetadata::new("mock", config.frequency_hz()))
}

pub fn clock() -> ManualClock {
    ManualClock::new()
}
