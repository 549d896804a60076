//! Trajectory Generator - 解析振荡轨迹
//!
//! # 算法
//!
//! ```text
//! target_i(t) = base_i + A_i · w_i(2π · f_i · t)
//! ```
//!
//! 其中 `w_i` 为正弦或余弦。未配置振荡的关节恒等于基准位形。
//!
//! `evaluate` 是纯函数：同一 `t` 总得到同一结果，没有内部状态。
//!
//! # 示例
//!
//! ```rust
//! use sweep_control::{SessionConfig, TrajectoryGenerator};
//! use sweep_client::Joint;
//!
//! let config = SessionConfig::default().validate().unwrap();
//! let generator = TrajectoryGenerator::new(&config);
//!
//! let target = generator.evaluate(0.0);
//! assert_eq!(target[Joint::J4], config.base()[Joint::J4]);
//! ```

use crate::config::{Oscillation, ValidatedConfig};
use std::f64::consts::TAU;
use sweep_client::JointConfiguration;

/// 振荡轨迹生成器
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryGenerator {
    base: JointConfiguration,
    oscillations: Vec<Oscillation>,
}

impl TrajectoryGenerator {
    /// 从校验后的配置创建
    pub fn new(config: &ValidatedConfig) -> Self {
        Self::from_parts(*config.base(), config.oscillations().to_vec())
    }

    /// 直接指定基准位形和振荡
    pub fn from_parts(base: JointConfiguration, oscillations: Vec<Oscillation>) -> Self {
        Self { base, oscillations }
    }

    /// 基准位形
    pub fn base(&self) -> &JointConfiguration {
        &self.base
    }

    /// 计算 `t` 秒（自跟踪开始）处的目标位形
    pub fn evaluate(&self, t: f64) -> JointConfiguration {
        let mut target = self.base;
        for osc in &self.oscillations {
            let phase = TAU * osc.frequency_hz * t;
            target[osc.joint] = self.base[osc.joint] + osc.amplitude * osc.waveform.eval(phase);
        }
        target
    }
}
