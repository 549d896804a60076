//! PID 误差修正
//!
//! # 算法
//!
//! ```text
//! e        = measured − desired           （设定值恒为 0）
//! integral = integral + e · dt
//! output   = clamp(Kp·e + Ki·integral + Kd·(e − e_prev)/dt, min, max)
//! ```
//!
//! 输出被控制循环从目标中**减去**：`command = target − output`。
//!
//! # 特性
//!
//! - **固定步长**: `dt` 为标称控制周期，而非实测间隔
//! - **首次调用无微分**: 没有上一次误差时微分项为 0
//! - **保留积分饱和**: 输出限幅不影响积分累积；只有显式配置
//!   `integral_limit` 时才限制积分项
//!
//! # 示例
//!
//! ```rust
//! use sweep_control::JointPid;
//!
//! let mut pid = JointPid::new(0.4, 0.01, 0.02, 0.05).with_output_limits(-0.05, 0.05);
//!
//! let output = pid.correct(1000.0);
//! assert_eq!(output, 0.05);
//! assert!(pid.last_saturated());
//! ```

use crate::config::{PidGains, ValidatedConfig};
use sweep_client::{Joint, JointArray};
use tracing::debug;

/// 单关节 PID 控制器
#[derive(Debug, Clone, PartialEq)]
pub struct JointPid {
    kp: f64,
    ki: f64,
    kd: f64,

    /// 标称步长（秒）
    dt: f64,

    output_min: f64,
    output_max: f64,

    /// 积分项限制（`None` 表示不限制）
    integral_limit: Option<f64>,

    /// 积分项累积值（Σ e·dt）
    integral: f64,

    /// 上一次的误差
    last_error: Option<f64>,

    last_saturated: bool,
    saturation_count: u64,
}

impl JointPid {
    /// 创建控制器（输出不限幅）
    pub fn new(kp: f64, ki: f64, kd: f64, dt: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            dt,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
            integral_limit: None,
            integral: 0.0,
            last_error: None,
            last_saturated: false,
            saturation_count: 0,
        }
    }

    /// 从配置的增益创建
    pub fn from_gains(gains: &PidGains, dt: f64) -> Self {
        let pid = Self::new(gains.kp, gains.ki, gains.kd, dt)
            .with_output_limits(gains.output_min, gains.output_max);
        match gains.integral_limit {
            Some(limit) => pid.with_integral_limit(limit),
            None => pid,
        }
    }

    /// 设置输出限幅
    pub fn with_output_limits(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// 设置积分项限制（抗饱和）
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// 计算修正量
    ///
    /// 每个 tick 每个关节只调用一次。
    pub fn correct(&mut self, error: f64) -> f64 {
        self.integral += error * self.dt;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }

        let derivative = match self.last_error {
            Some(previous) if self.dt > 0.0 => (error - previous) / self.dt,
            _ => 0.0,
        };
        self.last_error = Some(error);

        let raw = self.kp * error + self.ki * self.integral + self.kd * derivative;
        let output = raw.clamp(self.output_min, self.output_max);

        self.last_saturated = output != raw;
        if self.last_saturated {
            self.saturation_count += 1;
        }
        output
    }

    /// 当前积分项
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// 上一次调用是否被限幅
    pub fn last_saturated(&self) -> bool {
        self.last_saturated
    }

    /// 累计限幅次数
    pub fn saturation_count(&self) -> u64 {
        self.saturation_count
    }

    /// 输出范围
    pub fn output_limits(&self) -> (f64, f64) {
        (self.output_min, self.output_max)
    }
}

/// 按关节索引的 PID 集合
///
/// 未配置控制器的关节为 `None`。
#[derive(Debug, Clone, PartialEq)]
pub struct PidBank {
    controllers: JointArray<Option<JointPid>>,
}

impl PidBank {
    /// 从校验后的配置创建
    pub fn new(config: &ValidatedConfig) -> Self {
        let dt = config.interval().as_secs_f64();
        Self {
            controllers: config.pid().map(|gains| gains.map(|g| JointPid::from_gains(&g, dt))),
        }
    }

    /// 直接指定各关节控制器
    pub fn from_controllers(controllers: JointArray<Option<JointPid>>) -> Self {
        Self { controllers }
    }

    /// 是否为受控关节
    pub fn is_controlled(&self, joint: Joint) -> bool {
        self.controllers[joint].is_some()
    }

    /// 某关节的控制器
    pub fn get(&self, joint: Joint) -> Option<&JointPid> {
        self.controllers[joint].as_ref()
    }

    /// 对受控关节计算修正量；不受控关节返回 `None`
    pub fn correct(&mut self, joint: Joint, error: f64) -> Option<f64> {
        let pid = self.controllers[joint].as_mut()?;
        let output = pid.correct(error);
        if pid.last_saturated() {
            debug!(
                "PID saturated on {}: error {:.6} rad, output clamped to {:.6}",
                joint, error, output
            );
        }
        Some(output)
    }

    /// 各关节累计限幅次数
    pub fn saturation_counts(&self) -> JointArray<u64> {
        JointArray::new(Joint::ALL.map(|joint| {
            self.controllers[joint].as_ref().map_or(0, JointPid::saturation_count)
        }))
    }
}
