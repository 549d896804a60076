//! 会话配置
//!
//! [`SessionConfig`] 是面向用户的 TOML 结构（角度用度、时间用秒），
//! [`SessionConfig::validate`] 一次性完成所有检查和单位换算，得到不可变的
//! [`ValidatedConfig`]。控制核心的所有构造函数只接受校验后的配置。
//!
//! # 示例
//!
//! ```toml
//! actuator_address = "192.168.1.1"
//! duration_s = 10.0
//! frequency_hz = 20.0
//! settle_s = 1.0
//! pacing = "relative"
//! base_deg = [261.15, -19.99, 10.0, 0.0, 90.0, 0.0]
//!
//! [motion]
//! speed = 0.3
//! acceleration = 0.8
//!
//! [[oscillation]]
//! joint = "J1"
//! amplitude_deg = 2.0
//! frequency_hz = 0.2
//! waveform = "sine"
//!
//! [[pid]]
//! joint = "J1"
//! kp = 0.4
//! ki = 0.01
//! kd = 0.02
//! output_min = -0.05
//! output_max = 0.05
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sweep_client::{Deg, Joint, JointArray, JointConfiguration, Rad, ServoParams};
use thiserror::Error;
use tracing::warn;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 向量长度错误
    #[error("{field} must have {expected} entries, got {actual}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 必须为正数
    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: String, value: f64 },

    /// 必须为非负数
    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: String, value: f64 },

    /// 非有限值
    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    /// 输出上下限颠倒
    #[error("PID output limits for {joint} are inverted: min {min} > max {max}")]
    InvertedLimits { joint: Joint, min: f64, max: f64 },

    /// 同一关节重复配置
    #[error("joint {joint} appears more than once in [[{section}]]")]
    DuplicateJoint { section: &'static str, joint: Joint },

    /// 振荡关节没有 PID 控制器
    #[error("joint {joint} oscillates but has no [[pid]] entry")]
    UncontrolledOscillation { joint: Joint },

    /// 时间值超出可表示范围
    #[error("{field} is out of range ({value})")]
    OutOfRange { field: String, value: f64 },

    /// 文件读写失败
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 节拍策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// 休眠到本 tick 开始 + 周期；超时后立即开始下一 tick，允许累计漂移
    #[default]
    Relative,
    /// 第 k 个 tick 的截止时刻固定为 起点 + k·周期，消除累计漂移
    Deadline,
}

/// 振荡波形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Cosine,
}

impl Waveform {
    /// 计算波形值
    #[inline]
    pub fn eval(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Cosine => phase.cos(),
        }
    }
}

/// 运动限制（用于回零移动和伺服命令）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionLimits {
    /// 速度上限（rad/s）
    pub speed: f64,
    /// 加速度上限（rad/s²）
    pub acceleration: f64,
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            speed: 0.3,
            acceleration: 0.8,
        }
    }
}

/// 伺服命令参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// 前瞻时间（秒）
    pub lookahead_s: f64,
    /// 比例增益
    pub gain: f64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            lookahead_s: 0.05,
            gain: 300.0,
        }
    }
}

/// 录制配置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// 控制线程到录制线程的通道容量（样本数）
    ///
    /// 缺省为无界通道，每个 tick 的样本都会保留；设置后队列满时丢弃样本。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,
}

/// 单个关节的振荡
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillationConfig {
    pub joint: Joint,
    /// 振幅（度）
    pub amplitude_deg: f64,
    /// 频率（Hz）
    pub frequency_hz: f64,
    pub waveform: Waveform,
}

/// 单个关节的 PID 参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub joint: Joint,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// 输出下限（rad）
    pub output_min: f64,
    /// 输出上限（rad）
    pub output_max: f64,
    /// 积分项绝对值上限；缺省时不做抗饱和
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

impl PidConfig {
    fn reference(joint: Joint) -> Self {
        Self {
            joint,
            kp: 0.4,
            ki: 0.01,
            kd: 0.02,
            output_min: -0.05,
            output_max: 0.05,
            integral_limit: None,
        }
    }
}

/// 会话配置（TOML）
///
/// 缺省字段取 [`SessionConfig::default`] 的值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 机械臂地址
    pub actuator_address: String,
    /// 跟踪阶段时长（秒）
    pub duration_s: f64,
    /// 控制频率（Hz）
    pub frequency_hz: f64,
    /// 回零后的稳定等待（秒）
    pub settle_s: f64,
    /// 节拍策略
    pub pacing: Pacing,
    /// 基准位形（度，6 个）
    pub base_deg: Vec<f64>,
    pub motion: MotionLimits,
    pub servo: ServoConfig,
    pub telemetry: TelemetryConfig,
    pub oscillation: Vec<OscillationConfig>,
    pub pid: Vec<PidConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let oscillation = |joint, amplitude_deg, frequency_hz, waveform| OscillationConfig {
            joint,
            amplitude_deg,
            frequency_hz,
            waveform,
        };

        Self {
            actuator_address: "192.168.1.1".to_string(),
            duration_s: 10.0,
            frequency_hz: 20.0,
            settle_s: 1.0,
            pacing: Pacing::Relative,
            base_deg: vec![261.15, -19.99, 10.0, 0.0, 90.0, 0.0],
            motion: MotionLimits::default(),
            servo: ServoConfig::default(),
            telemetry: TelemetryConfig::default(),
            oscillation: vec![
                oscillation(Joint::J1, 2.0, 0.2, Waveform::Sine),
                oscillation(Joint::J2, 3.0, 0.5, Waveform::Sine),
                oscillation(Joint::J3, 3.0, 0.5, Waveform::Cosine),
                oscillation(Joint::J5, 1.0, 0.7, Waveform::Sine),
            ],
            pid: [Joint::J1, Joint::J2, Joint::J3, Joint::J5]
                .into_iter()
                .map(PidConfig::reference)
                .collect(),
        }
    }
}

fn finite(field: impl Into<String>, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite {
            field: field.into(),
        })
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<f64, ConfigError> {
    let field = field.into();
    let value = finite(field.clone(), value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(value)
}

fn non_negative(field: impl Into<String>, value: f64) -> Result<f64, ConfigError> {
    let field = field.into();
    let value = finite(field.clone(), value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(value)
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::OutOfRange {
        field: field.to_string(),
        value,
    })
}

impl SessionConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 保存到文件（父目录不存在时自动创建）
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.to_toml_string()?).map_err(io_err)
    }

    /// 校验并换算为控制核心使用的配置
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let duration = positive("duration_s", self.duration_s)?;
        let frequency_hz = positive("frequency_hz", self.frequency_hz)?;
        let settle = non_negative("settle_s", self.settle_s)?;
        if frequency_hz > 1000.0 {
            warn!(
                "Very high control frequency: {} Hz. Port round-trips must finish within {:.3}ms.",
                frequency_hz,
                1000.0 / frequency_hz
            );
        }

        if self.base_deg.len() != 6 {
            return Err(ConfigError::WrongLength {
                field: "base_deg",
                expected: 6,
                actual: self.base_deg.len(),
            });
        }
        let mut base = JointArray::splat(Rad::ZERO);
        for (joint, &deg) in Joint::ALL.iter().zip(&self.base_deg) {
            base[*joint] = Deg(finite(format!("base_deg[{}]", joint.index()), deg)?).to_rad();
        }

        let speed = positive("motion.speed", self.motion.speed)?;
        let acceleration = positive("motion.acceleration", self.motion.acceleration)?;
        let lookahead = positive("servo.lookahead_s", self.servo.lookahead_s)?;
        let gain = positive("servo.gain", self.servo.gain)?;
        if self.telemetry.channel_capacity == Some(0) {
            return Err(ConfigError::NonPositive {
                field: "telemetry.channel_capacity".to_string(),
                value: 0.0,
            });
        }

        let mut pid = JointArray::splat(None);
        for entry in &self.pid {
            let joint = entry.joint;
            if pid[joint].is_some() {
                return Err(ConfigError::DuplicateJoint {
                    section: "pid",
                    joint,
                });
            }
            let min = finite(format!("pid.{joint}.output_min"), entry.output_min)?;
            let max = finite(format!("pid.{joint}.output_max"), entry.output_max)?;
            if min > max {
                return Err(ConfigError::InvertedLimits { joint, min, max });
            }
            let integral_limit = entry
                .integral_limit
                .map(|limit| positive(format!("pid.{joint}.integral_limit"), limit))
                .transpose()?;
            pid[joint] = Some(PidGains {
                kp: finite(format!("pid.{joint}.kp"), entry.kp)?,
                ki: finite(format!("pid.{joint}.ki"), entry.ki)?,
                kd: finite(format!("pid.{joint}.kd"), entry.kd)?,
                output_min: min,
                output_max: max,
                integral_limit,
            });
        }

        let mut seen = JointArray::splat(false);
        let mut oscillations = Vec::with_capacity(self.oscillation.len());
        for entry in &self.oscillation {
            let joint = entry.joint;
            if seen[joint] {
                return Err(ConfigError::DuplicateJoint {
                    section: "oscillation",
                    joint,
                });
            }
            seen[joint] = true;

            let amplitude =
                non_negative(format!("oscillation.{joint}.amplitude_deg"), entry.amplitude_deg)?;
            let osc_hz = positive(format!("oscillation.{joint}.frequency_hz"), entry.frequency_hz)?;
            if osc_hz * 2.0 > frequency_hz {
                warn!(
                    "Oscillation on {} at {} Hz is above the Nyquist limit of the {} Hz control loop",
                    joint, osc_hz, frequency_hz
                );
            }
            if pid[joint].is_none() {
                return Err(ConfigError::UncontrolledOscillation { joint });
            }

            oscillations.push(Oscillation {
                joint,
                amplitude: Deg(amplitude).to_rad(),
                frequency_hz: osc_hz,
                waveform: entry.waveform,
            });
        }

        let interval = seconds("1 / frequency_hz", 1.0 / frequency_hz)?;
        if interval.is_zero() {
            return Err(ConfigError::NonPositive {
                field: "1 / frequency_hz".to_string(),
                value: 0.0,
            });
        }

        Ok(ValidatedConfig {
            actuator_address: self.actuator_address.clone(),
            duration: seconds("duration_s", duration)?,
            frequency_hz,
            interval,
            settle: seconds("settle_s", settle)?,
            pacing: self.pacing,
            base,
            speed,
            acceleration,
            servo: ServoParams {
                speed,
                acceleration,
                time: interval,
                lookahead_time: seconds("servo.lookahead_s", lookahead)?,
                gain,
            },
            oscillations,
            pid,
            channel_capacity: self.telemetry.channel_capacity,
        })
    }
}

/// 单关节振荡（弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub joint: Joint,
    pub amplitude: Rad,
    pub frequency_hz: f64,
    pub waveform: Waveform,
}

/// PID 增益与限幅
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_min: f64,
    pub output_max: f64,
    pub integral_limit: Option<f64>,
}

/// 校验后的不可变配置
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    actuator_address: String,
    duration: Duration,
    frequency_hz: f64,
    interval: Duration,
    settle: Duration,
    pacing: Pacing,
    base: JointConfiguration,
    speed: f64,
    acceleration: f64,
    servo: ServoParams,
    oscillations: Vec<Oscillation>,
    pid: JointArray<Option<PidGains>>,
    channel_capacity: Option<usize>,
}

impl ValidatedConfig {
    pub fn actuator_address(&self) -> &str {
        &self.actuator_address
    }

    /// 跟踪阶段时长
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// 控制周期
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// 基准位形（rad）
    pub fn base(&self) -> &JointConfiguration {
        &self.base
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// 每个 tick 的伺服命令参数
    pub fn servo(&self) -> &ServoParams {
        &self.servo
    }

    pub fn oscillations(&self) -> &[Oscillation] {
        &self.oscillations
    }

    /// 各关节 PID 参数（`None` 表示不受控）
    pub fn pid(&self) -> &JointArray<Option<PidGains>> {
        &self.pid
    }

    /// 录制通道容量（`None` 表示无界）
    pub fn channel_capacity(&self) -> Option<usize> {
        self.channel_capacity
    }

    /// 不超频运行时的 tick 数：`ceil(duration / interval)`
    pub fn planned_ticks(&self) -> u64 {
        let duration = self.duration.as_nanos();
        let interval = self.interval.as_nanos().max(1);
        u64::try_from(duration.div_ceil(interval)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_setup() {
        let config = SessionConfig::default().validate().unwrap();

        assert_eq!(config.interval(), Duration::from_millis(50));
        assert_eq!(config.duration(), Duration::from_secs(10));
        assert_eq!(config.planned_ticks(), 200);
        assert_eq!(config.pacing(), Pacing::Relative);
        assert!((config.base()[Joint::J1].to_deg().0 - 261.15).abs() < 1e-9);
        assert_eq!(config.servo().gain, 300.0);
        assert_eq!(config.servo().lookahead_time, Duration::from_millis(50));
        assert_eq!(config.servo().time, config.interval());

        let controlled: Vec<Joint> =
            Joint::ALL.into_iter().filter(|j| config.pid()[*j].is_some()).collect();
        assert_eq!(controlled, vec![Joint::J1, Joint::J2, Joint::J3, Joint::J5]);
        assert_eq!(config.oscillations()[2].waveform, Waveform::Cosine);
    }

    #[test]
    fn test_planned_ticks_rounds_up() {
        let mut cfg = SessionConfig::default();
        cfg.duration_s = 0.12;
        assert_eq!(cfg.validate().unwrap().planned_ticks(), 3);

        cfg.duration_s = 2.0;
        assert_eq!(cfg.validate().unwrap().planned_ticks(), 40);
    }

    #[test]
    fn test_rejects_wrong_base_length() {
        let mut cfg = SessionConfig::default();
        cfg.base_deg.pop();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::WrongLength {
                field: "base_deg",
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut cfg = SessionConfig::default();
        cfg.frequency_hz = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));

        let mut cfg = SessionConfig::default();
        cfg.duration_s = -1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));

        let mut cfg = SessionConfig::default();
        cfg.oscillation[0].frequency_hz = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));

        let mut cfg = SessionConfig::default();
        cfg.duration_s = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn test_negative_values_reported_as_negative() {
        let mut cfg = SessionConfig::default();
        cfg.settle_s = -0.5;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Negative { ref field, value } if field == "settle_s" && value == -0.5));
        assert_eq!(err.to_string(), "settle_s must be >= 0 (got -0.5)");

        let mut cfg = SessionConfig::default();
        cfg.oscillation[1].amplitude_deg = -3.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Negative { .. })));

        // 0 是合法值
        let mut cfg = SessionConfig::default();
        cfg.settle_s = 0.0;
        cfg.oscillation[1].amplitude_deg = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_channel_capacity_defaults_to_unbounded() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.validate().unwrap().channel_capacity(), None);

        let mut bounded = cfg.clone();
        bounded.telemetry.channel_capacity = Some(64);
        assert_eq!(bounded.validate().unwrap().channel_capacity(), Some(64));

        bounded.telemetry.channel_capacity = Some(0);
        assert!(matches!(bounded.validate(), Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn test_rejects_unrepresentable_durations() {
        let mut cfg = SessionConfig::default();
        cfg.frequency_hz = 1e-300;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut cfg = SessionConfig::default();
        cfg.duration_s = 1e300;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_rejects_inconsistent_pid_entries() {
        let mut cfg = SessionConfig::default();
        cfg.pid[0].output_min = 0.1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedLimits { joint: Joint::J1, .. })
        ));

        let mut cfg = SessionConfig::default();
        cfg.pid.push(PidConfig::reference(Joint::J2));
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DuplicateJoint {
                section: "pid",
                joint: Joint::J2
            })
        ));

        let mut cfg = SessionConfig::default();
        cfg.pid.retain(|p| p.joint != Joint::J5);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UncontrolledOscillation { joint: Joint::J5 })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = SessionConfig::from_toml_str(
            r#"
            duration_s = 2.0
            pacing = "deadline"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.duration_s, 2.0);
        assert_eq!(cfg.pacing, Pacing::Deadline);
        assert_eq!(cfg.frequency_hz, 20.0);
        assert_eq!(cfg.pid.len(), 4);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let mut cfg = SessionConfig::default();
        cfg.pid[1].integral_limit = Some(0.2);
        cfg.save(&path).unwrap();

        let loaded = SessionConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.validate().unwrap().pid()[Joint::J2].unwrap().integral_limit, Some(0.2));
    }

    #[test]
    fn test_unknown_joint_rejected() {
        let err = SessionConfig::from_toml_str(
            r#"
            [[pid]]
            joint = "J9"
            kp = 1.0
            ki = 0.0
            kd = 0.0
            output_min = -1.0
            output_max = 1.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
