//! # 统计工具
//!
//! 轨迹分析（可选模块）
//!
//! 需要启用 `statistics` feature：
//! ```toml
//! sweep-tools = { workspace = true, features = ["statistics"] }
//! ```

use crate::trace::{MotionSample, PowerSample, TraceSet};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// 一维数据的描述统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// 平均值
    pub mean: f64,
    /// 样本标准差（少于 2 个样本时为 0）
    pub std_dev: f64,
    /// 最小值
    pub min: f64,
    /// 最大值
    pub max: f64,
    /// 均方根
    pub rms: f64,
    /// 样本数量
    pub count: usize,
}

impl Summary {
    /// 空数据的统计结果
    pub const EMPTY: Summary = Summary {
        mean: 0.0,
        std_dev: 0.0,
        min: 0.0,
        max: 0.0,
        rms: 0.0,
        count: 0,
    };

    /// 计算描述统计
    pub fn calculate(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }

        let std_dev = if values.len() < 2 { 0.0 } else { values.std_dev() };

        Self {
            mean: values.mean(),
            std_dev,
            min: values.min(),
            max: values.max(),
            rms: values.quadratic_mean(),
            count: values.len(),
        }
    }

    /// 极差
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// 控制周期统计
///
/// 基于相邻样本时间戳之差，用于评估节拍抖动和超时。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickStatistics {
    /// 相邻样本间隔（秒）
    pub interval: Summary,

    /// 实际频率（Hz）
    pub effective_hz: f64,

    /// 间隔超过标称周期 1.5 倍的次数
    pub late_ticks: usize,
}

impl TickStatistics {
    /// 计算周期统计
    ///
    /// - `timestamps`: 样本时间戳（秒）
    /// - `nominal_hz`: 标称控制频率
    pub fn calculate(timestamps: &[f64], nominal_hz: f64) -> Self {
        let intervals: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        let interval = Summary::calculate(&intervals);

        let effective_hz = if interval.mean > 0.0 { 1.0 / interval.mean } else { 0.0 };

        let late_ticks = if nominal_hz > 0.0 {
            let threshold = 1.5 / nominal_hz;
            intervals.iter().filter(|&&dt| dt > threshold).count()
        } else {
            0
        };

        Self {
            interval,
            effective_hz,
            late_ticks,
        }
    }
}

/// 整个轨迹集合的统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStatistics {
    /// 周期统计
    pub ticks: TickStatistics,

    /// 各关节位置统计（rad）
    pub joint_positions: [Summary; 6],

    /// 各关节速度统计（rad/s）
    pub joint_velocities: [Summary; 6],

    /// 各关节电流统计（A）
    pub joint_currents: [Summary; 6],
}

impl TraceStatistics {
    /// 计算轨迹统计
    pub fn calculate(set: &TraceSet) -> Self {
        let timestamps: Vec<f64> = set.motion.iter().map(|s| s.timestamp).collect();

        Self {
            ticks: TickStatistics::calculate(&timestamps, set.metadata.tick_frequency_hz),
            joint_positions: per_joint(&set.motion, |s| s.joint_positions),
            joint_velocities: per_joint(&set.motion, |s| s.joint_velocities),
            joint_currents: per_joint_power(&set.power),
        }
    }
}

fn per_joint<F>(samples: &[MotionSample], field: F) -> [Summary; 6]
where
    F: Fn(&MotionSample) -> [f64; 6],
{
    std::array::from_fn(|j| {
        let column: Vec<f64> = samples.iter().map(|s| field(s)[j]).collect();
        Summary::calculate(&column)
    })
}

fn per_joint_power(samples: &[PowerSample]) -> [Summary; 6] {
    std::array::from_fn(|j| {
        let column: Vec<f64> = samples.iter().map(|s| s.joint_currents[j]).collect();
        Summary::calculate(&column)
    })
}
