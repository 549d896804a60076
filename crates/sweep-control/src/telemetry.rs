//! 录制（Telemetry）
//!
//! 每个 tick 产生一条 [`TelemetryRecord`]（运动 / 电流 / 末端位姿三类样本），
//! 按值交给 [`TelemetrySink`]。
//!
//! # 设计原则
//!
//! - **默认无界**: 每个 tick 的样本都会到达录制线程，样本数与 tick 数一致
//! - **可选有界**: 指定容量后内存有上限，但队列满时丢弃样本（控制线程不阻塞）
//! - **丢样监控**: [`TelemetrySink::dropped`] 报告丢弃的样本数
//!
//! # 使用示例
//!
//! ```rust
//! use sweep_control::telemetry::{TelemetryRecorder, TelemetrySink, TelemetryRecord};
//! use sweep_client::ArmState;
//! use sweep_tools::TraceMetadata;
//!
//! let mut recorder = TelemetryRecorder::spawn(TraceMetadata::new("sim", 20.0), None).unwrap();
//! recorder.append(TelemetryRecord::from_state(0.0, &ArmState::default()));
//!
//! let traces = recorder.finish().unwrap();
//! assert_eq!(traces.len(), 1);
//! ```

use crossbeam_channel::{Sender, TrySendError, bounded, unbounded};
use std::thread::JoinHandle;
use sweep_client::ArmState;
use sweep_tools::{MotionSample, PowerSample, TcpSample, TraceMetadata, TraceSet};
use thiserror::Error;
use tracing::{debug, warn};

/// 录制错误
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// 无法启动录制线程
    #[error("failed to spawn telemetry writer thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 录制线程异常退出
    #[error("telemetry writer thread panicked")]
    WriterPanicked,
}

/// 一个 tick 的三类样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub motion: MotionSample,
    pub power: PowerSample,
    pub tcp: TcpSample,
}

impl TelemetryRecord {
    /// 从一次状态读数构建（`timestamp` 为自跟踪开始的秒数）
    pub fn from_state(timestamp: f64, state: &ArmState) -> Self {
        let pose = state.tcp_pose.to_array();
        Self {
            motion: MotionSample {
                timestamp,
                joint_positions: state.joint_positions.to_radians(),
                joint_velocities: state.joint_velocities.map(|v| v.0).into(),
                tcp_pose: pose,
            },
            power: PowerSample {
                timestamp,
                joint_currents: state.joint_currents.map(|c| c.0).into(),
            },
            tcp: TcpSample {
                timestamp,
                tcp_pose: pose,
            },
        }
    }
}

/// 录制接收端
///
/// `append` 在控制线程中调用，不得阻塞。
pub trait TelemetrySink {
    /// 追加一个 tick 的样本
    fn append(&mut self, record: TelemetryRecord);

    /// 因队列满而丢弃的样本数
    fn dropped(&self) -> u64 {
        0
    }
}

impl TelemetrySink for TraceSet {
    fn append(&mut self, record: TelemetryRecord) {
        self.push_tick(record.motion, record.power, record.tcp);
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn append(&mut self, record: TelemetryRecord) {
        (**self).append(record)
    }

    fn dropped(&self) -> u64 {
        (**self).dropped()
    }
}

/// 后台录制器
///
/// 控制线程通过通道把样本交给录制线程（默认无界，见 [`spawn`](Self::spawn)）；录制线程累积到 [`TraceSet`]，
/// [`finish`](Self::finish) 时返回。
pub struct TelemetryRecorder {
    tx: Option<Sender<TelemetryRecord>>,
    dropped_samples: u64,
    appended: u64,
    handle: Option<JoinHandle<TraceSet>>,
}

impl TelemetryRecorder {
    /// 启动录制线程
    ///
    /// - `capacity`: `None` 为无界通道（不丢样）；`Some(n)` 为有界通道，
    ///   队列满时丢弃样本并计数
    pub fn spawn(metadata: TraceMetadata, capacity: Option<usize>) -> Result<Self, TelemetryError> {
        let (tx, rx) = match capacity {
            Some(n) => bounded::<TelemetryRecord>(n.max(1)),
            None => unbounded(),
        };

        let handle = std::thread::Builder::new().name("sweep-telemetry".into()).spawn(
            move || {
                let mut traces = TraceSet::new(metadata);
                while let Ok(record) = rx.recv() {
                    traces.append(record);
                }
                debug!("Telemetry writer drained {} ticks", traces.len());
                traces
            },
        )?;

        Ok(Self {
            tx: Some(tx),
            dropped_samples: 0,
            appended: 0,
            handle: Some(handle),
        })
    }

    /// 成功交付的样本数
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// 关闭通道并等待录制线程结束
    pub fn finish(mut self) -> Result<TraceSet, TelemetryError> {
        drop(self.tx.take());
        if self.dropped_samples > 0 {
            warn!("Telemetry dropped {} samples (channel full)", self.dropped_samples);
        }
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| TelemetryError::WriterPanicked),
            None => Err(TelemetryError::WriterPanicked),
        }
    }
}

impl TelemetrySink for TelemetryRecorder {
    fn append(&mut self, record: TelemetryRecord) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(record) {
            Ok(()) => self.appended += 1,
            Err(TrySendError::Full(_)) => {
                self.dropped_samples += 1;
                if self.dropped_samples == 1 {
                    warn!("Telemetry channel full, dropping samples");
                }
            },
            Err(TrySendError::Disconnected(_)) => {
                self.dropped_samples += 1;
            },
        }
    }

    fn dropped(&self) -> u64 {
        self.dropped_samples
    }
}

impl Drop for TelemetryRecorder {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_client::{Ampere, CartesianPose, Joint, JointArray, Rad, RadPerSecond};

    fn state(q: f64) -> ArmState {
        ArmState {
            joint_positions: JointArray::splat(Rad(q)),
            joint_velocities: JointArray::splat(RadPerSecond(0.1)),
            joint_currents: JointArray::new([0.1, 0.2, 0.3, 0.4, 0.5, 0.6].map(Ampere)),
            tcp_pose: CartesianPose::from_array([0.4, -0.1, 0.3, 0.0, 2.5, 0.0]),
        }
    }

    #[test]
    fn test_record_layout() {
        let record = TelemetryRecord::from_state(0.25, &state(1.0));
        assert_eq!(record.motion.timestamp, 0.25);
        assert_eq!(record.motion.joint_positions, [1.0; 6]);
        assert_eq!(record.power.joint_currents[Joint::J4.index()], 0.4);
        assert_eq!(record.tcp.tcp_pose, record.motion.tcp_pose);
        assert_eq!(record.tcp.tcp_pose[4], 2.5);
    }

    #[test]
    fn test_trace_set_sink() {
        let mut traces = TraceSet::new(TraceMetadata::new("sim", 20.0));
        traces.append(TelemetryRecord::from_state(0.0, &state(0.0)));
        traces.append(TelemetryRecord::from_state(0.05, &state(0.1)));

        assert_eq!(traces.len(), 2);
        assert_eq!(traces.power.len(), 2);
        assert_eq!(traces.tcp[1].timestamp, 0.05);
        assert_eq!(TelemetrySink::dropped(&traces), 0);
    }

    #[test]
    fn test_recorder_preserves_order() {
        let mut recorder = TelemetryRecorder::spawn(TraceMetadata::new("sim", 20.0), Some(16)).unwrap();
        for i in 0..10 {
            let t = i as f64 * 0.05;
            recorder.append(TelemetryRecord::from_state(t, &state(t)));
        }
        assert_eq!(recorder.appended(), 10);

        let traces = recorder.finish().unwrap();
        assert_eq!(traces.len(), 10);
        assert!(traces.motion.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_unbounded_recorder_keeps_every_sample() {
        let mut recorder = TelemetryRecorder::spawn(TraceMetadata::new("sim", 20.0), None).unwrap();
        for i in 0..10_000 {
            recorder.append(TelemetryRecord::from_state(i as f64 * 0.05, &state(0.0)));
        }
        assert_eq!(recorder.dropped(), 0);
        assert_eq!(recorder.appended(), 10_000);

        let traces = recorder.finish().unwrap();
        assert_eq!(traces.len(), 10_000);
        assert_eq!(traces.power.len(), 10_000);
        assert_eq!(traces.tcp.len(), 10_000);
    }
}
