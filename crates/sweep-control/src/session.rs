//! Type State Machine - 会话阶段
//!
//! 使用状态标记类型在编译期约束阶段顺序：
//!
//! ```text
//! Session<Homing> --home()--> Session<Tracking> --track()--> Session<Returning> --finish()--> SessionReport
//! ```
//!
//! - **Homing**: 阻塞移动到基准位形，然后等待稳定时间
//! - **Tracking**: 固定频率执行 [`ControlLoop::tick`]，直到经过会话时长或收到中断
//! - **Returning**（终止）: 回到基准位形并停止控制脚本
//!
//! 任何阶段的端口错误都是致命的：不重试，尽力回到基准并停止，然后返回错误。
//!
//! # 示例
//!
//! ```rust
//! use sweep_client::{MonotonicClock, SimulatedArm};
//! use sweep_control::{Session, SessionConfig};
//! use sweep_tools::{TraceMetadata, TraceSet};
//!
//! let mut cfg = SessionConfig::default();
//! cfg.duration_s = 0.1;
//! cfg.settle_s = 0.0;
//! let config = cfg.validate().unwrap();
//!
//! let arm = SimulatedArm::new(*config.base());
//! let mut traces = TraceSet::new(TraceMetadata::new("sim", config.frequency_hz()));
//!
//! let report = Session::new(arm, MonotonicClock::new(), config)
//!     .home()?
//!     .track(&mut traces)?
//!     .finish()?;
//! assert_eq!(report.ticks, traces.len() as u64);
//! # Ok::<(), sweep_control::SessionError>(())
//! ```

use crate::config::{Pacing, ValidatedConfig};
use crate::control_loop::ControlLoop;
use crate::telemetry::{TelemetryError, TelemetrySink};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use sweep_client::{ActuatorPort, Clock, Joint, JointArray, RobotError};
use thiserror::Error;
use tracing::{error, info, warn};

// ==================== 状态类型（零大小类型）====================

/// 回零阶段
pub struct Homing;

/// 跟踪阶段
pub struct Tracking;

/// 返回阶段（终止）
pub struct Returning;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Homing,
    Tracking,
    Returning,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Homing => "Homing",
            Phase::Tracking => "Tracking",
            Phase::Returning => "Returning",
        };
        f.write_str(name)
    }
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 回零失败
    #[error("homing failed: {0}")]
    Homing(#[source] RobotError),

    /// 跟踪中端口失败
    #[error("tracking aborted after {ticks} ticks: {source}")]
    Tracking {
        #[source]
        source: RobotError,
        /// 失败前完成的 tick 数
        ticks: u64,
    },

    /// 返回基准或停止失败
    #[error("returning failed: {0}")]
    Returning(#[source] RobotError),

    /// 录制失败
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl SessionError {
    /// 失败发生的阶段（录制错误不属于任何阶段）
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SessionError::Homing(_) => Some(Phase::Homing),
            SessionError::Tracking { .. } => Some(Phase::Tracking),
            SessionError::Returning(_) => Some(Phase::Returning),
            SessionError::Telemetry(_) => None,
        }
    }

    /// 底层端口错误
    pub fn robot_error(&self) -> Option<&RobotError> {
        match self {
            SessionError::Homing(e) | SessionError::Returning(e) => Some(e),
            SessionError::Tracking { source, .. } => Some(source),
            SessionError::Telemetry(_) => None,
        }
    }
}

/// 跟踪阶段统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingStats {
    /// 完成的 tick 数
    pub ticks: u64,
    /// 超过控制周期的 tick 数
    pub overruns: u64,
    /// 最长单 tick 耗时
    pub max_tick: Duration,
    /// 跟踪阶段实际时长
    pub elapsed: Duration,
    /// 是否因中断提前结束
    pub interrupted: bool,
}

/// 会话报告
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// 完成的 tick 数（等于每类样本的数量）
    pub ticks: u64,
    /// 不超频时应有的 tick 数
    pub planned_ticks: u64,
    /// 超过控制周期的 tick 数
    pub overruns: u64,
    /// 最长单 tick 耗时
    pub max_tick: Duration,
    /// 因录制队列满而丢弃的样本数
    pub dropped_samples: u64,
    /// 各关节 PID 限幅次数
    pub saturation: JointArray<u64>,
    /// 跟踪阶段时长
    pub elapsed: Duration,
    /// 是否因中断提前结束
    pub interrupted: bool,
}

/// 会话
///
/// `State` 为阶段标记类型（[`Homing`]、[`Tracking`]、[`Returning`]）。
pub struct Session<P, C, State = Homing> {
    port: P,
    clock: C,
    config: ValidatedConfig,
    control: ControlLoop,
    interrupt: Arc<AtomicBool>,
    stats: TrackingStats,
    dropped_samples: u64,
    _state: PhantomData<State>,
}

impl<P, C, State> Session<P, C, State> {
    fn transition<Next>(self) -> Session<P, C, Next> {
        Session {
            port: self.port,
            clock: self.clock,
            config: self.config,
            control: self.control,
            interrupt: self.interrupt,
            stats: self.stats,
            dropped_samples: self.dropped_samples,
            _state: PhantomData,
        }
    }

    /// 会话配置
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// 机械臂端口
    pub fn port(&self) -> &P {
        &self.port
    }

    /// 中断标志（置位后在下一个 tick 边界进入返回阶段）
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }
}

impl<P: ActuatorPort, C: Clock, State> Session<P, C, State> {
    /// 尽力回到基准并停止（失败只记录日志）
    fn safe_stop(&mut self) {
        let base = *self.config.base();
        if let Err(e) =
            self.port.move_to_absolute(&base, self.config.speed(), self.config.acceleration())
        {
            error!("Safe stop: return to base failed: {}", e);
        }
        if let Err(e) = self.port.stop() {
            error!("Safe stop: stop failed: {}", e);
        }
    }
}

impl<P: ActuatorPort, C: Clock> Session<P, C, Homing> {
    /// 创建会话
    pub fn new(port: P, clock: C, config: ValidatedConfig) -> Self {
        let control = ControlLoop::new(&config);
        Session {
            port,
            clock,
            config,
            control,
            interrupt: Arc::new(AtomicBool::new(false)),
            stats: TrackingStats::default(),
            dropped_samples: 0,
            _state: PhantomData,
        }
    }

    /// 使用外部中断标志（例如 Ctrl-C 处理器持有的标志）
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// 回零：移动到基准位形并等待稳定
    pub fn home(mut self) -> Result<Session<P, C, Tracking>, SessionError> {
        let base = *self.config.base();
        info!(
            "Homing: moving {} to base {:?} rad",
            self.port.describe(),
            base.to_radians()
        );

        if let Err(e) =
            self.port.move_to_absolute(&base, self.config.speed(), self.config.acceleration())
        {
            error!("Homing failed: {}", e);
            if let Err(stop_err) = self.port.stop() {
                error!("Stop after homing failure also failed: {}", stop_err);
            }
            return Err(SessionError::Homing(e));
        }

        let settle = self.config.settle();
        if !settle.is_zero() {
            self.clock.sleep_until(self.clock.now() + settle);
        }
        info!("Homing complete, settled for {:?}", settle);

        Ok(self.transition())
    }
}

impl<P: ActuatorPort, C: Clock> Session<P, C, Tracking> {
    /// 跟踪：固定频率执行控制循环
    ///
    /// 以 `elapsed < duration` 为循环条件；中断只在 tick 边界生效。
    /// 端口失败时尽力回到基准并停止，然后返回 [`SessionError::Tracking`]。
    pub fn track<S>(mut self, sink: &mut S) -> Result<Session<P, C, Returning>, SessionError>
    where
        S: TelemetrySink + ?Sized,
    {
        raise_thread_priority();

        let duration = self.config.duration();
        let interval = self.config.interval();
        let pacing = self.config.pacing();
        info!(
            "Tracking: {:?} at {} Hz ({} ticks planned, {:?} pacing)",
            duration,
            self.config.frequency_hz(),
            self.config.planned_ticks(),
            pacing
        );

        let start = self.clock.now();
        let mut stats = TrackingStats::default();

        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                info!("Interrupt received after {} ticks", stats.ticks);
                stats.interrupted = true;
                break;
            }

            let tick_start = self.clock.now();
            let elapsed = tick_start.saturating_duration_since(start);
            if elapsed >= duration {
                break;
            }

            if let Err(source) =
                self.control.tick(&mut self.port, &self.clock, &mut *sink, elapsed)
            {
                error!("Tracking aborted at t={:.3}s: {}", elapsed.as_secs_f64(), source);
                self.safe_stop();
                return Err(SessionError::Tracking {
                    source,
                    ticks: stats.ticks,
                });
            }
            stats.ticks += 1;

            let deadline = next_deadline(pacing, start, tick_start, interval);
            let now = self.clock.now();
            let took = now.saturating_duration_since(tick_start);
            stats.max_tick = stats.max_tick.max(took);

            if now > deadline {
                stats.overruns += 1;
                if stats.overruns == 1 {
                    warn!(
                        "Control loop overrun: tick took {:?} (interval {:?}), starting next tick immediately",
                        took, interval
                    );
                }
            } else {
                self.clock.sleep_until(deadline);
            }
        }

        stats.elapsed = self.clock.now().saturating_duration_since(start);
        self.stats = stats;
        self.dropped_samples = sink.dropped();

        let saturation = self.control.pids().saturation_counts();
        for joint in Joint::ALL {
            if self.control.pids().is_controlled(joint) {
                info!("PID {} saturated on {} of {} ticks", joint, saturation[joint], stats.ticks);
            }
        }
        if stats.overruns > 0 {
            warn!("{} of {} ticks overran the {:?} interval", stats.overruns, stats.ticks, interval);
        }

        Ok(self.transition())
    }
}

impl<P: ActuatorPort, C: Clock> Session<P, C, Returning> {
    /// 跟踪阶段统计
    pub fn stats(&self) -> &TrackingStats {
        &self.stats
    }

    /// 返回基准位形并停止控制脚本
    pub fn finish(mut self) -> Result<SessionReport, SessionError> {
        info!("Returning to base");
        let base = *self.config.base();

        let moved =
            self.port.move_to_absolute(&base, self.config.speed(), self.config.acceleration());
        let stopped = self.port.stop();
        moved.map_err(SessionError::Returning)?;
        stopped.map_err(SessionError::Returning)?;

        let report = SessionReport {
            ticks: self.stats.ticks,
            planned_ticks: self.config.planned_ticks(),
            overruns: self.stats.overruns,
            max_tick: self.stats.max_tick,
            dropped_samples: self.dropped_samples,
            saturation: self.control.pids().saturation_counts(),
            elapsed: self.stats.elapsed,
            interrupted: self.stats.interrupted,
        };
        info!(
            "Session finished: {} ticks in {:?} ({} overruns, {} dropped samples)",
            report.ticks, report.elapsed, report.overruns, report.dropped_samples
        );
        Ok(report)
    }
}

/// 计算本 tick 的休眠截止时刻
///
/// - `Relative`: tick 开始 + 周期
/// - `Deadline`: 严格晚于 tick 开始的第一个网格点 `start + k·interval`，
///   错过的网格点直接跳过，不连发补偿
fn next_deadline(pacing: Pacing, start: Instant, tick_start: Instant, interval: Duration) -> Instant {
    match pacing {
        Pacing::Relative => tick_start + interval,
        Pacing::Deadline => {
            let since = tick_start.saturating_duration_since(start).as_nanos();
            let step = interval.as_nanos().max(1);
            let k = since / step + 1;
            let offset = step.saturating_mul(k);
            start + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
        },
    }
}

/// 提升控制线程优先级（`realtime` feature）
#[cfg(feature = "realtime")]
fn raise_thread_priority() {
    use thread_priority::*;

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(_) => {
            info!("Control thread priority set to MAX (realtime)");
        },
        Err(e) => {
            warn!(
                "Failed to set control thread priority: {:?}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                e
            );
        },
    }
}

#[cfg(not(feature = "realtime"))]
fn raise_thread_priority() {}

/// 完整运行一次会话：回零、跟踪、返回
pub fn run_session<P, C, S>(
    port: P,
    clock: C,
    config: ValidatedConfig,
    sink: &mut S,
    interrupt: Arc<AtomicBool>,
) -> Result<SessionReport, SessionError>
where
    P: ActuatorPort,
    C: Clock,
    S: TelemetrySink + ?Sized,
{
    Session::new(port, clock, config)
        .with_interrupt(interrupt)
        .home()?
        .track(sink)?
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_deadline() {
        let start = Instant::now();
        let tick_start = start + Duration::from_millis(73);
        let interval = Duration::from_millis(50);

        assert_eq!(
            next_deadline(Pacing::Relative, start, tick_start, interval),
            tick_start + interval
        );
    }

    #[test]
    fn test_fixed_grid_deadline_skips_missed_slots() {
        let start = Instant::now();
        let interval = Duration::from_millis(50);

        assert_eq!(
            next_deadline(Pacing::Deadline, start, start, interval),
            start + Duration::from_millis(50)
        );
        // 73ms 开始的 tick 截止在 100ms 网格点
        assert_eq!(
            next_deadline(Pacing::Deadline, start, start + Duration::from_millis(73), interval),
            start + Duration::from_millis(100)
        );
        // 正好落在网格点上时取下一个网格点
        assert_eq!(
            next_deadline(Pacing::Deadline, start, start + Duration::from_millis(150), interval),
            start + Duration::from_millis(200)
        );
    }

    #[test]
    fn test_error_phase() {
        let err = SessionError::Tracking {
            source: RobotError::hardware_failure("link down"),
            ticks: 3,
        };
        assert_eq!(err.phase(), Some(Phase::Tracking));
        assert!(err.robot_error().unwrap().is_fatal());
        assert_eq!(err.to_string(), "tracking aborted after 3 ticks: Hardware communication failed: link down");
        assert_eq!(Phase::Returning.to_string(), "Returning");
    }
}
