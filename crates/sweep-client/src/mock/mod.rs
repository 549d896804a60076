//! 测试替身（需要 `mock` feature）
//!
//! - [`ManualClock`]：手动推进的时钟，`sleep_until` 直接把时间拨到目标时刻；
//! - [`MockArm`]：返回固定状态的机械臂桩，记录所有命令，可注入失败和调用延迟。

use crate::clock::Clock;
use crate::error::RobotError;
use crate::port::{ActuatorPort, ArmState, ServoParams};
use crate::types::JointConfiguration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// 手动推进的时钟
///
/// 克隆共享同一时间线。
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// 自起点以来经过的时间
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 向前推进
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep_until(&self, deadline: Instant) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        let target = deadline.saturating_duration_since(self.origin);
        if target > *offset {
            *offset = target;
        }
    }
}

/// 注入的失败点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// 第 n 次（从 0 计）`move_to_absolute`
    Move(usize),
    /// 第 n 次 `read_state`
    Read(usize),
    /// 第 n 次 `command_servo`
    Command(usize),
    /// 每次 `stop`
    Stop,
}

/// 可编程机械臂桩
#[derive(Debug, Default)]
pub struct MockArm {
    /// `read_state` 返回的状态
    pub state: ArmState,
    /// `move_to_absolute` 收到的目标（含速度、加速度）
    pub moves: Vec<(JointConfiguration, f64, f64)>,
    /// `command_servo` 收到的目标
    pub commands: Vec<JointConfiguration>,
    /// `command_servo` 收到的参数
    pub servo_params: Vec<ServoParams>,
    /// `read_state` 调用次数
    pub reads: usize,
    /// `stop` 调用次数
    pub stops: usize,
    failures: Vec<FailurePoint>,
    latency: Option<(ManualClock, Duration)>,
    trip: Option<(usize, Arc<AtomicBool>)>,
}

impl MockArm {
    /// 固定返回给定状态
    pub fn new(state: ArmState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// 在指定调用处返回 `HardwareFailure`
    pub fn fail_at(mut self, point: FailurePoint) -> Self {
        self.failures.push(point);
        self
    }

    /// 每次 `read_state` / `command_servo` 让手动时钟前进 `latency`
    pub fn with_latency(mut self, clock: ManualClock, latency: Duration) -> Self {
        self.latency = Some((clock, latency));
        self
    }

    /// 第 `after` 次伺服命令之后置位中断标志
    pub fn trip_after(mut self, after: usize, flag: Arc<AtomicBool>) -> Self {
        self.trip = Some((after, flag));
        self
    }

    fn check(&self, point: FailurePoint) -> Result<(), RobotError> {
        if self.failures.contains(&point) {
            return Err(RobotError::hardware_failure(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn spend_latency(&self) {
        if let Some((clock, latency)) = &self.latency {
            clock.advance(*latency);
        }
    }
}

impl ActuatorPort for MockArm {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn move_to_absolute(
        &mut self,
        target: &JointConfiguration,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        self.check(FailurePoint::Move(self.moves.len()))?;
        self.moves.push((*target, speed, acceleration));
        Ok(())
    }

    fn read_state(&mut self) -> Result<ArmState, RobotError> {
        let n = self.reads;
        self.reads += 1;
        self.spend_latency();
        self.check(FailurePoint::Read(n))?;
        Ok(self.state)
    }

    fn command_servo(
        &mut self,
        target: &JointConfiguration,
        params: &ServoParams,
    ) -> Result<(), RobotError> {
        self.spend_latency();
        self.check(FailurePoint::Command(self.commands.len()))?;
        self.commands.push(*target);
        self.servo_params.push(*params);

        if let Some((after, flag)) = &self.trip
            && self.commands.len() >= *after
        {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RobotError> {
        self.stops += 1;
        self.check(FailurePoint::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointArray, Rad};

    #[test]
    fn test_manual_clock_sleep_until() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep_until(start + Duration::from_millis(50));
        assert_eq!(clock.elapsed(), Duration::from_millis(50));

        // 过去的时刻不回拨
        clock.sleep_until(start + Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(50));

        let shared = clock.clone();
        shared.advance(Duration::from_millis(5));
        assert_eq!(clock.now() - start, Duration::from_millis(55));
    }

    #[test]
    fn test_mock_arm_records_and_fails() {
        let mut arm = MockArm::new(ArmState::default()).fail_at(FailurePoint::Read(1));
        let target = JointArray::splat(Rad(0.1));

        arm.move_to_absolute(&target, 0.3, 0.8).unwrap();
        assert!(arm.read_state().is_ok());
        assert!(arm.read_state().unwrap_err().is_fatal());
        assert_eq!(arm.reads, 2);
        assert_eq!(arm.moves, vec![(target, 0.3, 0.8)]);
    }

    #[test]
    fn test_mock_arm_latency_advances_clock() {
        let clock = ManualClock::new();
        let mut arm = MockArm::new(ArmState::default())
            .with_latency(clock.clone(), Duration::from_millis(7));

        arm.read_state().unwrap();
        assert_eq!(clock.elapsed(), Duration::from_millis(7));
    }
}
