//! 单个 tick 的控制逻辑
//!
//! [`ControlLoop::tick`] 严格按顺序执行：
//!
//! 1. 读取机械臂状态（位置、速度、电流、末端位姿）
//! 2. `target = TrajectoryGenerator::evaluate(t)`
//! 3. 受控关节：`error = current − target`，`command = target − pid.correct(error)`
//! 4. 不受控关节：`command = base`
//! 5. 发送伺服命令
//! 6. 追加录制样本
//!
//! 节拍、阶段切换和失败处理由 [`Session`](crate::session::Session) 负责。

use crate::config::ValidatedConfig;
use crate::pid::PidBank;
use crate::telemetry::{TelemetryRecord, TelemetrySink};
use crate::trajectory::TrajectoryGenerator;
use std::time::Duration;
use sweep_client::{
    ActuatorPort, ArmState, Clock, Joint, JointArray, JointConfiguration, Rad, RobotError,
    ServoParams,
};
use tracing::trace;

/// 一个 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSample {
    /// 自跟踪开始的秒数
    pub timestamp: f64,
    /// 本 tick 读到的状态
    pub state: ArmState,
    /// 轨迹目标
    pub target: JointConfiguration,
    /// PID 修正量（不受控关节为 0）
    pub correction: JointArray<f64>,
    /// 实际发送的命令
    pub command: JointConfiguration,
}

/// 每 tick 的控制逻辑
#[derive(Debug, Clone)]
pub struct ControlLoop {
    generator: TrajectoryGenerator,
    pids: PidBank,
    servo: ServoParams,
    /// 单次端口调用允许的最长耗时
    call_limit: Duration,
}

impl ControlLoop {
    /// 从校验后的配置创建
    pub fn new(config: &ValidatedConfig) -> Self {
        Self::from_parts(TrajectoryGenerator::new(config), PidBank::new(config), *config.servo())
    }

    /// 直接指定各组成部分（调用耗时上限取 `servo.time`）
    pub fn from_parts(generator: TrajectoryGenerator, pids: PidBank, servo: ServoParams) -> Self {
        Self {
            generator,
            pids,
            servo,
            call_limit: servo.time,
        }
    }

    /// 轨迹生成器
    pub fn generator(&self) -> &TrajectoryGenerator {
        &self.generator
    }

    /// PID 集合
    pub fn pids(&self) -> &PidBank {
        &self.pids
    }

    /// 由状态和目标计算命令
    ///
    /// 每个受控关节的 PID 恰好更新一次。
    pub fn compose(
        &mut self,
        current: &JointConfiguration,
        target: &JointConfiguration,
    ) -> (JointConfiguration, JointArray<f64>) {
        let base = *self.generator.base();
        let mut command = base;
        let mut correction = JointArray::splat(0.0);

        for joint in Joint::ALL {
            let error = (current[joint] - target[joint]).0;
            if let Some(output) = self.pids.correct(joint, error) {
                correction[joint] = output;
                command[joint] = target[joint] - Rad(output);
            }
        }

        (command, correction)
    }

    /// 执行一个 tick
    ///
    /// `elapsed` 为 tick 开始时刻距跟踪开始的时间。端口错误原样返回；
    /// 单次端口调用超过一个控制周期返回 [`RobotError::Timeout`]。
    pub fn tick<P, C, S>(
        &mut self,
        port: &mut P,
        clock: &C,
        sink: &mut S,
        elapsed: Duration,
    ) -> Result<TickSample, RobotError>
    where
        P: ActuatorPort + ?Sized,
        C: Clock + ?Sized,
        S: TelemetrySink + ?Sized,
    {
        let t = elapsed.as_secs_f64();

        let state = self.timed(clock, "read_state", || port.read_state())?;
        state.check_finite()?;

        let target = self.generator.evaluate(t);
        let (command, correction) = self.compose(&state.joint_positions, &target);

        let servo = self.servo;
        self.timed(clock, "command_servo", || port.command_servo(&command, &servo))?;

        trace!("t={:.3}s target={:?} command={:?}", t, target.to_radians(), command.to_radians());

        sink.append(TelemetryRecord::from_state(t, &state));

        Ok(TickSample {
            timestamp: t,
            state,
            target,
            correction,
            command,
        })
    }

    fn timed<C, T, F>(&self, clock: &C, operation: &'static str, call: F) -> Result<T, RobotError>
    where
        C: Clock + ?Sized,
        F: FnOnce() -> Result<T, RobotError>,
    {
        let started = clock.now();
        let result = call()?;
        let took = clock.now().saturating_duration_since(started);
        if took > self.call_limit {
            return Err(RobotError::timeout(
                operation,
                took.as_millis() as u64,
                self.call_limit.as_millis() as u64,
            ));
        }
        Ok(result)
    }
}
