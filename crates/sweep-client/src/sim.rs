//! 进程内机械臂模拟器
//!
//! [`SimulatedArm`] 实现 [`ActuatorPort`]，让会话在没有硬件的情况下完整运行：
//!
//! - 关节对伺服命令做一阶响应（时间常数 `tau`），速度受命令的速度上限约束；
//! - 电流由加速度和速度线性合成，J2/J3 额外叠加重力项；
//! - 末端位姿由简化的 6 轴几何（肩-肘-腕平面链）计算。
//!
//! 模拟器不依赖真实时间：每条伺服命令推进 `ServoParams::time`。

use crate::error::RobotError;
use crate::port::{ActuatorPort, ArmState, ServoParams};
use crate::types::{
    Ampere, CartesianPose, Joint, JointArray, JointConfiguration, Position3D, Rad, RadPerSecond,
    RotationVector,
};
use tracing::{debug, trace};

/// 基座高度（米）
const BASE_HEIGHT: f64 = 0.1625;
/// 上臂长度（米）
const UPPER_ARM: f64 = 0.425;
/// 前臂长度（米）
const FOREARM: f64 = 0.3922;
/// 腕部偏置（米）
const WRIST_OFFSET: f64 = 0.1333;
/// 末端法兰长度（米）
const FLANGE: f64 = 0.0996;

/// 电流合成系数
const CURRENT_PER_ACCEL: f64 = 0.35;
const CURRENT_PER_VELOCITY: f64 = 0.8;
const GRAVITY_CURRENT: [f64; 6] = [0.0, 2.4, 1.1, 0.0, 0.0, 0.0];

/// 进程内模拟机械臂
#[derive(Debug, Clone)]
pub struct SimulatedArm {
    positions: JointConfiguration,
    velocities: JointArray<RadPerSecond>,
    currents: JointArray<Ampere>,
    /// 一阶响应时间常数（秒）
    tau: f64,
    stopped: bool,
    commands: u64,
}

impl SimulatedArm {
    /// 默认时间常数（秒）
    pub const DEFAULT_TAU: f64 = 0.03;

    /// 从给定位形开始
    pub fn new(initial: JointConfiguration) -> Self {
        Self {
            positions: initial,
            velocities: JointArray::splat(RadPerSecond::ZERO),
            currents: JointArray::new(GRAVITY_CURRENT.map(Ampere)),
            tau: Self::DEFAULT_TAU,
            stopped: false,
            commands: 0,
        }
    }

    /// 设置一阶响应时间常数（秒，`<= 0` 表示立即到达）
    pub fn with_time_constant(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// 已执行的伺服命令数
    pub fn command_count(&self) -> u64 {
        self.commands
    }

    /// 是否已停止
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// 当前末端位姿
    pub fn tcp_pose(&self) -> CartesianPose {
        forward_kinematics(&self.positions)
    }

    fn ensure_running(&self, operation: &str) -> Result<(), RobotError> {
        if self.stopped {
            return Err(RobotError::CommandRejected(format!(
                "{operation} after stop: control script is not running"
            )));
        }
        Ok(())
    }
}

/// 简化正运动学
///
/// J1 绕竖直轴旋转，J2/J3/J4 在竖直平面内串联，J5/J6 只影响姿态。
pub fn forward_kinematics(q: &JointConfiguration) -> CartesianPose {
    let [q1, q2, q3, q4, q5, q6] = q.to_radians();

    let shoulder = q2;
    let elbow = q2 + q3;
    let wrist = q2 + q3 + q4;

    let reach = UPPER_ARM * shoulder.cos() + FOREARM * elbow.cos() + FLANGE * wrist.sin();
    let height =
        BASE_HEIGHT - UPPER_ARM * shoulder.sin() - FOREARM * elbow.sin() - FLANGE * wrist.cos();

    let (s1, c1) = q1.sin_cos();
    let position = Position3D::new(
        reach * c1 + WRIST_OFFSET * s1,
        reach * s1 - WRIST_OFFSET * c1,
        height,
    );

    CartesianPose {
        position,
        rotation: RotationVector::new(q5.sin() * wrist.cos(), wrist + q5.cos() - 1.0, q1 + q6),
    }
}

impl ActuatorPort for SimulatedArm {
    fn describe(&self) -> String {
        "simulator".to_string()
    }

    fn move_to_absolute(
        &mut self,
        target: &JointConfiguration,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RobotError::invalid_parameter("speed", format!("{speed} must be > 0")));
        }
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(RobotError::invalid_parameter(
                "acceleration",
                format!("{acceleration} must be > 0"),
            ));
        }
        // 阻塞式移动：重新启动控制脚本并直接到达目标
        self.stopped = false;

        let travel = self
            .positions
            .map_with(*target, |from, to| (to - from).abs().0)
            .into_iter()
            .fold(0.0, f64::max);
        debug!(
            "Simulated move: largest joint travel {:.4} rad, nominal duration {:.2}s",
            travel,
            travel / speed
        );

        self.positions = *target;
        self.velocities = JointArray::splat(RadPerSecond::ZERO);
        self.currents = JointArray::new(GRAVITY_CURRENT.map(Ampere));
        Ok(())
    }

    fn read_state(&mut self) -> Result<ArmState, RobotError> {
        Ok(ArmState {
            joint_positions: self.positions,
            joint_velocities: self.velocities,
            joint_currents: self.currents,
            tcp_pose: self.tcp_pose(),
        })
    }

    fn command_servo(
        &mut self,
        target: &JointConfiguration,
        params: &ServoParams,
    ) -> Result<(), RobotError> {
        self.ensure_running("command_servo")?;

        let dt = params.time.as_secs_f64();
        if dt <= 0.0 {
            return Err(RobotError::invalid_parameter("time", "servo time must be > 0"));
        }
        let alpha = if self.tau > 0.0 { 1.0 - (-dt / self.tau).exp() } else { 1.0 };
        let max_step = params.speed * dt;

        let previous = self.velocities;
        let next = self.positions.map_with(*target, |from, to| {
            let step = ((to - from) * alpha).0.clamp(-max_step, max_step);
            from + Rad(step)
        });
        let velocities = self.positions.map_with(next, |from, to| RadPerSecond((to - from).0 / dt));

        self.currents = JointArray::new(Joint::ALL.map(|joint| {
            let accel = (velocities[joint] - previous[joint]).0 / dt;
            Ampere(
                GRAVITY_CURRENT[joint.index()] * next[joint].cos().abs()
                    + CURRENT_PER_ACCEL * accel
                    + CURRENT_PER_VELOCITY * velocities[joint].0,
            )
        }));
        self.positions = next;
        self.velocities = velocities;
        self.commands += 1;

        trace!("Simulated servo #{}: {:?}", self.commands, self.positions.to_radians());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RobotError> {
        self.stopped = true;
        self.velocities = JointArray::splat(RadPerSecond::ZERO);
        debug!("Simulated arm stopped after {} servo commands", self.commands);
        Ok(())
    }
}
