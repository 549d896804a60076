//! 机械臂端口抽象
//!
//! [`ActuatorPort`] 是控制核心与机械臂之间唯一的接口。实现方负责网络传输、
//! 控制脚本和单位换算；控制核心只看到强类型的关节量和末端位姿。
//!
//! 所有方法都是阻塞调用。控制循环会测量 `read_state` 和 `command_servo`
//! 的耗时，超过一个控制周期即视为协议违规。

use crate::error::RobotError;
use crate::types::{Ampere, CartesianPose, Joint, JointArray, JointConfiguration, RadPerSecond};
use std::time::Duration;

/// 一次读数得到的完整机械臂状态
///
/// 同一次读取中的各量相互一致（同一控制器周期）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmState {
    /// 关节位置（rad）
    pub joint_positions: JointConfiguration,
    /// 关节速度（rad/s）
    pub joint_velocities: JointArray<RadPerSecond>,
    /// 关节电流（A）
    pub joint_currents: JointArray<Ampere>,
    /// 末端位姿
    pub tcp_pose: CartesianPose,
}

impl ArmState {
    /// 所有关节静止在给定位形
    pub fn at_rest(positions: JointConfiguration, tcp_pose: CartesianPose) -> Self {
        Self {
            joint_positions: positions,
            joint_velocities: JointArray::splat(RadPerSecond::ZERO),
            joint_currents: JointArray::splat(Ampere::ZERO),
            tcp_pose,
        }
    }

    /// 检查读数是否全部为有限值
    pub fn check_finite(&self) -> Result<(), RobotError> {
        for joint in Joint::ALL {
            let checks = [
                ("position", self.joint_positions[joint].0),
                ("velocity", self.joint_velocities[joint].0),
                ("current", self.joint_currents[joint].0),
            ];
            if let Some((quantity, _)) = checks.iter().find(|(_, v)| !v.is_finite()) {
                return Err(RobotError::InvalidReading { joint, quantity });
            }
        }
        if !self.tcp_pose.to_array().iter().all(|v| v.is_finite()) {
            return Err(RobotError::hardware_failure("non-finite TCP pose reading"));
        }
        Ok(())
    }
}

/// 伺服（流式）命令参数
///
/// 每个 tick 发送一次；控制器在 `time` 内向目标插补，
/// `lookahead_time` 和 `gain` 决定轨迹平滑程度与跟踪刚度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoParams {
    /// 速度上限（rad/s）
    pub speed: f64,
    /// 加速度上限（rad/s²）
    pub acceleration: f64,
    /// 命令有效时间（通常等于控制周期）
    pub time: Duration,
    /// 前瞻时间
    pub lookahead_time: Duration,
    /// 比例增益
    pub gain: f64,
}

/// 机械臂端口
pub trait ActuatorPort {
    /// 端口描述（地址或模拟器名称），用于日志和录制元数据
    fn describe(&self) -> String {
        "actuator".to_string()
    }

    /// 阻塞式关节空间移动到绝对位形
    fn move_to_absolute(
        &mut self,
        target: &JointConfiguration,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError>;

    /// 读取当前状态
    fn read_state(&mut self) -> Result<ArmState, RobotError>;

    /// 发送一次伺服命令
    fn command_servo(
        &mut self,
        target: &JointConfiguration,
        params: &ServoParams,
    ) -> Result<(), RobotError>;

    /// 停止运动并终止控制脚本
    fn stop(&mut self) -> Result<(), RobotError>;
}

impl<P: ActuatorPort + ?Sized> ActuatorPort for &mut P {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn move_to_absolute(
        &mut self,
        target: &JointConfiguration,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        (**self).move_to_absolute(target, speed, acceleration)
    }

    fn read_state(&mut self) -> Result<ArmState, RobotError> {
        (**self).read_state()
    }

    fn command_servo(
        &mut self,
        target: &JointConfiguration,
        params: &ServoParams,
    ) -> Result<(), RobotError> {
        (**self).command_servo(target, params)
    }

    fn stop(&mut self) -> Result<(), RobotError> {
        (**self).stop()
    }
}

impl<P: ActuatorPort + ?Sized> ActuatorPort for Box<P> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn move_to_absolute(
        &mut self,
        target: &JointConfiguration,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        (**self).move_to_absolute(target, speed, acceleration)
    }

    fn read_state(&mut self) -> Result<ArmState, RobotError> {
        (**self).read_state()
    }

    fn command_servo(
        &mut self,
        target: &JointConfiguration,
        params: &ServoParams,
    ) -> Result<(), RobotError> {
        (**self).command_servo(target, params)
    }

    fn stop(&mut self) -> Result<(), RobotError> {
        (**self).stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rad;

    #[test]
    fn test_at_rest_is_finite() {
        let state = ArmState::at_rest(JointArray::splat(Rad(0.5)), CartesianPose::ORIGIN);
        assert!(state.check_finite().is_ok());
        assert_eq!(state.joint_velocities[Joint::J3], RadPerSecond::ZERO);
    }

    #[test]
    fn test_non_finite_reading_reported_with_joint() {
        let mut state = ArmState::default();
        state.joint_currents[Joint::J5] = Ampere(f64::NAN);

        assert_eq!(
            state.check_finite(),
            Err(RobotError::InvalidReading {
                joint: Joint::J5,
                quantity: "current"
            })
        );
    }

    #[test]
    fn test_non_finite_pose_rejected() {
        let mut state = ArmState::default();
        state.tcp_pose.position.z = f64::INFINITY;
        assert!(state.check_finite().unwrap_err().is_fatal());
    }
}
