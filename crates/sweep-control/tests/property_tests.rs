//! 控制核心的属性测试
//!
//! 使用 proptest 验证 PID 限幅、轨迹周期性和保持关节。

mod common;

use common::*;
use proptest::prelude::*;
use sweep_client::{Deg, Joint, JointArray, Rad};
use sweep_control::{
    ControlLoop, JointPid, Oscillation, PidBank, SessionConfig, TrajectoryGenerator, Waveform,
};

fn waveform() -> impl Strategy<Value = Waveform> {
    prop_oneof![Just(Waveform::Sine), Just(Waveform::Cosine)]
}

proptest! {
    /// 输出总在限幅范围内
    #[test]
    fn pid_output_within_limits(
        kp in 0.0..100.0f64,
        ki in 0.0..10.0f64,
        kd in 0.0..10.0f64,
        limit in 0.001..1.0f64,
        errors in prop::collection::vec(-1000.0..1000.0f64, 1..200),
    ) {
        let mut pid = JointPid::new(kp, ki, kd, 0.05).with_output_limits(-limit, limit);
        for e in errors {
            let out = pid.correct(e);
            prop_assert!((-limit..=limit).contains(&out));
        }
    }

    /// 默认参数下任何误差都不超过 ±0.05
    #[test]
    fn pid_reference_gains_clamped(error in -1.0e6..1.0e6f64, repeats in 1usize..50) {
        let config = SessionConfig::default().validate().unwrap();
        let mut bank = PidBank::new(&config);
        for _ in 0..repeats {
            let out = bank.correct(Joint::J1, error).unwrap();
            prop_assert!(out.abs() <= 0.05);
        }
    }

    /// 零误差永远输出零
    #[test]
    fn pid_zero_error_is_zero(kp in 0.0..10.0f64, ki in 0.0..10.0f64, kd in 0.0..10.0f64, n in 1usize..500) {
        let mut pid = JointPid::new(kp, ki, kd, 0.05).with_output_limits(-0.05, 0.05);
        for _ in 0..n {
            prop_assert_eq!(pid.correct(0.0), 0.0);
        }
    }

    /// 振荡关节以 1/f 为周期
    #[test]
    fn trajectory_is_periodic(
        t in 0.0..20.0f64,
        amplitude in 0.0..10.0f64,
        hz in 0.05..5.0f64,
        wave in waveform(),
    ) {
        let generator = TrajectoryGenerator::from_parts(
            JointArray::splat(Rad(0.5)),
            vec![Oscillation { joint: Joint::J2, amplitude: Deg(amplitude).to_rad(), frequency_hz: hz, waveform: wave }],
        );
        let a = generator.evaluate(t)[Joint::J2];
        let b = generator.evaluate(t + 1.0 / hz)[Joint::J2];
        prop_assert!((a - b).abs().0 < 1e-9);
    }

    /// 保持关节（J4、J6）在任何时刻都精确等于基准
    #[test]
    fn held_joints_equal_base(t in 0.0..1000.0f64) {
        let config = SessionConfig::default().validate().unwrap();
        let generator = TrajectoryGenerator::new(&config);
        let target = generator.evaluate(t);
        prop_assert_eq!(target[Joint::J4], config.base()[Joint::J4]);
        prop_assert_eq!(target[Joint::J6], config.base()[Joint::J6]);
    }

    /// 命令 = 目标 − 修正量（符号回归）
    #[test]
    fn command_is_target_minus_correction(
        t in 0.0..10.0f64,
        offsets in prop::array::uniform6(-0.2..0.2f64),
    ) {
        let config = validated(zero_base_config(1.0));
        let mut control = ControlLoop::new(&config);
        let target = control.generator().evaluate(t);
        let current = target.map_with(JointArray::new(offsets), |q, d| q + Rad(d));

        let (command, correction) = control.compose(&current, &target);
        for joint in [Joint::J1, Joint::J2, Joint::J3, Joint::J5] {
            prop_assert_eq!(command[joint], target[joint] - Rad(correction[joint]));
            // 实测高于目标 → 修正为正 → 命令低于目标
            if offsets[joint.index()] > 0.0 {
                prop_assert!(command[joint] <= target[joint]);
            }
        }
        prop_assert_eq!(command[Joint::J4], Rad(0.0));
        prop_assert_eq!(command[Joint::J6], Rad(0.0));
    }
}

#[test]
fn reference_peak_at_quarter_period() {
    let cfg = SessionConfig {
        oscillation: vec![sweep_control::OscillationConfig {
            joint: Joint::J1,
            amplitude_deg: 2.0,
            frequency_hz: 0.2,
            waveform: Waveform::Sine,
        }],
        ..zero_base_config(10.0)
    };
    let generator = TrajectoryGenerator::new(&validated(cfg));
    let target = generator.evaluate(1.25);
    assert!((target[Joint::J1].0 - 2.0f64.to_radians()).abs() < 1e-12);
}
