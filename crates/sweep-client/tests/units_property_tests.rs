//! 单位与关节数组的属性测试
//!
//! 使用 proptest 验证数学属性。

use proptest::prelude::*;
use sweep_client::{Deg, Joint, JointArray, Rad};

proptest! {
    /// 弧度到角度的往返转换
    #[test]
    fn rad_deg_roundtrip(rad in -100.0..100.0f64) {
        let r = Rad(rad);
        prop_assert!((r.to_deg().to_rad().0 - r.0).abs() < 1e-10);
    }

    /// 减法是加法的逆运算
    #[test]
    fn rad_sub_inverts_add(a in -10.0..10.0f64, b in -10.0..10.0f64) {
        let sum = Rad(a) + Rad(b);
        prop_assert!(((sum - Rad(b)).0 - a).abs() < 1e-12);
    }

    /// 限幅结果总在区间内
    #[test]
    fn rad_clamp_within_bounds(v in -1.0e6..1.0e6f64, limit in 0.0..1.0f64) {
        let clamped = Rad(v).clamp(Rad(-limit), Rad(limit));
        prop_assert!(clamped.abs().0 <= limit);
    }

    /// map 不改变关节顺序
    #[test]
    fn joint_array_map_preserves_order(values in prop::array::uniform6(-10.0..10.0f64)) {
        let arr = JointArray::new(values.map(Deg));
        let converted = arr.map(Deg::to_rad);
        for joint in Joint::ALL {
            prop_assert_eq!(converted[joint], Deg(values[joint.index()]).to_rad());
        }
    }

    /// 关节名称解析的往返
    #[test]
    fn joint_name_roundtrip(index in 0usize..6) {
        let joint = Joint::from_index(index).unwrap();
        prop_assert_eq!(joint.name().parse::<Joint>().unwrap(), joint);
    }
}
