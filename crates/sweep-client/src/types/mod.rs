//! 强类型词汇
//!
//! 单位、关节索引和末端位姿。

pub mod cartesian;
pub mod joint;
pub mod units;

pub use cartesian::{CartesianPose, Position3D, RotationVector};
pub use joint::{Joint, JointArray, JointConfiguration, ParseJointError};
pub use units::{Ampere, Deg, Rad, RadPerSecond};
