//! 笛卡尔空间类型
//!
//! 末端（TCP）位姿由机械臂控制器直接给出：位置（米）加旋转向量（弧度，
//! 轴角表示，方向为旋转轴、模长为旋转角）。本模块只负责承载和展开，
//! 不做运动学计算。

use std::fmt;

/// 三维位置向量（米）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position3D {
    /// X 坐标（米）
    pub x: f64,
    /// Y 坐标（米）
    pub y: f64,
    /// Z 坐标（米）
    pub z: f64,
}

impl Position3D {
    /// 零向量
    pub const ZERO: Self = Position3D::new(0.0, 0.0, 0.0);

    /// 创建新的三维位置
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position3D { x, y, z }
    }
}

/// 旋转向量（轴角，弧度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationVector {
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl RotationVector {
    /// 无旋转
    pub const IDENTITY: Self = RotationVector::new(0.0, 0.0, 0.0);

    pub const fn new(rx: f64, ry: f64, rz: f64) -> Self {
        RotationVector { rx, ry, rz }
    }
}

/// 末端位姿
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianPose {
    /// 位置（米）
    pub position: Position3D,
    /// 姿态（旋转向量）
    pub rotation: RotationVector,
}

impl CartesianPose {
    /// 原点、无旋转
    pub const ORIGIN: Self = CartesianPose {
        position: Position3D::ZERO,
        rotation: RotationVector::IDENTITY,
    };

    /// 从 `[x, y, z, rx, ry, rz]` 创建
    pub const fn from_array(v: [f64; 6]) -> Self {
        CartesianPose {
            position: Position3D::new(v[0], v[1], v[2]),
            rotation: RotationVector::new(v[3], v[4], v[5]),
        }
    }

    /// 展开为 `[x, y, z, rx, ry, rz]`（录制用）
    pub const fn to_array(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.rx,
            self.rotation.ry,
            self.rotation.rz,
        ]
    }
}

impl fmt::Display for CartesianPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose(pos: [{:.4}, {:.4}, {:.4}] m, rot: [{:.4}, {:.4}, {:.4}] rad)",
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.rx,
            self.rotation.ry,
            self.rotation.rz
        )
    }
}
