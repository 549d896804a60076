//! 关节索引和数组
//!
//! 6 轴机械臂的关节顺序固定为物理关节 1..6，`JointArray` 的长度在类型上
//! 固定为 6，任何操作都不会重排关节。
//!
//! # 示例
//!
//! ```rust
//! use sweep_client::types::{Joint, JointArray, Rad};
//!
//! let positions = JointArray::new([
//!     Rad(0.0), Rad(0.1), Rad(0.2),
//!     Rad(0.3), Rad(0.4), Rad(0.5),
//! ]);
//!
//! assert_eq!(positions[Joint::J3], Rad(0.2));
//!
//! let raw: [f64; 6] = positions.map(|r| r.0).into();
//! assert_eq!(raw[5], 0.5);
//! ```

use super::units::Rad;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// 关节枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Joint {
    /// 关节 1（基座）
    J1 = 0,
    /// 关节 2（肩部）
    J2 = 1,
    /// 关节 3（肘部）
    J3 = 2,
    /// 关节 4（腕 1）
    J4 = 3,
    /// 关节 5（腕 2）
    J5 = 4,
    /// 关节 6（腕 3）
    J6 = 5,
}

impl Joint {
    /// 所有关节，按物理顺序
    pub const ALL: [Joint; 6] = [Joint::J1, Joint::J2, Joint::J3, Joint::J4, Joint::J5, Joint::J6];

    /// 数组索引（0-5）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从数组索引创建（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 关节名称
    pub const fn name(self) -> &'static str {
        match self {
            Joint::J1 => "J1",
            Joint::J2 => "J2",
            Joint::J3 => "J3",
            Joint::J4 => "J4",
            Joint::J5 => "J5",
            Joint::J6 => "J6",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 关节名称解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown joint '{0}' (expected J1..J6)")]
pub struct ParseJointError(pub String);

impl FromStr for Joint {
    type Err = ParseJointError;

    /// 接受 `J1`、`j1` 或 `1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['J', 'j']);
        digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(Joint::from_index)
            .ok_or_else(|| ParseJointError(s.to_string()))
    }
}

/// 关节数组
///
/// 固定长度 6 的容器，按 [`Joint`] 或 `usize` 索引。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointArray<T> {
    data: [T; 6],
}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; 6]) -> Self {
        JointArray { data }
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 按关节迭代 `(Joint, &T)`
    pub fn iter_joints(&self) -> impl Iterator<Item = (Joint, &T)> {
        Joint::ALL.into_iter().zip(self.data.iter())
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }

    /// 与另一个数组逐元素组合
    pub fn map_with<U, V, F>(self, other: JointArray<U>, mut f: F) -> JointArray<V>
    where
        F: FnMut(T, U) -> V,
    {
        let mut rhs = other.data.into_iter();
        JointArray::new(self.data.map(|lhs| match rhs.next() {
            Some(r) => f(lhs, r),
            None => unreachable!("JointArray always holds six elements"),
        }))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; 6])
    }
}

impl JointArray<Rad> {
    /// 转换为原始弧度数组
    #[inline]
    pub fn to_radians(self) -> [f64; 6] {
        self.data.map(|r| r.0)
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> Index<usize> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> From<[T; 6]> for JointArray<T> {
    #[inline]
    fn from(data: [T; 6]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; 6] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, 6>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// 关节位形（rad）
pub type JointConfiguration = JointArray<Rad>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::J1.index(), 0);
        assert_eq!(Joint::J6.index(), 5);
        assert_eq!(Joint::from_index(4), Some(Joint::J5));
        assert_eq!(Joint::from_index(6), None);
    }

    #[test]
    fn test_joint_from_str() {
        assert_eq!("J3".parse::<Joint>(), Ok(Joint::J3));
        assert_eq!("j5".parse::<Joint>(), Ok(Joint::J5));
        assert_eq!("6".parse::<Joint>(), Ok(Joint::J6));
        assert!("J0".parse::<Joint>().is_err());
        assert!("J7".parse::<Joint>().is_err());
        assert!("elbow".parse::<Joint>().is_err());
    }

    #[test]
    fn test_joint_array_order_preserved() {
        let arr = JointArray::new([1, 2, 3, 4, 5, 6]);
        let doubled = arr.map(|v| v * 2);
        assert_eq!(<[i32; 6]>::from(doubled), [2, 4, 6, 8, 10, 12]);
    }

    #[test]
    fn test_joint_array_map_with() {
        let a = JointArray::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = JointArray::splat(0.5);
        let c = a.map_with(b, |x, y| x - y);
        assert_eq!(c[Joint::J1], 0.5);
        assert_eq!(c[Joint::J6], 5.5);
    }

    #[test]
    fn test_joint_array_indexing() {
        let mut positions = JointArray::splat(Rad(0.0));
        positions[Joint::J4] = Rad(1.5);
        assert_eq!(positions[3], Rad(1.5));
        assert_eq!(positions.to_radians(), [0.0, 0.0, 0.0, 1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_iter_joints() {
        let arr = JointArray::new([10, 20, 30, 40, 50, 60]);
        let collected: Vec<_> = arr.iter_joints().map(|(j, v)| (j, *v)).collect();
        assert_eq!(collected[0], (Joint::J1, 10));
        assert_eq!(collected[5], (Joint::J6, 60));
    }
}
