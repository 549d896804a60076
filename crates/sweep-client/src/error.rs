//! 错误类型
//!
//! 机械臂端口上的一切失败都归为 [`RobotError`]。控制循环不做重试：
//! 跟踪阶段出现的任何端口错误都会结束会话，只区分“能否尝试安全停止”
//! 和“是否为启动期配置问题”。
//!
//! # 示例
//!
//! ```rust
//! use sweep_client::RobotError;
//!
//! let err = RobotError::timeout("read_state", 80, 50);
//! assert!(err.is_fatal());
//! assert!(!err.is_config_error());
//! ```

use crate::types::Joint;
use thiserror::Error;

/// 机器人错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RobotError {
    // ==================== Fatal Errors ====================
    /// 硬件通信失败
    #[error("Hardware communication failed: {0}")]
    HardwareFailure(String),

    /// 端口调用未在一个控制周期内返回
    #[error("{operation} did not return within {limit_ms}ms (took {elapsed_ms}ms)")]
    Timeout {
        /// 调用名称
        operation: &'static str,
        /// 实际耗时（毫秒）
        elapsed_ms: u64,
        /// 允许的最长耗时（毫秒）
        limit_ms: u64,
    },

    /// 控制器拒绝了命令
    #[error("Command rejected by controller: {0}")]
    CommandRejected(String),

    /// 读数中出现非有限值
    #[error("Non-finite {quantity} reading on joint {joint}")]
    InvalidReading {
        /// 关节
        joint: Joint,
        /// 物理量名称
        quantity: &'static str,
    },

    // ==================== Configuration Errors ====================
    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 参数无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// 参数名
        param: String,
        /// 原因
        reason: String,
    },
}

impl RobotError {
    /// 是否为致命错误
    ///
    /// 致命错误发生后机械臂处于未知状态，只能尝试停止。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HardwareFailure(_)
                | Self::Timeout { .. }
                | Self::CommandRejected(_)
                | Self::InvalidReading { .. }
        )
    }

    /// 是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::InvalidParameter { .. })
    }

    /// 创建硬件失败错误
    pub fn hardware_failure(msg: impl Into<String>) -> Self {
        Self::HardwareFailure(msg.into())
    }

    /// 创建超时错误
    pub fn timeout(operation: &'static str, elapsed_ms: u64, limit_ms: u64) -> Self {
        Self::Timeout {
            operation,
            elapsed_ms,
            limit_ms,
        }
    }

    /// 创建参数无效错误
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RobotError::hardware_failure("socket closed").is_fatal());
        assert!(RobotError::CommandRejected("protective stop".into()).is_fatal());
        assert!(
            RobotError::InvalidReading {
                joint: Joint::J2,
                quantity: "position"
            }
            .is_fatal()
        );

        let cfg = RobotError::invalid_parameter("speed", "must be positive");
        assert!(cfg.is_config_error());
        assert!(!cfg.is_fatal());
    }

    #[test]
    fn test_display() {
        let err = RobotError::timeout("command_servo", 72, 50);
        assert_eq!(err.to_string(), "command_servo did not return within 50ms (took 72ms)");

        let err = RobotError::InvalidReading {
            joint: Joint::J4,
            quantity: "current",
        };
        assert_eq!(err.to_string(), "Non-finite current reading on joint J4");
    }
}
