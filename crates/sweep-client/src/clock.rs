//! 时钟抽象
//!
//! 控制循环只通过 [`Clock`] 读取时间和休眠，测试中可以替换为手动推进的
//! 时钟（见 `mock` feature），从而得到确定性的节拍。

use std::time::Instant;

/// 单调时钟
pub trait Clock {
    /// 当前时刻
    fn now(&self) -> Instant;

    /// 休眠到指定时刻；已经过去的时刻立即返回
    fn sleep_until(&self, deadline: Instant);
}

/// 系统单调时钟
///
/// 使用 `spin_sleep` 休眠：先交给操作系统睡眠，最后一段自旋等待，
/// 抖动在微秒级（`std::thread::sleep` 通常为 1-2ms）。
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock {
    sleeper: spin_sleep::SpinSleeper,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            self.sleeper.sleep(deadline - now);
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep_until(&self, deadline: Instant) {
        (**self).sleep_until(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_monotonic_sleep_until() {
        let clock = MonotonicClock::new();
        let start = clock.now();
        clock.sleep_until(start + Duration::from_millis(5));
        assert!(clock.now() - start >= Duration::from_millis(5));
    }

    #[test]
    fn test_past_deadline_returns_immediately() {
        let clock = MonotonicClock::new();
        let start = clock.now();
        clock.sleep_until(start);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
