//! 运动块定义
//!
//! 运动块只携带功率相关信息（功率快照、进给速度、梯形加减速占比），
//! 几何规划不在本 crate 范围内。

use std::ops::BitOr;
use std::time::Duration;

/// 运动块标志位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BlockFlags(u8);

impl BlockFlags {
    /// 无标志
    pub const NONE: Self = Self(0);

    /// 到达该块时应用挂起功率（同步标记策略）
    pub const SYNC_POWER: Self = Self(1 << 0);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 是否包含 `other` 的全部标志位（`other` 为空时返回 false）
    pub fn contains(self, other: Self) -> bool {
        !other.is_empty() && self.0 & other.0 == other.0
    }
}

impl BitOr for BlockFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// 运动块携带的内联功率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlinePower {
    /// 硬件值（占空比/舵机位置）
    pub value: u8,
    /// 动态模式：执行时按进给速度缩放
    pub dynamic: bool,
}

impl InlinePower {
    pub fn constant(value: u8) -> Self {
        Self {
            value,
            dynamic: false,
        }
    }

    pub fn dynamic(value: u8) -> Self {
        Self {
            value,
            dynamic: true,
        }
    }
}

/// 入队请求
///
/// # Example
///
/// ```
/// use cutter_driver::MoveRequest;
/// use std::time::Duration;
///
/// // 20ms，进给 25 mm/s，前后各 25% 加减速
/// let request = MoveRequest::new(Duration::from_millis(20), 25.0).with_ramps(0.25, 0.25);
/// assert_eq!(request.accel_fraction, 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    /// 执行时长
    pub duration: Duration,
    /// 名义进给速度（mm/s）
    pub feedrate: f32,
    /// 加速段占比 [0, 1]
    pub accel_fraction: f32,
    /// 减速段占比 [0, 1]
    pub decel_fraction: f32,
}

impl MoveRequest {
    pub fn new(duration: Duration, feedrate: f32) -> Self {
        Self {
            duration,
            feedrate,
            accel_fraction: 0.0,
            decel_fraction: 0.0,
        }
    }

    /// 设置梯形加减速占比（链式，超出部分在执行时按比例收缩）
    pub fn with_ramps(mut self, accel_fraction: f32, decel_fraction: f32) -> Self {
        self.accel_fraction = accel_fraction;
        self.decel_fraction = decel_fraction;
        self
    }
}

/// 运动块（入队后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct MotionBlock {
    /// 入队序号（单调递增，FIFO 顺序）
    pub seq: u64,
    pub flags: BlockFlags,
    pub duration: Duration,
    pub feedrate: f32,
    pub accel_fraction: f32,
    pub decel_fraction: f32,
    /// 入队时刻的内联功率快照（`None`：该块不改变输出）
    pub laser: Option<InlinePower>,
}

impl MotionBlock {
    /// 由入队请求构造运动块
    pub fn from_request(seq: u64, request: MoveRequest, laser: Option<InlinePower>) -> Self {
        Self {
            seq,
            flags: BlockFlags::NONE,
            duration: request.duration,
            feedrate: request.feedrate.max(0.0),
            accel_fraction: request.accel_fraction,
            decel_fraction: request.decel_fraction,
            laser,
        }
    }

    /// 零位移同步标记块
    pub fn sync_marker(seq: u64, flags: BlockFlags) -> Self {
        Self {
            seq,
            flags,
            duration: Duration::ZERO,
            feedrate: 0.0,
            accel_fraction: 0.0,
            decel_fraction: 0.0,
            laser: None,
        }
    }

    pub fn is_sync_marker(&self) -> bool {
        self.duration.is_zero() && !self.flags.is_empty()
    }

    /// 梯形速度曲线上 `t ∈ [0, 1]` 处的速度比例 [0, 1]
    ///
    /// 加减速占比之和超过 1 时按比例收缩（退化为三角形曲线）。
    pub fn speed_factor(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let mut accel = self.accel_fraction.clamp(0.0, 1.0);
        let mut decel = self.decel_fraction.clamp(0.0, 1.0);
        let total = accel + decel;
        if total > 1.0 {
            accel /= total;
            decel /= total;
        }

        if accel > 0.0 && t < accel {
            t / accel
        } else if decel > 0.0 && t > 1.0 - decel {
            (1.0 - t) / decel
        } else {
            1.0
        }
    }
}
