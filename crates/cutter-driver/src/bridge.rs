//! 内联功率交接
//!
//! 把命令上下文换算好的硬件值交给执行上下文。两种策略：
//!
//! - **PerBlock**: 设置“下一块功率”，之后入队的每个运动块都携带该值
//! - **PowerSync**: 写入挂起插槽，再入队一个零位移同步标记块，
//!   步进线程到达标记块时才把插槽值写到输出
//!
//! 无论哪种策略，交出的值最早在调用之后入队的第一个块生效，
//! 已入队的块不受影响。

use crate::block::{BlockFlags, InlinePower};
use crate::error::DriverError;
use crate::pending::PendingPower;
use crate::planner::MotionQueue;
use cutter_protocol::{InlineStrategy, PowerMode};
use std::sync::Arc;

/// 内联功率交接策略（构建时选定）
#[derive(Debug, Clone)]
pub enum InlineQueueBridge {
    /// 每块携带功率
    PerBlock,
    /// 挂起插槽 + 同步标记块
    PowerSync { pending: Arc<PendingPower> },
}

impl InlineQueueBridge {
    pub fn new(strategy: InlineStrategy, pending: Arc<PendingPower>) -> Self {
        match strategy {
            InlineStrategy::PerBlock => Self::PerBlock,
            InlineStrategy::PowerSync => Self::PowerSync { pending },
        }
    }

    pub fn strategy(&self) -> InlineStrategy {
        match self {
            Self::PerBlock => InlineStrategy::PerBlock,
            Self::PowerSync { .. } => InlineStrategy::PowerSync,
        }
    }

    /// 交出一个硬件值
    ///
    /// `mode` 为交出时的内联模式，动态模式下块功率在执行时按速度缩放。
    pub fn deliver<Q: MotionQueue + ?Sized>(
        &self,
        queue: &Q,
        value: u8,
        mode: PowerMode,
    ) -> Result<(), DriverError> {
        match self {
            Self::PerBlock => {
                let power = InlinePower {
                    value,
                    dynamic: mode.is_dynamic(),
                };
                queue.set_next_block_power(Some(power));
                Ok(())
            },
            Self::PowerSync { pending } => {
                pending.store(value);
                queue.enqueue_sync_marker(BlockFlags::SYNC_POWER)
            },
        }
    }

    /// 离开内联模式：之后入队的块不再携带功率
    pub fn release<Q: MotionQueue + ?Sized>(&self, queue: &Q) {
        if let Self::PerBlock = self {
            queue.set_next_block_power(None);
        }
    }
}
