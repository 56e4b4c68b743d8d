//! 步进线程指标
//!
//! 原子计数器，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 执行上下文指标
///
/// # 使用示例
///
/// ```rust
/// use cutter_driver::StepperMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = StepperMetrics::default();
///
/// // 在步进线程中更新指标
/// metrics.blocks_executed.fetch_add(1, Ordering::Relaxed);
///
/// // 在主线程中读取快照
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.blocks_executed, 1);
/// ```
#[derive(Debug, Default)]
pub struct StepperMetrics {
    /// 已执行的运动块总数（包括同步标记块）
    pub blocks_executed: AtomicU64,

    /// 已应用的同步标记块数
    pub sync_markers_applied: AtomicU64,

    /// 执行上下文写入输出的次数（内联功率 + 同步标记）
    pub inline_power_writes: AtomicU64,

    /// 动态功率斜坡的采样次数
    pub ramp_ticks: AtomicU64,

    /// 输出写入失败次数
    ///
    /// 执行上下文无法向调用方传播错误，只能计数并记录日志。
    pub output_errors: AtomicU64,
}

impl StepperMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_executed: self.blocks_executed.load(Ordering::Relaxed),
            sync_markers_applied: self.sync_markers_applied.load(Ordering::Relaxed),
            inline_power_writes: self.inline_power_writes.load(Ordering::Relaxed),
            ramp_ticks: self.ramp_ticks.load(Ordering::Relaxed),
            output_errors: self.output_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.blocks_executed.store(0, Ordering::Relaxed);
        self.sync_markers_applied.store(0, Ordering::Relaxed);
        self.inline_power_writes.store(0, Ordering::Relaxed);
        self.ramp_ticks.store(0, Ordering::Relaxed);
        self.output_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub blocks_executed: u64,
    pub sync_markers_applied: u64,
    pub inline_power_writes: u64,
    pub ramp_ticks: u64,
    pub output_errors: u64,
}
