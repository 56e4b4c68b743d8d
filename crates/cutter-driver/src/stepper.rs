//! 步进线程（执行上下文）
//!
//! 按 FIFO 顺序取出运动块并“执行”：在块开始时应用块携带的功率，
//! 然后按块时长计时。动态内联功率在块内按采样周期随速度曲线重新计算。

use crate::block::{BlockFlags, InlinePower, MotionBlock};
use crate::metrics::StepperMetrics;
use crate::pending::PendingPower;
use crate::planner::BlockReceiver;
use crossbeam_channel::{RecvTimeoutError, TryRecvError};
use cutter_hal::PowerOutput;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, trace, warn};

/// 步进线程配置
///
/// # Example
///
/// ```
/// use cutter_driver::StepperConfig;
///
/// // 使用默认配置
/// let config = StepperConfig::default();
/// assert_eq!(config.queue_capacity, 16);
///
/// // 自定义配置
/// let config = StepperConfig {
///     queue_capacity: 32,
///     ramp_tick_us: 500,
///     idle_poll_ms: 1,
///     stall_grace_ms: 250,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepperConfig {
    /// 规划器缓冲区容量（块数）
    pub queue_capacity: usize,
    /// 动态功率采样周期（微秒）
    pub ramp_tick_us: u64,
    /// 空闲时的接收超时（毫秒），用于检查运行标志
    pub idle_poll_ms: u64,
    /// 停滞判定宽限（毫秒）
    pub stall_grace_ms: u64,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            ramp_tick_us: 1000,
            idle_poll_ms: 2,
            stall_grace_ms: 500,
        }
    }
}

impl StepperConfig {
    pub fn stall_grace(&self) -> Duration {
        Duration::from_millis(self.stall_grace_ms)
    }
}

/// 动态内联功率：按实际速度相对 `dynamic_feedrate_max` 的比例缩放
///
/// `dynamic_feedrate_max <= 0` 时不缩放。
pub fn scale_dynamic_power(value: u8, speed: f32, dynamic_feedrate_max: f32) -> u8 {
    if !(dynamic_feedrate_max > 0.0) {
        return value;
    }
    let ratio = (speed / dynamic_feedrate_max).clamp(0.0, 1.0);
    (value as f32 * ratio).round() as u8
}

/// 执行上下文
pub struct Stepper<O: PowerOutput> {
    blocks: BlockReceiver,
    output: Arc<O>,
    pending: Arc<PendingPower>,
    metrics: Arc<StepperMetrics>,
    ramp_tick: Duration,
    idle_poll: Duration,
    dynamic_feedrate_max: f32,
}

impl<O: PowerOutput> Stepper<O> {
    pub fn new(
        blocks: BlockReceiver,
        output: Arc<O>,
        pending: Arc<PendingPower>,
        metrics: Arc<StepperMetrics>,
        config: &StepperConfig,
        dynamic_feedrate_max: f32,
    ) -> Self {
        Self {
            blocks,
            output,
            pending,
            metrics,
            ramp_tick: Duration::from_micros(config.ramp_tick_us.max(1)),
            idle_poll: Duration::from_millis(config.idle_poll_ms.max(1)),
            dynamic_feedrate_max,
        }
    }

    /// 执行一个已就绪的块（非阻塞）
    ///
    /// 返回 false 表示队列当前为空或已断开。
    pub fn poll(&self) -> bool {
        match self.blocks.try_recv() {
            Ok(block) => {
                self.execute(block);
                true
            },
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    /// 执行一个块
    pub fn execute(&self, block: MotionBlock) {
        self.blocks.begin(&block);

        if block.flags.contains(BlockFlags::SYNC_POWER) {
            let value = self.pending.load();
            trace!(seq = block.seq, value, "sync marker reached");
            self.apply(value);
            self.metrics.sync_markers_applied.fetch_add(1, Ordering::Relaxed);
        }

        match block.laser {
            Some(power) if power.dynamic => self.run_dynamic(&block, power),
            Some(power) => {
                self.apply(power.value);
                Self::wait(block.duration);
            },
            None => Self::wait(block.duration),
        }

        // 先计数再完成，synchronize() 返回时计数已可见
        self.metrics.blocks_executed.fetch_add(1, Ordering::Relaxed);
        self.blocks.complete();
    }

    /// 动态功率：块内按采样周期取速度曲线中点，值变化时才写入
    fn run_dynamic(&self, block: &MotionBlock, power: InlinePower) {
        let tick_us = self.ramp_tick.as_micros().max(1);
        let ticks = (block.duration.as_micros() / tick_us).clamp(1, u32::MAX as u128) as u32;
        let tick = block.duration / ticks;

        let mut last = None;
        for i in 0..ticks {
            let t = (i as f32 + 0.5) / ticks as f32;
            let speed = block.feedrate * block.speed_factor(t);
            let value = scale_dynamic_power(power.value, speed, self.dynamic_feedrate_max);
            if last != Some(value) {
                self.apply(value);
                last = Some(value);
            }
            self.metrics.ramp_ticks.fetch_add(1, Ordering::Relaxed);
            Self::wait(tick);
        }
    }

    fn apply(&self, value: u8) {
        match self.output.write_output(value) {
            Ok(()) => {
                self.metrics.inline_power_writes.fetch_add(1, Ordering::Relaxed);
            },
            Err(e) => {
                // 执行上下文无法把错误交还给命令上下文
                error!("Stepper: failed to write cutter output {}: {}", value, e);
                self.metrics.output_errors.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    fn wait(duration: Duration) {
        if !duration.is_zero() {
            spin_sleep::sleep(duration);
        }
    }
}

/// 步进线程主循环
///
/// # 参数
/// - `stepper`: 执行上下文
/// - `is_running`: 运行标志（用于生命周期联动）
///
/// 运行标志为 false 或生产者端全部 drop 后退出；
/// 正在执行的块会先执行完。
pub fn stepper_loop<O: PowerOutput>(stepper: Stepper<O>, is_running: Arc<AtomicBool>) {
    // 设置线程优先级（可选 feature）
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;
        use tracing::info;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Stepper thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set stepper thread priority: {}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    stepper.blocks.bind_current_thread();

    loop {
        // Acquire: If we see false, we must see all cleanup writes from other threads
        if !is_running.load(Ordering::Acquire) {
            trace!("Stepper thread: is_running flag is false, exiting");
            break;
        }

        match stepper.blocks.recv_timeout(stepper.idle_poll) {
            Ok(block) => stepper.execute(block),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Stepper thread: planner queue disconnected, exiting");
                break;
            },
        }
    }
}
