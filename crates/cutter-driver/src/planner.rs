//! 运动队列（规划器缓冲区）
//!
//! 命令上下文是唯一的生产者，步进线程是唯一的消费者：
//!
//! ```text
//! PowerModeController ──buffer_move()──▶ [bounded channel] ──▶ Stepper
//!        │                                                        │
//!        └──── synchronize(): 等待 outstanding == 0 ◀── complete() ┘
//! ```
//!
//! 每个运动块在入队时拍下当前的内联功率快照，之后不再改变，
//! 因此改变“下一块功率”不会影响已入队的块。

use crate::block::{BlockFlags, InlinePower, MotionBlock, MoveRequest};
use crate::error::DriverError;
use crate::heartbeat::StallMonitor;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tracing::trace;

/// 运动队列接口（功率控制器对规划器的全部依赖）
///
/// 控制器只通过这三个操作与运动队列交互，便于在测试中替换为记录调用的假实现。
pub trait MotionQueue: Send + Sync {
    /// 阻塞直到所有已入队的块执行完毕
    ///
    /// 从执行上下文调用会返回 [`DriverError::SyncFromExecutionContext`]。
    fn synchronize(&self) -> Result<(), DriverError>;

    /// 入队零位移同步标记块
    fn enqueue_sync_marker(&self, flags: BlockFlags) -> Result<(), DriverError>;

    /// 设置此后入队的块携带的内联功率（`None`：不携带）
    fn set_next_block_power(&self, power: Option<InlinePower>);
}

impl<T: MotionQueue + ?Sized> MotionQueue for Arc<T> {
    fn synchronize(&self) -> Result<(), DriverError> {
        (**self).synchronize()
    }

    fn enqueue_sync_marker(&self, flags: BlockFlags) -> Result<(), DriverError> {
        (**self).enqueue_sync_marker(flags)
    }

    fn set_next_block_power(&self, power: Option<InlinePower>) {
        (**self).set_next_block_power(power)
    }
}

/// 生产者与消费者共享的队列状态
struct QueueShared {
    /// 已入队但尚未执行完毕的块数
    outstanding: Mutex<u64>,
    /// `outstanding` 归零或消费者退出时通知
    drained: Condvar,
    /// 消费者已退出（接收端被 drop）
    closed: AtomicBool,
    /// 执行上下文线程 ID（消费者线程首次绑定后确定）
    execution_thread: OnceLock<ThreadId>,
    monitor: StallMonitor,
}

impl QueueShared {
    fn begin_block(&self) {
        let mut outstanding = self.outstanding.lock();
        if *outstanding == 0 {
            self.monitor.expect_progress_within(Duration::ZERO);
        }
        *outstanding += 1;
    }

    fn finish_block(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }

    fn is_execution_context(&self) -> bool {
        self.execution_thread.get() == Some(&thread::current().id())
    }
}

/// 生产者状态（序号与下一块功率必须和入队顺序一起加锁）
struct ProducerState {
    next_seq: u64,
    inline: Option<InlinePower>,
}

/// 规划器队列（生产者端）
pub struct PlannerQueue {
    block_tx: Sender<MotionBlock>,
    shared: Arc<QueueShared>,
    producer: Mutex<ProducerState>,
}

impl PlannerQueue {
    /// 入队一个运动块，返回其序号
    ///
    /// 队列满时阻塞，直到步进线程取走一个块。
    pub fn buffer_move(&self, request: MoveRequest) -> Result<u64, DriverError> {
        let mut producer = self.producer.lock();
        let seq = producer.next_seq;
        let block = MotionBlock::from_request(seq, request, producer.inline);
        self.push(block)?;
        producer.next_seq += 1;
        Ok(seq)
    }

    /// 已入队但尚未执行完毕的块数
    pub fn outstanding(&self) -> u64 {
        *self.shared.outstanding.lock()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding() == 0
    }

    /// 当前的“下一块功率”
    pub fn next_block_power(&self) -> Option<InlinePower> {
        self.producer.lock().inline
    }

    /// 有待执行的块，但执行上下文超过预期时间没有进展
    pub fn is_stalled(&self) -> bool {
        self.outstanding() > 0 && self.shared.monitor.is_overdue()
    }

    /// 消费者是否已退出
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// 调用方必须持有 producer 锁，保证 FIFO 顺序与序号一致
    fn push(&self, block: MotionBlock) -> Result<(), DriverError> {
        self.shared.begin_block();
        let seq = block.seq;
        if self.block_tx.send(block).is_err() {
            self.shared.finish_block();
            return Err(DriverError::QueueClosed);
        }
        trace!(seq, "block buffered");
        Ok(())
    }
}

impl MotionQueue for PlannerQueue {
    fn synchronize(&self) -> Result<(), DriverError> {
        if self.shared.is_execution_context() {
            return Err(DriverError::SyncFromExecutionContext);
        }

        let mut outstanding = self.shared.outstanding.lock();
        while *outstanding > 0 {
            if self.shared.closed.load(Ordering::Acquire) {
                return Err(DriverError::QueueClosed);
            }
            self.shared.drained.wait(&mut outstanding);
        }
        Ok(())
    }

    fn enqueue_sync_marker(&self, flags: BlockFlags) -> Result<(), DriverError> {
        let mut producer = self.producer.lock();
        let seq = producer.next_seq;
        self.push(MotionBlock::sync_marker(seq, flags))?;
        producer.next_seq += 1;
        Ok(())
    }

    fn set_next_block_power(&self, power: Option<InlinePower>) {
        self.producer.lock().inline = power;
    }
}

/// 规划器队列（消费者端，由步进线程持有）
pub struct BlockReceiver {
    block_rx: Receiver<MotionBlock>,
    shared: Arc<QueueShared>,
}

impl BlockReceiver {
    /// 把当前线程登记为执行上下文
    ///
    /// 只有第一次调用生效。
    pub fn bind_current_thread(&self) {
        let _ = self.shared.execution_thread.set(thread::current().id());
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<MotionBlock, RecvTimeoutError> {
        self.block_rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<MotionBlock, TryRecvError> {
        self.block_rx.try_recv()
    }

    /// 开始执行一个块：预期在块时长（+ 宽限）内完成
    pub fn begin(&self, block: &MotionBlock) {
        self.shared.monitor.expect_progress_within(block.duration);
    }

    /// 一个块执行完毕
    pub fn complete(&self) {
        self.shared.monitor.expect_progress_within(Duration::ZERO);
        self.shared.finish_block();
    }
}

impl Drop for BlockReceiver {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        // 持锁通知，避免 synchronize() 在检查 closed 与 wait 之间错过唤醒
        let _guard = self.shared.outstanding.lock();
        self.shared.drained.notify_all();
    }
}

/// 创建规划器队列
///
/// # 参数
/// - `capacity`: 缓冲区容量（块数，至少为 1）
/// - `stall_grace`: 停滞判定的宽限时间
pub fn planner_channel(capacity: usize, stall_grace: Duration) -> (PlannerQueue, BlockReceiver) {
    let (block_tx, block_rx) = bounded(capacity.max(1));
    let shared = Arc::new(QueueShared {
        outstanding: Mutex::new(0),
        drained: Condvar::new(),
        closed: AtomicBool::new(false),
        execution_thread: OnceLock::new(),
        monitor: StallMonitor::new(stall_grace),
    });

    let queue = PlannerQueue {
        block_tx,
        shared: shared.clone(),
        producer: Mutex::new(ProducerState {
            next_seq: 0,
            inline: None,
        }),
    };
    let receiver = BlockReceiver { block_rx, shared };
    (queue, receiver)
}
