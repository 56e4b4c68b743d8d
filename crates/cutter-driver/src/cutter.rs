//! Cutter API 模块
//!
//! 提供对外的 `Cutter` 结构体，封装步进线程、规划器队列和功率控制器。

use crate::block::MoveRequest;
use crate::command::CutterCommand;
use crate::controller::PowerModeController;
use crate::error::DriverError;
use crate::metrics::{MetricsSnapshot, StepperMetrics};
use crate::planner::{MotionQueue, PlannerQueue};
use crate::state::{StateObserver, ToolPowerState};
use cutter_hal::PowerOutput;
use cutter_protocol::{CutterConfig, PowerMode};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{error, info};

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // Watchdog thread joins the target so we can wait with a timeout
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 刀具驱动（对外 API）
///
/// 命令上下文通过 `activate`/`deactivate`/`buffer_move` 操作；
/// 步进线程在后台按 FIFO 顺序执行运动块。
pub struct Cutter<O: PowerOutput + 'static> {
    /// 功率控制器（命令上下文独占，锁只用于让 `Cutter` 可以跨线程共享）
    controller: Mutex<PowerModeController<PlannerQueue, O>>,
    /// 规划器队列（生产者端）
    planner: Arc<PlannerQueue>,
    /// 启动时的配置（只读，读取时不经过控制器的锁）
    config: CutterConfig,
    /// 状态观察者
    observer: StateObserver,
    /// 步进线程句柄（Drop 时 join）
    stepper_thread: Option<JoinHandle<()>>,
    /// 运行标志（用于线程生命周期联动）
    is_running: Arc<AtomicBool>,
    /// 步进线程指标
    metrics: Arc<StepperMetrics>,
}

impl<O: PowerOutput + 'static> Cutter<O> {
    /// 由 Builder 调用
    pub(crate) fn from_parts(
        controller: PowerModeController<PlannerQueue, O>,
        planner: Arc<PlannerQueue>,
        stepper_thread: JoinHandle<()>,
        is_running: Arc<AtomicBool>,
        metrics: Arc<StepperMetrics>,
    ) -> Self {
        let observer = controller.observer();
        let config = controller.config().clone();
        Self {
            controller: Mutex::new(controller),
            planner,
            config,
            observer,
            stepper_thread: Some(stepper_thread),
            is_running,
            metrics,
        }
    }

    /// 开启刀具（见 [`PowerModeController::activate`]）
    pub fn activate(
        &self,
        reverse: bool,
        inline: bool,
        power: Option<f32>,
    ) -> Result<ToolPowerState, DriverError> {
        self.controller.lock().activate(reverse, inline, power)
    }

    /// 关闭刀具（见 [`PowerModeController::deactivate`]）
    pub fn deactivate(&self, clear_inline: bool) -> Result<ToolPowerState, DriverError> {
        self.controller.lock().deactivate(clear_inline)
    }

    /// 执行一条刀具命令
    pub fn execute(&self, command: CutterCommand) -> Result<ToolPowerState, DriverError> {
        let mut controller = self.controller.lock();
        command.dispatch(&mut *controller)
    }

    /// 入队一个运动块，返回其序号
    pub fn buffer_move(&self, request: MoveRequest) -> Result<u64, DriverError> {
        self.planner.buffer_move(request)
    }

    /// 阻塞直到所有已入队的块执行完毕
    pub fn synchronize(&self) -> Result<(), DriverError> {
        self.planner.synchronize()
    }

    /// 当前功率状态
    pub fn state(&self) -> ToolPowerState {
        self.observer.get()
    }

    pub fn mode(&self) -> PowerMode {
        self.observer.mode()
    }

    pub fn config(&self) -> &CutterConfig {
        &self.config
    }

    /// 状态观察者（可克隆到其他线程）
    pub fn observer(&self) -> StateObserver {
        self.observer.clone()
    }

    /// 步进线程指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 有待执行的块但步进线程超时没有进展
    pub fn is_stalled(&self) -> bool {
        self.planner.is_stalled()
    }

    /// 步进线程是否仍在运行
    pub fn is_stepper_alive(&self) -> bool {
        self.stepper_thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// 规划器队列（生产者端）
    pub fn planner(&self) -> &Arc<PlannerQueue> {
        &self.planner
    }
}

impl<O: PowerOutput + 'static> Drop for Cutter<O> {
    fn drop(&mut self) {
        // 使用 Release 确保所有之前的写入对步进线程可见
        self.is_running.store(false, Ordering::Release);

        let join_timeout = Duration::from_secs(2);

        // 正在执行的块会先执行完
        if let Some(handle) = self.stepper_thread.take()
            && let Err(_e) = handle.join_timeout(join_timeout)
        {
            error!(
                "Stepper thread panicked or failed to shut down within {:?}",
                join_timeout
            );
        } else {
            info!("Cutter stopped");
        }
    }
}
