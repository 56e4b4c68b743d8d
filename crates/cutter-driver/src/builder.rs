//! Builder 模式实现
//!
//! 提供链式构造 `Cutter` 实例的便捷方式。

use crate::cutter::Cutter;
use crate::controller::PowerModeController;
use crate::error::DriverError;
use crate::metrics::StepperMetrics;
use crate::pending::PendingPower;
use crate::planner::planner_channel;
use crate::stepper::{Stepper, StepperConfig, stepper_loop};
use cutter_hal::PowerOutput;
use cutter_protocol::CutterConfig;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use tracing::info;

/// Cutter Builder（链式构造）
///
/// # Example
///
/// ```
/// use cutter_driver::{CutterBuilder, StepperConfig};
/// use cutter_hal::LogOutput;
/// use cutter_protocol::{CutterConfig, PowerUnit};
///
/// // 使用默认配置
/// let cutter = CutterBuilder::new().build(LogOutput::default()).unwrap();
///
/// // 百分比单位的激光，更大的规划器缓冲区
/// let cutter = CutterBuilder::new()
///     .config(CutterConfig::pwm(PowerUnit::Percent))
///     .stepper_config(StepperConfig {
///         queue_capacity: 64,
///         ..Default::default()
///     })
///     .build(LogOutput::default())
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct CutterBuilder {
    /// 刀具配置
    config: Option<CutterConfig>,
    /// 步进线程配置
    stepper_config: Option<StepperConfig>,
}

impl CutterBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置刀具配置
    pub fn config(mut self, config: CutterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 设置步进线程配置
    pub fn stepper_config(mut self, config: StepperConfig) -> Self {
        self.stepper_config = Some(config);
        self
    }

    /// 构建 Cutter 实例并启动步进线程
    ///
    /// 配置在这里校验，运行期间不再校验。
    pub fn build<O: PowerOutput + 'static>(self, output: O) -> Result<Cutter<O>, DriverError> {
        let config = self.config.unwrap_or_default();
        let stepper_config = self.stepper_config.unwrap_or_default();

        let (queue, receiver) =
            planner_channel(stepper_config.queue_capacity, stepper_config.stall_grace());
        let queue = Arc::new(queue);
        let output = Arc::new(output);
        let pending = Arc::new(PendingPower::default());
        let metrics = Arc::new(StepperMetrics::new());

        let controller = PowerModeController::new(
            config.clone(),
            queue.clone(),
            output.clone(),
            pending.clone(),
        )?;

        let stepper = Stepper::new(
            receiver,
            output,
            pending,
            metrics.clone(),
            &stepper_config,
            config.dynamic_feedrate_max,
        );

        let is_running = Arc::new(AtomicBool::new(true));
        let is_running_stepper = is_running.clone();
        let stepper_thread = thread::Builder::new()
            .name("cutter-stepper".into())
            .spawn(move || stepper_loop(stepper, is_running_stepper))
            .map_err(|e| DriverError::StepperThread(e.to_string()))?;

        info!(
            "Cutter started: {:?} output, {:?} inline strategy, queue capacity {}",
            config.output, config.inline_strategy, stepper_config.queue_capacity
        );

        Ok(Cutter::from_parts(
            controller,
            queue,
            stepper_thread,
            is_running,
            metrics,
        ))
    }
}
