//! 驱动层模块
//!
//! 本模块提供主轴/激光刀具的功率控制核心，包括：
//! - 功率模式状态机（标准 / 连续内联 / 动态内联）
//! - 与运动队列的同步（排空等待、每块功率、同步标记块）
//! - 步进线程（执行上下文，按 FIFO 顺序执行运动块）
//! - 状态发布（ArcSwap 无锁读取）
//!
//! # 使用场景
//!
//! ```
//! use cutter_driver::{CutterBuilder, MoveRequest};
//! use cutter_hal::LogOutput;
//! use std::time::Duration;
//!
//! let cutter = CutterBuilder::new().build(LogOutput::default())?;
//!
//! // 连续内联模式，功率随后续运动块生效
//! cutter.activate(false, true, Some(255.0))?;
//! cutter.buffer_move(MoveRequest::new(Duration::from_millis(2), 20.0))?;
//!
//! // 关闭并回到标准模式
//! cutter.deactivate(true)?;
//! # Ok::<(), cutter_driver::DriverError>(())
//! ```

pub mod block;
pub mod bridge;
mod builder;
pub mod command;
pub mod controller;
mod cutter;
mod error;
pub mod heartbeat;
pub mod metrics;
pub mod pending;
pub mod planner;
pub mod state;
pub mod stepper;

pub use block::{BlockFlags, InlinePower, MotionBlock, MoveRequest};
pub use bridge::InlineQueueBridge;
pub use builder::CutterBuilder;
pub use command::{CutterCommand, power_off, power_on};
pub use controller::PowerModeController;
pub use cutter::Cutter;
pub use error::DriverError;
pub use heartbeat::StallMonitor;
pub use metrics::{MetricsSnapshot, StepperMetrics};
pub use pending::PendingPower;
pub use planner::{BlockReceiver, MotionQueue, PlannerQueue, planner_channel};
pub use state::*;
pub use stepper::{Stepper, StepperConfig, scale_dynamic_power, stepper_loop};
