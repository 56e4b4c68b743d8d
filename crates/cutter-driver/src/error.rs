//! 驱动层错误类型定义
//!
//! 功率值和模式请求一律钳位，不产生错误；
//! 这里的错误只来自协作者（输出写入失败、运动队列关闭）和构建期配置校验。

use cutter_hal::OutputError;
use cutter_protocol::ConfigError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 硬件输出错误
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// 配置校验失败（构建期）
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// 运动队列已关闭（步进线程退出）
    #[error("Motion queue closed")]
    QueueClosed,

    /// 在执行上下文（步进线程）中调用 `synchronize()`
    ///
    /// 执行上下文等待自己排空队列会永久阻塞，因此直接拒绝。
    #[error("synchronize() called from the execution context")]
    SyncFromExecutionContext,

    /// 步进线程错误
    #[error("Stepper thread error: {0}")]
    StepperThread(String),
}
