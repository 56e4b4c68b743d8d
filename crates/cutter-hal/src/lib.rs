//! # Cutter HAL
//!
//! 刀具功率输出的硬件抽象层，提供统一的输出接口。
//!
//! 同一个输出实例同时被两个上下文使用：
//! - 命令上下文：标准模式下的立即写入
//! - 执行上下文（步进线程）：内联模式下随运动块写入
//!
//! 因此所有方法都接收 `&self`，实现者需要自行保证内部可变性。

use cutter_protocol::Direction;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockOutput, OutputEvent};

/// 输出错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputErrorKind {
    Unknown,
    NotReady,
    Unsupported,
    Backend,
}

/// 硬件输出错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct OutputError {
    pub kind: OutputErrorKind,
    pub message: String,
}

impl OutputError {
    pub fn new(kind: OutputErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<String> for OutputError {
    fn from(message: String) -> Self {
        Self::new(OutputErrorKind::Unknown, message)
    }
}

impl From<&str> for OutputError {
    fn from(message: &str) -> Self {
        Self::new(OutputErrorKind::Unknown, message)
    }
}

/// 刀具功率输出
///
/// - `write_output`: 设置物理占空比/舵机位置
/// - `set_direction`: 设置转向，仅在 `supports_direction()` 为 true 时有意义
pub trait PowerOutput: Send + Sync {
    fn write_output(&self, value: u8) -> Result<(), OutputError>;

    fn set_direction(&self, _direction: Direction) -> Result<(), OutputError> {
        Ok(())
    }

    fn supports_direction(&self) -> bool {
        false
    }
}

impl<T: PowerOutput + ?Sized> PowerOutput for Arc<T> {
    fn write_output(&self, value: u8) -> Result<(), OutputError> {
        (**self).write_output(value)
    }

    fn set_direction(&self, direction: Direction) -> Result<(), OutputError> {
        (**self).set_direction(direction)
    }

    fn supports_direction(&self) -> bool {
        (**self).supports_direction()
    }
}

/// 只记录日志的输出（无硬件时用于演示和脚本回放）
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOutput {
    direction_control: bool,
}

impl LogOutput {
    pub fn new(direction_control: bool) -> Self {
        Self { direction_control }
    }
}

impl PowerOutput for LogOutput {
    fn write_output(&self, value: u8) -> Result<(), OutputError> {
        info!(value, "cutter output");
        Ok(())
    }

    fn set_direction(&self, direction: Direction) -> Result<(), OutputError> {
        info!(?direction, "cutter direction");
        Ok(())
    }

    fn supports_direction(&self) -> bool {
        self.direction_control
    }
}
