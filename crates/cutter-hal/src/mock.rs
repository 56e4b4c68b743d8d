//! Mock 输出
//!
//! 记录所有写入事件，支持故障注入，用于无硬件测试。

use crate::{OutputError, OutputErrorKind, PowerOutput};
use cutter_protocol::Direction;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// 输出事件（按发生顺序记录）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    Write(u8),
    Direction(Direction),
}

/// Mock 功率输出
#[derive(Debug, Default)]
pub struct MockOutput {
    events: Mutex<Vec<OutputEvent>>,
    direction_control: bool,
    should_fail: AtomicBool,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 支持转向控制的 Mock 输出
    pub fn with_direction_control() -> Self {
        Self {
            direction_control: true,
            ..Self::default()
        }
    }

    /// 注入故障：之后的写入都返回错误
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// 所有事件的副本
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().clone()
    }

    /// 只包含写入值的序列
    pub fn writes(&self) -> Vec<u8> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Write(v) => Some(*v),
                OutputEvent::Direction(_) => None,
            })
            .collect()
    }

    /// 最近一次写入的值
    pub fn last_value(&self) -> Option<u8> {
        self.writes().last().copied()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn check_fail(&self) -> Result<(), OutputError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(OutputError::new(
                OutputErrorKind::Backend,
                "injected output failure",
            ));
        }
        Ok(())
    }
}

impl PowerOutput for MockOutput {
    fn write_output(&self, value: u8) -> Result<(), OutputError> {
        self.check_fail()?;
        self.events.lock().push(OutputEvent::Write(value));
        Ok(())
    }

    fn set_direction(&self, direction: Direction) -> Result<(), OutputError> {
        self.check_fail()?;
        self.events.lock().push(OutputEvent::Direction(direction));
        Ok(())
    }

    fn supports_direction(&self) -> bool {
        self.direction_control
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_events_in_order() {
        let output = MockOutput::with_direction_control();
        output.write_output(10).unwrap();
        output.set_direction(Direction::Reverse).unwrap();
        output.write_output(0).unwrap();

        assert_eq!(
            output.events(),
            vec![
                OutputEvent::Write(10),
                OutputEvent::Direction(Direction::Reverse),
                OutputEvent::Write(0),
            ]
        );
        assert_eq!(output.writes(), vec![10, 0]);
        assert_eq!(output.last_value(), Some(0));
    }

    #[test]
    fn test_failure_injection() {
        let output = MockOutput::new();
        output.set_should_fail(true);
        let err = output.write_output(1).unwrap_err();
        assert_eq!(err.kind, OutputErrorKind::Backend);
        assert!(output.events().is_empty());

        output.set_should_fail(false);
        assert!(output.write_output(1).is_ok());
    }

    #[test]
    fn test_clear() {
        let output = MockOutput::new();
        output.write_output(5).unwrap();
        output.clear();
        assert_eq!(output.last_value(), None);
    }
}
