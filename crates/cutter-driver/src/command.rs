//! 命令入口
//!
//! 把“开启（正转/反转）”和“关闭”两类操作员命令转发给 [`PowerModeController`]。
//! 参数解析不在这里，调用方已经把指令拆成方向、内联标志和可选功率。

use crate::controller::PowerModeController;
use crate::error::DriverError;
use crate::planner::MotionQueue;
use crate::state::ToolPowerState;
use cutter_hal::PowerOutput;

/// 刀具命令
///
/// | 命令 | 含义 |
/// |---|---|
/// | `SpindleForward` | 正转开启；内联时进入连续内联模式 |
/// | `SpindleReverse` | 反转开启；内联时进入动态内联模式 |
/// | `Off` | 关闭；`clear_inline` 时同时回到标准模式 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutterCommand {
    SpindleForward { inline: bool, power: Option<f32> },
    SpindleReverse { inline: bool, power: Option<f32> },
    Off { clear_inline: bool },
}

impl CutterCommand {
    /// 开启命令
    pub fn on(reverse: bool, inline: bool, power: Option<f32>) -> Self {
        if reverse {
            Self::SpindleReverse { inline, power }
        } else {
            Self::SpindleForward { inline, power }
        }
    }

    /// 关闭命令
    pub fn off(clear_inline: bool) -> Self {
        Self::Off { clear_inline }
    }

    /// 转发给控制器
    pub fn dispatch<Q: MotionQueue, O: PowerOutput>(
        self,
        ctrl: &mut PowerModeController<Q, O>,
    ) -> Result<ToolPowerState, DriverError> {
        match self {
            Self::SpindleForward { inline, power } => power_on(ctrl, false, inline, power),
            Self::SpindleReverse { inline, power } => power_on(ctrl, true, inline, power),
            Self::Off { clear_inline } => power_off(ctrl, clear_inline),
        }
    }
}

/// 开启刀具
#[inline]
pub fn power_on<Q: MotionQueue, O: PowerOutput>(
    ctrl: &mut PowerModeController<Q, O>,
    reverse: bool,
    inline: bool,
    power: Option<f32>,
) -> Result<ToolPowerState, DriverError> {
    ctrl.activate(reverse, inline, power)
}

/// 关闭刀具
#[inline]
pub fn power_off<Q: MotionQueue, O: PowerOutput>(
    ctrl: &mut PowerModeController<Q, O>,
    clear_inline: bool,
) -> Result<ToolPowerState, DriverError> {
    ctrl.deactivate(clear_inline)
}
