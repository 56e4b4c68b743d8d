//! 刀具功率状态
//!
//! 控制器在每次操作后把状态快照发布到 `ArcSwap`，
//! 其他线程（界面、遥测）可以无锁读取，不会和命令上下文竞争。

use arc_swap::ArcSwap;
use cutter_protocol::{Direction, PowerMode};
use std::sync::Arc;

/// 刀具功率状态快照
///
/// 默认值：标准模式、未使能、正转、功率为 0。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToolPowerState {
    /// 当前功率模式
    pub mode: PowerMode,
    /// 刀具是否使能（标准模式下等价于最近一次写入的硬件值 > 0）
    pub enabled: bool,
    /// 转向
    pub direction: Direction,
    /// 最近一次请求的功率（用户单位，已钳位）
    pub unit_power: f32,
    /// 最近一次换算得到的硬件值
    pub hardware_value: u8,
    /// 界面显示的功率，跟随 `unit_power`
    pub menu_power: f32,
}

/// 状态观察者（只读、可跨线程克隆）
///
/// # Example
///
/// ```
/// use cutter_driver::{StateObserver, ToolPowerState};
///
/// let observer = StateObserver::default();
/// assert_eq!(observer.get(), ToolPowerState::default());
/// ```
#[derive(Clone, Default)]
pub struct StateObserver {
    inner: Arc<ArcSwap<ToolPowerState>>,
}

impl StateObserver {
    pub(crate) fn from_shared(inner: Arc<ArcSwap<ToolPowerState>>) -> Self {
        Self { inner }
    }

    /// 最新的状态快照
    pub fn get(&self) -> ToolPowerState {
        **self.inner.load()
    }

    pub fn mode(&self) -> PowerMode {
        self.inner.load().mode
    }

    pub fn menu_power(&self) -> f32 {
        self.inner.load().menu_power
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.load().enabled
    }
}
