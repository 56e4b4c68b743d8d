//! 功率模式控制器
//!
//! 独占 [`ToolPowerState`]，实现开启/关闭刀具时的模式转换：
//!
//! ```text
//! Standard --(activate, inline, fwd)--> ContinuousInline
//! Standard --(activate, inline, rev)--> DynamicInline
//! Continuous/Dynamic --(deactivate, clear_inline)--> Standard
//! ```
//!
//! 标准模式下功率变化前先排空运动队列，然后立即写硬件输出；
//! 内联模式下换算后的硬件值交给 [`InlineQueueBridge`]，随运动块生效。

use crate::bridge::InlineQueueBridge;
use crate::error::DriverError;
use crate::pending::PendingPower;
use crate::planner::MotionQueue;
use crate::state::{StateObserver, ToolPowerState};
use arc_swap::ArcSwap;
use cutter_hal::PowerOutput;
use cutter_protocol::{CutterConfig, Direction, InlineStrategy, PowerMode, UnitConverter};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 功率模式控制器
///
/// 所有状态修改都经过 [`activate`](Self::activate) 和
/// [`deactivate`](Self::deactivate)，每次操作结束后发布状态快照。
pub struct PowerModeController<Q: MotionQueue, O: PowerOutput> {
    state: ToolPowerState,
    config: CutterConfig,
    converter: UnitConverter,
    queue: Arc<Q>,
    output: Arc<O>,
    bridge: InlineQueueBridge,
    published: Arc<ArcSwap<ToolPowerState>>,
    /// 配置声明支持转向且输出确实支持
    direction_control: bool,
}

impl<Q: MotionQueue, O: PowerOutput> PowerModeController<Q, O> {
    /// 创建控制器
    ///
    /// 配置在这里校验一次；`pending` 只在 `PowerSync` 策略下使用，
    /// 必须与执行上下文读取的是同一个插槽。
    pub fn new(
        config: CutterConfig,
        queue: Arc<Q>,
        output: Arc<O>,
        pending: Arc<PendingPower>,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let direction_control = config.direction_control && output.supports_direction();
        if config.direction_control && !direction_control {
            warn!("Direction control configured but the output does not support it, ignoring");
        }

        let state = ToolPowerState::default();
        Ok(Self {
            state,
            converter: UnitConverter::new(&config),
            bridge: InlineQueueBridge::new(config.inline_strategy, pending),
            config,
            queue,
            output,
            published: Arc::new(ArcSwap::from_pointee(state)),
            direction_control,
        })
    }

    /// 开启刀具
    ///
    /// # 参数
    /// - `reverse`: 反转指令（内联时选择 `DynamicInline`）
    /// - `request_inline`: 进入内联模式
    /// - `requested_power`: 功率（用户单位）；缺省时标准模式用启动功率，
    ///   内联模式保持上一次的功率
    ///
    /// 功率越界时静默钳位，不返回错误。派发失败时状态和已发布快照都保持不变。
    pub fn activate(
        &mut self,
        reverse: bool,
        request_inline: bool,
        requested_power: Option<f32>,
    ) -> Result<ToolPowerState, DriverError> {
        if self.state.mode.is_standard() {
            self.queue.synchronize()?;
        }

        let mut next = self.state;
        if request_inline {
            next.mode = PowerMode::inline_for(reverse);
            next.enabled = true;
        }

        let direction = Direction::from_reverse(reverse);
        next.direction = direction;

        match requested_power {
            Some(power) => {
                let power = self.converter.power_to_range(power);
                next.unit_power = power;
                next.menu_power = power;
            },
            None if next.mode.is_standard() => {
                let power = self.converter.power_to_range(self.config.startup_power);
                next.unit_power = power;
                next.menu_power = power;
            },
            None => {},
        }

        next.hardware_value = self.converter.to_hardware_value(next.unit_power);
        self.dispatch(&mut next, Some(direction))?;
        self.commit(next);
        Ok(self.state)
    }

    /// 关闭刀具
    ///
    /// 总是先排空运动队列。`clear_inline` 时回到标准模式（本身不改变输出），
    /// 然后经由新模式的派发路径把功率置 0：
    /// 仍处于内联模式时，0 只影响之后入队的块。
    ///
    /// `unit_power` 和 `menu_power` 保持不变，下一次不带功率的内联开启沿用它们。
    pub fn deactivate(&mut self, clear_inline: bool) -> Result<ToolPowerState, DriverError> {
        self.queue.synchronize()?;

        let mut next = self.state;
        if clear_inline {
            next.mode = PowerMode::Standard;
            next.enabled = false;
        }

        next.hardware_value = 0;
        self.dispatch(&mut next, None)?;
        if clear_inline {
            self.bridge.release(&*self.queue);
        }
        self.commit(next);
        Ok(self.state)
    }

    /// 当前状态快照
    pub fn state(&self) -> ToolPowerState {
        self.state
    }

    pub fn mode(&self) -> PowerMode {
        self.state.mode
    }

    pub fn config(&self) -> &CutterConfig {
        &self.config
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    pub fn inline_strategy(&self) -> InlineStrategy {
        self.bridge.strategy()
    }

    pub fn has_direction_control(&self) -> bool {
        self.direction_control
    }

    pub fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    /// 创建只读观察者（可跨线程）
    pub fn observer(&self) -> StateObserver {
        StateObserver::from_shared(self.published.clone())
    }

    /// 派发成功后提交新状态并发布
    fn commit(&mut self, next: ToolPowerState) {
        if self.state.mode != next.mode {
            info!("Cutter power mode: {:?} -> {:?}", self.state.mode, next.mode);
        }
        self.state = next;
        self.publish();
    }

    /// 内联模式交给运动队列，标准模式立即写输出
    fn dispatch(
        &self,
        next: &mut ToolPowerState,
        direction: Option<Direction>,
    ) -> Result<(), DriverError> {
        let value = next.hardware_value;

        if next.mode.is_inline() {
            debug!(
                value,
                mode = ?next.mode,
                strategy = ?self.bridge.strategy(),
                "inline power handed to motion queue"
            );
            return self.bridge.deliver(&*self.queue, value, next.mode);
        }

        if self.direction_control
            && let Some(direction) = direction
        {
            self.output.set_direction(direction)?;
        }
        self.output.write_output(value)?;
        next.enabled = value > 0;
        debug!(value, "cutter output written");
        Ok(())
    }

    fn publish(&self) {
        self.published.store(Arc::new(self.state));
    }
}
