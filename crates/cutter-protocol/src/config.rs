//! 刀具配置定义
//!
//! 输出类型（PWM / 舵机 / 开关）、功率单位和内联交付策略都在启动时选定一次，
//! 运行期间不再改变。

use crate::ConfigError;

/// 硬件输出类型（互斥）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputKind {
    /// 位置舵机：功率值映射为舵机角度（如 0-180），常用于笔式升降
    ServoPositional,
    /// PWM 输出：功率值映射为占空比 [0, 255]
    #[default]
    PwmCapable,
    /// 开关输出：功率 > 0 即全开（255），否则关闭
    BinaryOnOff,
}

/// 用户功率单位
///
/// 决定默认的功率范围和启动功率。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PowerUnit {
    /// 直接使用 PWM 值（0-255）
    #[default]
    Pwm255,
    /// 百分比（0-100）
    Percent,
    /// 转速（RPM）
    Rpm,
}

impl PowerUnit {
    /// 默认功率范围 `(min, max, startup)`
    ///
    /// - `min` 是非零请求的下限（地板值），零请求始终为零
    /// - `startup` 是标准模式下未指定功率时使用的默认值
    pub fn default_range(self) -> (f32, f32, f32) {
        match self {
            PowerUnit::Pwm255 => (0.0, 255.0, 255.0),
            PowerUnit::Percent => (0.0, 100.0, 80.0),
            PowerUnit::Rpm => (5_000.0, 30_000.0, 25_000.0),
        }
    }
}

/// 内联功率交付策略
///
/// 两种策略互为替代，在构建 `Cutter` 时选定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InlineStrategy {
    /// 逐块策略：后续每个运动块都携带该功率值，执行该块时应用
    #[default]
    PerBlock,
    /// 同步标记策略：功率值写入挂起插槽，并入队一个零位移同步块，
    /// 执行上下文到达该块时才应用
    PowerSync,
}

/// 刀具配置
///
/// # Example
///
/// ```
/// use cutter_protocol::{CutterConfig, OutputKind, PowerUnit};
///
/// // 默认：PWM 输出，0-255 功率单位
/// let config = CutterConfig::default();
/// assert_eq!(config.output, OutputKind::PwmCapable);
///
/// // 百分比单位的激光
/// let laser = CutterConfig::pwm(PowerUnit::Percent);
/// assert_eq!(laser.unit_max, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CutterConfig {
    /// 硬件输出类型
    pub output: OutputKind,
    /// 用户功率单位
    pub unit: PowerUnit,
    /// 非零功率请求的下限
    pub unit_min: f32,
    /// 功率上限
    pub unit_max: f32,
    /// 标准模式下未指定功率时的启动功率
    pub startup_power: f32,
    /// 舵机最大位置（仅 `ServoPositional` 有效）
    pub servo_max_position: u8,
    /// 硬件是否支持转向控制
    pub direction_control: bool,
    /// 内联交付策略
    pub inline_strategy: InlineStrategy,
    /// 动态内联模式下满功率对应的进给速度（mm/s）
    pub dynamic_feedrate_max: f32,
}

impl Default for CutterConfig {
    fn default() -> Self {
        Self::pwm(PowerUnit::Pwm255)
    }
}

impl CutterConfig {
    /// 默认舵机最大位置（度）
    pub const DEFAULT_SERVO_MAX: u8 = 180;

    /// PWM 输出配置
    pub fn pwm(unit: PowerUnit) -> Self {
        let (unit_min, unit_max, startup_power) = unit.default_range();
        Self {
            output: OutputKind::PwmCapable,
            unit,
            unit_min,
            unit_max,
            startup_power,
            servo_max_position: Self::DEFAULT_SERVO_MAX,
            direction_control: false,
            inline_strategy: InlineStrategy::PerBlock,
            dynamic_feedrate_max: 50.0,
        }
    }

    /// 位置舵机配置
    ///
    /// 功率单位范围与舵机位置范围一致（S0-S180），换算为恒等映射。
    pub fn servo() -> Self {
        let max = f32::from(Self::DEFAULT_SERVO_MAX);
        Self {
            output: OutputKind::ServoPositional,
            unit_min: 0.0,
            unit_max: max,
            startup_power: 0.0,
            ..Self::pwm(PowerUnit::Pwm255)
        }
    }

    /// 开关输出配置
    pub fn binary() -> Self {
        Self {
            output: OutputKind::BinaryOnOff,
            ..Self::pwm(PowerUnit::Pwm255)
        }
    }

    /// 设置内联交付策略（链式）
    pub fn with_inline_strategy(mut self, strategy: InlineStrategy) -> Self {
        self.inline_strategy = strategy;
        self
    }

    /// 设置是否支持转向控制（链式）
    pub fn with_direction_control(mut self, enabled: bool) -> Self {
        self.direction_control = enabled;
        self
    }

    /// 校验配置
    ///
    /// 在构建期调用，运行期间不再校验。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range_ok = self.unit_max.is_finite()
            && self.unit_min.is_finite()
            && self.unit_max > 0.0
            && self.unit_min >= 0.0
            && self.unit_min <= self.unit_max;
        if !range_ok {
            return Err(ConfigError::InvalidUnitRange {
                min: self.unit_min,
                max: self.unit_max,
            });
        }

        if !(0.0..=self.unit_max).contains(&self.startup_power) {
            return Err(ConfigError::StartupOutOfRange {
                startup: self.startup_power,
                min: self.unit_min,
                max: self.unit_max,
            });
        }

        if self.output == OutputKind::ServoPositional && self.servo_max_position == 0 {
            return Err(ConfigError::ZeroServoRange);
        }

        if !(self.dynamic_feedrate_max.is_finite() && self.dynamic_feedrate_max > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "dynamic_feedrate_max".to_string(),
                value: self.dynamic_feedrate_max,
            });
        }

        Ok(())
    }
}
