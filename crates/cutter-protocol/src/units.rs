//! 功率单位换算
//!
//! 把用户功率（S 值，单位由 `PowerUnit` 决定）换算为硬件值：
//! PWM 占空比 [0, 255]、舵机位置 [0, servo_max] 或开关量 {0, 255}。
//!
//! 换算器在启动时根据配置构建一次，之后只做纯函数计算。

use crate::config::{CutterConfig, OutputKind};

/// PWM 占空比上限
pub const PWM_MAX: u8 = u8::MAX;

/// 功率换算器
///
/// # 性质
///
/// - 纯函数，无副作用，结果确定
/// - 输入先钳位到配置范围（NaN / 负数 → 0）
/// - 任何输出类型下 `0 → 0`
/// - PWM 和舵机类型下单调不减
///
/// # Example
///
/// ```
/// use cutter_protocol::{CutterConfig, UnitConverter};
///
/// let converter = UnitConverter::new(&CutterConfig::default());
/// assert_eq!(converter.to_hardware_value(128.0), 128);
/// assert_eq!(converter.to_hardware_value(1_000.0), 255); // 钳位
/// assert_eq!(converter.to_hardware_value(-5.0), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    kind: OutputKind,
    unit_min: f32,
    unit_max: f32,
    servo_max: u8,
}

impl UnitConverter {
    /// 根据配置构建换算器
    pub fn new(config: &CutterConfig) -> Self {
        Self {
            kind: config.output,
            unit_min: config.unit_min,
            unit_max: config.unit_max,
            servo_max: config.servo_max_position,
        }
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn unit_max(&self) -> f32 {
        self.unit_max
    }

    /// 硬件值上限（PWM/开关为 255，舵机为 `servo_max`）
    pub fn hardware_max(&self) -> u8 {
        match self.kind {
            OutputKind::ServoPositional => self.servo_max,
            OutputKind::PwmCapable | OutputKind::BinaryOnOff => PWM_MAX,
        }
    }

    /// 把用户功率钳位到有效范围
    ///
    /// - `<= 0`（以及 NaN）→ `0`，即 "S0 关闭刀具"
    /// - 其余值钳位到 `[unit_min, unit_max]`，`unit_min` 作为非零功率的地板值
    ///
    /// 未经校验的倒置范围（`unit_min > unit_max`）不会 panic，上限优先。
    pub fn power_to_range(&self, power: f32) -> f32 {
        // `!(x > 0)` 同时覆盖 NaN
        if !(power > 0.0) {
            return 0.0;
        }
        power.max(self.unit_min).min(self.unit_max)
    }

    /// 用户功率 → 硬件值
    ///
    /// 舵机类型直接使用钳位后的用户值作为位置，再限制在 `servo_max` 以内。
    pub fn to_hardware_value(&self, unit_power: f32) -> u8 {
        let power = self.power_to_range(unit_power);
        match self.kind {
            OutputKind::BinaryOnOff => {
                if power > 0.0 {
                    PWM_MAX
                } else {
                    0
                }
            },
            OutputKind::PwmCapable => self.scale(power, PWM_MAX),
            OutputKind::ServoPositional => {
                let position = power.round().min(f32::from(self.servo_max));
                position.max(0.0) as u8
            },
        }
    }

    /// 硬件值 → 用户功率（用于显示，开关类型返回 0 或上限）
    pub fn hardware_to_unit(&self, value: u8) -> f32 {
        let top = self.hardware_max();
        if top == 0 || value == 0 {
            return 0.0;
        }
        match self.kind {
            OutputKind::BinaryOnOff => self.unit_max,
            OutputKind::ServoPositional => f32::from(value.min(top)),
            OutputKind::PwmCapable => f32::from(value) / f32::from(top) * self.unit_max,
        }
    }

    /// 线性映射 `[0, unit_max] → [0, top]`
    fn scale(&self, power: f32, top: u8) -> u8 {
        if !(self.unit_max > 0.0) {
            return 0;
        }
        let top_f = f32::from(top);
        let scaled = (power / self.unit_max * top_f).round();
        scaled.max(0.0).min(top_f) as u8
    }
}

/// 使用给定配置换算功率（一次性调用的便捷函数）
pub fn to_hardware_value(unit_power: f32, config: &CutterConfig) -> u8 {
    UnitConverter::new(config).to_hardware_value(unit_power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PowerUnit;

    #[test]
    fn test_pwm_identity_for_pwm255_unit() {
        let converter = UnitConverter::new(&CutterConfig::default());
        assert_eq!(converter.to_hardware_value(0.0), 0);
        assert_eq!(converter.to_hardware_value(1.0), 1);
        assert_eq!(converter.to_hardware_value(128.0), 128);
        assert_eq!(converter.to_hardware_value(255.0), 255);
    }

    #[test]
    fn test_pwm_percent_unit() {
        let converter = UnitConverter::new(&CutterConfig::pwm(PowerUnit::Percent));
        assert_eq!(converter.to_hardware_value(0.0), 0);
        assert_eq!(converter.to_hardware_value(50.0), 128); // 127.5 四舍五入
        assert_eq!(converter.to_hardware_value(100.0), 255);
        assert_eq!(converter.to_hardware_value(150.0), 255);
    }

    #[test]
    fn test_rpm_floor_applies_to_nonzero_only() {
        let converter = UnitConverter::new(&CutterConfig::pwm(PowerUnit::Rpm));
        assert_eq!(converter.power_to_range(0.0), 0.0);
        assert_eq!(converter.power_to_range(100.0), 5_000.0);
        assert_eq!(converter.power_to_range(40_000.0), 30_000.0);
        assert_eq!(converter.to_hardware_value(0.0), 0);
        assert_eq!(converter.to_hardware_value(30_000.0), 255);
        assert_eq!(converter.to_hardware_value(15_000.0), 128);
        // 低于地板值的非零请求按地板值换算
        assert_eq!(
            converter.to_hardware_value(100.0),
            converter.to_hardware_value(5_000.0)
        );
    }

    #[test]
    fn test_binary_on_off() {
        let converter = UnitConverter::new(&CutterConfig::binary());
        assert_eq!(converter.to_hardware_value(0.0), 0);
        assert_eq!(converter.to_hardware_value(1.0), 255);
        assert_eq!(converter.to_hardware_value(0.01), 255);
        assert_eq!(converter.to_hardware_value(-1.0), 0);
        assert_eq!(converter.hardware_max(), 255);
    }

    #[test]
    fn test_servo_identity_with_default_range() {
        let converter = UnitConverter::new(&CutterConfig::servo());
        assert_eq!(converter.hardware_max(), 180);
        assert_eq!(converter.to_hardware_value(0.0), 0);
        assert_eq!(converter.to_hardware_value(90.0), 90);
        assert_eq!(converter.to_hardware_value(180.0), 180);
        assert_eq!(converter.to_hardware_value(255.0), 180);
    }

    #[test]
    fn test_servo_position_is_not_rescaled() {
        // 其余字段取 PWM 默认值（unit_max = 255）
        let config = CutterConfig {
            output: OutputKind::ServoPositional,
            ..CutterConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(to_hardware_value(90.0, &config), 90);
        assert_eq!(to_hardware_value(180.0, &config), 180);
        // 超出舵机行程时停在 servo_max
        assert_eq!(to_hardware_value(255.0, &config), 180);
        assert_eq!(to_hardware_value(0.0, &config), 0);
    }

    #[test]
    fn test_servo_smaller_position_range() {
        let config = CutterConfig {
            unit_max: 100.0,
            servo_max_position: 90,
            ..CutterConfig::servo()
        };
        let converter = UnitConverter::new(&config);
        assert_eq!(converter.to_hardware_value(50.0), 50);
        assert_eq!(converter.to_hardware_value(89.6), 90);
        assert_eq!(converter.to_hardware_value(100.0), 90);
        assert_eq!(converter.hardware_to_unit(45), 45.0);
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        let config = CutterConfig {
            unit_min: 200.0,
            unit_max: 100.0,
            ..CutterConfig::default()
        };
        assert!(config.validate().is_err());

        let converter = UnitConverter::new(&config);
        assert_eq!(converter.power_to_range(150.0), 100.0);
        assert_eq!(converter.power_to_range(0.0), 0.0);
        assert_eq!(to_hardware_value(150.0, &config), 255);
        assert_eq!(to_hardware_value(0.0, &config), 0);

        let servo = CutterConfig {
            unit_min: 200.0,
            unit_max: 100.0,
            ..CutterConfig::servo()
        };
        assert_eq!(to_hardware_value(150.0, &servo), 100);
    }

    #[test]
    fn test_nan_is_treated_as_off() {
        for config in [
            CutterConfig::default(),
            CutterConfig::servo(),
            CutterConfig::binary(),
        ] {
            assert_eq!(to_hardware_value(f32::NAN, &config), 0);
        }
    }

    #[test]
    fn test_hardware_to_unit() {
        let converter = UnitConverter::new(&CutterConfig::pwm(PowerUnit::Percent));
        assert_eq!(converter.hardware_to_unit(0), 0.0);
        assert_eq!(converter.hardware_to_unit(255), 100.0);

        let servo = UnitConverter::new(&CutterConfig::servo());
        assert_eq!(servo.hardware_to_unit(90), 90.0);
        assert_eq!(servo.hardware_to_unit(200), 180.0);

        let binary = UnitConverter::new(&CutterConfig::binary());
        assert_eq!(binary.hardware_to_unit(255), 255.0);
        assert_eq!(binary.hardware_to_unit(0), 0.0);
    }
}
