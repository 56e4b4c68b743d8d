//! convert 命令
//!
//! 打印用户功率 → 硬件值的换算表，以及硬件值实际对应的用户功率

use anyhow::Result;
use clap::{Args, ValueEnum};
use cutter_protocol::{CutterConfig, OutputKind, PowerUnit, UnitConverter};
use std::path::Path;

use crate::commands::config::{CliConfig, resolve_path};

/// 输出类型（命令行覆盖）
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArg {
    Pwm,
    Servo,
    Binary,
}

/// 功率单位（命令行覆盖）
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitArg {
    Pwm255,
    Percent,
    Rpm,
}

impl From<UnitArg> for PowerUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Pwm255 => PowerUnit::Pwm255,
            UnitArg::Percent => PowerUnit::Percent,
            UnitArg::Rpm => PowerUnit::Rpm,
        }
    }
}

/// 换算表的一行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRow {
    /// 请求的用户功率
    pub requested: f32,
    /// 写入硬件的值
    pub hardware: u8,
    /// 硬件值折算回用户单位（量化后的实际功率）
    pub effective: f32,
}

/// 换算命令参数
#[derive(Args, Debug)]
pub struct ConvertCommand {
    /// 用户功率值
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<f32>,

    /// 输出类型（覆盖配置）
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,

    /// 功率单位（覆盖配置，使用该单位的默认范围）
    #[arg(short, long, value_enum)]
    pub unit: Option<UnitArg>,
}

impl ConvertCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let base = CliConfig::load(&resolve_path(config_path)?)?.cutter;
        let config = self.effective_config(base);
        config.validate()?;

        let converter = UnitConverter::new(&config);
        println!(
            "{:?} / {:?} (范围 {} - {})",
            config.output, config.unit, config.unit_min, config.unit_max
        );
        for row in self.table(&converter) {
            println!(
                "  {:>10} → {:>3}  (≈ {:.2})",
                row.requested, row.hardware, row.effective
            );
        }
        Ok(())
    }

    /// 应用命令行覆盖
    fn effective_config(&self, base: CutterConfig) -> CutterConfig {
        let mut config = match self.unit {
            Some(unit) => CutterConfig {
                output: base.output,
                ..CutterConfig::pwm(unit.into())
            },
            None => base,
        };

        match self.output {
            Some(OutputArg::Pwm) => config.output = OutputKind::PwmCapable,
            Some(OutputArg::Binary) => config.output = OutputKind::BinaryOnOff,
            Some(OutputArg::Servo) => {
                config = CutterConfig {
                    inline_strategy: config.inline_strategy,
                    ..CutterConfig::servo()
                };
            },
            None => {},
        }
        config
    }

    fn table(&self, converter: &UnitConverter) -> Vec<ConversionRow> {
        self.values
            .iter()
            .map(|&requested| {
                let hardware = converter.to_hardware_value(requested);
                ConversionRow {
                    requested,
                    hardware,
                    effective: converter.hardware_to_unit(hardware),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(values: Vec<f32>, output: Option<OutputArg>, unit: Option<UnitArg>) -> ConvertCommand {
        ConvertCommand {
            values,
            output,
            unit,
        }
    }

    fn hardware_column(table: &[ConversionRow]) -> Vec<(f32, u8)> {
        table.iter().map(|row| (row.requested, row.hardware)).collect()
    }

    #[test]
    fn test_pwm_table() {
        let cmd = command(vec![0.0, 128.0, 999.0, -1.0], None, None);
        let config = cmd.effective_config(CutterConfig::default());
        let table = cmd.table(&UnitConverter::new(&config));
        assert_eq!(
            hardware_column(&table),
            vec![(0.0, 0), (128.0, 128), (999.0, 255), (-1.0, 0)]
        );
        assert_eq!(table[0].effective, 0.0);
        assert_eq!(table[2].effective, 255.0);
    }

    #[test]
    fn test_effective_power_shows_quantization() {
        let cmd = command(vec![50.0, 100.0], None, Some(UnitArg::Percent));
        let config = cmd.effective_config(CutterConfig::default());
        let table = cmd.table(&UnitConverter::new(&config));

        // 50% → 128/255
        assert_eq!(table[0].hardware, 128);
        assert!((table[0].effective - 50.196).abs() < 0.01);
        assert_eq!(table[1].hardware, 255);
        assert_eq!(table[1].effective, 100.0);
    }

    #[test]
    fn test_overrides() {
        let cmd = command(vec![50.0], None, Some(UnitArg::Percent));
        let config = cmd.effective_config(CutterConfig::default());
        assert_eq!(config.unit, PowerUnit::Percent);
        assert_eq!(
            hardware_column(&cmd.table(&UnitConverter::new(&config))),
            vec![(50.0, 128)]
        );

        let cmd = command(vec![90.0], Some(OutputArg::Servo), None);
        let config = cmd.effective_config(CutterConfig::default());
        assert_eq!(config.output, OutputKind::ServoPositional);
        let table = cmd.table(&UnitConverter::new(&config));
        assert_eq!(hardware_column(&table), vec![(90.0, 90)]);
        assert_eq!(table[0].effective, 90.0);

        let cmd = command(vec![0.5], Some(OutputArg::Binary), None);
        let config = cmd.effective_config(CutterConfig::default());
        let table = cmd.table(&UnitConverter::new(&config));
        assert_eq!(hardware_column(&table), vec![(0.5, 255)]);
        assert_eq!(table[0].effective, 255.0);
    }
}
