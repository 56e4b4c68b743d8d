//! 配置管理命令
//!
//! 配置文件为 TOML，包含 `[cutter]` 和 `[stepper]` 两节，缺省字段使用默认值。

use anyhow::{Context, Result};
use clap::Subcommand;
use cutter_driver::StepperConfig;
use cutter_protocol::CutterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("cutter");
    path.push("config.toml");
    Ok(path)
}

/// 使用给定路径或默认路径
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_file(),
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 刀具配置
    pub cutter: CutterConfig,
    /// 步进线程配置
    pub stepper: StepperConfig,
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认配置）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("解析配置 TOML 失败")?;
        config.cutter.validate().context("配置校验失败")?;
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# Cutter CLI Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;
        Ok(())
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 显示当前配置
    Show,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: Option<&Path>) -> Result<()> {
        let path = resolve_path(path)?;
        match self {
            ConfigCommand::Init { force } => Self::init_(&path, force),
            ConfigCommand::Show => Self::show_(&path),
            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        CliConfig::default().save(path)?;
        println!("✅ 写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(path: &Path) -> Result<()> {
        let config = CliConfig::load(path)?;

        println!("配置文件: {}", path.display());
        println!("{}", toml::to_string_pretty(&config).context("序列化配置失败")?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutter_protocol::{InlineStrategy, OutputKind, PowerUnit};

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = CliConfig {
            cutter: CutterConfig::pwm(PowerUnit::Percent)
                .with_inline_strategy(InlineStrategy::PowerSync),
            stepper: StepperConfig {
                queue_capacity: 32,
                ..Default::default()
            },
        };
        config.save(&path).unwrap();

        assert_eq!(CliConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[cutter]\noutput = \"binary_on_off\"\n\n[stepper]\nramp_tick_us = 250\n",
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.cutter.output, OutputKind::BinaryOnOff);
        assert_eq!(config.cutter.unit_max, 255.0);
        assert_eq!(config.stepper.ramp_tick_us, 250);
        assert_eq!(config.stepper.queue_capacity, 16);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cutter]\nunit_max = -5.0\n").unwrap();

        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        ConfigCommand::Init { force: false }.execute(Some(&path)).unwrap();
        assert!(ConfigCommand::Init { force: false }.execute(Some(&path)).is_err());
        ConfigCommand::Init { force: true }.execute(Some(&path)).unwrap();
    }
}
