//! run 命令
//!
//! 在日志输出上回放脚本文件

use anyhow::{Context, Result};
use clap::Args;
use cutter_driver::CutterBuilder;
use cutter_hal::LogOutput;
use cutter_protocol::InlineStrategy;
use std::path::{Path, PathBuf};

use crate::commands::config::{CliConfig, resolve_path};
use crate::script;

/// 脚本执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 脚本文件路径
    #[arg(short, long)]
    pub script: PathBuf,

    /// 使用同步标记策略交付内联功率（覆盖配置）
    #[arg(long)]
    pub power_sync: bool,
}

impl RunCommand {
    /// 执行脚本
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let mut config = CliConfig::load(&resolve_path(config_path)?)?;
        if self.power_sync {
            config.cutter.inline_strategy = InlineStrategy::PowerSync;
        }

        println!("📜 加载脚本: {}", self.script.display());
        let lines = script::load_script(&self.script)?;
        println!("    {} 个命令", lines.len());
        println!();

        let output = LogOutput::new(config.cutter.direction_control);
        let cutter = CutterBuilder::new()
            .config(config.cutter)
            .stepper_config(config.stepper)
            .build(output)
            .context("启动刀具驱动失败")?;

        let result = script::execute(&cutter, &lines)?;
        let state = cutter.state();
        let metrics = cutter.metrics();

        println!();
        println!("📊 执行结果:");
        println!("  总命令数: {}", result.total_commands);
        println!("  刀具命令: {}", result.cutter_commands);
        println!("  运动块: {}", result.moves);
        println!("  耗时: {:.3} 秒", result.duration_secs);
        println!();
        println!("🔧 刀具状态:");
        println!("  模式: {:?}", state.mode);
        println!("  使能: {}", state.enabled);
        println!("  转向: {:?}", state.direction);
        println!("  功率: {} (硬件值 {})", state.unit_power, state.hardware_value);
        println!();
        println!("⏱  步进线程:");
        println!("  已执行块: {}", metrics.blocks_executed);
        println!("  同步标记: {}", metrics.sync_markers_applied);
        println!("  内联写入: {}", metrics.inline_power_writes);
        println!("  输出错误: {}", metrics.output_errors);

        Ok(())
    }
}
