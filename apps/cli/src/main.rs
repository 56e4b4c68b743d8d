//! # Cutter CLI
//!
//! 主轴/激光刀具功率控制的命令行工具。
//!
//! ```bash
//! # 写入默认配置（~/.config/cutter/config.toml）
//! cutter-cli config init
//!
//! # 回放脚本
//! cutter-cli run --script job.txt
//!
//! # 查看换算表
//! cutter-cli convert --unit percent 0 25 50 100
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod script;

use commands::{ConfigCommand, ConvertCommand, RunCommand};

/// Cutter CLI - 刀具功率控制命令行工具
#[derive(Parser, Debug)]
#[command(name = "cutter-cli")]
#[command(about = "Command-line interface for spindle/laser cutter power control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认使用用户配置目录）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 执行脚本
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 功率换算表
    Convert {
        #[command(flatten)]
        args: ConvertCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cutter_cli=info".parse()?)
                .add_directive("cutter_driver=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(config),
        Commands::Run { args } => args.execute(config),
        Commands::Convert { args } => args.execute(config),
    }
}
