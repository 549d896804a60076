//! # Sweep CLI
//!
//! 振荡扫描的命令行入口。
//!
//! ```bash
//! # 生成默认配置
//! sweep-cli config init
//!
//! # 在模拟器上运行一次会话，轨迹写到 ./traces/circular_*.bin
//! sweep-cli run --output-dir traces
//!
//! # 查看轨迹统计
//! sweep-cli inspect --dir traces
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `sweep_cli=info,sweep_control=info`。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, InspectCommand, RunCommand};

/// Sweep CLI - 振荡扫描工具
#[derive(Parser, Debug)]
#[command(name = "sweep-cli")]
#[command(about = "PID-corrected oscillation sweep for 6-axis arms", long_about = None)]
#[command(version)]
struct Cli {
    /// 会话配置文件（默认 <config_dir>/arm-sweep/session.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行一次会话（回零 → 跟踪 → 返回）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 查看已录制的轨迹
    Inspect {
        #[command(flatten)]
        args: InspectCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sweep_cli=info,sweep_control=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => args.execute(cli.config).await,
        Commands::Config(cmd) => cmd.execute(cli.config).await,
        Commands::Inspect { args } => args.execute().await,
    }
}
