//! # Nesting CLI
//!
//! Command-line interface for the pick-and-place nesting cell.
//!
//! ```bash
//! # 生成默认配置
//! nesting-cli config init --path nesting.toml
//!
//! # 在 Mock 工作站上模拟一次完整操作
//! nesting-cli simulate --config nesting.toml --batches 3 --plane-capacity 5 --fast
//!
//! # 打印状态转换表
//! nesting-cli states
//! ```
//!
//! 模拟过程中按 Ctrl-C 请求停止（执行清理），再按一次急停。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, SimulateCommand, StatesCommand};

/// 默认日志过滤
const DEFAULT_LOG_FILTER: &str = "nesting_cli=info,nesting_process=info";

/// Nesting CLI - 拾取-放置工作站命令行工具
#[derive(Parser, Debug)]
#[command(name = "nesting-cli")]
#[command(about = "Command-line interface for the pick-and-place nesting cell", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在 Mock 工作站上运行一次拾取-放置操作
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 打印状态与转换表
    States {
        #[command(flatten)]
        args: StatesCommand,
    },
}

fn init_logging() -> Result<()> {
    // 把 `log` 记录转发到 tracing
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { args } => {
            let result = args.execute()?;
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        },
        Commands::Config(cmd) => cmd.execute(),
        Commands::States { args } => {
            args.execute();
            Ok(())
        },
    }
}
