//! 配置管理命令
//!
//! 生成、校验和打印工作站配置文件（TOML）。

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use nesting_model::NestingConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "nesting.toml";

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置
    Init {
        /// 配置文件路径
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 加载、校验并打印配置
    Show {
        /// 配置文件路径（缺省时打印默认配置）
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => {
                init_config(&path, force)?;
                println!("✅ 默认配置已写入 {}", path.display());
                Ok(())
            },
            ConfigCommand::Show { path } => {
                print!("{}", render_config(path.as_deref())?);
                Ok(())
            },
        }
    }
}

/// 写入默认配置
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }
    NestingConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// 加载配置（未指定路径时使用默认值）
pub fn load_config(path: Option<&Path>) -> Result<NestingConfig> {
    match path {
        Some(path) => NestingConfig::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(NestingConfig::default()),
    }
}

fn render_config(path: Option<&Path>) -> Result<String> {
    let config = load_config(path)?;
    toml::to_string_pretty(&config).context("Failed to serialize config")
}
