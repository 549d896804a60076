//! 配置管理命令
//!
//! 配置文件查找顺序：`--config <path>`，否则 `<config_dir>/arm-sweep/session.toml`，
//! 都不存在时使用内置默认值。

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use sweep_control::SessionConfig;

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("arm-sweep");
    path.push("session.toml");
    Ok(path)
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// 从文件加载
    File(PathBuf),
    /// 内置默认值
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// 加载会话配置
///
/// 显式指定的文件必须存在；默认位置的文件不存在时回退到内置默认值。
pub fn load_config(explicit: Option<&Path>) -> Result<(SessionConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = SessionConfig::load(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let path = default_config_file()?;
    if path.exists() {
        let config = SessionConfig::load(&path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?;
        return Ok((config, ConfigSource::File(path)));
    }

    Ok((SessionConfig::default(), ConfigSource::Defaults))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 显示生效的配置
    Show {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 校验配置
    Check,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, explicit: Option<PathBuf>) -> Result<()> {
        match self {
            ConfigCommand::Init { force } => Self::init_(explicit, force).await,

            ConfigCommand::Show { json } => Self::show_(explicit, json).await,

            ConfigCommand::Check => Self::check_(explicit).await,

            ConfigCommand::Path => {
                let path = match explicit {
                    Some(path) => path,
                    None => default_config_file()?,
                };
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    async fn init_(explicit: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match explicit {
            Some(path) => path,
            None => default_config_file()?,
        };

        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        SessionConfig::default()
            .save(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    async fn show_(explicit: Option<PathBuf>, json: bool) -> Result<()> {
        let (config, source) = load_config(explicit.as_deref())?;

        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!("# source: {}", source);
            print!("{}", config.to_toml_string()?);
        }
        Ok(())
    }

    async fn check_(explicit: Option<PathBuf>) -> Result<()> {
        let (config, source) = load_config(explicit.as_deref())?;
        let validated = config.validate().with_context(|| format!("配置无效: {}", source))?;

        println!("✅ 配置有效: {}", source);
        println!("   机械臂: {}", validated.actuator_address());
        println!(
            "   时长: {:?} @ {} Hz ({} ticks, {:?} pacing)",
            validated.duration(),
            validated.frequency_hz(),
            validated.planned_ticks(),
            validated.pacing()
        );
        for osc in validated.oscillations() {
            println!(
                "   {}: ±{:.2}° @ {} Hz ({:?})",
                osc.joint,
                osc.amplitude.to_deg().0,
                osc.frequency_hz,
                osc.waveform
            );
        }
        let controlled: Vec<String> = validated
            .pid()
            .iter_joints()
            .filter(|(_, gains)| gains.is_some())
            .map(|(j, _)| j.to_string())
            .collect();
        println!("   PID: {}", controlled.join(", "));
        Ok(())
    }
}
