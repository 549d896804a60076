//! 运行命令
//!
//! 在进程内模拟器上执行一次完整会话，并把三类轨迹写到输出目录。

use super::config::load_config;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use sweep_client::{MonotonicClock, SimulatedArm};
use sweep_control::{Pacing, SessionError, SessionReport, TelemetryRecorder, run_session};
use sweep_tools::{TraceMetadata, TracePaths};
use tracing::{info, warn};

/// 运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 轨迹输出目录
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// 轨迹文件名前缀（生成 <name>_motion_data.bin 等）
    #[arg(short, long, default_value = "circular")]
    pub name: String,

    /// 覆盖跟踪时长（秒）
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// 覆盖控制频率（Hz）
    #[arg(short, long)]
    pub frequency: Option<f64>,

    /// 覆盖回零后的稳定时间（秒）
    #[arg(long)]
    pub settle: Option<f64>,

    /// 使用固定网格截止时刻（消除累计漂移）
    #[arg(long)]
    pub deadline_pacing: bool,

    /// 模拟器一阶响应时间常数（秒）
    #[arg(long, default_value_t = SimulatedArm::DEFAULT_TAU)]
    pub sim_tau: f64,
}

impl RunCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let (mut config, source) = load_config(config_path.as_deref())?;
        if let Some(duration) = self.duration {
            config.duration_s = duration;
        }
        if let Some(frequency) = self.frequency {
            config.frequency_hz = frequency;
        }
        if let Some(settle) = self.settle {
            config.settle_s = settle;
        }
        if self.deadline_pacing {
            config.pacing = Pacing::Deadline;
        }
        let config = config.validate().with_context(|| format!("配置无效: {}", source))?;

        info!("Using config from {}", source);
        info!(
            "Actuator {} is driven by the in-process simulator",
            config.actuator_address()
        );

        let interrupt = Arc::new(AtomicBool::new(false));
        {
            let interrupt = Arc::clone(&interrupt);
            ctrlc::set_handler(move || {
                interrupt.store(true, Ordering::SeqCst);
            })
            .context("注册 Ctrl-C 处理器失败")?;
        }

        let metadata = TraceMetadata {
            notes: format!("simulated; config: {}", source),
            ..TraceMetadata::new(config.actuator_address(), config.frequency_hz())
        };
        let mut recorder = TelemetryRecorder::spawn(metadata, config.channel_capacity())?;
        let arm = SimulatedArm::new(*config.base()).with_time_constant(self.sim_tau);

        println!("⏳ 运行中（Ctrl-C 提前结束）...");

        // 控制循环是阻塞的，放到专用线程
        let (recorder, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = run_session(arm, MonotonicClock::new(), config, &mut recorder, interrupt);
            (recorder, outcome)
        })
        .await
        .context("控制线程异常退出")?;

        let traces = recorder.finish()?;
        let paths = traces
            .flush(&self.output_dir, &self.name)
            .with_context(|| format!("写入轨迹失败: {}", self.output_dir.display()))?;

        match outcome {
            Ok(report) => {
                print_report(&report);
                print_paths(&paths);
                Ok(())
            },
            Err(err) => {
                if let SessionError::Tracking { ticks, .. } = &err {
                    warn!("Partial traces ({} ticks) saved before failure", ticks);
                }
                print_paths(&paths);
                Err(err.into())
            },
        }
    }
}

fn print_report(report: &SessionReport) {
    let status = if report.interrupted { "⚠️  已中断" } else { "✅ 完成" };
    println!("{}: {} / {} ticks in {:.2?}", status, report.ticks, report.planned_ticks, report.elapsed);
    println!("   超时 tick: {} (最长 {:.2?})", report.overruns, report.max_tick);
    println!("   丢弃样本: {}", report.dropped_samples);

    let saturation: Vec<String> = report
        .saturation
        .iter_joints()
        .filter(|(_, n)| **n > 0)
        .map(|(j, n)| format!("{}={}", j, n))
        .collect();
    if saturation.is_empty() {
        println!("   PID 限幅: 无");
    } else {
        println!("   PID 限幅: {}", saturation.join(", "));
    }
}

fn print_paths(paths: &TracePaths) {
    println!("💾 运动轨迹: {}", paths.motion.display());
    println!("💾 电流轨迹: {}", paths.power.display());
    println!("💾 位姿轨迹: {}", paths.tcp.display());
}
