//! 轨迹查看命令

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use sweep_client::Joint;
use sweep_tools::TraceSet;
use sweep_tools::statistics::{Summary, TraceStatistics};

/// 查看命令参数
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// 轨迹所在目录
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// 轨迹文件名前缀
    #[arg(short, long, default_value = "circular")]
    pub name: String,

    /// 以 JSON 输出统计
    #[arg(long)]
    pub json: bool,
}

impl InspectCommand {
    pub async fn execute(self) -> Result<()> {
        let set = TraceSet::load(&self.dir, &self.name)
            .with_context(|| format!("读取轨迹失败: {}/{}_*", self.dir.display(), self.name))?;
        let stats = TraceStatistics::calculate(&set);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("📼 {} @ {}", self.name, self.dir.display());
        println!("   机械臂: {}", set.metadata.actuator);
        println!("   平台: {}", set.metadata.platform);
        if !set.metadata.notes.is_empty() {
            println!("   备注: {}", set.metadata.notes);
        }
        println!("   样本: {} ({:.3?})", set.len(), set.duration().unwrap_or_default());
        println!(
            "   周期: 平均 {:.2}ms, 最大 {:.2}ms, 实际 {:.1} Hz, 延迟 {} 次",
            stats.ticks.interval.mean * 1000.0,
            stats.ticks.interval.max * 1000.0,
            stats.ticks.effective_hz,
            stats.ticks.late_ticks
        );

        println!();
        println!("   关节  位置范围(°)         速度RMS(rad/s)  电流RMS(A)");
        for joint in Joint::ALL {
            let j = joint.index();
            let (lo, hi) = degrees(&stats.joint_positions[j]);
            println!(
                "   {:<4}  [{:>7.3}, {:>7.3}]  {:>14.4}  {:>10.4}",
                joint, lo, hi, stats.joint_velocities[j].rms, stats.joint_currents[j].rms
            );
        }
        Ok(())
    }
}

fn degrees(summary: &Summary) -> (f64, f64) {
    (summary.min.to_degrees(), summary.max.to_degrees())
}
