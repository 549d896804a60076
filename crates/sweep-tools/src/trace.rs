//! # 轨迹录制格式
//!
//! 控制循环每个 tick 产生三类样本，分别落盘为三个独立文件：
//!
//! | 类型 | 列 | 文件名后缀 |
//! |------|----|-----------|
//! | [`MotionSample`] | 时间戳 + 关节位置(6) + 关节速度(6) + 末端位姿(6) | `_motion_data.bin` |
//! | [`PowerSample`] | 时间戳 + 关节电流(6) | `_power_data.bin` |
//! | [`TcpSample`] | 时间戳 + 末端位姿(6) | `_tcp_trace.bin` |
//!
//! 每个文件都是按时间戳排序的定宽数值行。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 轨迹文件魔数（用于文件格式识别）
pub const MAGIC: &[u8; 8] = b"SWEEPTR\0";

/// 当前文件格式版本
pub const FORMAT_VERSION: u8 = 1;

/// 轨迹类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceKind {
    /// 运动轨迹（位置、速度、末端位姿）
    Motion,
    /// 电流轨迹
    Power,
    /// 末端位姿轨迹
    Tcp,
}

impl TraceKind {
    /// 所有轨迹类型
    pub const ALL: [TraceKind; 3] = [TraceKind::Motion, TraceKind::Power, TraceKind::Tcp];

    /// 文件头中的类型标记
    pub const fn tag(self) -> u8 {
        match self {
            TraceKind::Motion => 1,
            TraceKind::Power => 2,
            TraceKind::Tcp => 3,
        }
    }

    /// 从类型标记解析
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(TraceKind::Motion),
            2 => Some(TraceKind::Power),
            3 => Some(TraceKind::Tcp),
            _ => None,
        }
    }

    /// 文件名后缀
    pub const fn file_suffix(self) -> &'static str {
        match self {
            TraceKind::Motion => "motion_data",
            TraceKind::Power => "power_data",
            TraceKind::Tcp => "tcp_trace",
        }
    }

    /// 每行的列数（含时间戳）
    pub const fn width(self) -> usize {
        match self {
            TraceKind::Motion => 19,
            TraceKind::Power | TraceKind::Tcp => 7,
        }
    }

    /// 列名
    pub fn columns(self) -> Vec<String> {
        let mut columns = vec!["timestamp".to_string()];
        let pose = ["x", "y", "z", "rx", "ry", "rz"].map(|c| format!("tcp_{c}"));

        match self {
            TraceKind::Motion => {
                columns.extend(joint_columns("q"));
                columns.extend(joint_columns("qd"));
                columns.extend(pose);
            },
            TraceKind::Power => columns.extend(joint_columns("current")),
            TraceKind::Tcp => columns.extend(pose),
        }

        columns
    }

    /// 文件路径 `<dir>/<name>_<suffix>.bin`
    pub fn path_in(self, dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}_{}.bin", name, self.file_suffix()))
    }
}

/// `<prefix>_j1` .. `<prefix>_j6`
fn joint_columns(prefix: &str) -> impl Iterator<Item = String> + '_ {
    (1..=6).map(move |j| format!("{prefix}_j{j}"))
}

/// 可写入轨迹文件的定宽样本
pub trait TraceRow: Sized {
    /// 对应的轨迹类型
    const KIND: TraceKind;

    /// 时间戳（秒，自循环开始）
    fn timestamp(&self) -> f64;

    /// 展开为一行定宽数值
    fn row(&self) -> Vec<f64>;

    /// 从一行数值还原（列数不符时返回 `None`）
    fn from_row(row: &[f64]) -> Option<Self>;
}

fn take6(values: &[f64]) -> [f64; 6] {
    let mut out = [0.0; 6];
    out.copy_from_slice(&values[..6]);
    out
}

/// 运动样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// 时间戳（秒）
    pub timestamp: f64,
    /// 关节位置（rad）
    pub joint_positions: [f64; 6],
    /// 关节速度（rad/s）
    pub joint_velocities: [f64; 6],
    /// 末端位姿（x, y, z, rx, ry, rz）
    pub tcp_pose: [f64; 6],
}

impl TraceRow for MotionSample {
    const KIND: TraceKind = TraceKind::Motion;

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::KIND.width());
        row.push(self.timestamp);
        row.extend_from_slice(&self.joint_positions);
        row.extend_from_slice(&self.joint_velocities);
        row.extend_from_slice(&self.tcp_pose);
        row
    }

    fn from_row(row: &[f64]) -> Option<Self> {
        if row.len() != Self::KIND.width() {
            return None;
        }
        Some(Self {
            timestamp: row[0],
            joint_positions: take6(&row[1..7]),
            joint_velocities: take6(&row[7..13]),
            tcp_pose: take6(&row[13..19]),
        })
    }
}

/// 电流样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// 时间戳（秒）
    pub timestamp: f64,
    /// 关节电流（A）
    pub joint_currents: [f64; 6],
}

impl TraceRow for PowerSample {
    const KIND: TraceKind = TraceKind::Power;

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::KIND.width());
        row.push(self.timestamp);
        row.extend_from_slice(&self.joint_currents);
        row
    }

    fn from_row(row: &[f64]) -> Option<Self> {
        if row.len() != Self::KIND.width() {
            return None;
        }
        Some(Self {
            timestamp: row[0],
            joint_currents: take6(&row[1..7]),
        })
    }
}

/// 末端位姿样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TcpSample {
    /// 时间戳（秒）
    pub timestamp: f64,
    /// 末端位姿（x, y, z, rx, ry, rz）
    pub tcp_pose: [f64; 6],
}

impl TraceRow for TcpSample {
    const KIND: TraceKind = TraceKind::Tcp;

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(Self::KIND.width());
        row.push(self.timestamp);
        row.extend_from_slice(&self.tcp_pose);
        row
    }

    fn from_row(row: &[f64]) -> Option<Self> {
        if row.len() != Self::KIND.width() {
            return None;
        }
        Some(Self {
            timestamp: row[0],
            tcp_pose: take6(&row[1..7]),
        })
    }
}

/// 录制元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// 录制开始时间（Unix 时间戳，秒）
    pub start_time: u64,

    /// 控制频率（Hz）
    pub tick_frequency_hz: f64,

    /// 机械臂地址
    pub actuator: String,

    /// 平台信息
    pub platform: String,

    /// 备注
    pub notes: String,
}

impl TraceMetadata {
    /// 创建新的元数据
    pub fn new(actuator: impl Into<String>, tick_frequency_hz: f64) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        Self {
            start_time: SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs(),
            tick_frequency_hz,
            actuator: actuator.into(),
            platform: std::env::consts::OS.to_string(),
            notes: String::new(),
        }
    }
}

/// 单个轨迹文件
///
/// 文件格式：
/// ```text
/// [MAGIC: 8 bytes]
/// [Version: 1 byte]
/// [Kind: 1 byte]
/// [Data: bincode serialized TraceFile]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFile {
    /// 轨迹类型
    pub kind: TraceKind,

    /// 元数据
    pub metadata: TraceMetadata,

    /// 列名（长度等于行宽）
    pub columns: Vec<String>,

    /// 数据行（按时间戳排序）
    pub rows: Vec<Vec<f64>>,
}

impl TraceFile {
    /// 从样本序列构建
    pub fn from_samples<T: TraceRow>(metadata: TraceMetadata, samples: &[T]) -> Self {
        Self {
            kind: T::KIND,
            metadata,
            columns: T::KIND.columns(),
            rows: samples.iter().map(TraceRow::row).collect(),
        }
    }

    /// 行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 按列名取出一整列
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// 还原为样本序列
    pub fn samples<T: TraceRow>(&self) -> Result<Vec<T>> {
        if self.kind != T::KIND {
            anyhow::bail!("轨迹类型不匹配: 文件为 {:?}，期望 {:?}", self.kind, T::KIND);
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                T::from_row(row).with_context(|| format!("第 {} 行列数错误: {}", i, row.len()))
            })
            .collect()
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("创建轨迹文件失败: {}", path.display()))?;

        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC).context("写入魔数失败")?;
        writer.write_all(&[FORMAT_VERSION, self.kind.tag()]).context("写入文件头失败")?;

        let data = bincode::serialize(self).context("序列化轨迹失败")?;
        writer.write_all(&data).context("写入轨迹数据失败")?;

        writer.flush().context("刷新缓冲区失败")?;

        Ok(())
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("打开轨迹文件失败: {}", path.display()))?;

        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).context("读取魔数失败")?;
        if &magic != MAGIC {
            anyhow::bail!("无效的轨迹文件格式（魔数不匹配）");
        }

        let mut header = [0u8; 2];
        reader.read_exact(&mut header).context("读取文件头失败")?;
        if header[0] != FORMAT_VERSION {
            anyhow::bail!("不支持的轨迹文件版本: {}", header[0]);
        }
        let kind = TraceKind::from_tag(header[1])
            .with_context(|| format!("未知的轨迹类型标记: {}", header[1]))?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).context("读取轨迹数据失败")?;

        let trace: TraceFile = bincode::deserialize(&data).context("反序列化轨迹失败")?;

        if trace.kind != kind {
            anyhow::bail!("文件头类型 {:?} 与数据类型 {:?} 不一致", kind, trace.kind);
        }
        let width = kind.width();
        if trace.columns.len() != width {
            anyhow::bail!("列名数量 {} 与行宽 {} 不一致", trace.columns.len(), width);
        }
        if let Some((i, row)) = trace.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            anyhow::bail!("第 {} 行宽度为 {}，期望 {}", i, row.len(), width);
        }

        Ok(trace)
    }
}

/// 三个轨迹文件的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePaths {
    /// 运动轨迹
    pub motion: PathBuf,
    /// 电流轨迹
    pub power: PathBuf,
    /// 末端位姿轨迹
    pub tcp: PathBuf,
}

impl TracePaths {
    /// 计算 `<dir>/<name>_*.bin` 三个路径
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            motion: TraceKind::Motion.path_in(dir, name),
            power: TraceKind::Power.path_in(dir, name),
            tcp: TraceKind::Tcp.path_in(dir, name),
        }
    }
}

/// 一次会话的完整轨迹集合
///
/// 只追加，不修改已有样本。
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSet {
    /// 元数据
    pub metadata: TraceMetadata,
    /// 运动样本
    pub motion: Vec<MotionSample>,
    /// 电流样本
    pub power: Vec<PowerSample>,
    /// 末端位姿样本
    pub tcp: Vec<TcpSample>,
}

impl TraceSet {
    /// 创建空集合
    pub fn new(metadata: TraceMetadata) -> Self {
        Self {
            metadata,
            motion: Vec::new(),
            power: Vec::new(),
            tcp: Vec::new(),
        }
    }

    /// 预分配容量
    pub fn with_capacity(metadata: TraceMetadata, capacity: usize) -> Self {
        Self {
            metadata,
            motion: Vec::with_capacity(capacity),
            power: Vec::with_capacity(capacity),
            tcp: Vec::with_capacity(capacity),
        }
    }

    /// 追加一个 tick 的三类样本
    pub fn push_tick(&mut self, motion: MotionSample, power: PowerSample, tcp: TcpSample) {
        self.motion.push(motion);
        self.power.push(power);
        self.tcp.push(tcp);
    }

    /// 运动样本数（即 tick 数）
    pub fn len(&self) -> usize {
        self.motion.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.motion.is_empty()
    }

    /// 首末样本之间的时间跨度
    pub fn duration(&self) -> Option<Duration> {
        let first = self.motion.first()?.timestamp;
        let last = self.motion.last()?.timestamp;
        Some(Duration::from_secs_f64((last - first).max(0.0)))
    }

    /// 写出三个独立的轨迹文件
    ///
    /// 目录不存在时自动创建。
    pub fn flush<P: AsRef<Path>>(&self, dir: P, name: &str) -> Result<TracePaths> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("创建输出目录失败: {}", dir.display()))?;

        let paths = TracePaths::new(dir, name);
        TraceFile::from_samples(self.metadata.clone(), &self.motion).save(&paths.motion)?;
        TraceFile::from_samples(self.metadata.clone(), &self.power).save(&paths.power)?;
        TraceFile::from_samples(self.metadata.clone(), &self.tcp).save(&paths.tcp)?;

        Ok(paths)
    }

    /// 从 `flush` 写出的三个文件重新加载
    pub fn load<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        let paths = TracePaths::new(dir.as_ref(), name);

        let motion = TraceFile::load(&paths.motion)?;
        let power = TraceFile::load(&paths.power)?;
        let tcp = TraceFile::load(&paths.tcp)?;

        Ok(Self {
            metadata: motion.metadata.clone(),
            motion: motion.samples()?,
            power: power.samples()?,
            tcp: tcp.samples()?,
        })
    }
}
