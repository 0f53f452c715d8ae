use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_RECENT_PATHS: usize = 10;
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

/// 單幀摘要演算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerKind {
    #[default]
    Average,
    HsvMode,
    #[serde(rename = "kmeans_palette")]
    KMeansPalette,
}

impl SummarizerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::HsvMode => "hsv_mode",
            Self::KMeansPalette => "kmeans_palette",
        }
    }
}

impl fmt::Display for SummarizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 條碼圖版面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripLayout {
    #[default]
    Gradient,
    Histogram,
}

impl fmt::Display for StripLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gradient => write!(f, "gradient"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// 條碼圖產生設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeSettings {
    pub summarizer: SummarizerKind,
    pub layout: StripLayout,
    /// 每隔幾幀取樣一次（1 = 每幀）
    pub frame_stride: usize,
    /// 依每秒幀數分桶平均
    pub aggregate_by_second: bool,
    pub strip_width: u32,
    pub strip_height: u32,
    pub bell_easing: bool,
    pub output_format: OutputFormat,
    /// `None` 使用全部 CPU
    pub worker_count: Option<usize>,
    /// 解碼時先縮小到此寬度以加速，`None` 保留原始尺寸
    pub decode_width: Option<u32>,
    pub use_cache: bool,
    pub kmeans_seed: Option<u64>,
}

impl Default for BarcodeSettings {
    fn default() -> Self {
        Self {
            summarizer: SummarizerKind::default(),
            layout: StripLayout::default(),
            frame_stride: 1,
            aggregate_by_second: true,
            strip_width: 1920,
            strip_height: 1080,
            bell_easing: true,
            output_format: OutputFormat::default(),
            worker_count: None,
            decode_width: Some(320),
            use_cache: true,
            kmeans_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub barcode: BarcodeSettings,
    /// 最近使用的影片路徑（新到舊）
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
