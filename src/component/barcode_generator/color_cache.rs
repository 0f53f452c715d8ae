use crate::config::SummarizerKind;
use crate::tools::FrameColor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CACHE_VERSION: u32 = 1;

/// 序列化顏色序列
pub fn encode_colors(colors: &[FrameColor]) -> Result<Vec<u8>> {
    serde_json::to_vec(colors).context("無法序列化顏色序列")
}

/// 反序列化顏色序列；內容損毀時回傳錯誤
pub fn decode_colors(bytes: &[u8]) -> Result<Vec<FrameColor>> {
    serde_json::from_slice(bytes).context("無法解析顏色序列")
}

/// 取樣結果快取，重新執行時可跳過解碼與摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCache {
    pub version: u32,
    /// 來源影片識別碼（見 `calculate_file_fingerprint`）
    pub source_fingerprint: String,
    pub summarizer: SummarizerKind,
    pub frame_stride: usize,
    pub frame_rate: f64,
    pub colors: Vec<FrameColor>,
}

impl ColorCache {
    #[must_use]
    pub const fn new(
        source_fingerprint: String,
        summarizer: SummarizerKind,
        frame_stride: usize,
        frame_rate: f64,
        colors: Vec<FrameColor>,
    ) -> Self {
        Self {
            version: CACHE_VERSION,
            source_fingerprint,
            summarizer,
            frame_stride,
            frame_rate,
            colors,
        }
    }

    /// 讀取快取；檔案不存在時回傳 `None`，內容損毀時回傳錯誤
    pub fn load_from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read(path).with_context(|| format!("無法讀取快取檔案: {}", path.display()))?;

        let cache = serde_json::from_slice(&content)
            .with_context(|| format!("快取檔案損毀: {}", path.display()))?;

        Ok(Some(cache))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("無法序列化快取")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("無法建立目錄: {}", parent.display()))?;
        }

        fs::write(path, content)
            .with_context(|| format!("無法寫入快取檔案: {}", path.display()))?;

        Ok(())
    }

    /// 快取是否對應同一支影片與相同的取樣設定
    #[must_use]
    pub fn matches(&self, fingerprint: &str, summarizer: SummarizerKind, frame_stride: usize) -> bool {
        self.version == CACHE_VERSION
            && self.source_fingerprint == fingerprint
            && self.summarizer == summarizer
            && self.frame_stride == frame_stride
    }
}
