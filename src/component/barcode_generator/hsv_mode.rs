//! HSV 色相眾數
//!
//! 以 360 個整數度數建立色相直方圖，平滑後取最多像素的色相區域。
//! 相較於單純平均，同一色系的深淺變化會被歸為一類，不會被其他顏色混成灰色。

use super::frame_summarizer::{FrameSummarizer, SummarizeError};
use crate::tools::{Color, FrameColor, PixelBuffer, hsv_to_rgb, rgb_to_hsv};

pub const HUE_BUCKETS: usize = 360;

/// 預設平滑半徑（左右各 10 度）
pub const DEFAULT_SMOOTHING_RADIUS: usize = 10;

/// 色相直方圖，另外累加每個色相的飽和度與明度
#[derive(Debug, Clone)]
pub struct HueHistogram {
    counts: [u64; HUE_BUCKETS],
    saturation_sums: [f64; HUE_BUCKETS],
    value_sums: [f64; HUE_BUCKETS],
}

impl Default for HueHistogram {
    fn default() -> Self {
        Self {
            counts: [0; HUE_BUCKETS],
            saturation_sums: [0.0; HUE_BUCKETS],
            value_sums: [0.0; HUE_BUCKETS],
        }
    }
}

impl HueHistogram {
    #[must_use]
    pub fn from_frame(frame: &PixelBuffer) -> Self {
        let mut histogram = Self::default();
        for pixel in frame.pixels() {
            let (r, g, b) = Color::from(*pixel).to_unit();
            let (h, s, v) = rgb_to_hsv(r, g, b);
            histogram.add(h, s, v);
        }
        histogram
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn add(&mut self, hue: f32, saturation: f32, value: f32) {
        // 浮點誤差可能讓色相落在 360.0
        let bucket = (hue.max(0.0) as usize).min(HUE_BUCKETS - 1);
        self.counts[bucket] += 1;
        self.saturation_sums[bucket] += f64::from(saturation);
        self.value_sums[bucket] += f64::from(value);
    }

    #[must_use]
    pub const fn counts(&self) -> &[u64; HUE_BUCKETS] {
        &self.counts
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// 視窗平滑：每個色相取 `[i-R, i+R]` 範圍內原始計數的總和
    ///
    /// 視窗在 0 與 359 兩端截斷，不會跨越 359 → 0 繞回。
    #[must_use]
    pub fn smoothed(&self, radius: usize) -> [u64; HUE_BUCKETS] {
        let mut prefix = [0u64; HUE_BUCKETS + 1];
        for (i, &count) in self.counts.iter().enumerate() {
            prefix[i + 1] = prefix[i] + count;
        }

        let mut smoothed = [0u64; HUE_BUCKETS];
        for (i, slot) in smoothed.iter_mut().enumerate() {
            let low = i.saturating_sub(radius);
            let high = (i + radius).min(HUE_BUCKETS - 1);
            *slot = prefix[high + 1] - prefix[low];
        }
        smoothed
    }

    /// 平滑後計數最大的色相
    ///
    /// 平滑值相同時以原始計數較大者為準，兩者皆相同時取第一個，
    /// 孤立峰值因此不會偏移到視窗邊緣。
    #[must_use]
    pub fn dominant_hue(&self, radius: usize) -> usize {
        let smoothed = self.smoothed(radius);
        let mut best = 0;
        for i in 1..HUE_BUCKETS {
            let candidate = (smoothed[i], self.counts[i]);
            if candidate > (smoothed[best], self.counts[best]) {
                best = i;
            }
        }
        best
    }

    /// 指定色相的平均飽和度與明度（未平滑），計數為 0 時回傳 `(0, 0)`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn mean_saturation_value(&self, bucket: usize) -> (f32, f32) {
        let count = self.counts[bucket];
        if count == 0 {
            return (0.0, 0.0);
        }
        let count = count as f64;
        (
            (self.saturation_sums[bucket] / count) as f32,
            (self.value_sums[bucket] / count) as f32,
        )
    }
}

/// 以色相眾數代表整幀
#[derive(Debug, Clone)]
pub struct HsvMode {
    pub smoothing_radius: usize,
}

impl Default for HsvMode {
    fn default() -> Self {
        Self {
            smoothing_radius: DEFAULT_SMOOTHING_RADIUS,
        }
    }
}

impl HsvMode {
    #[allow(clippy::cast_precision_loss)]
    pub fn dominant_color(&self, frame: &PixelBuffer) -> Result<Color, SummarizeError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(SummarizeError::EmptyFrame);
        }

        let histogram = HueHistogram::from_frame(frame);
        let hue = histogram.dominant_hue(self.smoothing_radius);
        let (saturation, value) = histogram.mean_saturation_value(hue);

        let (r, g, b) = hsv_to_rgb(hue as f32, saturation, value);
        Ok(Color::from_unit(r, g, b))
    }
}

impl FrameSummarizer for HsvMode {
    fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
        self.dominant_color(frame).map(FrameColor::Single)
    }
}
