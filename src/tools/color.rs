use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// 單一幀的像素緩衝（row-major、RGB 三通道）
pub type PixelBuffer = RgbImage;

/// 8-bit RGB 顏色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 由 `[0,1]` 浮點通道建立顏色，超出範圍者截斷
    #[must_use]
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        Self::new(unit_to_channel(r), unit_to_channel(g), unit_to_channel(b))
    }

    #[must_use]
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::new(r, g, b)
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Self([color.r, color.g, color.b])
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// 色盤中的一個顏色與其像素佔比
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanEntry {
    pub color: Color,
    pub weight: f32,
}

/// 依佔比由大到小排序的加權色盤
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorSpan {
    entries: Vec<SpanEntry>,
}

impl ColorSpan {
    /// 建立色盤並依權重由大到小排序（穩定排序，同權重保留原順序）
    #[must_use]
    pub fn new(mut entries: Vec<SpanEntry>) -> Self {
        entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[SpanEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 佔比最大的顏色
    #[must_use]
    pub fn dominant(&self) -> Option<Color> {
        self.entries.first().map(|entry| entry.color)
    }

    #[must_use]
    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }
}

/// 單一幀的摘要結果：單色或色盤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameColor {
    Single(Color),
    Palette(ColorSpan),
}

impl FrameColor {
    /// 代表色（色盤取佔比最大者）
    #[must_use]
    pub fn dominant(&self) -> Color {
        match self {
            Self::Single(color) => *color,
            Self::Palette(span) => span.dominant().unwrap_or(Color::BLACK),
        }
    }
}

impl From<Color> for FrameColor {
    fn from(color: Color) -> Self {
        Self::Single(color)
    }
}

impl From<ColorSpan> for FrameColor {
    fn from(span: ColorSpan) -> Self {
        Self::Palette(span)
    }
}

/// 帶有來源幀序號的摘要結果，供平行處理後依序重組
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub index: usize,
    pub color: FrameColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_span_sorted_by_weight() {
        let span = ColorSpan::new(vec![
            SpanEntry {
                color: Color::new(1, 1, 1),
                weight: 0.1,
            },
            SpanEntry {
                color: Color::new(2, 2, 2),
                weight: 0.6,
            },
            SpanEntry {
                color: Color::new(3, 3, 3),
                weight: 0.3,
            },
        ]);

        let weights: Vec<f32> = span.entries().iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.6, 0.3, 0.1]);
        assert_eq!(span.dominant(), Some(Color::new(2, 2, 2)));
        assert!((span.total_weight() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_unit_truncates_and_clamps() {
        assert_eq!(Color::from_unit(1.0, 0.0, 0.5), Color::new(255, 0, 127));
        assert_eq!(Color::from_unit(1.5, -0.2, f32::NAN), Color::new(255, 0, 0));
    }

    #[test]
    fn test_frame_color_dominant() {
        let single = FrameColor::Single(Color::new(10, 20, 30));
        assert_eq!(single.dominant(), Color::new(10, 20, 30));

        let empty = FrameColor::Palette(ColorSpan::default());
        assert_eq!(empty.dominant(), Color::BLACK);
    }

    #[test]
    fn test_rgb_conversion() {
        let pixel: Rgb<u8> = Color::new(4, 5, 6).into();
        assert_eq!(pixel.0, [4, 5, 6]);
        assert_eq!(Color::from(pixel), Color::new(4, 5, 6));
    }
}
