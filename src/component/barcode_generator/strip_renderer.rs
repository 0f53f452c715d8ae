//! 條碼圖繪製：水平漸層或逐欄直方圖

use crate::tools::{Color, FrameColor, PixelBuffer};
use anyhow::{Result, bail};
use image::Rgb;
use serde::{Deserialize, Serialize};

/// 漸層色標之間的過渡曲線
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// 兩端平緩、中段陡峭的鐘形混色（smoothstep）
    Bell,
}

impl Easing {
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Bell => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// 水平漸層：色標平均分佈於 `i / (n - 1)`
#[allow(clippy::cast_precision_loss)]
pub fn render_gradient(colors: &[Color], width: u32, height: u32, easing: Easing) -> Result<PixelBuffer> {
    if colors.is_empty() {
        bail!("沒有可繪製的顏色");
    }
    if width == 0 || height == 0 {
        bail!("輸出尺寸無效: {width}x{height}");
    }

    let mut image = PixelBuffer::new(width, height);
    let last_column = width.saturating_sub(1).max(1) as f32;

    for x in 0..width {
        let position = (x as f32 / last_column).clamp(0.0, 1.0);
        let color = gradient_color_at(colors, position, easing);
        fill_column(&mut image, x, 0, height, color);
    }

    Ok(image)
}

/// 計算漸層在 `position`（0 到 1）的顏色
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn gradient_color_at(colors: &[Color], position: f32, easing: Easing) -> Color {
    match colors {
        [] => Color::BLACK,
        [only] => *only,
        _ => {
            let segments = colors.len() - 1;
            let scaled = position.clamp(0.0, 1.0) * segments as f32;
            let index = (scaled.floor() as usize).min(segments - 1);
            let t = easing.apply(scaled - index as f32);
            lerp(colors[index], colors[index + 1], t)
        }
    }
}

/// 逐欄直方圖：每個元素一欄，寬度等於序列長度
///
/// 單色為整欄純色；色盤依排序由上而下堆疊，每段高度為 `round(weight * height)`，
/// 累計高度不超過影像高度，未覆蓋的部分保留黑色。
pub fn render_histogram(frames: &[FrameColor], height: u32) -> Result<PixelBuffer> {
    if frames.is_empty() {
        bail!("沒有可繪製的顏色");
    }
    if height == 0 {
        bail!("輸出高度無效: {height}");
    }
    let width = u32::try_from(frames.len())
        .map_err(|_| anyhow::anyhow!("序列過長，無法繪製: {}", frames.len()))?;

    let mut image = PixelBuffer::new(width, height);

    for (x, frame) in (0..width).zip(frames) {
        match frame {
            FrameColor::Single(color) => fill_column(&mut image, x, 0, height, *color),
            FrameColor::Palette(span) => {
                let mut offset = 0u32;
                for entry in span.entries() {
                    let end = offset
                        .saturating_add(segment_height(entry.weight, height))
                        .min(height);
                    fill_column(&mut image, x, offset, end, entry.color);
                    offset = end;
                }
            }
        }
    }

    Ok(image)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn segment_height(weight: f32, height: u32) -> u32 {
    if !weight.is_finite() || weight <= 0.0 {
        return 0;
    }
    (weight * height as f32).round() as u32
}

fn fill_column(image: &mut PixelBuffer, x: u32, from: u32, to: u32, color: Color) {
    let pixel: Rgb<u8> = color.into();
    for y in from..to {
        image.put_pixel(x, y, pixel);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(from: Color, to: Color, t: f32) -> Color {
    let channel = |a: u8, b: u8| {
        let (a, b) = (f32::from(a), f32::from(b));
        (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
    };
    Color::new(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
    )
}
