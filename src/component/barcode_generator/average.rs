use super::frame_summarizer::{FrameSummarizer, SummarizeError};
use crate::tools::{Color, FrameColor, PixelBuffer};

/// 各通道平均色
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageColor;

impl AverageColor {
    /// 以 64-bit 累加各通道後整數除法（無條件捨去）
    pub fn average(frame: &PixelBuffer) -> Result<Color, SummarizeError> {
        let pixel_count = u64::from(frame.width()) * u64::from(frame.height());
        if pixel_count == 0 {
            return Err(SummarizeError::EmptyFrame);
        }

        let (mut red_sum, mut green_sum, mut blue_sum) = (0u64, 0u64, 0u64);
        for pixel in frame.pixels() {
            let [r, g, b] = pixel.0;
            red_sum += u64::from(r);
            green_sum += u64::from(g);
            blue_sum += u64::from(b);
        }

        Ok(Color::new(
            channel_mean(red_sum, pixel_count),
            channel_mean(green_sum, pixel_count),
            channel_mean(blue_sum, pixel_count),
        ))
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn channel_mean(sum: u64, count: u64) -> u8 {
    (sum / count) as u8
}

impl FrameSummarizer for AverageColor {
    fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
        Self::average(frame).map(FrameColor::Single)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_average_truncates() {
        let mut frame = PixelBuffer::new(2, 1);
        frame.put_pixel(0, 0, Rgb([255, 0, 10]));
        frame.put_pixel(1, 0, Rgb([0, 0, 11]));

        let color = AverageColor::average(&frame).unwrap();
        assert_eq!(color, Color::new(127, 0, 10));
    }

    #[test]
    fn test_average_large_frame_does_not_overflow() {
        let frame = PixelBuffer::from_pixel(1920, 1080, Rgb([255, 255, 255]));
        let color = AverageColor::average(&frame).unwrap();
        assert_eq!(color, Color::new(255, 255, 255));
    }

    #[test]
    fn test_average_empty_frame() {
        let frame = PixelBuffer::new(0, 4);
        assert_eq!(
            AverageColor::average(&frame),
            Err(SummarizeError::EmptyFrame)
        );
    }
}
