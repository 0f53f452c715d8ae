use super::average::AverageColor;
use super::hsv_mode::HsvMode;
use super::kmeans_palette::KMeansPalette;
use crate::config::SummarizerKind;
use crate::tools::{FrameColor, PixelBuffer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("幀緩衝為空（0 像素）")]
    EmptyFrame,
    #[error("k-means 分群失敗: 僅有 {distinct} 個不同顏色，少於 {clusters} 群")]
    FitFailed { distinct: usize, clusters: usize },
}

/// 將單一幀縮減為代表色或色盤
///
/// 實作會在多個工作執行緒上同時被呼叫，且不得保留 `frame` 的參照。
pub trait FrameSummarizer: Sync {
    fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError>;
}

/// 依設定選用的摘要演算法
#[derive(Debug, Clone)]
pub enum Summarizer {
    Average(AverageColor),
    HsvMode(HsvMode),
    KMeansPalette(KMeansPalette),
}

impl Summarizer {
    #[must_use]
    pub fn from_kind(kind: SummarizerKind, kmeans_seed: Option<u64>) -> Self {
        match kind {
            SummarizerKind::Average => Self::Average(AverageColor),
            SummarizerKind::HsvMode => Self::HsvMode(HsvMode::default()),
            SummarizerKind::KMeansPalette => {
                Self::KMeansPalette(KMeansPalette::default().with_seed(kmeans_seed))
            }
        }
    }
}

impl FrameSummarizer for Summarizer {
    fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
        match self {
            Self::Average(inner) => inner.summarize(frame),
            Self::HsvMode(inner) => inner.summarize(frame),
            Self::KMeansPalette(inner) => inner.summarize(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_from_kind_selects_variant() {
        assert!(matches!(
            Summarizer::from_kind(SummarizerKind::Average, None),
            Summarizer::Average(_)
        ));
        assert!(matches!(
            Summarizer::from_kind(SummarizerKind::HsvMode, None),
            Summarizer::HsvMode(_)
        ));
        assert!(matches!(
            Summarizer::from_kind(SummarizerKind::KMeansPalette, Some(7)),
            Summarizer::KMeansPalette(_)
        ));
    }

    #[test]
    fn test_empty_frame_rejected_by_every_variant() {
        let frame = PixelBuffer::new(0, 0);
        for kind in [
            SummarizerKind::Average,
            SummarizerKind::HsvMode,
            SummarizerKind::KMeansPalette,
        ] {
            let summarizer = Summarizer::from_kind(kind, Some(1));
            assert_eq!(
                summarizer.summarize(&frame),
                Err(SummarizeError::EmptyFrame),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_all_black_frame() {
        let frame = PixelBuffer::from_pixel(8, 8, Rgb([0, 0, 0]));
        for kind in [SummarizerKind::Average, SummarizerKind::HsvMode] {
            let result = Summarizer::from_kind(kind, None).summarize(&frame).unwrap();
            assert_eq!(result, FrameColor::Single(crate::tools::Color::BLACK));
        }
    }
}
