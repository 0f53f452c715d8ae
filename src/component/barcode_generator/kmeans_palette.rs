//! k-means 主色盤
//!
//! 從整幀抽樣最多 5000 個不重複像素訓練 k-means，再把模型套用到全部像素，
//! 依各群像素數由多到少輸出 `(質心顏色, 佔比)`。

use super::frame_summarizer::{FrameSummarizer, SummarizeError};
use crate::tools::{Color, ColorSpan, FrameColor, PixelBuffer, SpanEntry};
use kmeans_colors::get_kmeans;
use log::debug;
use palette::Srgb;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub const DEFAULT_CLUSTERS: usize = 4;
pub const DEFAULT_SAMPLE_SIZE: usize = 5000;

const MAX_ITERATIONS: usize = 20;
const CONVERGENCE: f32 = 1e-4;
/// 以不同種子重複訓練，取分數最低者
const TRAINING_RUNS: usize = 3;

#[derive(Debug, Clone)]
pub struct KMeansPalette {
    pub clusters: usize,
    pub sample_size: usize,
    /// 固定種子時結果可重現；`None` 每次使用系統亂數
    pub seed: Option<u64>,
}

impl Default for KMeansPalette {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: None,
        }
    }
}

/// 已訓練的模型（正規化 RGB 質心）
#[derive(Debug, Clone)]
pub struct FittedModel {
    centroids: Vec<[f32; 3]>,
}

impl FittedModel {
    /// 最接近的質心索引（歐氏距離）
    #[must_use]
    pub fn predict(&self, features: [f32; 3]) -> usize {
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let distance = squared_distance(features, *centroid);
            if distance < best_distance {
                best_distance = distance;
                best = i;
            }
        }
        best
    }

    #[must_use]
    pub fn centroids(&self) -> &[[f32; 3]] {
        &self.centroids
    }
}

impl KMeansPalette {
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    pub fn palette(&self, frame: &PixelBuffer) -> Result<ColorSpan, SummarizeError> {
        let features: Vec<[f32; 3]> = frame.pixels().map(|p| normalize(p.0)).collect();
        if features.is_empty() {
            return Err(SummarizeError::EmptyFrame);
        }

        let mut rng = self.rng();
        let training = sample_without_replacement(&features, self.sample_size, &mut rng);
        let model = self.fit(&training, &mut rng)?;

        let mut histogram = vec![0u64; model.centroids.len()];
        for &feature in &features {
            histogram[model.predict(feature)] += 1;
        }

        Ok(build_span(&model, &histogram, features.len()))
    }

    /// 訓練模型；不同顏色少於群數時視為失敗，不降級為較少的群數
    pub fn fit(&self, training: &[[f32; 3]], rng: &mut StdRng) -> Result<FittedModel, SummarizeError> {
        let distinct = count_distinct(training);
        if self.clusters == 0 || distinct < self.clusters {
            return Err(SummarizeError::FitFailed {
                distinct,
                clusters: self.clusters,
            });
        }

        let buffer: Vec<Srgb> = training
            .iter()
            .map(|&[r, g, b]| Srgb::new(r, g, b))
            .collect();

        let best = (0..TRAINING_RUNS)
            .map(|_| {
                get_kmeans(
                    self.clusters,
                    MAX_ITERATIONS,
                    CONVERGENCE,
                    false,
                    &buffer,
                    rng.r#gen::<u64>(),
                )
            })
            .filter(|result| result.score.is_finite())
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(SummarizeError::FitFailed {
                distinct,
                clusters: self.clusters,
            })?;

        debug!("k-means 訓練完成: score={:.5}", best.score);

        Ok(FittedModel {
            centroids: best
                .centroids
                .iter()
                .map(|c| [c.red, c.green, c.blue])
                .collect(),
        })
    }
}

impl FrameSummarizer for KMeansPalette {
    fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
        self.palette(frame).map(FrameColor::Palette)
    }
}

fn normalize([r, g, b]: [u8; 3]) -> [f32; 3] {
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    ]
}

fn squared_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_distinct(features: &[[f32; 3]]) -> usize {
    features
        .iter()
        .map(|f| f.map(|c| (c * 255.0).round() as u8))
        .collect::<HashSet<[u8; 3]>>()
        .len()
}

/// 不重複抽樣 `min(amount, len)` 個元素
///
/// 使用 `rand::seq::index::sample`（Floyd 演算法／部分洗牌），保證有限步內完成。
pub fn sample_without_replacement<T: Copy>(items: &[T], amount: usize, rng: &mut impl Rng) -> Vec<T> {
    let amount = amount.min(items.len());
    index::sample(rng, items.len(), amount)
        .into_iter()
        .map(|i| items[i])
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn build_span(model: &FittedModel, histogram: &[u64], total: usize) -> ColorSpan {
    let mut ranked: Vec<(usize, u64)> = histogram.iter().copied().enumerate().collect();
    // 穩定排序：像素數相同時保留質心原順序
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let entries = ranked
        .into_iter()
        .map(|(cluster, count)| {
            let [r, g, b] = model.centroids[cluster];
            SpanEntry {
                color: Color::from_unit(r, g, b),
                weight: count as f32 / total as f32,
            }
        })
        .collect();

    ColorSpan::new(entries)
}
