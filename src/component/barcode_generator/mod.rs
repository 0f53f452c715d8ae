//! 影片條碼圖元件
//!
//! 三階段流程：
//! A. 批次取樣並平行摘要每一幀（平均色、HSV 色相眾數、k-means 色盤）
//! B. 依每秒幀數分桶平均
//! C. 繪製漸層或直方圖並輸出

mod average;
mod batch_sampler;
mod color_cache;
mod frame_summarizer;
mod hsv_mode;
mod kmeans_palette;
mod main;
mod strip_encoder;
mod strip_renderer;
mod time_aggregator;

pub use average::AverageColor;
pub use batch_sampler::{
    BatchSampler, SamplerConfig, SamplingOutcome, default_worker_count,
};
pub use color_cache::{CACHE_VERSION, ColorCache, decode_colors, encode_colors};
pub use frame_summarizer::{FrameSummarizer, SummarizeError, Summarizer};
pub use hsv_mode::{DEFAULT_SMOOTHING_RADIUS, HUE_BUCKETS, HsvMode, HueHistogram};
pub use kmeans_palette::{
    DEFAULT_CLUSTERS, DEFAULT_SAMPLE_SIZE, FittedModel, KMeansPalette,
    sample_without_replacement,
};
pub use main::{
    BarcodeGenerator, BarcodeReport, cache_path_for, extract_colors, generate_barcode,
    output_path_for, render_strip,
};
pub use strip_encoder::save_strip;
pub use strip_renderer::{Easing, gradient_color_at, render_gradient, render_histogram};
pub use time_aggregator::{aggregate_by_bucket, bucket_size_for};
