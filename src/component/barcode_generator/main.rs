use super::batch_sampler::{BatchSampler, SamplerConfig, SamplingOutcome, default_worker_count};
use super::color_cache::ColorCache;
use super::frame_summarizer::Summarizer;
use super::strip_encoder::save_strip;
use super::strip_renderer::{Easing, render_gradient, render_histogram};
use super::time_aggregator::{aggregate_by_bucket, bucket_size_for};
use crate::config::save::{add_recent_path, save_settings};
use crate::config::{BarcodeSettings, Config, StripLayout};
use crate::tools::{
    DecoderConfig, FfmpegDecoder, FrameColor, FrameSource, PixelBuffer,
    calculate_file_fingerprint, ensure_directory_exists, validate_file_exists,
};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 條碼圖產生結果
#[derive(Debug)]
pub struct BarcodeReport {
    pub output_path: PathBuf,
    pub cache_path: PathBuf,
    pub cache_hit: bool,
    pub frames_sampled: usize,
    pub frames_dropped: usize,
    /// 實際繪製的欄數／色標數
    pub colors_rendered: usize,
}

/// 影片條碼圖產生器
///
/// 流程：
/// A. 讀取快取，或解碼並平行摘要每一幀
/// B. 依每秒幀數分桶平均（可關閉）
/// C. 繪製漸層或直方圖並輸出圖檔
pub struct BarcodeGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl BarcodeGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 更新後的設定（最近使用路徑）
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("barcode.title")).cyan().bold());

        let video_path = PathBuf::from(self.prompt_video_path()?);
        validate_file_exists(&video_path)?;

        let output_dir = PathBuf::from(self.prompt_output_dir(&video_path)?);
        ensure_directory_exists(&output_dir)?;

        let settings = &self.config.settings.barcode;
        println!(
            "{}",
            style(t!(
                "barcode.settings_line",
                summarizer = settings.summarizer,
                layout = settings.layout,
                stride = settings.frame_stride
            ))
            .dim()
        );

        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        progress_bar.set_message(t!("barcode.sampling").to_string());

        let result = generate_barcode(
            &video_path,
            &output_dir,
            settings,
            &self.shutdown_signal,
            &progress_bar,
        );
        progress_bar.finish_and_clear();

        match result {
            Ok(report) => {
                self.print_summary(&report);
                add_recent_path(
                    &mut self.config.settings,
                    &video_path.to_string_lossy(),
                );
                if let Err(e) = save_settings(&self.config.settings) {
                    warn!("無法儲存最近使用路徑: {e:#}");
                }
                Ok(())
            }
            Err(e) => {
                error!("產生條碼圖失敗 {}: {e:#}", video_path.display());
                Err(e)
            }
        }
    }

    fn prompt_video_path(&self) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(t!("barcode.prompt_video"));
        if let Some(recent) = self.config.settings.recent_paths.first() {
            input = input.default(recent.clone());
        }
        Ok(input.interact_text()?.trim().to_string())
    }

    fn prompt_output_dir(&self, video_path: &Path) -> Result<String> {
        let default_dir = video_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_string_lossy()
            .to_string();

        let path: String = Input::new()
            .with_prompt(t!("barcode.prompt_output"))
            .default(default_dir)
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn print_summary(&self, report: &BarcodeReport) {
        println!();
        println!("{}", style(t!("barcode.summary_title")).cyan().bold());
        if report.cache_hit {
            println!(
                "  {}",
                style(t!("barcode.cache_hit", path = report.cache_path.display())).dim()
            );
        } else {
            println!(
                "  {}",
                t!("barcode.frames_sampled", count = report.frames_sampled)
            );
            if report.frames_dropped > 0 {
                println!(
                    "  {}",
                    style(t!("barcode.frames_dropped", count = report.frames_dropped)).yellow()
                );
            }
        }
        println!(
            "  {}",
            t!("barcode.colors_rendered", count = report.colors_rendered)
        );
        println!(
            "  {} {}",
            style("✓").green(),
            t!("barcode.output", path = report.output_path.display())
        );

        info!(
            "條碼圖完成 - 取樣: {}, 略過: {}, 欄數: {}, 快取: {}",
            report.frames_sampled, report.frames_dropped, report.colors_rendered, report.cache_hit
        );
    }
}

/// 快取檔路徑：`<輸出目錄>/<影片名>.<演算法>.s<間隔>.colors.json`
#[must_use]
pub fn cache_path_for(video_path: &Path, output_dir: &Path, settings: &BarcodeSettings) -> PathBuf {
    output_dir.join(format!(
        "{}.{}.s{}.colors.json",
        video_stem(video_path),
        settings.summarizer,
        settings.frame_stride.max(1)
    ))
}

/// 輸出圖檔路徑：`<輸出目錄>/<影片名>_barcode.<副檔名>`
#[must_use]
pub fn output_path_for(video_path: &Path, output_dir: &Path, settings: &BarcodeSettings) -> PathBuf {
    output_dir.join(format!(
        "{}_barcode.{}",
        video_stem(video_path),
        settings.output_format.extension()
    ))
}

fn video_stem(video_path: &Path) -> String {
    video_path
        .file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string())
}

/// 從任意影像來源取樣並摘要每一幀
pub fn extract_colors<F>(
    source: &mut F,
    settings: &BarcodeSettings,
    shutdown_signal: &Arc<AtomicBool>,
    progress_bar: &ProgressBar,
) -> Result<SamplingOutcome>
where
    F: FrameSource + ?Sized,
{
    let stride = settings.frame_stride.max(1);
    let sampler = BatchSampler::new(
        SamplerConfig {
            worker_count: settings.worker_count.unwrap_or_else(default_worker_count),
            frame_stride: stride,
        },
        Arc::clone(shutdown_signal),
    )?;
    let summarizer = Summarizer::from_kind(settings.summarizer, settings.kmeans_seed);

    progress_bar.set_length(source.frame_count().div_ceil(stride as u64));
    info!(
        "開始取樣: {}x{}, {:.2} fps, 間隔 {stride}, 演算法 {}",
        source.width(),
        source.height(),
        source.frame_rate(),
        settings.summarizer
    );

    sampler.run(source, &summarizer, |n| progress_bar.inc(n as u64))
}

/// 依設定分桶並繪製條碼圖
pub fn render_strip(
    colors: &[FrameColor],
    frame_rate: f64,
    settings: &BarcodeSettings,
) -> Result<PixelBuffer> {
    if colors.is_empty() {
        bail!("沒有擷取到任何顏色");
    }

    let frames: Vec<FrameColor> = if settings.aggregate_by_second {
        let dominant: Vec<_> = colors.iter().map(FrameColor::dominant).collect();
        aggregate_by_bucket(&dominant, bucket_size_for(frame_rate))
            .into_iter()
            .map(FrameColor::Single)
            .collect()
    } else {
        colors.to_vec()
    };

    match settings.layout {
        StripLayout::Gradient => {
            let stops: Vec<_> = frames.iter().map(FrameColor::dominant).collect();
            let easing = if settings.bell_easing {
                Easing::Bell
            } else {
                Easing::Linear
            };
            render_gradient(&stops, settings.strip_width, settings.strip_height, easing)
        }
        StripLayout::Histogram => render_histogram(&frames, settings.strip_height),
    }
}

/// 取出取樣結果並寫入快取
///
/// 中斷或沒有任何顏色時回傳錯誤且不寫入快取，避免下次執行讀到不完整的結果。
fn store_outcome(
    outcome: SamplingOutcome,
    cache: Option<ColorCache>,
    cache_path: &Path,
) -> Result<Vec<FrameColor>> {
    if outcome.cancelled {
        bail!("操作已取消");
    }

    let colors: Vec<FrameColor> = outcome.results.into_iter().map(|r| r.color).collect();
    if colors.is_empty() {
        bail!(
            "沒有擷取到任何顏色（取樣 {} 幀，略過 {} 幀）",
            outcome.frames_sampled,
            outcome.frames_dropped
        );
    }

    if let Some(mut cache) = cache {
        cache.colors.clone_from(&colors);
        cache.save_to_file(cache_path)?;
    }

    Ok(colors)
}

/// 完整流程：快取／解碼 → 分桶 → 繪製 → 輸出
pub fn generate_barcode(
    video_path: &Path,
    output_dir: &Path,
    settings: &BarcodeSettings,
    shutdown_signal: &Arc<AtomicBool>,
    progress_bar: &ProgressBar,
) -> Result<BarcodeReport> {
    validate_file_exists(video_path)?;
    ensure_directory_exists(output_dir)?;

    let stride = settings.frame_stride.max(1);
    let fingerprint = calculate_file_fingerprint(video_path)?;
    let cache_path = cache_path_for(video_path, output_dir, settings);

    let cached = if settings.use_cache {
        ColorCache::load_from_file(&cache_path)?
            .filter(|cache| {
                let usable = cache.matches(&fingerprint, settings.summarizer, stride);
                if !usable {
                    warn!("快取與影片或設定不符，重新擷取: {}", cache_path.display());
                }
                usable
            })
    } else {
        None
    };

    let (colors, frame_rate, frames_sampled, frames_dropped, cache_hit) = match cached {
        Some(cache) => {
            info!(
                "使用快取: {} ({} 筆)",
                cache_path.display(),
                cache.colors.len()
            );
            (cache.colors, cache.frame_rate, 0, 0, true)
        }
        None => {
            let mut decoder = FfmpegDecoder::open(
                video_path,
                DecoderConfig {
                    scale_width: settings.decode_width,
                },
            )?;
            let frame_rate = decoder.frame_rate();
            let outcome = extract_colors(&mut decoder, settings, shutdown_signal, progress_bar)?;
            drop(decoder);

            let (frames_sampled, frames_dropped) = (outcome.frames_sampled, outcome.frames_dropped);
            let cache = settings.use_cache.then(|| {
                ColorCache::new(fingerprint, settings.summarizer, stride, frame_rate, Vec::new())
            });
            let colors = store_outcome(outcome, cache, &cache_path)?;

            (colors, frame_rate, frames_sampled, frames_dropped, false)
        }
    };

    let strip = render_strip(&colors, frame_rate, settings)
        .with_context(|| format!("無法繪製條碼圖: {}", video_path.display()))?;

    let output_path = output_path_for(video_path, output_dir, settings);
    save_strip(&strip, &output_path, settings.output_format)?;

    let colors_rendered = match settings.layout {
        StripLayout::Histogram => strip.width() as usize,
        StripLayout::Gradient if settings.aggregate_by_second => {
            colors.len().div_ceil(bucket_size_for(frame_rate))
        }
        StripLayout::Gradient => colors.len(),
    };

    Ok(BarcodeReport {
        output_path,
        cache_path,
        cache_hit,
        frames_sampled,
        frames_dropped,
        colors_rendered,
    })
}
