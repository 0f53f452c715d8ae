//! 批次取樣
//!
//! 每批由單一執行緒依序從解碼器讀滿 `worker_count` 個幀緩衝，
//! 再交給 rayon 執行緒池平行摘要，等待整批完成後才讀取下一批。
//! 結果依緩衝槽順序附加，因此輸出順序與幀到達順序一致。

use super::frame_summarizer::{FrameSummarizer, SummarizeError};
use crate::tools::{FrameResult, FrameSource, PixelBuffer};
use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 取樣設定
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// 平行工作數（同時存在的幀緩衝數量）
    pub worker_count: usize,
    /// 每讀一幀後略過 `frame_stride - 1` 幀
    pub frame_stride: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            frame_stride: 1,
        }
    }
}

#[must_use]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// 取樣結果
#[derive(Debug, Default)]
pub struct SamplingOutcome {
    /// 依幀順序排列的摘要結果（已排除失敗的幀）
    pub results: Vec<FrameResult>,
    pub frames_sampled: usize,
    pub frames_dropped: usize,
    /// 收到中斷信號而提前結束
    pub cancelled: bool,
}

pub struct BatchSampler {
    config: SamplerConfig,
    pool: ThreadPool,
    shutdown_signal: Arc<AtomicBool>,
}

impl BatchSampler {
    pub fn new(config: SamplerConfig, shutdown_signal: Arc<AtomicBool>) -> Result<Self> {
        let config = SamplerConfig {
            worker_count: config.worker_count.max(1),
            frame_stride: config.frame_stride.max(1),
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|i| format!("summarizer-{i}"))
            .build()
            .context("無法建立摘要執行緒池")?;

        Ok(Self {
            config,
            pool,
            shutdown_signal,
        })
    }

    #[must_use]
    pub const fn config(&self) -> SamplerConfig {
        self.config
    }

    /// 取樣整支影片
    ///
    /// `on_batch` 在每批完成後以該批的幀數呼叫，用於進度顯示。
    pub fn run<F, S>(
        &self,
        source: &mut F,
        summarizer: &S,
        mut on_batch: impl FnMut(usize),
    ) -> Result<SamplingOutcome>
    where
        F: FrameSource + ?Sized,
        S: FrameSummarizer + ?Sized,
    {
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            bail!("影格尺寸無效: {width}x{height}");
        }

        let mut slots: Vec<PixelBuffer> = (0..self.config.worker_count)
            .map(|_| PixelBuffer::new(width, height))
            .collect();
        let mut outcome = SamplingOutcome::default();
        let mut batch_number = 0usize;

        loop {
            if self.is_shutdown() {
                warn!("收到中斷信號，停止取樣");
                outcome.cancelled = true;
                break;
            }

            let first_sample = outcome.frames_sampled;
            let (filled, partial) = match self.fill_slots(source, &mut slots) {
                Ok(fill) => fill,
                // 解碼器與本程序同時收到中斷信號時，讀取錯誤視為中斷
                Err(e) if self.is_shutdown() => {
                    warn!("收到中斷信號，停止取樣: {e:#}");
                    outcome.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            let batch = &slots[..filled];
            let results: Vec<Result<_, SummarizeError>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|frame| summarizer.summarize(frame))
                    .collect()
            });

            for (offset, result) in results.into_iter().enumerate() {
                let frame_index = (first_sample + offset) * self.config.frame_stride;
                match result {
                    Ok(color) => outcome.results.push(FrameResult {
                        index: frame_index,
                        color,
                    }),
                    Err(e @ SummarizeError::FitFailed { .. }) => {
                        warn!("略過第 {frame_index} 幀: {e}");
                        outcome.frames_dropped += 1;
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("第 {frame_index} 幀摘要失敗"));
                    }
                }
            }

            outcome.frames_sampled += filled;
            batch_number += 1;
            debug!(
                "批次 {batch_number} 完成: {filled} 幀，累計 {}",
                outcome.frames_sampled
            );
            on_batch(filled);

            if partial {
                // 串流提前結束可能是解碼器被同一個中斷信號終止
                if self.is_shutdown() {
                    warn!("收到中斷信號，取樣結果不完整");
                    outcome.cancelled = true;
                }
                break;
            }
        }

        info!(
            "取樣完成: {} 幀，成功 {}，略過 {}",
            outcome.frames_sampled,
            outcome.results.len(),
            outcome.frames_dropped
        );

        Ok(outcome)
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }

    /// 依序填滿緩衝槽；遇到串流結尾時停止並標記為不完整批次
    fn fill_slots<F>(&self, source: &mut F, slots: &mut [PixelBuffer]) -> Result<(usize, bool)>
    where
        F: FrameSource + ?Sized,
    {
        for (filled, slot) in slots.iter_mut().enumerate() {
            if !source.read_frame(slot)? {
                return Ok((filled, true));
            }
            for _ in 1..self.config.frame_stride {
                if !source.skip_frame()? {
                    break;
                }
            }
        }
        Ok((slots.len(), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Color, FrameColor};
    use image::Rgb;
    use std::time::Duration;

    /// 依序產生的測試來源，第 n 幀的像素為 (n, n, n)
    struct CountingSource {
        total: usize,
        position: usize,
    }

    impl FrameSource for CountingSource {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn frame_rate(&self) -> f64 {
            24.0
        }

        fn frame_count(&self) -> u64 {
            self.total as u64
        }

        fn read_frame(&mut self, buffer: &mut PixelBuffer) -> Result<bool> {
            if self.position >= self.total {
                return Ok(false);
            }
            let value = u8::try_from(self.position % 256)?;
            for pixel in buffer.pixels_mut() {
                *pixel = Rgb([value, value, value]);
            }
            self.position += 1;
            Ok(true)
        }

        fn skip_frame(&mut self) -> Result<bool> {
            if self.position >= self.total {
                return Ok(false);
            }
            self.position += 1;
            Ok(true)
        }
    }

    /// 回傳左上像素顏色，並依值加入不同延遲
    struct JitterSummarizer;

    impl FrameSummarizer for JitterSummarizer {
        fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
            let color = Color::from(*frame.get_pixel(0, 0));
            std::thread::sleep(Duration::from_millis(u64::from(7 - color.r % 7)));
            Ok(FrameColor::Single(color))
        }
    }

    /// 數值為 3 的倍數時視為分群失敗
    struct FlakySummarizer;

    impl FrameSummarizer for FlakySummarizer {
        fn summarize(&self, frame: &PixelBuffer) -> Result<FrameColor, SummarizeError> {
            let color = Color::from(*frame.get_pixel(0, 0));
            if color.r % 3 == 0 {
                return Err(SummarizeError::FitFailed {
                    distinct: 1,
                    clusters: 4,
                });
            }
            Ok(FrameColor::Single(color))
        }
    }

    fn sampler(worker_count: usize, frame_stride: usize) -> BatchSampler {
        BatchSampler::new(
            SamplerConfig {
                worker_count,
                frame_stride,
            },
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap()
    }

    #[test]
    fn test_preserves_arrival_order() {
        let workers = 4;
        let total = workers * 2 + 1;
        let mut source = CountingSource { total, position: 0 };

        let outcome = sampler(workers, 1)
            .run(&mut source, &JitterSummarizer, |_| {})
            .unwrap();

        assert_eq!(outcome.results.len(), total);
        assert_eq!(outcome.frames_sampled, total);
        for (i, result) in outcome.results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert_eq!(result.color.dominant().r as usize, i);
        }
    }

    #[test]
    fn test_stride_skips_frames() {
        let mut source = CountingSource {
            total: 10,
            position: 0,
        };

        let outcome = sampler(2, 3)
            .run(&mut source, &JitterSummarizer, |_| {})
            .unwrap();

        let values: Vec<u8> = outcome.results.iter().map(|r| r.color.dominant().r).collect();
        let indices: Vec<usize> = outcome.results.iter().map(|r| r.index).collect();
        assert_eq!(values, vec![0, 3, 6, 9]);
        assert_eq!(indices, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_failed_frames_are_dropped() {
        let mut source = CountingSource {
            total: 10,
            position: 0,
        };

        let outcome = sampler(3, 1)
            .run(&mut source, &FlakySummarizer, |_| {})
            .unwrap();

        let values: Vec<u8> = outcome.results.iter().map(|r| r.color.dominant().r).collect();
        assert_eq!(values, vec![1, 2, 4, 5, 7, 8]);
        assert_eq!(outcome.frames_dropped, 4);
        assert_eq!(outcome.frames_sampled, 10);
    }

    #[test]
    fn test_progress_reports_every_batch() {
        let mut source = CountingSource {
            total: 5,
            position: 0,
        };
        let mut batches = Vec::new();

        sampler(2, 1)
            .run(&mut source, &JitterSummarizer, |n| batches.push(n))
            .unwrap();

        assert_eq!(batches, vec![2, 2, 1]);
    }

    #[test]
    fn test_exact_multiple_ends_with_empty_batch() {
        let mut source = CountingSource {
            total: 4,
            position: 0,
        };

        let outcome = sampler(2, 1)
            .run(&mut source, &JitterSummarizer, |_| {})
            .unwrap();

        assert_eq!(outcome.results.len(), 4);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_shutdown_signal_stops_before_reading() {
        let signal = Arc::new(AtomicBool::new(true));
        let sampler = BatchSampler::new(SamplerConfig::default(), signal).unwrap();
        let mut source = CountingSource {
            total: 10,
            position: 0,
        };

        let outcome = sampler.run(&mut source, &JitterSummarizer, |_| {}).unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.results.is_empty());
        assert_eq!(source.position, 0);
    }

    /// 讀到 `stop_at` 幀時設定中斷旗標並回報串流結束（解碼器隨中斷信號退出）
    struct InterruptedSource {
        inner: CountingSource,
        stop_at: usize,
        signal: Arc<AtomicBool>,
        fail: bool,
    }

    impl FrameSource for InterruptedSource {
        fn width(&self) -> u32 {
            self.inner.width()
        }

        fn height(&self) -> u32 {
            self.inner.height()
        }

        fn frame_rate(&self) -> f64 {
            self.inner.frame_rate()
        }

        fn frame_count(&self) -> u64 {
            self.inner.frame_count()
        }

        fn read_frame(&mut self, buffer: &mut PixelBuffer) -> Result<bool> {
            if self.inner.position == self.stop_at {
                self.signal.store(true, Ordering::SeqCst);
                if self.fail {
                    bail!("decoder exited");
                }
                return Ok(false);
            }
            self.inner.read_frame(buffer)
        }

        fn skip_frame(&mut self) -> Result<bool> {
            self.inner.skip_frame()
        }
    }

    fn interrupted_source(signal: &Arc<AtomicBool>, fail: bool) -> InterruptedSource {
        InterruptedSource {
            inner: CountingSource {
                total: 20,
                position: 0,
            },
            stop_at: 5,
            signal: Arc::clone(signal),
            fail,
        }
    }

    #[test]
    fn test_stream_end_during_shutdown_is_cancelled() {
        let signal = Arc::new(AtomicBool::new(false));
        let sampler = BatchSampler::new(
            SamplerConfig {
                worker_count: 2,
                frame_stride: 1,
            },
            Arc::clone(&signal),
        )
        .unwrap();
        let mut source = interrupted_source(&signal, false);

        let outcome = sampler.run(&mut source, &JitterSummarizer, |_| {}).unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.results.len(), 5);
    }

    #[test]
    fn test_read_error_during_shutdown_is_cancelled() {
        let signal = Arc::new(AtomicBool::new(false));
        let sampler = BatchSampler::new(
            SamplerConfig {
                worker_count: 2,
                frame_stride: 1,
            },
            Arc::clone(&signal),
        )
        .unwrap();
        let mut source = interrupted_source(&signal, true);

        let outcome = sampler.run(&mut source, &JitterSummarizer, |_| {}).unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.results.len(), 4);
    }

    #[test]
    fn test_zero_settings_are_clamped() {
        let sampler = sampler(0, 0);
        assert_eq!(sampler.config().worker_count, 1);
        assert_eq!(sampler.config().frame_stride, 1);
    }
}
