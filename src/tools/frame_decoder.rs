//! 影片解碼：以 ffmpeg 將影格輸出為 rgb24 rawvideo，再逐幀讀入緩衝

use super::color::PixelBuffer;
use super::ffprobe_info::{VideoInfo, get_video_info};
use super::path_validator::validate_file_exists;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// 逐幀讀取的影像來源
///
/// 取樣器只會在單一執行緒中呼叫來源，實作不需要 `Sync`。
pub trait FrameSource {
    /// 輸出幀的寬度
    fn width(&self) -> u32;

    /// 輸出幀的高度
    fn height(&self) -> u32;

    /// 每秒幀數
    fn frame_rate(&self) -> f64;

    /// 預估總幀數
    fn frame_count(&self) -> u64;

    /// 讀取下一幀到 `buffer`；回傳 `false` 表示已到串流結尾
    ///
    /// `buffer` 的尺寸必須等於 `width() x height()`。
    fn read_frame(&mut self, buffer: &mut PixelBuffer) -> Result<bool>;

    /// 略過下一幀；回傳 `false` 表示已到串流結尾
    fn skip_frame(&mut self) -> Result<bool>;
}

/// 解碼輸出設定
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderConfig {
    /// 縮放後的寬度（高度依比例計算），`None` 保留原始尺寸
    pub scale_width: Option<u32>,
}

/// 透過 ffmpeg 子程序解碼的影像來源
pub struct FfmpegDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    /// 背景讀取 ffmpeg 錯誤輸出，避免管線塞滿
    stderr: Option<JoinHandle<String>>,
    info: VideoInfo,
    width: u32,
    height: u32,
    frames_read: u64,
}

impl FfmpegDecoder {
    /// 開啟影片；檔案不存在或無法取得影片資訊時立即失敗
    pub fn open(path: &Path, config: DecoderConfig) -> Result<Self> {
        validate_file_exists(path)?;

        let info = get_video_info(path)?;
        if info.width == 0 || info.height == 0 {
            bail!("影片尺寸無效: {}x{}", info.width, info.height);
        }

        let (width, height) = output_dimensions(info.width, info.height, config.scale_width);

        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-an".to_string(),
            "-sn".to_string(),
            "-dn".to_string(),
        ];

        if (width, height) != (info.width, info.height) {
            args.push("-vf".to_string());
            args.push(format!("scale={width}:{height}"));
        }

        args.extend([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-".to_string(),
        ]);

        debug!("啟動解碼: ffmpeg {}", args.join(" "));

        let mut command = Command::new("ffmpeg");
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // 獨立的行程群組：終端機的 Ctrl-C 只送給本程序，由取樣器決定何時停止
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command
            .spawn()
            .with_context(|| format!("無法執行 ffmpeg 解碼: {}", path.display()))?;

        Self::from_child(child, info, width, height)
    }

    fn from_child(mut child: Child, info: VideoInfo, width: u32, height: u32) -> Result<Self> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("無法取得 ffmpeg 輸出"))?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            child,
            stdout: BufReader::with_capacity(frame_bytes(width, height), stdout),
            stderr,
            info,
            width,
            height,
            frames_read: 0,
        })
    }

    #[must_use]
    pub const fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn frame_len(&self) -> usize {
        frame_bytes(self.width, self.height)
    }

    /// 串流結束時確認 ffmpeg 正常結束；中途解碼失敗會回傳錯誤而非當成結尾
    fn finish(&mut self) -> Result<()> {
        let status = self.child.wait().context("無法等待 ffmpeg 結束")?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        debug!("解碼結束，共讀取 {} 幀", self.frames_read);
        check_exit_status(status, &stderr)
    }
}

impl FrameSource for FfmpegDecoder {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    fn read_frame(&mut self, buffer: &mut PixelBuffer) -> Result<bool> {
        if buffer.dimensions() != (self.width, self.height) {
            bail!(
                "幀緩衝尺寸不符: {:?} != {}x{}",
                buffer.dimensions(),
                self.width,
                self.height
            );
        }

        match self.stdout.read_exact(buffer) {
            Ok(()) => {
                self.frames_read += 1;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish()?;
                Ok(false)
            }
            Err(e) => Err(e).context("讀取 ffmpeg 輸出失敗"),
        }
    }

    fn skip_frame(&mut self) -> Result<bool> {
        let expected = self.frame_len() as u64;
        let skipped = io::copy(&mut (&mut self.stdout).take(expected), &mut io::sink())
            .context("略過影格失敗")?;
        if skipped < expected {
            self.finish()?;
            return Ok(false);
        }
        self.frames_read += 1;
        Ok(true)
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        // 提前結束取樣時 ffmpeg 仍在輸出，需主動終止
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        if let Err(e) = self.child.wait() {
            warn!("無法回收 ffmpeg 程序: {e}");
        }
    }
}

fn check_exit_status(status: ExitStatus, stderr: &str) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    bail!("ffmpeg 解碼失敗 ({status}): {}", stderr.trim());
}

fn frame_bytes(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// 計算縮放後的輸出尺寸（保持比例，高度取偶數）
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn output_dimensions(width: u32, height: u32, scale_width: Option<u32>) -> (u32, u32) {
    match scale_width {
        Some(target) if target > 0 && target < width => {
            let scaled = (f64::from(height) * f64::from(target) / f64::from(width)).round() as u32;
            let scaled = (scaled / 2 * 2).max(2);
            (target, scaled)
        }
        _ => (width, height),
    }
}
