use crate::config::OutputFormat;
use crate::tools::PixelBuffer;
use anyhow::{Context, Result};
use image::ImageFormat;
use log::info;
use std::path::Path;

impl OutputFormat {
    #[must_use]
    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// 將條碼圖寫入檔案
pub fn save_strip(image: &PixelBuffer, path: &Path, format: OutputFormat) -> Result<()> {
    image
        .save_with_format(path, format.image_format())
        .with_context(|| format!("無法寫入條碼圖: {}", path.display()))?;

    info!(
        "條碼圖已建立: {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(())
}
