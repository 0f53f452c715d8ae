use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// 以 blake3 計算影片檔的識別碼（路徑、大小、修改時間）
///
/// 不讀取檔案內容，數 GB 的影片也能即時完成；用來判斷快取是否仍對應同一支影片。
pub fn calculate_file_fingerprint(path: &Path) -> Result<String> {
    let canonical = fs::canonicalize(path)
        .with_context(|| format!("無法取得完整路徑: {}", path.display()))?;
    let metadata =
        fs::metadata(&canonical).with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?;

    let modified_nanos = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());

    let mut hasher = blake3::Hasher::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    hasher.update(&metadata.len().to_le_bytes());
    hasher.update(&modified_nanos.to_le_bytes());

    Ok(hasher.finalize().to_hex().to_string())
}
