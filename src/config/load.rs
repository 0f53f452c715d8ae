use crate::config::types::{Config, SETTINGS_FILE, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

impl Config {
    /// 從目前目錄的 settings.json 載入設定；檔案不存在或無法解析時使用預設值
    #[must_use]
    pub fn new() -> Self {
        let path = Path::new(SETTINGS_FILE);
        let settings = load_settings(path).unwrap_or_else(|e| {
            warn!("設定檔無法使用，改用預設值: {e:#}");
            UserSettings::default()
        });

        Self { settings }
    }
}

pub fn load_settings(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        return Ok(UserSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings from {}", path.display()))
}
