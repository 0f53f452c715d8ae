use anyhow::{Result, bail};
use std::path::Path;

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("路徑不是檔案: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_validate_file_exists() {
        let file = NamedTempFile::new().unwrap();
        assert!(validate_file_exists(file.path()).is_ok());
        assert!(validate_file_exists(Path::new("/nonexistent/file.mp4")).is_err());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        assert!(validate_file_exists(dir.path()).is_err());
    }

    #[test]
    fn test_ensure_directory_exists_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
