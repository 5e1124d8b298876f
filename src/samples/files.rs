/// Local source files: open a script, save a timestamped snapshot
use crate::config::types::{PlaygroundError, Result};
use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// Prefix of snapshots saved from the multi-panel view
pub const DEFAULT_SNAPSHOT_PREFIX: &str = "multi";

pub async fn load_source_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    String::from_utf8(bytes).map_err(|_| {
        PlaygroundError::Sample(format!("{} is not valid UTF-8 text", path.display()))
    })
}

/// `<prefix>-YYYYMMDD-HHMM.php`
pub fn snapshot_file_name<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{}.php", prefix, at.format("%Y%m%d-%H%M"))
}

/// Write `content` into `dir` under a snapshot name stamped with local time
pub async fn save_snapshot(dir: &Path, prefix: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(snapshot_file_name(prefix, &Local::now()));
    tokio::fs::write(&path, content).await?;
    log::info!("Saved snapshot {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn snapshot_names_are_zero_padded() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 59).unwrap();
        assert_eq!(snapshot_file_name("multi", &at), "multi-20250307-0905.php");
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_snapshot(dir.path(), "playground", "<?php echo 1;").await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("playground-") && name.ends_with(".php"));
        assert_eq!(load_source_file(&path).await.unwrap(), "<?php echo 1;");
    }

    #[tokio::test]
    async fn binary_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.php");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            load_source_file(&path).await,
            Err(PlaygroundError::Sample(_))
        ));
    }
}
