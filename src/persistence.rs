//! Saving finished recordings
//!
//! The host shows a save dialog; this module only writes the bytes to the
//! chosen path.

use crate::recorder::channel::RecordingError;
use crate::recorder::state::RecordingOutput;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// Native "save as" dialog
#[async_trait]
pub trait SaveDialog: Send + Sync {
    /// Ask the user for a destination, `None` if they cancelled
    async fn choose_path(&self, suggested_name: &str) -> Option<PathBuf>;
}

/// Write `bytes` to `path`, creating missing parent directories
pub fn save_bytes(bytes: &[u8], path: &Path) -> AppResult<()> {
    if bytes.is_empty() {
        return Err(AppError::Recording(RecordingError::EncodingError(
            "recording is empty".to_string(),
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;

    tracing::info!("Saved {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

/// Prompt for a destination and save the recording there
///
/// Returns the written path, or `None` when the user cancelled.
pub async fn save_recording(
    output: &RecordingOutput,
    dialog: &dyn SaveDialog,
) -> AppResult<Option<PathBuf>> {
    let Some(path) = dialog.choose_path(&output.suggested_file_name).await else {
        tracing::info!("Save cancelled");
        return Ok(None);
    };

    save_bytes(&output.bytes, &path)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::state::RecordingSegment;
    use chrono::Utc;
    use tempfile::tempdir;

    struct FixedDialog(Option<PathBuf>);

    #[async_trait]
    impl SaveDialog for FixedDialog {
        async fn choose_path(&self, _suggested_name: &str) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    fn output(bytes: Vec<u8>) -> RecordingOutput {
        let mut segment = RecordingSegment::new(0, 0.0);
        segment.end(1000.0);
        RecordingOutput::new(bytes, &[segment], Utc::now())
    }

    #[tokio::test]
    async fn test_save_recording_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.webm");
        let dialog = FixedDialog(Some(path.clone()));

        let saved = save_recording(&output(vec![1, 2, 3]), &dialog).await.unwrap();

        assert_eq!(saved, Some(path.clone()));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_dialog_writes_nothing() {
        let dialog = FixedDialog(None);
        let saved = save_recording(&output(vec![1]), &dialog).await.unwrap();
        assert!(saved.is_none());
    }

    #[test]
    fn test_empty_recording_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.webm");
        assert!(save_bytes(&[], &path).is_err());
        assert!(!path.exists());
    }
}
