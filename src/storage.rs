// SPDX-License-Identifier: MPL-2.0

//! Writing downloaded photos to disk

use crate::errors::ExportError;
use crate::pipelines::photo::EncodedImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// Save an encoded photo into `output_dir`, creating the directory if needed
///
/// The file is named after the capture time (see [`EncodedImage::filename`]).
pub async fn save(encoded: EncodedImage, output_dir: &Path) -> Result<PathBuf, ExportError> {
    let filepath = output_dir.join(encoded.filename());

    info!(path = %filepath.display(), "Saving photo");

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ExportError::Write {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
    tokio::fs::write(&filepath, &encoded.data)
        .await
        .map_err(|e| ExportError::Write {
            path: filepath.clone(),
            source: e,
        })?;

    info!(path = %filepath.display(), bytes = encoded.data.len(), "Photo saved successfully");
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::EncodingFormat;
    use chrono::{Local, TimeZone};

    fn encoded() -> EncodedImage {
        EncodedImage {
            data: vec![1, 2, 3],
            format: EncodingFormat::Png,
            width: 1,
            height: 1,
            captured_at: Local.timestamp_millis_opt(42).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("Photobooth");

        let path = save(encoded(), &target).await.unwrap();
        assert_eq!(path, target.join("photobooth-42.png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_save_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = save(encoded(), &blocker).await.unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
