// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for booth operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a single filtered photo without the kiosk

use photobooth::backends::camera::CameraBackend;
use photobooth::backends::feedback::Silent;
use photobooth::config::Config;
use photobooth::filters::FilterId;
use photobooth::pipelines::photo::{CaptureOutcome, CaptureStage, EncodingFormat, PhotoEncoder};
use photobooth::storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// List all available cameras
pub fn list_cameras(backend: &dyn CameraBackend) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        println!();
    }

    Ok(())
}

/// Take one photo with `filter` baked in and save it
///
/// `output` may name a directory or a file; without it the configured export
/// directory is used.
pub fn snap(
    config: &Config,
    backend: Arc<dyn CameraBackend>,
    filter: FilterId,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let format = output_format(output.as_deref(), config.export.format)?;

    // No countdown, no sounds
    let stage = CaptureStage::new(backend, Arc::new(Silent))
        .with_request(config.camera.stream_request())
        .with_countdown_step(Duration::ZERO)
        .with_encoder(PhotoEncoder::new().with_format(format));

    let output_dir = match output.as_ref() {
        Some(path) if path.is_dir() => path.clone(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
        None => config.export.directory(),
    };

    let saved = rt.block_on(async {
        let (width, height) = stage.activate().await?;
        println!("Capture format: {}x{}", width, height);
        stage.set_filter(filter);

        // Wait for frames to stabilize (camera warm-up)
        let warmup = Duration::from_millis(500);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        tokio::time::sleep(warmup).await;

        println!("Capturing...");
        let frame = loop {
            match stage.capture().await {
                CaptureOutcome::Captured(frame) => break frame,
                CaptureOutcome::NoFrame if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(16)).await;
                }
                other => {
                    stage.deactivate();
                    return Err(format!("Failed to capture frame from camera: {:?}", other).into());
                }
            }
        };
        stage.deactivate();

        let encoded = stage.export(&frame)?;
        let path = storage::save(encoded, &output_dir).await?;
        Ok::<_, Box<dyn std::error::Error>>(path)
    })?;

    // If user specified a specific filename, rename the file
    if let Some(user_path) = output
        && !user_path.is_dir()
    {
        std::fs::rename(&saved, &user_path)?;
        println!("Photo saved: {}", user_path.display());
        return Ok(());
    }

    println!("Photo saved: {}", saved.display());
    Ok(())
}

/// Encoding for `output`: a file name's extension decides, otherwise `fallback`
fn output_format(
    output: Option<&Path>,
    fallback: EncodingFormat,
) -> Result<EncodingFormat, Box<dyn std::error::Error>> {
    let Some(extension) = output.filter(|p| !p.is_dir()).and_then(Path::extension) else {
        return Ok(fallback);
    };
    let extension = extension.to_string_lossy();
    EncodingFormat::from_extension(&extension).ok_or_else(|| {
        format!("Unsupported output extension '.{}' (use .png, .jpg or .jpeg)", extension).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_extension_picks_encoder() {
        let jpeg = output_format(Some(Path::new("booth/photo.jpg")), EncodingFormat::Png).unwrap();
        assert_eq!(jpeg, EncodingFormat::Jpeg);

        let png = output_format(Some(Path::new("photo.PNG")), EncodingFormat::Jpeg).unwrap();
        assert_eq!(png, EncodingFormat::Png);
    }

    #[test]
    fn test_output_without_extension_uses_config() {
        assert_eq!(
            output_format(None, EncodingFormat::Jpeg).unwrap(),
            EncodingFormat::Jpeg
        );
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_format(Some(dir.path()), EncodingFormat::Png).unwrap(),
            EncodingFormat::Png
        );
    }

    #[test]
    fn test_unknown_output_extension_rejected() {
        let err = output_format(Some(Path::new("photo.gif")), EncodingFormat::Png).unwrap_err();
        assert!(err.to_string().contains(".gif"));
    }
}
