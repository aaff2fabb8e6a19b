//! Filesystem-backed capture backend.
//!
//! One temp PNG per capture session plus a screenshots directory of
//! timestamped files. All image and fs work runs on the blocking pool
//! so backend calls never stall a window's event loop.

use super::{screen, BackendError, CaptureBackend, CaptureImageRef, ScreenshotMeta};
use crate::selector::PixelRect;
use base64::{engine::general_purpose, Engine as _};
use chrono::Local;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const TEMP_CAPTURE: &str = "temp_capture.png";
const THUMBNAIL_MAX: u32 = 600;

/// Default [`CaptureBackend`] over the local filesystem.
pub struct FsBackend {
    data_dir: PathBuf,
    screenshots_dir: PathBuf,
}

impl FsBackend {
    /// Backend rooted at the user's app-data directory, with the
    /// screenshots folder optionally overridden from settings.
    pub fn new(screenshots_override: Option<PathBuf>) -> Result<Self, BackendError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| {
                BackendError::Io(std::io::Error::other("no app data directory available"))
            })?
            .join("nimshot");
        let screenshots_dir =
            screenshots_override.unwrap_or_else(|| data_dir.join("screenshots"));
        Ok(Self {
            data_dir,
            screenshots_dir,
        })
    }

    /// Backend over explicit directories. Tests use this with temp
    /// dirs; the glue can use it for portable installs.
    pub fn with_dirs(data_dir: PathBuf, screenshots_dir: PathBuf) -> Self {
        Self {
            data_dir,
            screenshots_dir,
        }
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    fn ensure_screenshots_dir(dir: &Path) -> Result<(), BackendError> {
        std::fs::create_dir_all(dir)?;
        Ok(())
    }
}

/// Build the metadata record for a file just written to `path`.
fn meta_for_saved(
    id: &str,
    filename: &str,
    path: &Path,
    width: u32,
    height: u32,
) -> ScreenshotMeta {
    ScreenshotMeta {
        id: id.to_string(),
        filename: filename.to_string(),
        path: path.to_string_lossy().to_string(),
        created_at: Local::now().to_rfc3339(),
        width,
        height,
        file_size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
    }
}

/// Recover the uuid suffix from a `screenshot_<ts>_<id>.png` name;
/// falls back to the whole filename for files we didn't produce.
fn id_from_filename(filename: &str) -> String {
    filename
        .strip_prefix("screenshot_")
        .and_then(|s| s.strip_suffix(".png"))
        .and_then(|s| s.split('_').next_back())
        .unwrap_or(filename)
        .to_string()
}

fn list_recent_blocking(
    dir: &Path,
    count: usize,
) -> Result<Vec<ScreenshotMeta>, BackendError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "png")
                .unwrap_or(false)
        })
        .collect();

    // Newest first, by modification time.
    entries.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    let results = entries
        .into_iter()
        .take(count)
        .filter_map(|entry| {
            let path = entry.path();
            let metadata = entry.metadata().ok()?;
            let filename = path.file_name()?.to_string_lossy().to_string();
            let (width, height) = image::image_dimensions(&path).unwrap_or((0, 0));
            let created_at = metadata
                .modified()
                .ok()
                .map(|t| {
                    let datetime: chrono::DateTime<chrono::Local> = t.into();
                    datetime.to_rfc3339()
                })
                .unwrap_or_default();

            Some(ScreenshotMeta {
                id: id_from_filename(&filename),
                filename,
                path: path.to_string_lossy().to_string(),
                created_at,
                width,
                height,
                file_size: metadata.len(),
            })
        })
        .collect();

    Ok(results)
}

fn thumbnail_blocking(path: &Path) -> Result<String, BackendError> {
    let img = image::open(path)?;
    // JPEG has no alpha channel; captures are RGBA.
    let thumbnail = img.thumbnail(THUMBNAIL_MAX, THUMBNAIL_MAX).to_rgb8();

    let mut buf = Cursor::new(Vec::new());
    thumbnail.write_to(&mut buf, ImageFormat::Jpeg)?;

    let encoded = general_purpose::STANDARD.encode(buf.into_inner());
    Ok(format!("data:image/jpeg;base64,{}", encoded))
}

fn join_failed(e: tokio::task::JoinError) -> BackendError {
    BackendError::Io(std::io::Error::other(format!("blocking task failed: {e}")))
}

#[async_trait::async_trait]
impl CaptureBackend for FsBackend {
    async fn capture_fullscreen(&self) -> Result<CaptureImageRef, BackendError> {
        let data_dir = self.data_dir.clone();
        let path = tokio::task::spawn_blocking(move || {
            let img = screen::capture_primary_monitor()?;
            std::fs::create_dir_all(&data_dir)?;
            let temp_path = data_dir.join(TEMP_CAPTURE);
            img.save(&temp_path)?;
            log::info!(
                "[STORE] Captured {}x{} to {}",
                img.width(),
                img.height(),
                temp_path.display()
            );
            Ok::<_, BackendError>(temp_path)
        })
        .await
        .map_err(join_failed)??;

        Ok(CaptureImageRef::new(path))
    }

    async fn capture_region(
        &self,
        image: &CaptureImageRef,
        rect: PixelRect,
    ) -> Result<ScreenshotMeta, BackendError> {
        if rect.width == 0 || rect.height == 0 {
            return Err(BackendError::InvalidRect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            });
        }

        let source = image.path().to_path_buf();
        let screenshots_dir = self.screenshots_dir.clone();
        tokio::task::spawn_blocking(move || {
            let img = image::open(&source)?;
            if rect.x >= img.width() || rect.y >= img.height() {
                return Err(BackendError::InvalidRect {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                });
            }
            let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);

            let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
            let id = Uuid::new_v4().to_string();
            let filename = format!("screenshot_{}_{}.png", timestamp, &id[..8]);

            FsBackend::ensure_screenshots_dir(&screenshots_dir)?;
            let filepath = screenshots_dir.join(&filename);
            cropped.save(&filepath)?;

            log::info!(
                "[STORE] Saved region {}x{} at ({},{}) as {}",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                filename
            );
            Ok(meta_for_saved(
                &id[..8],
                &filename,
                &filepath,
                cropped.width(),
                cropped.height(),
            ))
        })
        .await
        .map_err(join_failed)?
    }

    async fn list_recent(&self, count: usize) -> Result<Vec<ScreenshotMeta>, BackendError> {
        let dir = self.screenshots_dir.clone();
        tokio::task::spawn_blocking(move || {
            FsBackend::ensure_screenshots_dir(&dir)?;
            list_recent_blocking(&dir, count)
        })
        .await
        .map_err(join_failed)?
    }

    async fn get_thumbnail(&self, path: &str) -> Result<String, BackendError> {
        let path = PathBuf::from(path);
        tokio::task::spawn_blocking(move || thumbnail_blocking(&path))
            .await
            .map_err(join_failed)?
    }

    async fn delete(&self, filename: &str) -> Result<(), BackendError> {
        // Filenames only — a path here would escape the screenshots dir.
        if filename.contains('/') || filename.contains('\\') {
            return Err(BackendError::NotFound(filename.to_string()));
        }

        let filepath = self.screenshots_dir.join(filename);
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || {
            if !filepath.exists() {
                return Err(BackendError::NotFound(filename));
            }
            std::fs::remove_file(&filepath)?;
            log::info!("[STORE] Deleted {}", filename);
            Ok(())
        })
        .await
        .map_err(join_failed)?
    }
}
