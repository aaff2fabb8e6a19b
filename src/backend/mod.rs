//! Capture/storage backend — public contract.
//!
//! The orchestrator, gallery, and popup all talk to the backend
//! through [`CaptureBackend`]; the default implementation is the
//! filesystem-backed [`FsBackend`]. Each component can be handed a
//! mock in tests.

mod screen;
mod store;

pub use store::FsBackend;

use std::path::{Path, PathBuf};

/// Opaque handle to a full-screen image the backend has already
/// materialized. Created once per capture session, owned by that
/// session, and never shared across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureImageRef {
    path: PathBuf,
}

impl CaptureImageRef {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Metadata for one persisted screenshot. Produced by the backend,
/// immutable once issued.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreenshotMeta {
    pub id: String,
    pub filename: String,
    pub path: String,
    pub created_at: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no monitor available")]
    NoMonitor,
    #[error("screen capture failed: {0}")]
    Capture(String),
    #[error("invalid crop rectangle {width}x{height} at ({x},{y})")]
    InvalidRect { x: u32, y: u32, width: u32, height: u32 },
    #[error("screenshot not found: {0}")]
    NotFound(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The five backend operations the UI layer depends on. All methods
/// are suspension points; implementations must not block the caller's
/// thread (the filesystem backend runs its image work under
/// `spawn_blocking`).
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync + 'static {
    /// Capture the primary monitor and return a reference to the
    /// materialized image.
    async fn capture_fullscreen(&self) -> Result<CaptureImageRef, BackendError>;

    /// Crop `rect` out of a previously captured image and persist it.
    async fn capture_region(
        &self,
        image: &CaptureImageRef,
        rect: crate::selector::PixelRect,
    ) -> Result<ScreenshotMeta, BackendError>;

    /// Up to `count` persisted screenshots, most recent first.
    async fn list_recent(&self, count: usize) -> Result<Vec<ScreenshotMeta>, BackendError>;

    /// Encoded thumbnail for a screenshot, as a data URL.
    async fn get_thumbnail(&self, path: &str) -> Result<String, BackendError>;

    /// Delete a persisted screenshot by filename.
    async fn delete(&self, filename: &str) -> Result<(), BackendError>;
}
