//! Gallery/recents coordination.
//!
//! Reconciles screenshot metadata with thumbnails for the gallery and
//! the recents popup. Refreshes are re-entrant: each call fetches its
//! own snapshot and applies it as one atomic list replacement, and a
//! generation counter keeps a slow, older refresh from clobbering a
//! newer one.

use crate::backend::{BackendError, CaptureBackend, ScreenshotMeta};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// One displayed screenshot. `thumbnail` is a data URL; `None` means
/// the fetch failed and the view renders an empty placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub meta: ScreenshotMeta,
    pub thumbnail: Option<String>,
}

pub struct GalleryCoordinator {
    backend: Arc<dyn CaptureBackend>,
    entries: Mutex<Vec<GalleryEntry>>,
    refresh_gen: AtomicU64,
    limit: usize,
}

impl GalleryCoordinator {
    pub fn new(backend: Arc<dyn CaptureBackend>, limit: usize) -> Arc<Self> {
        Arc::new(Self {
            backend,
            entries: Mutex::new(Vec::new()),
            refresh_gen: AtomicU64::new(0),
            limit,
        })
    }

    /// The currently displayed list.
    pub fn entries(&self) -> Vec<GalleryEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Case-insensitive filename filter over the displayed list.
    pub fn search(&self, query: &str) -> Vec<GalleryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.meta.filename.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Fetch fresh metadata, then all thumbnails concurrently. A
    /// failed thumbnail degrades that entry to a placeholder rather
    /// than failing the refresh; a failed listing degrades to an
    /// empty gallery. Returns the list it applied (or `None` if a
    /// newer refresh won the race).
    pub async fn refresh(&self) -> Option<Vec<GalleryEntry>> {
        let generation = self.refresh_gen.fetch_add(1, Ordering::SeqCst) + 1;

        let metas = match self.backend.list_recent(self.limit).await {
            Ok(metas) => metas,
            Err(e) => {
                log::error!("[GALLERY] Listing screenshots failed: {}", e);
                Vec::new()
            }
        };

        let fetches = metas.into_iter().map(|meta| {
            let backend = self.backend.clone();
            async move {
                let thumbnail = match backend.get_thumbnail(&meta.path).await {
                    Ok(data) => Some(data),
                    Err(e) => {
                        log::warn!("[GALLERY] Thumbnail for {} failed: {}", meta.filename, e);
                        None
                    }
                };
                GalleryEntry { meta, thumbnail }
            }
        });
        let fresh = join_all(fetches).await;

        // Last started refresh wins; an older one drops its result.
        if self.refresh_gen.load(Ordering::SeqCst) != generation {
            log::debug!("[GALLERY] Refresh {} superseded", generation);
            return None;
        }
        log::info!("[GALLERY] Refreshed {} entries", fresh.len());
        *self.entries.lock().unwrap() = fresh.clone();
        Some(fresh)
    }

    /// Delete a screenshot. The entry leaves the displayed list only
    /// after the backend confirms; failures propagate so the caller
    /// can surface them (delete is the one user-initiated operation
    /// whose failure is visibly reported).
    pub async fn delete(&self, filename: &str) -> Result<(), BackendError> {
        self.backend.delete(filename).await?;
        self.entries
            .lock()
            .unwrap()
            .retain(|e| e.meta.filename != filename);
        log::info!("[GALLERY] Removed {}", filename);
        Ok(())
    }

    /// Copy a displayed screenshot's path to the system clipboard.
    pub fn copy_path_to_clipboard(&self, filename: &str) -> Result<(), String> {
        let path = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.meta.filename == filename)
            .map(|e| e.meta.path.clone())
            .ok_or_else(|| format!("No such screenshot: {}", filename))?;

        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(&path).map_err(|e| e.to_string())?;
        log::info!("[GALLERY] Copied path for {} to clipboard", filename);
        Ok(())
    }
}
