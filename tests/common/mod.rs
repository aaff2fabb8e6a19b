//! Shared fakes for the integration suites: an in-process shell and a
//! programmable capture backend.

#![allow(dead_code)] // each test crate uses a different slice of this

use nimshot::backend::{BackendError, CaptureBackend, CaptureImageRef, ScreenshotMeta};
use nimshot::selector::PixelRect;
use nimshot::shell::{
    MonitorInfo, PhysicalPosition, PhysicalSize, Shell, ShellError, WindowHandle, WindowOptions,
    WindowRole,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Fake windowing ───────────────────────────────────────────────────

pub struct FakeWindow {
    role: WindowRole,
    pub visible: Mutex<bool>,
    pub destroyed: Mutex<bool>,
    pub position: Mutex<Option<PhysicalPosition>>,
    pub scale: f64,
    pub show_count: AtomicUsize,
    pub hide_count: AtomicUsize,
    pub focus_count: AtomicUsize,
    pub unminimize_count: AtomicUsize,
}

impl FakeWindow {
    fn new(role: WindowRole, visible: bool, scale: f64) -> Arc<Self> {
        Arc::new(Self {
            role,
            visible: Mutex::new(visible),
            destroyed: Mutex::new(false),
            position: Mutex::new(None),
            scale,
            show_count: AtomicUsize::new(0),
            hide_count: AtomicUsize::new(0),
            focus_count: AtomicUsize::new(0),
            unminimize_count: AtomicUsize::new(0),
        })
    }

    pub fn is_destroyed(&self) -> bool {
        *self.destroyed.lock().unwrap()
    }

    pub fn shown(&self) -> usize {
        self.show_count.load(Ordering::SeqCst)
    }

    pub fn hidden(&self) -> usize {
        self.hide_count.load(Ordering::SeqCst)
    }
}

impl WindowHandle for FakeWindow {
    fn role(&self) -> WindowRole {
        self.role
    }

    fn show(&self) -> Result<(), ShellError> {
        self.show_count.fetch_add(1, Ordering::SeqCst);
        *self.visible.lock().unwrap() = true;
        Ok(())
    }

    fn hide(&self) -> Result<(), ShellError> {
        self.hide_count.fetch_add(1, Ordering::SeqCst);
        *self.visible.lock().unwrap() = false;
        Ok(())
    }

    fn is_visible(&self) -> bool {
        *self.visible.lock().unwrap()
    }

    fn set_focus(&self) -> Result<(), ShellError> {
        self.focus_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unminimize(&self) -> Result<(), ShellError> {
        self.unminimize_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> Result<(), ShellError> {
        *self.destroyed.lock().unwrap() = true;
        *self.visible.lock().unwrap() = false;
        Ok(())
    }

    fn outer_position(&self) -> Result<PhysicalPosition, ShellError> {
        self.position
            .lock()
            .unwrap()
            .ok_or(ShellError::Platform("no position set".into()))
    }

    fn set_position(&self, pos: PhysicalPosition) -> Result<(), ShellError> {
        *self.position.lock().unwrap() = Some(pos);
        Ok(())
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn start_dragging(&self) -> Result<(), ShellError> {
        Ok(())
    }
}

pub struct FakeShell {
    windows: Mutex<HashMap<WindowRole, Arc<FakeWindow>>>,
    pub created: Mutex<Vec<WindowOptions>>,
    pub fail_creation: AtomicBool,
    pub scale: f64,
    monitor: Option<MonitorInfo>,
}

impl FakeShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            fail_creation: AtomicBool::new(false),
            scale: 1.0,
            monitor: Some(MonitorInfo {
                size: PhysicalSize {
                    width: 1920,
                    height: 1080,
                },
                scale_factor: 1.0,
            }),
        })
    }

    pub fn with_scale(scale: f64) -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            fail_creation: AtomicBool::new(false),
            scale,
            monitor: Some(MonitorInfo {
                size: PhysicalSize {
                    width: 3840,
                    height: 2160,
                },
                scale_factor: scale,
            }),
        })
    }

    /// Pre-seed a window (the main/widget/popup windows exist before
    /// the component under test runs).
    pub fn add_window(&self, role: WindowRole, visible: bool) -> Arc<FakeWindow> {
        let window = FakeWindow::new(role, visible, self.scale);
        self.windows.lock().unwrap().insert(role, window.clone());
        window
    }

    pub fn fake_window(&self, role: WindowRole) -> Option<Arc<FakeWindow>> {
        self.windows.lock().unwrap().get(&role).cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

impl Shell for FakeShell {
    fn create_window(&self, opts: WindowOptions) -> Result<Arc<dyn WindowHandle>, ShellError> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(ShellError::CreationFailed("injected failure".into()));
        }
        let window = FakeWindow::new(opts.role, opts.visible, self.scale);
        self.windows.lock().unwrap().insert(opts.role, window.clone());
        self.created.lock().unwrap().push(opts);
        Ok(window)
    }

    fn window(&self, role: WindowRole) -> Option<Arc<dyn WindowHandle>> {
        let window = self.windows.lock().unwrap().get(&role).cloned()?;
        if window.is_destroyed() {
            return None;
        }
        Some(window)
    }

    fn primary_monitor(&self) -> Option<MonitorInfo> {
        self.monitor
    }
}

// ── Fake backend ─────────────────────────────────────────────────────

pub struct FakeBackend {
    pub capture_delay: Mutex<Duration>,
    pub list_delay: Mutex<Duration>,
    pub fail_capture: AtomicBool,
    pub fail_crop: AtomicBool,
    pub fail_listing: AtomicBool,
    pub fail_delete: AtomicBool,
    pub capture_count: AtomicUsize,
    pub crops: Mutex<Vec<PixelRect>>,
    pub metas: Mutex<Vec<ScreenshotMeta>>,
    pub failing_thumbs: Mutex<HashSet<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            capture_delay: Mutex::new(Duration::ZERO),
            list_delay: Mutex::new(Duration::ZERO),
            fail_capture: AtomicBool::new(false),
            fail_crop: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            capture_count: AtomicUsize::new(0),
            crops: Mutex::new(Vec::new()),
            metas: Mutex::new(Vec::new()),
            failing_thumbs: Mutex::new(HashSet::new()),
            deleted: Mutex::new(Vec::new()),
        })
    }

    pub fn set_metas(&self, metas: Vec<ScreenshotMeta>) {
        *self.metas.lock().unwrap() = metas;
    }

    pub fn fail_thumbnail_for(&self, path: &str) {
        self.failing_thumbs.lock().unwrap().insert(path.to_string());
    }

    pub fn captures(&self) -> usize {
        self.capture_count.load(Ordering::SeqCst)
    }

    pub fn crop_count(&self) -> usize {
        self.crops.lock().unwrap().len()
    }
}

pub fn meta(filename: &str) -> ScreenshotMeta {
    ScreenshotMeta {
        id: filename.to_string(),
        filename: filename.to_string(),
        path: format!("/shots/{}", filename),
        created_at: "2025-01-01T00:00:00+00:00".to_string(),
        width: 640,
        height: 480,
        file_size: 1024,
    }
}

#[async_trait::async_trait]
impl CaptureBackend for FakeBackend {
    async fn capture_fullscreen(&self) -> Result<CaptureImageRef, BackendError> {
        let delay = *self.capture_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(BackendError::Capture("injected capture failure".into()));
        }
        let n = self.capture_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CaptureImageRef::new(
            format!("/tmp/fake_capture_{}.png", n).into(),
        ))
    }

    async fn capture_region(
        &self,
        _image: &CaptureImageRef,
        rect: PixelRect,
    ) -> Result<ScreenshotMeta, BackendError> {
        self.crops.lock().unwrap().push(rect);
        if self.fail_crop.load(Ordering::SeqCst) {
            return Err(BackendError::Capture("injected crop failure".into()));
        }
        Ok(ScreenshotMeta {
            id: "cafebabe".to_string(),
            filename: "screenshot_fake_cafebabe.png".to_string(),
            path: "/shots/screenshot_fake_cafebabe.png".to_string(),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            width: rect.width,
            height: rect.height,
            file_size: 2048,
        })
    }

    async fn list_recent(&self, count: usize) -> Result<Vec<ScreenshotMeta>, BackendError> {
        let delay = *self.list_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::Io(std::io::Error::other("injected")));
        }
        let metas = self.metas.lock().unwrap();
        Ok(metas.iter().take(count).cloned().collect())
    }

    async fn get_thumbnail(&self, path: &str) -> Result<String, BackendError> {
        if self.failing_thumbs.lock().unwrap().contains(path) {
            return Err(BackendError::NotFound(path.to_string()));
        }
        Ok(format!("data:image/jpeg;base64,thumb-of-{}", path))
    }

    async fn delete(&self, filename: &str) -> Result<(), BackendError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound(filename.to_string()));
        }
        let existed = {
            let mut metas = self.metas.lock().unwrap();
            let before = metas.len();
            metas.retain(|m| m.filename != filename);
            metas.len() != before
        };
        if !existed {
            return Err(BackendError::NotFound(filename.to_string()));
        }
        self.deleted.lock().unwrap().push(filename.to_string());
        Ok(())
    }
}

// ── Timing helper ────────────────────────────────────────────────────

/// Poll `cond` under a paused clock. Sleeping (instead of yielding)
/// lets the runtime auto-advance timers held by the code under test.
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..5_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached in time");
}
