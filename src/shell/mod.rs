//! Platform seam — windows as the desktop glue sees them.
//!
//! The crate never links a windowing toolkit. Instead the glue layer
//! implements [`Shell`] (create/look up windows, report the primary
//! monitor) and [`WindowHandle`] (per-window operations), and every
//! controller in this crate works against `Arc<dyn ...>` handles.
//!
//! Windows are identified by an explicit [`WindowRole`] assigned at
//! construction time — never inferred from ambient identity — and the
//! shell's `window(role)` lookup is the single global slot that makes
//! reuse-first acquisition possible: at most one window per role.

use std::sync::Arc;

/// Which of the four application windows a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowRole {
    /// The gallery window — hidden during capture, restored after.
    Main,
    /// The ephemeral full-screen capture overlay.
    Capture,
    /// The persistent floating launcher.
    Widget,
    /// The recents popup paired with the launcher.
    Popup,
}

impl WindowRole {
    /// Stable lowercase name, used only for logging.
    pub fn label(self) -> &'static str {
        match self {
            WindowRole::Main => "main",
            WindowRole::Capture => "capture",
            WindowRole::Widget => "widget",
            WindowRole::Popup => "popup",
        }
    }
}

/// A position in physical (device) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalPosition {
    pub x: i32,
    pub y: i32,
}

/// A size in physical (device) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

/// What the shell knows about the primary monitor.
#[derive(Debug, Clone, Copy)]
pub struct MonitorInfo {
    pub size: PhysicalSize,
    pub scale_factor: f64,
}

/// Construction parameters for a window, fixed at creation time.
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub role: WindowRole,
    pub title: String,
    /// Logical width/height; `None` for fullscreen windows.
    pub inner_size: Option<(f64, f64)>,
    pub fullscreen: bool,
    pub resizable: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub skip_taskbar: bool,
    pub focus: bool,
    /// Windows that draw an image first are created hidden to avoid a
    /// flash of unstyled content; they show themselves when ready.
    pub visible: bool,
}

impl WindowOptions {
    /// The full-screen capture overlay. Created hidden — the overlay
    /// shows itself once the screenshot is decoded and drawn.
    pub fn capture_overlay() -> Self {
        Self {
            role: WindowRole::Capture,
            title: "nimShot Capture".to_string(),
            inner_size: None,
            fullscreen: true,
            resizable: false,
            decorations: false,
            transparent: true,
            always_on_top: true,
            skip_taskbar: true,
            focus: true,
            visible: false,
        }
    }

    /// The persistent floating launcher.
    pub fn floating_widget() -> Self {
        Self {
            role: WindowRole::Widget,
            title: "nimShot Widget".to_string(),
            inner_size: Some((70.0, 70.0)),
            fullscreen: false,
            resizable: false,
            decorations: false,
            transparent: true,
            always_on_top: true,
            skip_taskbar: true,
            focus: false,
            visible: true,
        }
    }

    /// The recents popup. Hidden until the hover controller shows it.
    pub fn popup_panel() -> Self {
        Self {
            role: WindowRole::Popup,
            title: "nimShot Popup".to_string(),
            inner_size: Some((300.0, 400.0)),
            fullscreen: false,
            resizable: false,
            decorations: false,
            transparent: true,
            always_on_top: true,
            skip_taskbar: true,
            focus: false,
            visible: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("window creation failed: {0}")]
    CreationFailed(String),
    #[error("window no longer exists")]
    WindowGone,
    #[error("platform error: {0}")]
    Platform(String),
}

/// Operations on one native window. All methods are non-blocking
/// requests to the windowing system; implementations must be callable
/// from any thread.
pub trait WindowHandle: Send + Sync {
    fn role(&self) -> WindowRole;

    fn show(&self) -> Result<(), ShellError>;
    fn hide(&self) -> Result<(), ShellError>;
    fn is_visible(&self) -> bool;

    fn set_focus(&self) -> Result<(), ShellError>;
    fn unminimize(&self) -> Result<(), ShellError>;

    /// Destroys the window. The glue must report the destruction back
    /// to the session orchestrator (user-initiated or not).
    fn destroy(&self) -> Result<(), ShellError>;

    fn outer_position(&self) -> Result<PhysicalPosition, ShellError>;
    fn set_position(&self, pos: PhysicalPosition) -> Result<(), ShellError>;
    fn scale_factor(&self) -> f64;

    /// Begin a native move-drag of the window itself (launcher
    /// repositioning). Distinct from content drag-out; does not touch
    /// hover state.
    fn start_dragging(&self) -> Result<(), ShellError>;
}

/// The windowing system, as far as this crate is concerned.
pub trait Shell: Send + Sync + 'static {
    /// Create the window for `opts.role`. Implementations must treat
    /// the role as a unique key — creating a role that already exists
    /// is a glue bug, not something this crate guards against.
    fn create_window(&self, opts: WindowOptions) -> Result<Arc<dyn WindowHandle>, ShellError>;

    /// Look up a live window by role. Returns `None` once destroyed;
    /// hidden windows are still found (that is what makes reuse work).
    fn window(&self, role: WindowRole) -> Option<Arc<dyn WindowHandle>>;

    fn primary_monitor(&self) -> Option<MonitorInfo>;
}
