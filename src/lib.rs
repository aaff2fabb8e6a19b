//! nimShot core — cross-window orchestration for a screenshot utility.
//!
//! The application is four cooperating native windows: a gallery
//! (main), an ephemeral full-screen capture overlay, a persistent
//! floating launcher, and a recents popup. This crate owns everything
//! between them — the capture-session lifecycle, the region-selection
//! state machine, hover-intent control for the launcher/popup pair,
//! and the gallery coordinator — over an async capture/storage
//! backend.
//!
//! The crate links no windowing toolkit. The desktop glue implements
//! the [`shell::Shell`] / [`shell::WindowHandle`] traits and feeds
//! window events in; all cross-window communication is typed tokio
//! channels ([`session::OverlayMessage`], [`hover::PopupSignal`],
//! [`app::AppSignal`]), never a stringly event bus.
//!
//! Typical glue wiring:
//!
//! ```ignore
//! let settings = nimshot::config::Settings::load();
//! let backend = Arc::new(nimshot::backend::FsBackend::new(
//!     settings.screenshot_folder.clone(),
//! )?);
//! let app = nimshot::App::new(shell, backend, settings);
//! app.bootstrap()?;
//! let triggers = app.signal_sender(); // hotkey/tray → TriggerCapture
//! ```

pub mod app;
pub mod backend;
pub mod config;
pub mod gallery;
pub mod hover;
pub mod selector;
pub mod session;
pub mod shell;
pub mod updater;

pub use app::App;

/// Initialize logging for a glue binary. Defaults to `info` unless
/// `RUST_LOG` overrides it.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
