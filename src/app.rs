//! App shell — wires the controllers together.
//!
//! No business logic lives here: construction, window bootstrap,
//! typed signal inlets for the glue (hotkey/tray triggers, popup
//! hover/drag notifications), the popup refresh loop, and teardown.

use crate::backend::CaptureBackend;
use crate::config::Settings;
use crate::gallery::GalleryCoordinator;
use crate::hover::{HoverIntentController, PopupSignal};
use crate::session::CaptureSession;
use crate::shell::{PhysicalPosition, Shell, ShellError, WindowHandle, WindowOptions, WindowRole};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Launcher inset from the bottom-right screen corner, logical px.
const WIDGET_INSET: f64 = 100.0;

/// Global signals into the app (hotkey, tray menu).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSignal {
    TriggerCapture,
}

pub struct App {
    shell: Arc<dyn Shell>,
    settings: Settings,
    session: Arc<CaptureSession>,
    hover: Arc<HoverIntentController>,
    gallery: Arc<GalleryCoordinator>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl App {
    pub fn new(
        shell: Arc<dyn Shell>,
        backend: Arc<dyn CaptureBackend>,
        settings: Settings,
    ) -> Arc<Self> {
        let session = CaptureSession::new(
            shell.clone(),
            backend.clone(),
            settings.settle_delay(),
            settings.handshake_timeout(),
        );
        let hover = HoverIntentController::new(shell.clone(), settings.hide_delay());
        let gallery = GalleryCoordinator::new(backend, settings.recents_limit);
        Arc::new(Self {
            shell,
            settings,
            session,
            hover,
            gallery,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn session(&self) -> &Arc<CaptureSession> {
        &self.session
    }

    pub fn hover(&self) -> &Arc<HoverIntentController> {
        &self.hover
    }

    pub fn gallery(&self) -> &Arc<GalleryCoordinator> {
        &self.gallery
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create the launcher widget (visible, bottom-right or at its
    /// saved position) and the recents popup (hidden until hovered).
    pub fn bootstrap(&self) -> Result<(), ShellError> {
        let widget = self.shell.create_window(WindowOptions::floating_widget())?;

        let position = match self.settings.widget_position {
            Some(saved) => Some(PhysicalPosition {
                x: saved.x as i32,
                y: saved.y as i32,
            }),
            None => self.shell.primary_monitor().map(|monitor| {
                let inset = (WIDGET_INSET * monitor.scale_factor) as i32;
                PhysicalPosition {
                    x: monitor.size.width as i32 - inset,
                    y: monitor.size.height as i32 - inset,
                }
            }),
        };
        if let Some(position) = position {
            if let Err(e) = widget.set_position(position) {
                log::warn!("[APP] Failed to position launcher: {}", e);
            }
        }

        self.shell.create_window(WindowOptions::popup_panel())?;
        log::info!("[APP] Launcher and popup windows created");
        Ok(())
    }

    /// Inlet for global signals. The glue's hotkey/tray handlers send
    /// here; the pump task is owned by the app and dies with it.
    pub fn signal_sender(&self) -> mpsc::UnboundedSender<AppSignal> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Arc::downgrade(&self.session);
        let handle = tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                let Some(session) = session.upgrade() else { break };
                match signal {
                    AppSignal::TriggerCapture => session.trigger().await,
                }
            }
        });
        self.tasks.lock().unwrap().push(handle);
        tx
    }

    /// Inlet for the popup window's hover/drag notifications.
    pub fn popup_signal_sender(&self) -> mpsc::UnboundedSender<PopupSignal> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let hover = Arc::downgrade(&self.hover);
        let handle = tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                let Some(hover) = hover.upgrade() else { break };
                hover.popup_signal(signal);
            }
        });
        self.tasks.lock().unwrap().push(handle);
        tx
    }

    /// The launcher was hovered / unhovered. Thin passthroughs so the
    /// glue only ever talks to `App`.
    pub fn widget_enter(&self) {
        self.hover.widget_enter();
    }

    pub fn widget_leave(&self) {
        self.hover.widget_leave();
    }

    /// Reposition the launcher itself (native move-drag). Window
    /// repositioning never touches hover or drag-lock state.
    pub fn widget_drag(&self) {
        if let Some(widget) = self.shell.window(WindowRole::Widget) {
            if let Err(e) = widget.start_dragging() {
                log::warn!("[APP] Launcher drag failed: {}", e);
            }
        }
    }

    /// Keep the recents popup fresh while the app runs.
    pub fn spawn_popup_refresh(&self) {
        let gallery = Arc::downgrade(&self.gallery);
        let period = self.settings.popup_refresh_period();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(gallery) = gallery.upgrade() else { break };
                gallery.refresh().await;
            }
        });
        self.tasks.lock().unwrap().push(handle);
    }

    /// Abort every owned background task and pending timer so nothing
    /// fires against disposed windows.
    pub fn shutdown(&self) {
        for handle in self.tasks.lock().unwrap().drain(..) {
            handle.abort();
        }
        self.hover.shutdown();
        log::info!("[APP] Shut down");
    }
}
