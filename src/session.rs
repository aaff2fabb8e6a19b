//! Capture-session orchestration.
//!
//! Owns the lifecycle of the ephemeral capture overlay: hiding the
//! main window, acquiring the screenshot, creating or reusing the
//! overlay window, the one-shot ready handshake, commit/cancel, and
//! restoring the main window on every exit path.
//!
//! At most one session is active at a time. Each session gets an
//! epoch number; async results that complete after the session ended
//! (a capture finishing after cancel, a crop finishing after a
//! restart) are compared against the current epoch and discarded.

use crate::backend::{BackendError, CaptureBackend, CaptureImageRef, ScreenshotMeta};
use crate::selector::Rect;
use crate::shell::{Shell, WindowHandle, WindowOptions, WindowRole};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Selections smaller than this (either axis) are accidental clicks,
/// not capture requests.
pub const MIN_SELECTION_PX: f64 = 10.0;

/// Typed channel payload pushed to the capture overlay. The overlay
/// decodes and draws the image, then makes its window visible.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayMessage {
    Screenshot(CaptureImageRef),
}

/// Externally observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Capturing,
    Selecting,
    Committing,
    Restoring,
}

enum Phase {
    Idle,
    Capturing,
    Selecting(CaptureImageRef),
    Committing,
    Restoring,
}

struct SessionSlot {
    /// Bumped when a session starts and again when it ends.
    epoch: u64,
    phase: Phase,
    /// The pending-handshake token: present while a freshly created
    /// overlay has not yet signalled ready. Consumed on first use;
    /// replaced (never stacked) by a newer trigger.
    ready: Option<oneshot::Sender<()>>,
    /// Typed channel to the current overlay host.
    overlay_tx: Option<mpsc::UnboundedSender<OverlayMessage>>,
}

/// The capture-session orchestrator.
pub struct CaptureSession {
    shell: Arc<dyn Shell>,
    backend: Arc<dyn CaptureBackend>,
    settle_delay: Duration,
    handshake_timeout: Duration,
    slot: Mutex<SessionSlot>,
}

impl CaptureSession {
    pub fn new(
        shell: Arc<dyn Shell>,
        backend: Arc<dyn CaptureBackend>,
        settle_delay: Duration,
        handshake_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            shell,
            backend,
            settle_delay,
            handshake_timeout,
            slot: Mutex::new(SessionSlot {
                epoch: 0,
                phase: Phase::Idle,
                ready: None,
                overlay_tx: None,
            }),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        match self.slot.lock().unwrap().phase {
            Phase::Idle => SessionPhase::Idle,
            Phase::Capturing => SessionPhase::Capturing,
            Phase::Selecting(_) => SessionPhase::Selecting,
            Phase::Committing => SessionPhase::Committing,
            Phase::Restoring => SessionPhase::Restoring,
        }
    }

    /// Register the overlay host's inbound channel. Called by the glue
    /// when it constructs the overlay view, before `notify_ready`.
    /// Replaces any previous channel.
    pub fn attach_overlay(&self) -> mpsc::UnboundedReceiver<OverlayMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slot.lock().unwrap().overlay_tx = Some(tx);
        rx
    }

    /// The overlay's render surface is ready to receive a screenshot.
    /// Consumes the pending handshake; redundant ready signals find no
    /// token and are ignored.
    pub fn notify_ready(&self) {
        let token = self.slot.lock().unwrap().ready.take();
        match token {
            Some(tx) => {
                let _ = tx.send(());
            }
            None => log::debug!("[SESSION] Ready signal with no pending handshake; ignored"),
        }
    }

    /// Start (or re-arm) a capture session. Fire-and-forget: the
    /// outcome flows through the overlay channel and the backend.
    pub async fn trigger(&self) {
        let epoch = {
            let mut slot = self.slot.lock().unwrap();
            match slot.phase {
                Phase::Capturing => {
                    // A capture is already being prepared; collapse
                    // this trigger into the one in flight.
                    drop(slot);
                    log::info!("[SESSION] Trigger while capturing; refocusing");
                    self.refocus_overlay();
                    return;
                }
                Phase::Committing | Phase::Restoring => {
                    log::debug!("[SESSION] Trigger during session teardown; ignored");
                    return;
                }
                // A trigger mid-selection restarts with a fresh
                // screenshot into the same window.
                Phase::Idle | Phase::Selecting(_) => {}
            }
            slot.epoch += 1;
            slot.phase = Phase::Capturing;
            slot.ready = None; // drop any stale handshake token
            slot.epoch
        };
        log::info!("[SESSION] Session {} started", epoch);

        // Hide the gallery and let the platform's hide animation
        // settle so it doesn't end up in the screenshot.
        if let Some(main) = self.shell.window(WindowRole::Main) {
            if let Err(e) = main.hide() {
                log::warn!("[SESSION] Failed to hide main window: {}", e);
            }
        }
        tokio::time::sleep(self.settle_delay).await;

        let image = match self.backend.capture_fullscreen().await {
            Ok(image) => image,
            Err(e) => {
                log::error!("[SESSION] Fullscreen capture failed: {}", e);
                self.finish(epoch);
                return;
            }
        };

        {
            let slot = self.slot.lock().unwrap();
            if slot.epoch != epoch || !matches!(slot.phase, Phase::Capturing) {
                log::info!("[SESSION] Discarding capture for ended session {}", epoch);
                return;
            }
        }

        // Reuse-first: a hidden overlay from an earlier session gets
        // the new screenshot pushed to it instead of a new window.
        if let Some(overlay) = self.shell.window(WindowRole::Capture) {
            log::info!("[SESSION] Reusing existing capture window");
            self.deliver(epoch, image);
            let _ = overlay.unminimize();
            // The overlay shows itself once the new image is drawn.
            return;
        }

        let overlay = match self.shell.create_window(WindowOptions::capture_overlay()) {
            Ok(overlay) => overlay,
            Err(e) => {
                log::error!("[SESSION] Capture window creation failed: {}", e);
                self.finish(epoch);
                return;
            }
        };

        // One pending handshake per session. If a newer trigger
        // replaces the token, this waiter sees a closed channel.
        let (ready_tx, ready_rx) = oneshot::channel();
        {
            let mut slot = self.slot.lock().unwrap();
            if slot.epoch != epoch {
                return;
            }
            slot.ready = Some(ready_tx);
        }

        match tokio::time::timeout(self.handshake_timeout, ready_rx).await {
            Ok(Ok(())) => self.deliver(epoch, image),
            Ok(Err(_)) => {
                // The token was replaced; the newer session owns the
                // window and the restoration.
                log::debug!("[SESSION] Handshake superseded (session {})", epoch);
            }
            Err(_) => {
                log::warn!(
                    "[SESSION] Capture window never signalled ready within {:?}; restoring",
                    self.handshake_timeout
                );
                {
                    let mut slot = self.slot.lock().unwrap();
                    if slot.epoch != epoch {
                        return;
                    }
                    slot.ready = None;
                }
                if let Err(e) = overlay.destroy() {
                    log::warn!("[SESSION] Failed to destroy stalled capture window: {}", e);
                }
                self.finish(epoch);
            }
        }
    }

    /// Crop `rect` out of the session screenshot and end the session.
    ///
    /// Below-minimum selections are ignored and the session stays in
    /// `Selecting`. Otherwise the overlay is hidden (kept for reuse)
    /// and the main window restored whether or not the crop succeeded;
    /// a crop failure is returned for logging but the UI is already
    /// back in its idle state.
    pub async fn commit(&self, rect: Rect) -> Result<Option<ScreenshotMeta>, BackendError> {
        let (epoch, image) = {
            let mut slot = self.slot.lock().unwrap();
            let image = match &slot.phase {
                Phase::Selecting(image) => image.clone(),
                _ => {
                    log::debug!("[SESSION] Commit outside selection phase; ignored");
                    return Ok(None);
                }
            };
            if rect.w < MIN_SELECTION_PX || rect.h < MIN_SELECTION_PX {
                log::debug!(
                    "[SESSION] Selection {:.0}x{:.0} below minimum; ignored",
                    rect.w,
                    rect.h
                );
                return Ok(None);
            }
            slot.phase = Phase::Committing;
            (slot.epoch, image)
        };

        let result = self.backend.capture_region(&image, rect.to_pixel()).await;

        {
            let mut slot = self.slot.lock().unwrap();
            if slot.epoch != epoch {
                log::info!("[SESSION] Discarding crop result for ended session {}", epoch);
                return Ok(None);
            }
            slot.phase = Phase::Restoring;
        }
        self.hide_overlay();
        self.finish(epoch);

        match result {
            Ok(meta) => {
                log::info!(
                    "[SESSION] Committed {} ({}x{})",
                    meta.filename,
                    meta.width,
                    meta.height
                );
                Ok(Some(meta))
            }
            Err(e) => {
                log::error!("[SESSION] Region crop failed: {}", e);
                Err(e)
            }
        }
    }

    /// Abort the active session without cropping. Safe to call twice;
    /// the second call finds no session and does nothing.
    pub fn cancel(&self) {
        let epoch = {
            let slot = self.slot.lock().unwrap();
            match slot.phase {
                Phase::Idle => {
                    log::debug!("[SESSION] Cancel with no active session");
                    return;
                }
                Phase::Committing | Phase::Restoring => return,
                Phase::Capturing | Phase::Selecting(_) => slot.epoch,
            }
        };
        log::info!("[SESSION] Session {} cancelled", epoch);
        self.hide_overlay();
        self.finish(epoch);
    }

    /// The glue reports overlay destruction here — user Escape-close,
    /// a platform error, anything. Restores the main window if a
    /// session was active.
    pub fn on_overlay_destroyed(&self) {
        let epoch = {
            let slot = self.slot.lock().unwrap();
            if matches!(slot.phase, Phase::Idle) {
                log::debug!("[SESSION] Capture window destroyed outside a session");
                return;
            }
            slot.epoch
        };
        log::info!("[SESSION] Capture window destroyed; restoring main window");
        self.finish(epoch);
    }

    /// Push the screenshot to the overlay and move to `Selecting`.
    fn deliver(&self, epoch: u64, image: CaptureImageRef) {
        let tx = {
            let mut slot = self.slot.lock().unwrap();
            if slot.epoch != epoch {
                log::info!("[SESSION] Not delivering screenshot for ended session {}", epoch);
                return;
            }
            slot.phase = Phase::Selecting(image.clone());
            slot.overlay_tx.clone()
        };
        match tx {
            Some(tx) => {
                if tx.send(OverlayMessage::Screenshot(image)).is_err() {
                    log::warn!("[SESSION] Overlay channel closed; screenshot dropped");
                }
            }
            None => log::warn!("[SESSION] No overlay host attached; screenshot dropped"),
        }
    }

    /// The single exit path: phase-guarded, so the main window is
    /// restored exactly once per session no matter how many exit
    /// signals race in.
    fn finish(&self, epoch: u64) {
        {
            let mut slot = self.slot.lock().unwrap();
            if slot.epoch != epoch || matches!(slot.phase, Phase::Idle) {
                return;
            }
            slot.phase = Phase::Idle;
            slot.ready = None;
            // Invalidate anything still in flight for this session.
            slot.epoch += 1;
        }
        self.restore_main();
    }

    fn restore_main(&self) {
        match self.shell.window(WindowRole::Main) {
            Some(main) => {
                if let Err(e) = main.show() {
                    log::warn!("[SESSION] Failed to restore main window: {}", e);
                }
            }
            None => log::warn!("[SESSION] Main window missing; nothing to restore"),
        }
    }

    fn hide_overlay(&self) {
        if let Some(overlay) = self.shell.window(WindowRole::Capture) {
            if let Err(e) = overlay.hide() {
                log::warn!("[SESSION] Failed to hide capture window: {}", e);
            }
        }
    }

    fn refocus_overlay(&self) {
        if let Some(overlay) = self.shell.window(WindowRole::Capture) {
            let _ = overlay.set_focus();
        }
    }
}
