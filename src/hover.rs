//! Hover-intent control for the launcher/popup pair.
//!
//! The launcher and the popup are separate native windows; neither can
//! observe the other's pointer state, so both report into this
//! controller (the launcher directly, the popup via [`PopupSignal`]
//! messages). The controller is the only mutator of the hover state,
//! owns the debounced hide timer, and guarantees the popup is never
//! hidden while a drag is in flight or either window is hovered.

use crate::shell::{PhysicalPosition, Shell, WindowHandle, WindowRole};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Popup offset from the launcher's outer position, logical pixels
/// (scaled by the launcher's display scale factor).
const POPUP_OFFSET_X: f64 = 240.0;
const POPUP_OFFSET_Y: f64 = 410.0;

/// Cross-window notifications from the popup to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupSignal {
    MouseEnter,
    MouseLeave,
    /// A thumbnail drag-out started; hide is suppressed until DragEnd.
    DragStart,
    DragEnd,
}

/// Snapshot of the controller's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    pub popup_visible: bool,
    pub widget_hovered: bool,
    pub popup_hovered: bool,
    pub drag_locked: bool,
}

pub struct HoverIntentController {
    shell: Arc<dyn Shell>,
    state: Mutex<HoverState>,
    hide_timer: Mutex<Option<JoinHandle<()>>>,
    hide_delay: Duration,
    /// Handed to the timer task; a torn-down controller must not be
    /// kept alive by its own pending timer.
    weak_self: Weak<HoverIntentController>,
}

impl HoverIntentController {
    pub fn new(shell: Arc<dyn Shell>, hide_delay: Duration) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            shell,
            state: Mutex::new(HoverState::default()),
            hide_timer: Mutex::new(None),
            hide_delay,
            weak_self: weak_self.clone(),
        })
    }

    pub fn state(&self) -> HoverState {
        *self.state.lock().unwrap()
    }

    /// Pointer entered the launcher: cancel any pending hide, position
    /// the popup next to the launcher, and show it.
    pub fn widget_enter(&self) {
        self.cancel_hide_timer();
        self.state.lock().unwrap().widget_hovered = true;
        self.show_popup();
    }

    /// Pointer left the launcher: schedule a debounced hide.
    pub fn widget_leave(&self) {
        self.state.lock().unwrap().widget_hovered = false;
        self.schedule_hide();
    }

    pub fn popup_signal(&self, signal: PopupSignal) {
        match signal {
            PopupSignal::MouseEnter => {
                self.cancel_hide_timer();
                self.state.lock().unwrap().popup_hovered = true;
            }
            PopupSignal::MouseLeave => {
                self.state.lock().unwrap().popup_hovered = false;
                self.schedule_hide();
            }
            PopupSignal::DragStart => {
                self.cancel_hide_timer();
                self.state.lock().unwrap().drag_locked = true;
                log::debug!("[HOVER] Drag lock set");
            }
            PopupSignal::DragEnd => {
                self.state.lock().unwrap().drag_locked = false;
                log::debug!("[HOVER] Drag lock cleared");
                // Equivalent to a fresh pointer-leave.
                self.schedule_hide();
            }
        }
    }

    /// Stop the pending hide timer, if any. Also called on teardown so
    /// no timer fires against a disposed popup.
    pub fn shutdown(&self) {
        self.cancel_hide_timer();
    }

    fn show_popup(&self) {
        let (Some(popup), Some(widget)) = (
            self.shell.window(WindowRole::Popup),
            self.shell.window(WindowRole::Widget),
        ) else {
            log::warn!("[HOVER] Launcher or popup window missing");
            return;
        };

        match widget.outer_position() {
            Ok(pos) => {
                let scale = widget.scale_factor();
                let target = PhysicalPosition {
                    x: pos.x - (POPUP_OFFSET_X * scale).floor() as i32,
                    y: pos.y - (POPUP_OFFSET_Y * scale).floor() as i32,
                };
                if let Err(e) = popup.set_position(target) {
                    log::warn!("[HOVER] Failed to position popup: {}", e);
                }
            }
            Err(e) => log::warn!("[HOVER] Failed to read launcher position: {}", e),
        }

        if let Err(e) = popup.show() {
            log::warn!("[HOVER] Failed to show popup: {}", e);
            return;
        }
        let _ = popup.set_focus();
        self.state.lock().unwrap().popup_visible = true;
    }

    fn schedule_hide(&self) {
        {
            let state = self.state.lock().unwrap();
            if state.drag_locked || state.widget_hovered || state.popup_hovered {
                return;
            }
        }
        self.cancel_hide_timer();

        let controller = self.weak_self.clone();
        let delay = self.hide_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(controller) = controller.upgrade() {
                controller.hide_if_allowed();
            }
        });
        *self.hide_timer.lock().unwrap() = Some(handle);
    }

    /// Timer fired: re-check intent before hiding — the pointer may
    /// have come back or a drag begun while the timer ran.
    fn hide_if_allowed(&self) {
        {
            let state = self.state.lock().unwrap();
            if state.drag_locked || state.widget_hovered || state.popup_hovered {
                return;
            }
        }
        if let Some(popup) = self.shell.window(WindowRole::Popup) {
            if let Err(e) = popup.hide() {
                log::warn!("[HOVER] Failed to hide popup: {}", e);
                return;
            }
        }
        self.state.lock().unwrap().popup_visible = false;
        log::debug!("[HOVER] Popup hidden");
    }

    fn cancel_hide_timer(&self) {
        if let Some(handle) = self.hide_timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for HoverIntentController {
    fn drop(&mut self) {
        if let Some(handle) = self.hide_timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}
