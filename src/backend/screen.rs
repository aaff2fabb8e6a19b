//! Primary-monitor capture via `xcap`.

use super::BackendError;
use image::RgbaImage;
use xcap::Monitor;

/// Capture the primary monitor. Monitor enumeration puts the primary
/// first on every platform xcap supports.
pub fn capture_primary_monitor() -> Result<RgbaImage, BackendError> {
    let monitors = Monitor::all().map_err(|e| BackendError::Capture(e.to_string()))?;
    let monitor = monitors.first().ok_or(BackendError::NoMonitor)?;

    monitor
        .capture_image()
        .map_err(|e| BackendError::Capture(e.to_string()))
}
