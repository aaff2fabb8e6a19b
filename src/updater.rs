//! Silent update check.
//!
//! Fetches a JSON release manifest and compares its version against
//! this build. Every failure path logs and reports "no update" — the
//! check runs in the background and must never surface an error
//! dialog. Downloading and installing are the glue's job.

use serde::{Deserialize, Serialize};

/// Result of an update check, shaped for the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateInfo {
    pub available: bool,
    pub version: Option<String>,
    pub date: Option<String>,
    pub body: Option<String>,
}

/// The release manifest the endpoint serves.
#[derive(Debug, Deserialize)]
struct ReleaseManifest {
    version: String,
    #[serde(default)]
    pub_date: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Check `endpoint` for a release newer than this build.
pub async fn check_for_updates(endpoint: &str) -> Option<UpdateInfo> {
    let manifest: ReleaseManifest = match fetch_manifest(endpoint).await {
        Ok(m) => m,
        Err(e) => {
            log::warn!("[UPDATER] Update check failed: {}", e);
            return None;
        }
    };

    let current = env!("CARGO_PKG_VERSION");
    if is_newer(current, &manifest.version) {
        log::info!(
            "[UPDATER] Update available: {} (running {})",
            manifest.version,
            current
        );
        Some(UpdateInfo {
            available: true,
            version: Some(manifest.version),
            date: manifest.pub_date,
            body: manifest.notes,
        })
    } else {
        log::info!("[UPDATER] Up to date ({})", current);
        Some(UpdateInfo {
            available: false,
            version: None,
            date: None,
            body: None,
        })
    }
}

async fn fetch_manifest(endpoint: &str) -> Result<ReleaseManifest, String> {
    let resp = reqwest::Client::new()
        .get(endpoint)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("endpoint returned {}", resp.status()));
    }
    resp.json().await.map_err(|e| e.to_string())
}

/// Numeric dotted-version comparison, tolerant of a leading `v` and
/// uneven segment counts. Unparseable segments compare as zero.
fn is_newer(current: &str, remote: &str) -> bool {
    fn segments(v: &str) -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|s| s.parse().unwrap_or(0))
            .collect()
    }
    let (cur, rem) = (segments(current), segments(remote));
    for i in 0..cur.len().max(rem.len()) {
        let c = cur.get(i).copied().unwrap_or(0);
        let r = rem.get(i).copied().unwrap_or(0);
        if r != c {
            return r > c;
        }
    }
    false
}
