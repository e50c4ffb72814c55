//! Replay of a recorded track as a location source

use crate::core::LocationFix;
use crate::source::{LocationRequest, LocationSource, SourceEvent};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 64;

/// Failure loading or starting a location source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read track '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse track '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("track contains no fixes")]
    EmptyTrack,
}

/// Replays fixes from a JSON array, pacing them by their own timestamps.
///
/// Fixes closer together than the request's fastest interval are dropped, as the
/// device API would. A `speedup` of 0 replays without any delay.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    fixes: Vec<LocationFix>,
    speedup: f64,
}

impl ReplaySource {
    pub fn new(fixes: Vec<LocationFix>) -> Result<Self, SourceError> {
        if fixes.is_empty() {
            return Err(SourceError::EmptyTrack);
        }
        Ok(Self { fixes, speedup: 1.0 })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path_str.clone(),
            source,
        })?;
        let fixes: Vec<LocationFix> = serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: path_str.clone(),
            source,
        })?;
        info!(path = %path_str, fixes = fixes.len(), "loaded track");
        Self::new(fixes)
    }

    pub fn with_speedup(mut self, speedup: f64) -> Self {
        self.speedup = speedup;
        self
    }

    /// Fixes that survive the fastest-interval filter, in delivery order
    pub fn admitted_fixes(&self, request: &LocationRequest) -> Vec<LocationFix> {
        let mut admitted: Vec<LocationFix> = Vec::with_capacity(self.fixes.len());
        for fix in &self.fixes {
            if request.admits(admitted.last(), fix) {
                admitted.push(*fix);
            }
        }
        admitted
    }

    fn delay_between(&self, previous: &LocationFix, next: &LocationFix) -> Option<Duration> {
        if !(self.speedup.is_finite() && self.speedup > 0.0) {
            return None;
        }
        let elapsed_ms = next.elapsed_since(previous) as f64 / self.speedup;
        Some(Duration::from_millis(elapsed_ms as u64))
    }
}

impl LocationSource for ReplaySource {
    fn subscribe(&self, request: &LocationRequest) -> Result<mpsc::Receiver<SourceEvent>, SourceError> {
        let fixes = self.admitted_fixes(request);
        let dropped = self.fixes.len() - fixes.len();
        if dropped > 0 {
            debug!(dropped, "fixes faster than the fastest interval dropped");
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let source = self.clone();
        tokio::spawn(async move {
            if tx.send(SourceEvent::PermissionGranted).await.is_err() {
                return;
            }
            let mut previous: Option<LocationFix> = None;
            for fix in fixes {
                if let Some(delay) = previous.and_then(|p| source.delay_between(&p, &fix)) {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(SourceEvent::Fix(fix)).await.is_err() {
                    return;
                }
                previous = Some(fix);
            }
            debug!("track replay finished");
        });

        Ok(rx)
    }
}
