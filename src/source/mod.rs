//! Location source boundary
//!
//! The device positioning API is external. The controller only needs a stream of
//! [`SourceEvent`]s; [`ReplaySource`] produces one from a recorded track.

pub mod request;
pub mod replay;

pub use request::LocationRequest;
pub use replay::{ReplaySource, SourceError};

use crate::core::LocationFix;
use tokio::sync::mpsc;

/// Event delivered by a location source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Fix(LocationFix),
    PermissionGranted,
    PermissionDenied,
}

/// A feed of device positions
pub trait LocationSource {
    /// Begin delivering events at the cadence described by `request`
    fn subscribe(&self, request: &LocationRequest) -> Result<mpsc::Receiver<SourceEvent>, SourceError>;
}
