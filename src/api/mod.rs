//! Sharing controller API
//!
//! This module exposes the controller the UI layer drives, the observable status
//! it renders, and the session state machine underneath.

pub mod observable;
pub mod types;
pub mod session;
pub mod controller;

pub use observable::Observable;
pub use types::{ApiResult, PreconditionError, SharingError, SharingState, SharingStatus};
pub use session::{CompletionAction, FixAction, SharingSession};
pub use controller::SharingController;
