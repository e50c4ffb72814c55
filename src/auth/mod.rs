//! Authentication gate consumed by the sharing controller
//!
//! Token issuance and refresh belong to the identity provider. This module only
//! describes what the controller needs from it: the current status, the current
//! access token, and a signal when the session ends.

pub mod gate;

pub use gate::{AuthGate, AuthSession, AuthStatus, SessionAuthGate};
