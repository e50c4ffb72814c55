//! Network boundary for location submission
//!
//! The controller talks to the backend only through [`LocationSubmitter`]. This
//! module provides the trait, the HTTP implementation used in production and a
//! scriptable mock for tests and dry runs.

pub mod error;
pub mod submitter;
pub mod dto;
pub mod http;
pub mod mock;

pub use error::{SubmissionError, SubmissionResult};
pub use submitter::{HttpLocationSubmitter, LocationSubmitter};
pub use dto::{LocationRecord, UserLocationRequest};
pub use http::{RestClient, RestError};
pub use mock::{MockSubmitter, SubmitMode};
