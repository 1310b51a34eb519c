//! Resource health model

mod status;

pub use status::{HealthStatus, HealthStatusCode};
