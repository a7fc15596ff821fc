//! service-core: Shared infrastructure for campus platform services.
pub mod config;
pub mod error;
pub mod observability;

pub use tracing;
pub use validator;
