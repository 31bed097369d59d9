/// REST client for the rating backend
///
/// The backend owns all persistence and aggregation; this module only holds
/// typed wrappers over its JSON endpoints plus the wire models.

pub mod client;
pub mod error;
pub mod models;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
