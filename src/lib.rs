pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod source;

pub use config::AppConfig;
pub use error::{ServiceError, TransformError};
pub use service::{reconcile, summarize_by_invoice, ReconService};
