pub mod cache;
pub mod invoice;
pub mod recon_service;
pub mod reconcile;
pub mod report;
pub mod upload;

pub use cache::DatasetCache;
pub use invoice::summarize_by_invoice;
pub use recon_service::ReconService;
pub use reconcile::{reconcile, reconcile_tables};
pub use report::{disputable_items, filter_rows, monthly_trends, summarize, variance_by_classification};
