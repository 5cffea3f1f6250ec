pub mod money;
pub mod receipt;
pub mod reconciled;
pub mod report;

pub use receipt::{ControlEntry, MappingEntry, ReceiptLine, RegisterLine, SourceCounts, SourceTables};
pub use reconciled::{
    compute_variance, AggregatedReceipt, Classification, InvoiceSummary, ReconciledDataset,
    UnknownClassification,
};
pub use report::{
    ClassificationFigure, MonthlyTrend, ReconSummary, RecordFilter, VarianceByClassification,
};
