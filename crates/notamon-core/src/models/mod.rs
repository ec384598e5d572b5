//! Data models for notes, the output dataset and configuration.

pub mod config;
pub mod dataset;
pub mod note;

pub use config::NotamonConfig;
pub use dataset::{dedupe_by_id, COLUMNS};
pub use note::{
    BmfDetails, ClassifiedRecord, ComplianceFlags, Layout, ObservationCodes, OperationRecord,
    PageHeader, RawOperation,
};
