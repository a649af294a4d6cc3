//! Storage boundary: the spreadsheet gateway, its wire shapes, and the service that
//! owns the single writable ledger copy.

mod gateway;
mod service;
pub mod wire;

pub use gateway::{HttpSheetGateway, OfflineSheetGateway, SheetError, SheetGateway};
pub use service::{BrandingTarget, ConductService, SaveReport, SyncStatus};
pub use wire::{ImageUpload, RemoteSnapshot, SaveAllPayload, PRESERVE_HEADER_ID};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to fetch ledger from sheet: {0}")]
    Fetch(#[source] SheetError),
    #[error("failed to save ledger to sheet: {0}")]
    Save(#[source] SheetError),
    #[error("failed to upload image: {0}")]
    Upload(#[source] SheetError),
}
