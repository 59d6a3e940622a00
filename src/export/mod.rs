//! Generated files: spreadsheet exports and PDF documents.
//!
//! DESIGN
//! ======
//! Everything here is pure: callers hand in records already fetched from the
//! remote store and get bytes back. Nothing touches the network, so the
//! route layer decides whether the bytes are streamed to the browser or
//! archived to object storage.

pub mod documents;
pub mod pdf;
pub mod sheet;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("record could not be flattened: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("pdf encoding failed: {0}")]
    Pdf(String),
    #[error("character {0:?} cannot be encoded as Code 39")]
    Barcode(char),
    #[error("barcode data is empty")]
    EmptyBarcode,
}

impl crate::error::ErrorCode for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Csv(_) => "E_EXPORT_CSV",
            Self::Serialize(_) => "E_EXPORT_SERIALIZE",
            Self::Pdf(_) => "E_EXPORT_PDF",
            Self::Barcode(_) | Self::EmptyBarcode => "E_BARCODE",
        }
    }
}
