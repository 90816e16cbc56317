//! Contracts for the HTTP backend the wizards talk to, plus the reqwest implementation.

mod client;
mod types;

pub use client::PortalClient;
pub use types::{
    ExportRequest, ExtractRequest, GenerateRequest, GenerateResponse, TaggedFile, UploadRequest,
    UploadResponse, EXPORT_FILE_NAME,
};

use crate::concept::ExtractedStudyData;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Messages produced by transports that could not reach the server at all.
const TRANSPORT_SIGNATURES: [&str; 5] = [
    "Failed to fetch",
    "NetworkError",
    "error sending request",
    "Connection refused",
    "dns error",
];

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Connection(String),
    #[error("{operation} failed: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("invalid response from server: {0}")]
    Decode(String),
    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ServiceError::Connection(err.to_string())
        } else if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Other(err.to_string())
        }
    }

    /// The reason without the operation prefix, for messages that add their own.
    pub fn detail(&self) -> String {
        match self {
            ServiceError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the server was never reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            ServiceError::Connection(_) => true,
            ServiceError::Other(message) => TRANSPORT_SIGNATURES
                .iter()
                .any(|signature| message.contains(signature)),
            _ => false,
        }
    }
}

#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, ServiceError>;
}

#[async_trait]
pub trait ConceptService: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractedStudyData, ServiceError>;

    /// Returns the generated concept as markdown.
    async fn generate(&self, data: &ExtractedStudyData) -> Result<String, ServiceError>;

    async fn export_docx(&self, markdown: &str) -> Result<Vec<u8>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_classification() {
        assert!(ServiceError::Connection("refused".into()).is_connectivity());
        assert!(ServiceError::Other("NetworkError when attempting to fetch".into()).is_connectivity());
        assert!(!ServiceError::Other("quota exceeded".into()).is_connectivity());
        assert!(!ServiceError::Status {
            operation: "Upload",
            status: 500,
            message: "error sending request".into(),
        }
        .is_connectivity());
    }

    #[test]
    fn status_error_carries_operation_and_body() {
        let err = ServiceError::Status {
            operation: "Extraction",
            status: 400,
            message: "No files or text provided".into(),
        };
        assert_eq!(err.to_string(), "Extraction failed: No files or text provided");
        assert_eq!(err.detail(), "No files or text provided");
        assert_eq!(ServiceError::Other("boom".into()).detail(), "boom");
    }
}
