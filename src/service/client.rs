use super::types::{
    ExportRequest, ExtractRequest, GenerateRequest, GenerateResponse, UploadRequest,
    UploadResponse,
};
use super::{ConceptService, ServiceError, UploadService};
use crate::concept::ExtractedStudyData;
use crate::files::AttachedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;

const UPLOAD_PATH: &str = "/api/upload";
const CONCEPT_PATH: &str = "/api/privacy-concept";

/// HTTP client for the portal backend.
#[derive(Clone, Debug)]
pub struct PortalClient {
    client: reqwest::Client,
    api_base: String,
}

impl PortalClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn file_part(file: &AttachedFile) -> Result<Part, ServiceError> {
        let content = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ServiceError::File {
                path: file.path.clone(),
                source,
            })?;
        Ok(Part::bytes(content).file_name(file.name.clone()))
    }

    /// Turns a non-success status into an error carrying the response body.
    async fn check(operation: &'static str, response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body
        };
        tracing::warn!(operation, status = status.as_u16(), %message, "request rejected");
        Err(ServiceError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl UploadService for PortalClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, ServiceError> {
        let mut form = Form::new()
            .text("email", request.email.clone())
            .text("uploader_name", request.uploader_name.clone())
            .text("project_title", request.project_title.clone())
            .text("project_details", request.project_details.clone())
            .text("institution", request.institution.as_str())
            .text(
                "is_prospective_study",
                request.is_prospective_study.to_string(),
            )
            .text("upload_timestamp", request.upload_timestamp.clone());

        if let Some(project_type) = request.project_type {
            form = form.text("project_type", project_type.as_str());
        }

        for tagged in &request.files {
            form = form.part(tagged.field_name(), Self::file_part(&tagged.file).await?);
        }

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        let response = Self::check("Upload", response).await?;
        response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ConceptService for PortalClient {
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractedStudyData, ServiceError> {
        let mut form = Form::new();
        for file in &request.files {
            form = form.part("files", Self::file_part(file).await?);
        }
        if let Some(text) = request.manual_text.as_deref().filter(|t| !t.trim().is_empty()) {
            form = form.text("manual_text", text.to_string());
        }

        let response = self
            .client
            .post(self.url(&format!("{CONCEPT_PATH}/extract")))
            .multipart(form)
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        let response = Self::check("Extraction", response).await?;
        response
            .json::<ExtractedStudyData>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn generate(&self, data: &ExtractedStudyData) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.url(&format!("{CONCEPT_PATH}/generate")))
            .json(&GenerateRequest { data })
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        let response = Self::check("Generation", response).await?;
        let generated = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(generated.concept_markdown)
    }

    async fn export_docx(&self, markdown: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .post(self.url(&format!("{CONCEPT_PATH}/export")))
            .json(&ExportRequest {
                format: "docx",
                markdown_content: markdown,
            })
            .send()
            .await
            .map_err(ServiceError::from_reqwest)?;

        let response = Self::check("Export", response).await?;
        let bytes = response.bytes().await.map_err(ServiceError::from_reqwest)?;
        Ok(bytes.to_vec())
    }
}
