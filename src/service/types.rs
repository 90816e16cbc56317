use crate::concept::ExtractedStudyData;
use crate::files::AttachedFile;
use crate::portal::{Institution, ProjectType};
use serde::{Deserialize, Serialize};

pub const EXPORT_FILE_NAME: &str = "Datenschutzkonzept.docx";

/// A file together with the key of the category that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    pub category: String,
    pub file: AttachedFile,
}

impl TaggedFile {
    pub fn field_name(&self) -> String {
        format!("files_{}", self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub email: String,
    pub uploader_name: String,
    pub project_title: String,
    pub project_details: String,
    pub institution: Institution,
    pub project_type: Option<ProjectType>,
    pub is_prospective_study: bool,
    pub upload_timestamp: String,
    pub files: Vec<TaggedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub files_uploaded: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractRequest {
    pub files: Vec<AttachedFile>,
    pub manual_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub data: &'a ExtractedStudyData,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub concept_markdown: String,
}

#[derive(Debug, Serialize)]
pub struct ExportRequest<'a> {
    pub format: &'static str,
    pub markdown_content: &'a str,
}
