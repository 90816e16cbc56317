use super::categories::{ActiveFlags, Flag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Institution {
    University,
    Clinic,
}

impl Institution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Institution::University => "university",
            Institution::Clinic => "clinic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Institution::University => "University",
            Institution::Clinic => "University Hospital",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    New,
    Existing,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::New => "new",
            ProjectType::Existing => "existing",
        }
    }
}

/// The fields typed into the new-project form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub email: String,
    pub uploader_name: String,
    pub project_title: String,
    pub project_details: String,
    pub is_prospective_study: bool,
}

impl FormState {
    pub fn active_flags(&self) -> ActiveFlags {
        let mut flags = ActiveFlags::new();
        if self.is_prospective_study {
            flags.insert(Flag::ProspectiveStudy);
        }
        flags
    }
}
