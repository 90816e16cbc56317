use serde::{Deserialize, Serialize};

/// Study metadata pulled out of a research proposal, reviewed and corrected by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedStudyData {
    pub study_title: String,
    pub study_type: String,
    pub principal_investigator: String,
    pub institution: String,
    pub study_goal: String,
    pub data_types: Vec<String>,
    pub patient_count: String,
    pub data_sources: Vec<String>,
    pub processing_methods: String,
    pub pseudonymization_usage: bool,
    pub external_data_sharing: bool,
    #[serde(default)]
    pub ethics_vote: Option<String>,
    #[serde(default)]
    pub data_minimization: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub archiving_period: Option<String>,
    #[serde(default)]
    pub internal_access: Vec<String>,
    #[serde(default)]
    pub external_partners: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    StudyTitle,
    StudyType,
    PrincipalInvestigator,
    Institution,
    StudyGoal,
    PatientCount,
    ProcessingMethods,
    EthicsVote,
    DataMinimization,
    StorageLocation,
    ArchivingPeriod,
    ExternalPartners,
}

impl TextField {
    pub const ALL: [TextField; 12] = [
        TextField::StudyTitle,
        TextField::StudyType,
        TextField::PrincipalInvestigator,
        TextField::Institution,
        TextField::PatientCount,
        TextField::EthicsVote,
        TextField::ProcessingMethods,
        TextField::DataMinimization,
        TextField::StorageLocation,
        TextField::ArchivingPeriod,
        TextField::ExternalPartners,
        TextField::StudyGoal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextField::StudyTitle => "Study title",
            TextField::StudyType => "Study type",
            TextField::PrincipalInvestigator => "Principal investigator",
            TextField::Institution => "Institution",
            TextField::StudyGoal => "Study goal",
            TextField::PatientCount => "Patient count",
            TextField::ProcessingMethods => "Processing methods",
            TextField::EthicsVote => "Ethics vote",
            TextField::DataMinimization => "Data minimization",
            TextField::StorageLocation => "Storage location",
            TextField::ArchivingPeriod => "Archiving period",
            TextField::ExternalPartners => "External partners",
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(
            self,
            TextField::StudyTitle
                | TextField::Institution
                | TextField::StudyGoal
                | TextField::ProcessingMethods
                | TextField::DataMinimization
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    DataTypes,
    DataSources,
    InternalAccess,
}

impl ListField {
    pub const ALL: [ListField; 3] = [
        ListField::DataTypes,
        ListField::DataSources,
        ListField::InternalAccess,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ListField::DataTypes => "Data types",
            ListField::DataSources => "Data sources",
            ListField::InternalAccess => "Internal access",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagField {
    PseudonymizationUsage,
    ExternalDataSharing,
}

impl FlagField {
    pub const ALL: [FlagField; 2] = [
        FlagField::PseudonymizationUsage,
        FlagField::ExternalDataSharing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FlagField::PseudonymizationUsage => "Pseudonymization is used",
            FlagField::ExternalDataSharing => "Data is shared externally",
        }
    }
}

/// Splits comma-separated input into trimmed entries.
///
/// Blank input is an empty list. Otherwise every segment is kept, including empty ones written
/// between two commas, so `"a,,b"` stays three entries.
pub fn split_list(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(|s| s.trim().to_string()).collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

impl ExtractedStudyData {
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::StudyTitle => &self.study_title,
            TextField::StudyType => &self.study_type,
            TextField::PrincipalInvestigator => &self.principal_investigator,
            TextField::Institution => &self.institution,
            TextField::StudyGoal => &self.study_goal,
            TextField::PatientCount => &self.patient_count,
            TextField::ProcessingMethods => &self.processing_methods,
            TextField::EthicsVote => self.ethics_vote.as_deref().unwrap_or_default(),
            TextField::DataMinimization => self.data_minimization.as_deref().unwrap_or_default(),
            TextField::StorageLocation => self.storage_location.as_deref().unwrap_or_default(),
            TextField::ArchivingPeriod => self.archiving_period.as_deref().unwrap_or_default(),
            TextField::ExternalPartners => self.external_partners.as_deref().unwrap_or_default(),
        }
    }

    /// Optional fields become `None` when cleared.
    pub fn set_text(&mut self, field: TextField, value: &str) {
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
        match field {
            TextField::StudyTitle => self.study_title = value.to_string(),
            TextField::StudyType => self.study_type = value.to_string(),
            TextField::PrincipalInvestigator => self.principal_investigator = value.to_string(),
            TextField::Institution => self.institution = value.to_string(),
            TextField::StudyGoal => self.study_goal = value.to_string(),
            TextField::PatientCount => self.patient_count = value.to_string(),
            TextField::ProcessingMethods => self.processing_methods = value.to_string(),
            TextField::EthicsVote => self.ethics_vote = optional(value),
            TextField::DataMinimization => self.data_minimization = optional(value),
            TextField::StorageLocation => self.storage_location = optional(value),
            TextField::ArchivingPeriod => self.archiving_period = optional(value),
            TextField::ExternalPartners => self.external_partners = optional(value),
        }
    }

    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::DataTypes => &self.data_types,
            ListField::DataSources => &self.data_sources,
            ListField::InternalAccess => &self.internal_access,
        }
    }

    pub fn list_text(&self, field: ListField) -> String {
        join_list(self.list(field))
    }

    pub fn set_list_text(&mut self, field: ListField, text: &str) {
        let items = split_list(text);
        match field {
            ListField::DataTypes => self.data_types = items,
            ListField::DataSources => self.data_sources = items,
            ListField::InternalAccess => self.internal_access = items,
        }
    }

    pub fn flag(&self, field: FlagField) -> bool {
        match field {
            FlagField::PseudonymizationUsage => self.pseudonymization_usage,
            FlagField::ExternalDataSharing => self.external_data_sharing,
        }
    }

    pub fn set_flag(&mut self, field: FlagField, value: bool) {
        match field {
            FlagField::PseudonymizationUsage => self.pseudonymization_usage = value,
            FlagField::ExternalDataSharing => self.external_data_sharing = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_text_is_split_and_trimmed() {
        let mut data = ExtractedStudyData::default();
        data.set_list_text(ListField::DataTypes, "a, b,  c");
        assert_eq!(data.data_types, vec!["a", "b", "c"]);
        assert_eq!(data.list_text(ListField::DataTypes), "a, b, c");
    }

    #[test]
    fn literal_empty_segments_are_kept() {
        assert_eq!(split_list("a,,b"), vec!["a", "", "b"]);
        assert_eq!(split_list("a, "), vec!["a", ""]);
    }

    #[test]
    fn blank_text_is_an_empty_list() {
        assert!(split_list("").is_empty());
        assert!(split_list("   ").is_empty());
    }

    #[test]
    fn optional_text_fields_clear_to_none() {
        let mut data = ExtractedStudyData::default();
        data.set_text(TextField::EthicsVote, "EK 123/24");
        assert_eq!(data.ethics_vote.as_deref(), Some("EK 123/24"));
        data.set_text(TextField::EthicsVote, "");
        assert_eq!(data.ethics_vote, None);
        assert_eq!(data.text(TextField::EthicsVote), "");
    }

    #[test]
    fn deserializes_backend_record_without_optional_fields() {
        let data: ExtractedStudyData = serde_json::from_value(serde_json::json!({
            "study_title": "Registry study",
            "study_type": "retrospective",
            "principal_investigator": "Prof. Dr. A",
            "institution": "Clinic",
            "study_goal": "Outcomes",
            "data_types": ["lab values"],
            "patient_count": "200",
            "data_sources": ["Orbis"],
            "processing_methods": "statistics",
            "pseudonymization_usage": true,
            "external_data_sharing": false
        }))
        .unwrap();
        assert!(data.pseudonymization_usage);
        assert!(data.internal_access.is_empty());
        assert_eq!(data.ethics_vote, None);
    }

    #[test]
    fn flags_toggle() {
        let mut data = ExtractedStudyData::default();
        data.set_flag(FlagField::ExternalDataSharing, true);
        assert!(data.flag(FlagField::ExternalDataSharing));
        assert!(!data.flag(FlagField::PseudonymizationUsage));
    }
}
