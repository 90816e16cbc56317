use crate::files::{AttachedFile, FileFilter, FileStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Form switches that can make a document category mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ProspectiveStudy,
}

pub type ActiveFlags = BTreeSet<Flag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Always,
    Optional,
    IfFlag(Flag),
}

impl Requirement {
    pub fn applies(&self, flags: &ActiveFlags) -> bool {
        match self {
            Requirement::Always => true,
            Requirement::Optional => false,
            Requirement::IfFlag(flag) => flags.contains(flag),
        }
    }

    /// True when the category can become mandatory depending on the form.
    pub fn is_conditional(&self) -> bool {
        matches!(self, Requirement::IfFlag(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown document category '{0}'")]
    UnknownCategory(String),
    #[error("document category '{0}' is defined more than once")]
    DuplicateKey(String),
    #[error("category '{key}' has no file at position {index}")]
    NoSuchFile { key: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub key: String,
    pub label: String,
    pub requirement: Requirement,
}

impl CategoryDefinition {
    pub fn new(key: &str, label: &str, requirement: Requirement) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            requirement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCategory {
    pub definition: CategoryDefinition,
    pub files: Vec<AttachedFile>,
}

impl FileCategory {
    pub fn key(&self) -> &str {
        &self.definition.key
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }

    pub fn is_required(&self, flags: &ActiveFlags) -> bool {
        self.definition.requirement.applies(flags)
    }
}

pub fn default_definitions() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition::new("datenschutzkonzept", "Privacy concept", Requirement::Always),
        CategoryDefinition::new(
            "verantwortung",
            "Assumption of responsibility",
            Requirement::Always,
        ),
        CategoryDefinition::new(
            "schulung_uni",
            "University training certificate",
            Requirement::Always,
        ),
        CategoryDefinition::new(
            "schulung_ukf",
            "University hospital training certificate",
            Requirement::Always,
        ),
        CategoryDefinition::new(
            "einwilligung",
            "Consent form",
            Requirement::IfFlag(Flag::ProspectiveStudy),
        ),
        CategoryDefinition::new("ethikvotum", "Ethics vote", Requirement::Optional),
        CategoryDefinition::new("sonstiges", "Other", Requirement::Optional),
    ]
}

/// Ordered set of document categories with their attached files. Keys are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<FileCategory>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self {
            categories: default_definitions()
                .into_iter()
                .map(|definition| FileCategory {
                    definition,
                    files: Vec::new(),
                })
                .collect(),
        }
    }
}

impl CategoryRegistry {
    pub fn new(definitions: Vec<CategoryDefinition>) -> Result<Self, CategoryError> {
        let mut seen = BTreeSet::new();
        for definition in &definitions {
            if !seen.insert(definition.key.as_str()) {
                return Err(CategoryError::DuplicateKey(definition.key.clone()));
            }
        }

        Ok(Self {
            categories: definitions
                .into_iter()
                .map(|definition| FileCategory {
                    definition,
                    files: Vec::new(),
                })
                .collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileCategory> {
        self.categories.iter()
    }

    pub fn get(&self, key: &str) -> Option<&FileCategory> {
        self.categories.iter().find(|c| c.key() == key)
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut FileCategory, CategoryError> {
        self.categories
            .iter_mut()
            .find(|c| c.key() == key)
            .ok_or_else(|| CategoryError::UnknownCategory(key.to_string()))
    }

    /// Appends the files the filter accepts, keeping insertion order.
    pub fn add_files(
        &mut self,
        key: &str,
        files: Vec<AttachedFile>,
        filter: &FileFilter,
    ) -> Result<Vec<FileStatus>, CategoryError> {
        let category = self.get_mut(key)?;
        let (accepted, statuses) = filter.partition(files);
        tracing::debug!(category = key, added = accepted.len(), "attaching files");
        category.files.extend(accepted);
        Ok(statuses)
    }

    pub fn remove_file(&mut self, key: &str, index: usize) -> Result<AttachedFile, CategoryError> {
        let category = self.get_mut(key)?;
        if index >= category.files.len() {
            return Err(CategoryError::NoSuchFile {
                key: key.to_string(),
                index,
            });
        }
        Ok(category.files.remove(index))
    }

    pub fn clear_files(&mut self) {
        for category in &mut self.categories {
            category.files.clear();
        }
    }

    pub fn total_files(&self) -> usize {
        self.categories.iter().map(|c| c.files.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prospective() -> ActiveFlags {
        [Flag::ProspectiveStudy].into_iter().collect()
    }

    #[test]
    fn requirement_rules() {
        let none = ActiveFlags::new();
        assert!(Requirement::Always.applies(&none));
        assert!(!Requirement::Optional.applies(&prospective()));
        assert!(!Requirement::IfFlag(Flag::ProspectiveStudy).applies(&none));
        assert!(Requirement::IfFlag(Flag::ProspectiveStudy).applies(&prospective()));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = CategoryRegistry::new(vec![
            CategoryDefinition::new("a", "A", Requirement::Always),
            CategoryDefinition::new("a", "Again", Requirement::Optional),
        ])
        .unwrap_err();
        assert_eq!(err, CategoryError::DuplicateKey("a".to_string()));
    }

    #[test]
    fn add_and_remove_keep_order() {
        let mut registry = CategoryRegistry::default();
        let filter = FileFilter::default();
        registry
            .add_files(
                "sonstiges",
                vec![
                    AttachedFile::new("/x/1.pdf", 1),
                    AttachedFile::new("/x/2.pdf", 1),
                    AttachedFile::new("/x/3.pdf", 1),
                ],
                &filter,
            )
            .unwrap();

        let removed = registry.remove_file("sonstiges", 1).unwrap();
        assert_eq!(removed.name, "2.pdf");
        let names: Vec<_> = registry
            .get("sonstiges")
            .unwrap()
            .files
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["1.pdf", "3.pdf"]);
        assert_eq!(registry.total_files(), 2);
    }

    #[test]
    fn unknown_category_and_bad_index() {
        let mut registry = CategoryRegistry::default();
        assert_eq!(
            registry.add_files("nope", vec![], &FileFilter::default()),
            Err(CategoryError::UnknownCategory("nope".to_string()))
        );
        assert_eq!(
            registry.remove_file("ethikvotum", 0),
            Err(CategoryError::NoSuchFile {
                key: "ethikvotum".to_string(),
                index: 0
            })
        );
    }

    #[test]
    fn rejected_files_are_not_attached() {
        let mut registry = CategoryRegistry::default();
        let statuses = registry
            .add_files(
                "ethikvotum",
                vec![AttachedFile::new("/x/vote.exe", 1)],
                &FileFilter::default(),
            )
            .unwrap();
        assert_eq!(statuses.len(), 1);
        assert!(registry.get("ethikvotum").unwrap().files.is_empty());
    }
}
