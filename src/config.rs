//! Settings read from `portal.toml`.
//!
//! Every key is optional; missing keys fall back to the built-in defaults. The backend address
//! can also be set with `PORTAL_API_BASE`.

use crate::files::{FileFilter, DEFAULT_EXTENSIONS, DEFAULT_IGNORED, DEFAULT_MAX_FILE_SIZE};
use crate::portal::categories::default_definitions;
use crate::portal::{
    CategoryDefinition, CategoryError, CategoryRegistry, Institution, PortalController,
};
use crate::service::PortalClient;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "portal.toml";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const API_BASE_ENV: &str = "PORTAL_API_BASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Categories(#[from] CategoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct PortalConfig {
    #[derivative(Default(value = "DEFAULT_API_BASE.to_string()"))]
    pub api_base: String,
    #[derivative(Default(value = "Institution::University"))]
    pub default_institution: Institution,
    #[derivative(Default(value = "DEFAULT_MAX_FILE_SIZE"))]
    pub max_file_size: u64,
    #[derivative(Default(value = "DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()"))]
    pub allowed_extensions: Vec<String>,
    #[derivative(Default(value = "DEFAULT_IGNORED.iter().map(|p| p.to_string()).collect()"))]
    pub ignored_files: Vec<String>,
    #[derivative(Default(value = "default_definitions()"))]
    pub categories: Vec<CategoryDefinition>,
}

impl PortalConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(path = %path.display(), "reading config");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.registry()?;
        Ok(config)
    }

    /// Reads `explicit` if given, else `portal.toml` in the working directory if present, else
    /// the defaults. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    tracing::info!("no {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base = api_base;
        }
    }

    pub fn registry(&self) -> Result<CategoryRegistry, CategoryError> {
        CategoryRegistry::new(self.categories.clone())
    }

    pub fn file_filter(&self) -> FileFilter {
        FileFilter::new(
            self.allowed_extensions.clone(),
            &self.ignored_files,
            self.max_file_size,
        )
    }

    pub fn client(&self) -> PortalClient {
        PortalClient::new(&self.api_base)
    }

    pub fn portal(&self) -> Result<PortalController, ConfigError> {
        Ok(PortalController::new(
            self.registry()?,
            self.file_filter(),
            self.default_institution,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::{Flag, Requirement};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PortalConfig::parse("", Path::new("portal.toml")).unwrap();
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.max_file_size, 52_428_800);
    }

    #[test]
    fn parses_categories_with_rules() {
        let config = PortalConfig::parse(
            r#"
            api_base = "https://portal.example.org"
            default_institution = "clinic"

            [[categories]]
            key = "konzept"
            label = "Concept"
            requirement = "always"

            [[categories]]
            key = "consent"
            label = "Consent"
            requirement = { if_flag = "prospective_study" }
            "#,
            Path::new("portal.toml"),
        )
        .unwrap();

        assert_eq!(config.default_institution, Institution::Clinic);
        assert_eq!(
            config.categories[1].requirement,
            Requirement::IfFlag(Flag::ProspectiveStudy)
        );
        assert_eq!(config.client().api_base(), "https://portal.example.org");
    }

    #[test]
    fn duplicate_category_keys_fail_to_load() {
        let err = PortalConfig::parse(
            r#"
            [[categories]]
            key = "a"
            label = "A"
            requirement = "always"

            [[categories]]
            key = "a"
            label = "B"
            requirement = "optional"
            "#,
            Path::new("portal.toml"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Categories(CategoryError::DuplicateKey(_))
        ));
    }

    #[test]
    fn env_overrides_api_base() {
        let mut config = PortalConfig::default();
        config.apply_env(|key| {
            (key == API_BASE_ENV).then(|| "http://10.0.0.5:8000".to_string())
        });
        assert_eq!(config.api_base, "http://10.0.0.5:8000");
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "max_file_size = 1024\n").unwrap();
        let config = PortalConfig::from_file(&path).unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert!(PortalConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
