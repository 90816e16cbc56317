use super::types::{AttachStatus, AttachedFile, FileStatus};
use crate::utils::file_size::format_size;
use glob::Pattern;
use ignore::Walk;
use std::path::Path;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub const DEFAULT_EXTENSIONS: [&str; 13] = [
    "pdf", "doc", "docx", "zip", "odt", "ods", "odp", "png", "jpg", "jpeg", "xlsx", "xls", "txt",
];

pub const DEFAULT_IGNORED: [&str; 4] = [".DS_Store", "Thumbs.db", "~$*", "*.tmp"];

/// Decides which picked files may be attached.
#[derive(Debug, Clone)]
pub struct FileFilter {
    allowed_extensions: Vec<String>,
    ignored: Vec<Pattern>,
    max_file_size: u64,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            &DEFAULT_IGNORED.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            DEFAULT_MAX_FILE_SIZE,
        )
    }
}

impl FileFilter {
    /// Invalid glob patterns are logged and dropped.
    pub fn new(allowed_extensions: Vec<String>, ignored: &[String], max_file_size: u64) -> Self {
        let ignored = ignored
            .iter()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %raw, error = %e, "ignoring invalid file pattern");
                    None
                }
            })
            .collect();

        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            ignored,
            max_file_size,
        }
    }

    /// Same limits, different set of accepted extensions.
    pub fn with_extensions(&self, extensions: &[&str]) -> Self {
        Self {
            allowed_extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            ignored: self.ignored.clone(),
            max_file_size: self.max_file_size,
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Returns the reason a file is rejected, if any.
    pub fn rejection(&self, file: &AttachedFile) -> Option<String> {
        if self.ignored.iter().any(|p| p.matches(&file.name)) {
            return Some("Ignored file".to_string());
        }

        match file.extension() {
            Some(ext) if self.allowed_extensions.contains(&ext) => {}
            _ => return Some("Unsupported file type".to_string()),
        }

        if file.size > self.max_file_size {
            return Some(format!(
                "File is larger than {}",
                format_size(self.max_file_size)
            ));
        }

        None
    }

    /// Splits `files` into accepted files and a status line for every input.
    pub fn partition(&self, files: Vec<AttachedFile>) -> (Vec<AttachedFile>, Vec<FileStatus>) {
        let mut accepted = Vec::new();
        let mut statuses = Vec::with_capacity(files.len());

        for file in files {
            match self.rejection(&file) {
                Some(reason) => {
                    tracing::info!(file = %file.name, %reason, "skipping file");
                    statuses.push(FileStatus {
                        name: file.name,
                        status: AttachStatus::Skipped(reason),
                    });
                }
                None => {
                    statuses.push(FileStatus {
                        name: file.name.clone(),
                        status: AttachStatus::Attached,
                    });
                    accepted.push(file);
                }
            }
        }

        (accepted, statuses)
    }

    /// Every file below `folder`, honouring `.gitignore` rules, in walk order.
    pub fn collect_folder(&self, folder: &Path) -> Vec<AttachedFile> {
        let mut files = Vec::new();
        for entry in Walk::new(folder) {
            match entry {
                Ok(entry) if entry.path().is_file() => match AttachedFile::from_path(entry.path()) {
                    Ok(file) => files.push(file),
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "cannot read file")
                    }
                },
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "error while walking folder"),
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        let filter = FileFilter::default();
        assert_eq!(filter.rejection(&AttachedFile::new("/tmp/Konzept.PDF", 10)), None);
        assert_eq!(
            filter.rejection(&AttachedFile::new("/tmp/run.exe", 10)),
            Some("Unsupported file type".to_string())
        );
        assert_eq!(
            filter.rejection(&AttachedFile::new("/tmp/README", 10)),
            Some("Unsupported file type".to_string())
        );
    }

    #[test]
    fn rejects_ignored_and_oversized_files() {
        let filter = FileFilter::new(vec![".pdf".into(), "docx".into()], &["~$*".into()], 100);
        assert_eq!(
            filter.rejection(&AttachedFile::new("/tmp/~$draft.docx", 1)),
            Some("Ignored file".to_string())
        );
        assert_eq!(
            filter.rejection(&AttachedFile::new("/tmp/big.pdf", 101)),
            Some("File is larger than 100 B".to_string())
        );
    }

    #[test]
    fn partition_reports_every_file() {
        let filter = FileFilter::default();
        let (accepted, statuses) = filter.partition(vec![
            AttachedFile::new("/a/one.pdf", 1),
            AttachedFile::new("/a/two.sh", 1),
        ]);
        assert_eq!(accepted, vec![AttachedFile::new("/a/one.pdf", 1)]);
        assert_eq!(statuses[0].status, AttachStatus::Attached);
        assert_eq!(
            statuses[1].status,
            AttachStatus::Skipped("Unsupported file type".to_string())
        );
    }

    #[test]
    fn collects_files_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.docx"), b"PK").unwrap();

        let mut names: Vec<String> = FileFilter::default()
            .collect_folder(dir.path())
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.pdf".to_string(), "b.docx".to_string()]);
    }
}
