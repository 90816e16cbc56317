mod filter;
mod types;

pub use filter::{FileFilter, DEFAULT_EXTENSIONS, DEFAULT_IGNORED, DEFAULT_MAX_FILE_SIZE};
pub use types::{AttachStatus, AttachedFile, FileStatus};
