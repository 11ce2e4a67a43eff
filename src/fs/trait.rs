//! FileSystem trait definition

use anyhow::Result;
use std::path::Path;

/// Metadata about a file
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub file_type: FileType,
}

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Other,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Read-only file access used to load templates and config documents
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Get file/directory metadata
    fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Read the whole file
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("{:?} is not UTF-8: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata_is_file() {
        let meta = FileMetadata {
            size: 100,
            file_type: FileType::File,
        };
        assert!(meta.is_file());
        assert_eq!(meta.len(), 100);
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_file_metadata_directory() {
        let meta = FileMetadata {
            size: 0,
            file_type: FileType::Directory,
        };
        assert!(!meta.is_file());
        assert!(meta.is_empty());
    }
}
