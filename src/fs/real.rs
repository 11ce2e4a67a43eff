use super::{FileMetadata, FileSystem, FileType};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).context(format!("Failed to get metadata for {:?}", path))?;

        let file_type = if meta.is_file() {
            FileType::File
        } else if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::Other
        };

        Ok(FileMetadata {
            size: meta.len(),
            file_type,
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).context(format!("Failed to read file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/kafka.yaml"), "host: {{ all.kafka.host }}\n").unwrap();
        fs::write(dir.path().join("values.yaml"), "host: broker\n").unwrap();
        dir
    }

    #[test]
    fn test_exists_and_is_file() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert!(fs.exists(&temp.path().join("values.yaml")));
        assert!(fs.is_file(&temp.path().join("values.yaml")));
        assert!(fs.exists(&temp.path().join("templates")));
        assert!(!fs.is_file(&temp.path().join("templates")));
        assert!(!fs.exists(&temp.path().join("missing.yaml")));
    }

    #[test]
    fn test_metadata() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let meta = fs.metadata(&temp.path().join("values.yaml")).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 13);

        let meta = fs.metadata(&temp.path().join("templates")).unwrap();
        assert_eq!(meta.file_type, FileType::Directory);
    }

    #[test]
    fn test_read() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert_eq!(fs.read(&temp.path().join("values.yaml")).unwrap(), b"host: broker\n");
        let template = fs
            .read_to_string(&temp.path().join("templates/kafka.yaml"))
            .unwrap();
        assert!(template.contains("all.kafka.host"));
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let err = fs.read(&temp.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
