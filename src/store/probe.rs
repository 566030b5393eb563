//! Existence probes for favorites

use std::path::Path;

use crate::domain::Entry;

/// Answers whether a favorite's target exists and what kind it is
pub trait ResourceProbe: Send + Sync {
    fn exists(&self, entry: &Entry) -> bool;

    fn is_directory(&self, entry: &Entry) -> bool;
}

/// Probes the local filesystem at the entry's absolute path.
///
/// Symlinks are followed, so a dangling link counts as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl ResourceProbe for FsProbe {
    fn exists(&self, entry: &Entry) -> bool {
        Path::new(entry.absolute_path()).exists()
    }

    fn is_directory(&self, entry: &Entry) -> bool {
        Path::new(entry.absolute_path()).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn probes_files_and_directories() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let file_entry = Entry::new(file.to_str().unwrap(), false).unwrap();
        let dir_entry = Entry::new(dir.path().to_str().unwrap(), false).unwrap();
        let gone = Entry::new(dir.path().join("gone").to_str().unwrap(), false).unwrap();

        assert!(FsProbe.exists(&file_entry));
        assert!(!FsProbe.is_directory(&file_entry));
        assert!(FsProbe.exists(&dir_entry));
        assert!(FsProbe.is_directory(&dir_entry));
        assert!(!FsProbe.exists(&gone));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_missing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        let link = dir.path().join("link.txt");
        fs::write(&target, "t").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let entry = Entry::new(link.to_str().unwrap(), false).unwrap();
        assert!(FsProbe.exists(&entry));

        fs::remove_file(&target).unwrap();
        assert!(!FsProbe.exists(&entry));
    }
}
