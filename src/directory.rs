use std::path::Path;
use tracing::debug;

/// Yes/no capability checks on the download directory.
pub trait DirectoryValidator: Send + Sync {
    fn is_available(&self, path: &Path) -> bool;
    fn is_writeable(&self, path: &Path) -> bool;
}

/// Checks the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDirectoryValidator;

impl DirectoryValidator for FsDirectoryValidator {
    fn is_available(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            debug!("Asked to check an empty directory path");
            return false;
        }
        let available = path.is_dir();
        debug!("Directory {:?} available: {}", path, available);
        available
    }

    fn is_writeable(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        let writeable = check_write_access(path);
        debug!("Directory {:?} writeable: {}", path, writeable);
        writeable
    }
}

#[cfg(unix)]
fn check_write_access(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn check_write_access(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| !metadata.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_temp_dir_is_usable() {
        let dir = TempDir::new().unwrap();
        let validator = FsDirectoryValidator;
        assert!(validator.is_available(dir.path()));
        assert!(validator.is_writeable(dir.path()));
    }

    #[test]
    fn test_missing_dir_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let validator = FsDirectoryValidator;
        assert!(!validator.is_available(&missing));
        assert!(!validator.is_writeable(&missing));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let validator = FsDirectoryValidator;
        assert!(!validator.is_available(Path::new("")));
        assert!(!validator.is_writeable(Path::new("")));
    }

    #[test]
    fn test_regular_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(!FsDirectoryValidator.is_available(&file));
    }
}
