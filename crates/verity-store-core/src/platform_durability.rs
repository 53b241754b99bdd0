//! Platform-specific durable sync for write-once files
//!
//! Content-addressed documents are created once and never rewritten, so a
//! single sync of the file and of its directory entry is all they need.
//! These helpers map that to the strongest primitive on each platform.

use std::fs::File;
use std::io;
use std::path::Path;

/// Block until the contents of `file` have reached persistent storage.
///
/// Platform behaviors:
/// - Linux: fdatasync() - data only, metadata like mtime is not flushed
/// - macOS/iOS: fcntl(F_FULLFSYNC) - bypasses the drive's volatile cache
/// - Windows: FlushFileBuffers()
/// - Other: file.sync_data()
///
/// May block for a long time under heavy I/O; do not call while holding
/// locks other threads need.
pub fn durable_sync(file: &File) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd comes from a live File reference, so it is open.
        let result = unsafe { libc::fdatasync(fd) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        // Plain fsync() on Apple platforms stops at the drive cache
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd comes from a live File reference, so it is open.
        let result = unsafe { libc::fcntl(fd, libc::F_FULLFSYNC) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::io::AsRawHandle;
        use winapi::um::fileapi::FlushFileBuffers;
        let handle = file.as_raw_handle();
        // SAFETY: handle comes from a live File reference.
        let result = unsafe { FlushFileBuffers(handle as *mut _) };
        if result != 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    )))]
    {
        file.sync_data()
    }
}

/// Make a newly created directory entry under `dir` durable.
///
/// On Unix this fsyncs the directory itself. Windows offers no portable way
/// to open a directory for syncing and persists entries with the file, so
/// this is a no-op there.
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        File::open(dir)?.sync_all()
    }

    #[cfg(not(unix))]
    {
        let _ = dir;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_durable_sync_success() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"name:doc\n{}").unwrap();

        let result = durable_sync(file.as_file());
        assert!(result.is_ok(), "durable_sync failed: {:?}", result.err());
    }

    #[test]
    fn test_sync_dir_success() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("entry"), b"x").unwrap();
        assert!(sync_dir(dir.path()).is_ok());
    }

    #[test]
    fn test_sync_dir_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        if cfg!(unix) {
            assert!(sync_dir(&missing).is_err());
        }
    }
}
