use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::WalletResult;

/// Durable flag remembering that the user connected a wallet, so the next
/// start of the client can resume the session without prompting.
pub trait ConnectMarker: Send + Sync {
    fn set(&self) -> WalletResult<()>;
    fn clear(&self) -> WalletResult<()>;
    fn is_set(&self) -> bool;
}

/// File-backed marker. Presence of the file is the flag.
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConnectMarker for FileMarker {
    fn set(&self) -> WalletResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, b"connected\n")?;
        Ok(())
    }

    fn clear(&self) -> WalletResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_set(&self) -> bool {
        self.path.exists()
    }
}

/// In-memory marker for tests.
#[derive(Default)]
pub struct MemoryMarker {
    set: AtomicBool,
}

impl MemoryMarker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectMarker for MemoryMarker {
    fn set(&self) -> WalletResult<()> {
        self.set.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> WalletResult<()> {
        self.set.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_marker_toggles() {
        let marker = MemoryMarker::new();
        assert!(!marker.is_set());
        marker.set().unwrap();
        assert!(marker.is_set());
        marker.clear().unwrap();
        assert!(!marker.is_set());
    }

    #[test]
    fn file_marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileMarker::new(dir.path().join("connected"));
        assert!(!marker.is_set());
        marker.set().unwrap();
        assert!(marker.is_set());
        marker.clear().unwrap();
        assert!(!marker.is_set());
    }

    #[test]
    fn file_marker_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileMarker::new(dir.path().join("connected"));
        marker.clear().unwrap();
        marker.clear().unwrap();
    }

    #[test]
    fn file_marker_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileMarker::new(dir.path().join("state/wallet/connected"));
        marker.set().unwrap();
        assert!(marker.is_set());
    }
}
