//! SD-card session log storage.
//!
//! Implements [`LogStoragePort`] over a mounted filesystem.  On the board
//! the card is mounted as FAT under [`pins::SD_MOUNT_POINT`] by `main`
//! and reached through ESP-IDF's VFS, so the same `std::fs` code runs on
//! target and host (host tests point it at a temp directory).
//!
//! - One target open at a time; a second `open` is `AlreadyOpen`.
//! - `open` never truncates: an existing target of the same name is
//!   appended to.
//! - `append` goes straight to the file (no user-space buffering), so a
//!   crash of this process never loses an appended record.
//! - `sync` flushes and `fsync`s: the durability point of the flush
//!   policy.
//!
//! [`pins::SD_MOUNT_POINT`]: crate::pins::SD_MOUNT_POINT

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::utils::is_printable_ascii;
use crate::app::ports::{LogHandle, LogStoragePort};
use crate::error::StorageError;

struct OpenLog {
    handle: LogHandle,
    path: PathBuf,
    file: File,
}

pub struct SdLogStorage {
    root: PathBuf,
    mounted: bool,
    open: Option<OpenLog>,
    next_handle: u32,
    reinits: u32,
}

impl SdLogStorage {
    /// Storage rooted at `root`.  Mount state is probed immediately.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mounted = root.is_dir();
        if mounted {
            info!("SdLog: medium at {}", root.display());
        } else {
            warn!("SdLog: nothing mounted at {}", root.display());
        }
        Self {
            root,
            mounted,
            open: None,
            next_handle: 1,
            reinits: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Path of the open target, if any.
    pub fn open_path(&self) -> Option<&Path> {
        self.open.as_ref().map(|o| o.path.as_path())
    }

    /// Re-initialisations requested since boot.
    pub fn reinits(&self) -> u32 {
        self.reinits
    }

    fn target(&mut self, handle: LogHandle) -> Result<&mut OpenLog, StorageError> {
        match self.open.as_mut() {
            Some(log) if log.handle == handle => Ok(log),
            _ => Err(StorageError::InvalidHandle),
        }
    }
}

impl LogStoragePort for SdLogStorage {
    fn open(&mut self, name: &str) -> Result<LogHandle, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        if self.open.is_some() {
            return Err(StorageError::AlreadyOpen);
        }
        if name.is_empty() || name.contains('/') || !is_printable_ascii(name) {
            return Err(StorageError::OpenFailed);
        }

        let path = self.root.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path).map_err(|e| {
            warn!("SdLog: create {} failed: {}", path.display(), e);
            StorageError::OpenFailed
        })?;

        let handle = LogHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        info!("SdLog: opened {} as #{}", path.display(), handle.0);
        self.open = Some(OpenLog { handle, path, file });
        Ok(handle)
    }

    fn append(&mut self, handle: LogHandle, record: &str) -> Result<(), StorageError> {
        let log = self.target(handle)?;
        log.file
            .write_all(record.as_bytes())
            .map_err(|_| StorageError::WriteFailed)
    }

    fn sync(&mut self, handle: LogHandle) -> Result<(), StorageError> {
        let log = self.target(handle)?;
        log.file.flush().map_err(|_| StorageError::SyncFailed)?;
        log.file.sync_all().map_err(|_| StorageError::SyncFailed)?;
        debug!("SdLog: synced #{}", handle.0);
        Ok(())
    }

    fn close(&mut self, handle: LogHandle) -> Result<(), StorageError> {
        self.target(handle)?;
        let Some(mut log) = self.open.take() else {
            return Err(StorageError::InvalidHandle);
        };
        log.file.flush().map_err(|_| StorageError::CloseFailed)?;
        log.file.sync_all().map_err(|_| StorageError::CloseFailed)?;
        info!("SdLog: closed {}", log.path.display());
        Ok(())
    }

    fn reinit(&mut self) -> Result<(), StorageError> {
        self.reinits = self.reinits.saturating_add(1);
        self.mounted = self.root.is_dir();
        if !self.mounted {
            warn!("SdLog: medium gone at {}", self.root.display());
            return Err(StorageError::NotMounted);
        }
        if let Some(log) = self.open.as_mut() {
            log.file.flush().map_err(|_| StorageError::SyncFailed)?;
        }
        debug!("SdLog: re-initialised");
        Ok(())
    }
}
