//! Byte-counted output streams and the run lock

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ExportError, Result};
use crate::stats::Stats;

/// Name of the marker file claiming an output root for one run
const LOCK_FILE_NAME: &str = ".takeout.lock";

/// Buffered file stream that attributes every written byte to the run's
/// stats and maps IO failures to the artifact path
pub struct OutputStream {
    path: PathBuf,
    writer: io::BufWriter<File>,
    stats: Arc<Stats>,
}

impl OutputStream {
    /// Create the file (and any missing parent directories) and count it
    /// as a produced artifact
    pub fn create(path: impl Into<PathBuf>, stats: Arc<Stats>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| ExportError::io(&path, e))?;
        log::debug!("created artifact {}", path.display());
        stats.add_file();
        Ok(Self {
            path,
            writer: io::BufWriter::new(file),
            stats,
        })
    }

    /// Path of the artifact this stream produces
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write raw bytes, counting them on success
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| ExportError::io(&self.path, e))?;
        self.stats.add_bytes(bytes.len() as u64);
        Ok(())
    }

    /// Write a string fragment
    pub fn write_str(&mut self, fragment: &str) -> Result<()> {
        self.write_all(fragment.as_bytes())
    }

    /// Write a string fragment followed by a newline
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_str(line)?;
        self.write_all(b"\n")
    }

    /// Flush and close the stream
    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ExportError::io(&self.path, e))
    }
}

/// Marker claiming an output root for the lifetime of one run
///
/// Created with create-new semantics so a second run into the same root is
/// rejected instead of silently interleaving with files the first run may
/// still hold open. Released on finish and abort; dropping the lock is the
/// backstop for every other exit path.
pub struct RunLock {
    path: PathBuf,
    armed: bool,
}

impl RunLock {
    /// Claim `output_dir`, creating it if needed
    pub fn acquire(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).map_err(|e| ExportError::io(output_dir, e))?;
        let path = output_dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path, armed: true }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ExportError::OutputBusy(output_dir.to_path_buf()))
            }
            Err(e) => Err(ExportError::io(&path, e)),
        }
    }

    /// Release the claim explicitly
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        fs::remove_file(&self.path).map_err(|e| ExportError::io(&self.path, e))
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}
