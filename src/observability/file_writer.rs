//! Append-only line writer with size-based rotation.
//!
//! When the next line would push the file past its size limit, the file is shifted
//! into numbered backups (`spans.jsonl` → `spans.jsonl.1` → `spans.jsonl.2` …) and
//! a fresh file is started. Backups beyond the configured count are deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct OpenFile {
    file: File,
    len: u64,
}

/// Thread-safe rotating line writer.
///
/// The file is opened lazily on the first write, so construction never fails.
///
/// # Example
///
/// ```rust
/// use notesync::observability::RotatingFileWriter;
///
/// let dir = std::env::temp_dir().join("notesync-doc-writer");
/// std::fs::create_dir_all(&dir)?;
/// let writer = RotatingFileWriter::new(dir.join("spans.jsonl"), 1024, 2);
/// writer.write_line(r#"{"name":"dispatch"}"#)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    current: Mutex<Option<OpenFile>>,
}

impl RotatingFileWriter {
    #[must_use]
    pub const fn new(path: PathBuf, max_bytes: u64, backups: usize) -> Self {
        Self {
            path,
            max_bytes,
            backups,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `n`th backup (1 is the most recent).
    #[must_use]
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    /// Appends `line` plus a newline, rotating first if it would not fit.
    ///
    /// # Errors
    ///
    /// Returns an error if rotating, opening or writing the file fails, or if the
    /// lock was poisoned.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("writer lock poisoned: {e}")))?;

        let incoming = line.len() as u64 + 1;
        let needs_rotation = current
            .as_ref()
            .map_or_else(|| self.on_disk_len(), |open| open.len)
            .checked_add(incoming)
            .is_some_and(|total| total > self.max_bytes);
        if needs_rotation && self.on_disk_len() > 0 {
            *current = None;
            self.rotate()?;
        }

        if current.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            let len = file.metadata()?.len();
            *current = Some(OpenFile { file, len });
        }

        let open = current
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace file unavailable"))?;
        writeln!(open.file, "{line}")?;
        open.file.flush()?;
        open.len += incoming;
        Ok(())
    }

    fn on_disk_len(&self) -> u64 {
        fs::metadata(&self.path).map_or(0, |m| m.len())
    }

    fn rotate(&self) -> io::Result<()> {
        if self.backups == 0 {
            return fs::remove_file(&self.path);
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.backups).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))
    }
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .field("backups", &self.backups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn rotates_into_numbered_backups() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::new(dir.path().join("spans.jsonl"), 10, 2);

        for line in ["aaaa", "bbbb", "cccc", "dddd", "eeee"] {
            writer.write_line(line).unwrap();
        }

        assert_eq!(read(writer.path()), "eeee\n");
        assert_eq!(read(&writer.backup_path(1)), "cccc\ndddd\n");
        assert_eq!(read(&writer.backup_path(2)), "aaaa\nbbbb\n");
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn oversized_line_goes_to_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::new(dir.path().join("spans.jsonl"), 4, 1);

        writer.write_line("much too long").unwrap();
        assert_eq!(read(writer.path()), "much too long\n");
        assert!(!writer.backup_path(1).exists());

        writer.write_line("x").unwrap();
        assert_eq!(read(writer.path()), "x\n");
        assert_eq!(read(&writer.backup_path(1)), "much too long\n");
    }

    #[test]
    fn zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::new(dir.path().join("spans.jsonl"), 6, 0);

        writer.write_line("one").unwrap();
        writer.write_line("two").unwrap();
        writer.write_line("three").unwrap();
        assert_eq!(read(writer.path()), "three\n");
        assert!(!writer.backup_path(1).exists());
    }
}
