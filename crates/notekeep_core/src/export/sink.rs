//! File-save collaborator contract.

use super::ExportError;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Finished export artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SavedFile {
    /// Payload as UTF-8 text, for text-based formats.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Receiver of named export payloads ("save as file").
pub trait FileSink {
    fn save(&mut self, file: &SavedFile) -> Result<(), ExportError>;
}

impl FileSink for Vec<SavedFile> {
    fn save(&mut self, file: &SavedFile) -> Result<(), ExportError> {
        self.push(file.clone());
        Ok(())
    }
}

/// Writes artifacts into one directory, overwriting same-named files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, file: &SavedFile) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&file.filename);
        fs::write(&path, &file.bytes)?;
        info!("{}", saved_log_line(file));
        Ok(())
    }
}

/// Filenames carry note titles, so only the extension is logged.
fn saved_log_line(file: &SavedFile) -> String {
    let extension = Path::new(&file.filename)
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or("none");
    format!(
        "event=export_saved module=export status=ok bytes={} extension={extension}",
        file.bytes.len()
    )
}
