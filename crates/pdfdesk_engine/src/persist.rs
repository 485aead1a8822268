use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot save into {dir}: {reason}")]
    SaveDir { dir: PathBuf, reason: String },
    #[error("artifact name {0:?} is not a plain file name")]
    ArtifactName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Makes `dir` usable as the save location for processed PDFs and zips,
/// creating it on first use and proving it accepts new files.
pub fn prepare_save_dir(dir: &Path) -> Result<(), PersistError> {
    let refuse = |reason: String| PersistError::SaveDir {
        dir: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(refuse("not a directory".to_string())),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| refuse(e.to_string()))?;
        }
        Err(err) => return Err(refuse(err.to_string())),
    }
    NamedTempFile::new_in(dir).map_err(|e| refuse(e.to_string()))?;
    Ok(())
}

/// Writes a finished artifact under its canonical name.
///
/// Saving the same name twice replaces the earlier artifact in one rename,
/// so a reader sees either the old bytes or the new ones.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, artifact_name: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        if !is_plain_name(artifact_name) {
            return Err(PersistError::ArtifactName(artifact_name.to_string()));
        }
        prepare_save_dir(&self.dir)?;

        let target = self.dir.join(artifact_name);
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file_mut().sync_all()?;
        staged
            .persist(&target)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}
