use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::TuneError;

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), TuneError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| TuneError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("sourcetune")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| TuneError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| TuneError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| TuneError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| TuneError::Filesystem(err.to_string()))?;
    Ok(())
}
