use log::{debug, warn};
use std::io::Write;
use std::path::Path;
use std::{fs, io};

use crate::core::error::{Result, TransformError};

pub trait WriteToFile {
    fn write_to_file(&self, path: &Path, data: &str) -> io::Result<()>;
}

#[derive(Default, Debug)]
pub struct Writer;

impl WriteToFile for Writer {
    fn write_to_file(&self, path: &Path, data: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        file.flush()?;

        Ok(())
    }
}

/// Write `data` to `path`, refusing to replace an existing file unless
/// `overwrite` is set.
pub fn write_output(
    writer: &dyn WriteToFile,
    path: &Path,
    data: &str,
    overwrite: bool,
) -> Result<()> {
    if path.exists() && !overwrite {
        warn!("Not overwriting existing file {}", path.display());
        return Err(TransformError::OutputExists(path.display().to_string()));
    }

    writer.write_to_file(path, data)?;
    debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
