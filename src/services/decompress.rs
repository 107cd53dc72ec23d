use std::io::{Seek, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub enum DecompressError {
    #[error("Failed to decompress received report bzip, cause: {0}")]
    Failed(String),
}

impl From<std::io::Error> for DecompressError {
    fn from(e: std::io::Error) -> Self {
        DecompressError::Failed(e.to_string())
    }
}

/// Runs an external decompressor against a staged copy of the archive.
///
/// The tool only reads from a path, so every call writes the bytes to its
/// own `NamedTempFile`. The file is removed when the call returns, on every
/// path.
#[derive(Debug, Clone)]
pub struct Decompressor {
    program: String,
    args: Vec<String>,
}

impl Decompressor {
    pub fn new(command: &[String]) -> Result<Self, DecompressError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DecompressError::Failed("no decompress command configured".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut staged = tempfile::NamedTempFile::new()?;
        staged.write_all(data)?;
        staged.flush()?;
        staged.rewind()?;

        let output = self.run(staged.path());
        if let Err(e) = staged.close() {
            warn!(error = %e, "failed to remove staged archive");
        }
        output
    }

    fn run(&self, path: &Path) -> Result<Vec<u8>, DecompressError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DecompressError::Failed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecompressError::Failed(format!(
                "{} {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}
