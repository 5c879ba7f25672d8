// # State Mirror File
//
// Optional file that mirrors the last applied address so that other tools
// (health checks, scripts) can read it.
//
// ## Semantics
//
// - Write-only: the engine never reads it back; at startup the provider's
//   record is the source of truth
// - Atomic writes: content goes to `<path>.tmp` and is then renamed
// - Plain text: the address followed by a newline

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;

/// Mirrors the last applied address to a file
#[derive(Debug, Clone)]
pub struct StateMirror {
    path: PathBuf,
}

impl StateMirror {
    /// Create a mirror, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Path of the mirror file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `address` to the mirror file atomically
    pub async fn write(&self, address: &str) -> Result<(), Error> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(address.trim().as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, &self.path).await?;
        tracing::debug!("Mirrored {} to {}", address, self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
