use crate::domain::constants::ARF_NAMESPACE;
use crate::domain::models::{ArchiveKey, StoredArchive, Tier};
use crate::services::settings::Settings;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
#[error("Could not store archive in {tier} directory: {message}")]
pub struct StoreError {
    pub tier: Tier,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Could not find requested file, {0}")]
    NotFound(String),
    #[error("Could not read archive {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_digest(raw: &str) -> bool {
    raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Archive store split into four directory trees, one per [`Tier`].
///
/// Layout: `<tier dir>/arf/<cname>/<id>/<date>/<sha256 of contents>`. The
/// filename is the content digest, so lookups need only the key and digest.
/// Writes to an existing path replace it (last writer wins).
#[derive(Debug, Clone)]
pub struct TieredStorage {
    reports: PathBuf,
    spool: PathBuf,
    failed: PathBuf,
    corrupted: PathBuf,
}

impl TieredStorage {
    pub fn new(settings: &Settings) -> Self {
        Self {
            reports: settings.tier_dir(Tier::Reports).to_path_buf(),
            spool: settings.tier_dir(Tier::Spool).to_path_buf(),
            failed: settings.tier_dir(Tier::Failed).to_path_buf(),
            corrupted: settings.tier_dir(Tier::Corrupted).to_path_buf(),
        }
    }

    pub fn tier_dir(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Reports => &self.reports,
            Tier::Spool => &self.spool,
            Tier::Failed => &self.failed,
            Tier::Corrupted => &self.corrupted,
        }
    }

    fn namespace_dir(&self, tier: Tier) -> PathBuf {
        self.tier_dir(tier).join(ARF_NAMESPACE)
    }

    pub fn archive_dir(&self, tier: Tier, key: &ArchiveKey) -> PathBuf {
        self.namespace_dir(tier)
            .join(key.cname())
            .join(key.id())
            .join(key.date())
    }

    pub fn store(&self, tier: Tier, key: &ArchiveKey, data: &[u8]) -> Result<PathBuf, StoreError> {
        let dir = self.archive_dir(tier, key);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError {
            tier,
            message: format!("Could not fulfill request: {}", e),
        })?;
        let target = dir.join(sha256_hex(data));
        std::fs::write(&target, data).map_err(|e| StoreError {
            tier,
            message: format!("Could not store file: {}", e),
        })?;
        debug!(path = %target.display(), %tier, "archive stored");
        Ok(target)
    }

    /// Reads an archive back, checking its contents against `digest`.
    pub fn fetch(&self, tier: Tier, key: &ArchiveKey, digest: &str) -> Result<Vec<u8>, FetchError> {
        let dir = self.archive_dir(tier, key);
        if !is_digest(digest) {
            return Err(FetchError::NotFound(dir.join(digest).display().to_string()));
        }
        let path = dir.join(digest.to_ascii_lowercase());
        let shown = path.display().to_string();
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(FetchError::NotFound(shown)),
            Err(source) => return Err(FetchError::Io { path: shown, source }),
        };
        if sha256_hex(&data) != digest.to_ascii_lowercase() {
            return Err(FetchError::NotFound(shown));
        }
        Ok(data)
    }

    /// Removes every archive filed under `<cname>/<id>`. Returns whether
    /// anything was there; a missing key is not an error.
    pub fn delete(&self, tier: Tier, key: &ArchiveKey) -> Result<bool, StoreError> {
        let dir = self.namespace_dir(tier).join(key.cname()).join(key.id());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %dir.display(), "nothing to delete, assuming deleted");
                Ok(false)
            }
            Err(e) => Err(StoreError {
                tier,
                message: format!("Could not delete {}: {}", dir.display(), e),
            }),
        }
    }

    /// Enumerates every archive currently held in `tier`, sorted by path.
    pub fn list_errors(&self, tier: Tier) -> Result<Vec<StoredArchive>, StoreError> {
        let io_err = |e: std::io::Error| StoreError {
            tier,
            message: format!("Could not list archives: {}", e),
        };
        let mut out = Vec::new();
        for (cname, cname_dir) in subdirs(&self.namespace_dir(tier)).map_err(io_err)? {
            for (id, id_dir) in subdirs(&cname_dir).map_err(io_err)? {
                for (date, date_dir) in subdirs(&id_dir).map_err(io_err)? {
                    for entry in std::fs::read_dir(&date_dir).map_err(io_err)? {
                        let entry = entry.map_err(io_err)?;
                        if !entry.file_type().map_err(io_err)?.is_file() {
                            continue;
                        }
                        out.push(StoredArchive {
                            cname: cname.clone(),
                            id: id.clone(),
                            date: date.clone(),
                            digest: entry.file_name().to_string_lossy().to_string(),
                            path: entry.path().to_string_lossy().to_string(),
                        });
                    }
                }
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}

fn subdirs(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e),
    };
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    Ok(out)
}
