use crate::error::{Error, Result};
use crate::report::{Event, Reporter};
use crate::types::NameBatch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    ReadOnly,
    ReadWrite,
}

/// A reference to one certificate record in the store, keyed by friendly
/// name. Friendly names are free text and NOT unique; uniqueness is only a
/// convention upheld by the dedup step upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub id: String,
    pub friendly_name: String,
}

pub trait CertificateStore {
    /// Opens the store. The handle is scoped: dropping it releases the store
    /// on every exit path.
    fn open(&self, access: StoreAccess) -> Result<Box<dyn StoreHandle + '_>>;
}

pub trait StoreHandle {
    fn entries(&mut self) -> Result<Vec<StoreEntry>>;

    fn remove(&mut self, entry: &StoreEntry) -> Result<()>;

    /// Installs a certificate record. Requires [`StoreAccess::ReadWrite`].
    fn insert(&mut self, friendly_name: &str, cert_pem: &str) -> Result<StoreEntry>;
}

/// Removes existing store entries whose friendly name collides with a batch
/// name, so the batch can re-issue without creating duplicates.
///
/// A removal failure drops that name from the batch entirely: a name whose
/// stale certificate cannot be cleared is skipped rather than re-issued next
/// to it. Per-entry failures never fail the call; only an open or enumerate
/// failure propagates, aborting the batch run.
pub fn reconcile(
    mut batch: NameBatch,
    store: &dyn CertificateStore,
    reporter: &mut dyn Reporter,
) -> Result<NameBatch> {
    let mut handle = store.open(StoreAccess::ReadWrite)?;
    for entry in handle.entries()? {
        if !batch.contains(&entry.friendly_name) {
            continue;
        }
        match handle.remove(&entry) {
            Ok(()) => reporter.report(Event::StoreEntryRemoved(&entry.friendly_name)),
            Err(err) => {
                batch.exclude(&entry.friendly_name);
                reporter.report(Event::StoreEntrySkipped {
                    name: &entry.friendly_name,
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(batch)
}

#[derive(Serialize, Deserialize)]
struct Record {
    friendly_name: String,
    cert_pem: String,
}

/// A directory-backed certificate store: one JSON record per entry, file stem
/// as the entry id.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CertificateStore for FileStore {
    fn open(&self, access: StoreAccess) -> Result<Box<dyn StoreHandle + '_>> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::Store(format!(
                "cannot open store at {}: {}",
                self.root.display(),
                e
            ))
        })?;
        Ok(Box::new(FileStoreHandle {
            root: &self.root,
            access,
        }))
    }
}

struct FileStoreHandle<'a> {
    root: &'a Path,
    access: StoreAccess,
}

impl FileStoreHandle<'_> {
    fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    fn require_write(&self) -> Result<()> {
        if self.access != StoreAccess::ReadWrite {
            return Err(Error::Store("store opened read-only".to_string()));
        }
        Ok(())
    }
}

impl StoreHandle for FileStoreHandle<'_> {
    fn entries(&mut self) -> Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(self.root).map_err(|e| Error::Store(e.to_string()))? {
            let path = dirent.map_err(|e| Error::Store(e.to_string()))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read_to_string(&path).map_err(|e| Error::Store(e.to_string()))?;
            let record: Record = serde_json::from_str(&data)?;
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            entries.push(StoreEntry {
                id,
                friendly_name: record.friendly_name,
            });
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        self.require_write()
            .map_err(|e| Error::StoreRemoval {
                name: entry.friendly_name.clone(),
                message: e.to_string(),
            })?;
        fs::remove_file(self.entry_path(&entry.id)).map_err(|e| Error::StoreRemoval {
            name: entry.friendly_name.clone(),
            message: e.to_string(),
        })
    }

    fn insert(&mut self, friendly_name: &str, cert_pem: &str) -> Result<StoreEntry> {
        self.require_write()?;
        let id = format!("{:016x}", rand::random::<u64>());
        let record = Record {
            friendly_name: friendly_name.to_string(),
            cert_pem: cert_pem.to_string(),
        };
        fs::write(self.entry_path(&id), serde_json::to_string_pretty(&record)?)
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(StoreEntry {
            id,
            friendly_name: friendly_name.to_string(),
        })
    }
}
