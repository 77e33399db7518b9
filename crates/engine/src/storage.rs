//! Persistence of the ledger and the streak record.
//!
//! Both records live in one JSON document:
//!
//! ```json
//! { "schema_version": 1, "ledger": { ... }, "streak": { ... } }
//! ```
//!
//! so that a single write persists them together. Reading is lenient: a
//! record that cannot be parsed falls back to its default, and a missing
//! record means "nothing saved yet". A document written by a newer schema is
//! refused instead, so an older binary never overwrites newer data.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{EngineError, Ledger, ResultEngine, StreakState};

/// Current version of the persisted document.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the engine persists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub ledger: Ledger,
    pub streak: StreakState,
}

/// Storage collaborator.
///
/// `save` must persist both records atomically: after a failed save the
/// previously saved document must still be the one returned by `load`.
pub trait Storage {
    /// Loads both records, or their defaults when nothing was saved.
    fn load(&self) -> ResultEngine<Snapshot>;

    /// Persists both records.
    fn save(&mut self, ledger: &Ledger, streak: &StreakState) -> ResultEngine<()>;
}

#[derive(Serialize)]
struct Document<'a> {
    schema_version: u32,
    ledger: &'a Ledger,
    streak: &'a StreakState,
}

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(default = "default_version")]
    schema_version: u32,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

/// Result of decoding a document.
struct Decoded {
    snapshot: Snapshot,
    /// `true` when part of the document was unreadable and replaced by
    /// defaults.
    recovered: bool,
}

fn encode(ledger: &Ledger, streak: &StreakState) -> ResultEngine<String> {
    Ok(serde_json::to_string_pretty(&Document {
        schema_version: SCHEMA_VERSION,
        ledger,
        streak,
    })?)
}

fn decode(raw: &str) -> ResultEngine<Decoded> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(_) => {
            tracing::warn!("stored document is not a JSON object, using defaults");
            return Ok(Decoded {
                snapshot: Snapshot::default(),
                recovered: true,
            });
        }
        Err(err) => {
            tracing::warn!("stored document is not valid JSON ({err}), using defaults");
            return Ok(Decoded {
                snapshot: Snapshot::default(),
                recovered: true,
            });
        }
    };

    if let Ok(header) = VersionHeader::deserialize(&value)
        && header.schema_version > SCHEMA_VERSION
    {
        return Err(EngineError::UnsupportedSchema {
            found: header.schema_version,
            supported: SCHEMA_VERSION,
        });
    }

    let mut recovered = false;
    let ledger = decode_record::<Ledger>(&value, "ledger", &mut recovered);
    let streak = decode_record::<StreakState>(&value, "streak", &mut recovered);

    Ok(Decoded {
        snapshot: Snapshot { ledger, streak },
        recovered,
    })
}

fn decode_record<T: DeserializeOwned + Default>(
    document: &Value,
    key: &str,
    recovered: &mut bool,
) -> T {
    let Some(record) = document.get(key) else {
        return T::default();
    };
    match T::deserialize(record) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("stored {key} record is malformed ({err}), using defaults");
            *recovered = true;
            T::default()
        }
    }
}

/// Stores the document in a JSON file.
///
/// Saves go through a temporary sibling file that is renamed over the target,
/// so a crash mid-write leaves the previous document in place.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where an unreadable document is copied before it can be overwritten.
    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, ".corrupt")
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> ResultEngine<Snapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store yet, using defaults");
                return Ok(Snapshot::default());
            }
            Err(err) => return Err(err.into()),
        };

        let decoded = decode(&raw)?;
        if decoded.recovered {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)?;
            tracing::warn!(backup = %backup.display(), "unreadable store backed up");
        }
        Ok(decoded.snapshot)
    }

    fn save(&mut self, ledger: &Ledger, streak: &StreakState) -> ResultEngine<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let payload = encode(ledger, streak)?;
        let tmp = sibling(&self.path, ".tmp");
        if let Err(err) = replace_with(&tmp, &self.path, payload.as_bytes()) {
            // The temp file may exist even when creating it was the failing step.
            if let Err(cleanup) = fs::remove_file(&tmp)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(tmp = %tmp.display(), error = %cleanup, "temp file left behind");
            }
            return Err(err.into());
        }
        tracing::debug!(path = %self.path.display(), "store saved");
        Ok(())
    }
}

/// Writes `payload` to `tmp`, syncs it and renames it over `target`.
fn replace_with(tmp: &Path, target: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(payload)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Keeps the serialized document in memory.
///
/// Uses the same encoding and fallback rules as [`JsonFileStorage`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    document: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing serialized document.
    pub fn from_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    /// The last saved document, if any.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> ResultEngine<Snapshot> {
        match &self.document {
            Some(raw) => Ok(decode(raw)?.snapshot),
            None => Ok(Snapshot::default()),
        }
    }

    fn save(&mut self, ledger: &Ledger, streak: &StreakState) -> ResultEngine<()> {
        self.document = Some(encode(ledger, streak)?);
        Ok(())
    }
}
