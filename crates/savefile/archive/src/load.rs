use std::io;
use std::path::Path;

use thiserror::Error;

use obelisk_properties::{ReadError, SaveFormat};
use obelisk_properties::parse::PropertyError;

use crate::asa;
use crate::ase;
use crate::container::ObjectContainer;
use crate::detect::{sniff, FileKind};


/// Knobs for a load. The defaults decode strictly and without bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Keep going on unknown save versions instead of failing.
    pub best_effort: bool,
    /// Abort once a save declares (or yields) more objects than this.
    pub max_objects: Option<usize>,
}

/// Metadata decoded from a save's header region.
#[derive(Debug, Clone)]
pub struct SaveHeader {
    pub format:     SaveFormat,
    pub kind:       FileKind,
    pub version:    i32,
    /// In-game seconds since the world started; zero for bundle files.
    pub game_time:  f64,
    /// Only present in legacy worlds of version 9 and later.
    pub save_count: Option<i32>,
    /// Map data files referenced by a legacy world header.
    pub data_files: Vec<String>,
}

/// A decoded save: header, the full object graph, and every recovered
/// error. Callers gate downstream use on [`Self::parse_error_count`].
#[derive(Debug)]
pub struct LoadedSave {
    pub header:       SaveHeader,
    pub container:    ObjectContainer,
    pub parse_errors: Vec<String>,
}

impl LoadedSave {
    pub fn parse_error_count(&self) -> usize {
        self.parse_errors.len()
    }
}

/// Describes an error that aborted a save load.
///
/// Per-property and per-blob problems never surface here; they are
/// recovered into [`LoadedSave::parse_errors`]. These variants are the
/// fatal class: header, name-table, and store-schema failures.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("i/o error while reading a save: {0}")]
    Io(#[from] io::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("decompression error: {0}")]
    Decompress(String),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("save version {version} is not in the supported set")]
    UnsupportedFormat {
        version: i32,
    },
    #[error("the database has no recognizable {0} table")]
    MissingTable(&'static str),
    #[error("save holds {count} objects, more than the cap of {cap}")]
    TooManyObjects {
        count: usize,
        cap:   usize,
    },
    #[error("modern saves are database files and must be loaded from a path")]
    InMemoryDatabase,
}

impl ArchiveError {
    pub(crate) fn corrupt<M: Into<String>>(message: M) -> Self {
        Self::Read(ReadError::Corrupt {
            offset:  0,
            message: message.into(),
        })
    }
}

/// Load any supported save file from disk: sniff the format and kind, then
/// dispatch to the matching decoder.
pub fn load_save<P: AsRef<Path>>(
    path: P,
    opts: &LoadOptions,
) -> Result<LoadedSave, ArchiveError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;

    let detected = sniff(&bytes);
    if detected.format == SaveFormat::Asa {
        // The database driver wants the file, not the bytes.
        drop(bytes);
        return asa::decode_db(path, opts);
    }
    decode_ase(&bytes, opts)
}

/// Load a legacy save already in memory. Modern saves must come from a
/// path; passing their bytes here fails with
/// [`ArchiveError::InMemoryDatabase`].
pub fn load_save_bytes(bytes: &[u8], opts: &LoadOptions) -> Result<LoadedSave, ArchiveError> {
    if sniff(bytes).format == SaveFormat::Asa {
        return Err(ArchiveError::InMemoryDatabase);
    }
    decode_ase(bytes, opts)
}

fn decode_ase(bytes: &[u8], opts: &LoadOptions) -> Result<LoadedSave, ArchiveError> {
    let detected = sniff(bytes);
    match detected.kind {
        FileKind::World => ase::decode_world(bytes, opts),
        FileKind::Profile | FileKind::Tribe | FileKind::CloudInventory => {
            ase::decode_bundle(bytes, detected.kind, opts)
        }
        FileKind::Unknown => {
            if !opts.best_effort {
                return Err(ArchiveError::UnsupportedFormat {
                    version: detected.version,
                });
            }
            // Best effort: a bundle shape first (cheap to reject), then a
            // world walk.
            ase::decode_bundle(bytes, FileKind::Unknown, opts).or_else(|bundle_error| {
                log::warn!("unclassified save did not decode as a bundle: {bundle_error}");
                ase::decode_world(bytes, opts)
            })
        }
    }
}
