//! Decoding of whole save files into an indexed object graph.
//!
//! The byte-level property system lives in `obelisk-properties`; this crate
//! owns everything above it: sniffing the format generation and file kind,
//! walking the legacy binary layout, walking the modern SQLite layout, and
//! assembling the decoded objects into a queryable container.

mod container;
mod detect;
mod load;
mod object;

mod asa;
mod ase;


pub use self::container::ObjectContainer;
pub use self::detect::{sniff, Detected, FileKind, KnownVersion, SQLITE_MAGIC};
pub use self::load::{
    load_save, load_save_bytes, ArchiveError, LoadedSave, LoadOptions, SaveHeader,
};
pub use self::object::{GameObject, LocationData, ObjectId};

pub use self::ase::decode_embedded;
