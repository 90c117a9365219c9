use bijective_enum_map::injective_enum_map;

use obelisk_properties::{SaveFormat, SliceReader};


/// The first sixteen bytes of every modern save: they are SQLite databases.
pub const SQLITE_MAGIC: [u8; 16] = *b"SQLite format 3\0";

/// The legacy save versions observed in circulation. Behavior is gated on
/// membership in this set, never on ranges; versions 7 and 8 have been
/// referenced but never observed, so they are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownVersion {
    V5,
    V6,
    V9,
    V10,
    V11,
}

injective_enum_map! {
    KnownVersion, i32,
    V5  <=> 5,
    V6  <=> 6,
    V9  <=> 9,
    V10 <=> 10,
    V11 <=> 11,
}

/// What a save file holds, independent of format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A full world save (`.ark`).
    World,
    /// A player profile (`.arkprofile`).
    Profile,
    /// A tribe snapshot (`.arktribe`).
    Tribe,
    /// An obelisk/cloud upload inventory.
    CloudInventory,
    Unknown,
}

/// The result of sniffing a save's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub format:  SaveFormat,
    pub kind:    FileKind,
    /// Raw version field. Zero for modern saves, whose version lives in a
    /// header row rather than the leading bytes.
    pub version: i32,
}

/// Classify a save from its first bytes. Never fails: unclassifiable input
/// comes back as `FileKind::Unknown`, and the caller decides whether to
/// abort or attempt a best-effort decode.
pub fn sniff(bytes: &[u8]) -> Detected {
    if bytes.len() >= SQLITE_MAGIC.len() && bytes[.. SQLITE_MAGIC.len()] == SQLITE_MAGIC {
        return Detected {
            format:  SaveFormat::Asa,
            // The precise kind falls out of the table shapes during the load.
            kind:    FileKind::World,
            version: 0,
        };
    }

    let mut reader = SliceReader::new(bytes);
    let Ok(version) = reader.read_i32() else {
        return Detected {
            format:  SaveFormat::Ase,
            kind:    FileKind::Unknown,
            version: 0,
        };
    };

    let kind = match bundle_marker(bytes) {
        Some(marker) if marker.contains("PrimalPlayerData")      => FileKind::Profile,
        Some(marker) if marker.contains("PrimalTribeData")       => FileKind::Tribe,
        Some(marker) if marker.contains("ArkCloudInventoryData") => FileKind::CloudInventory,
        _ if KnownVersion::try_from(version).is_ok()             => FileKind::World,
        _                                                        => FileKind::Unknown,
    };

    Detected {
        format: SaveFormat::Ase,
        kind,
        version,
    }
}

/// Try to read the identifying class string a bundle file (profile, tribe,
/// cloud inventory) leads with: version, object count, then the first
/// object's GUID and inline name list.
fn bundle_marker(bytes: &[u8]) -> Option<String> {
    let mut reader = SliceReader::new(bytes);
    let _version = reader.read_i32().ok()?;

    let object_count = reader.read_i32().ok()?;
    if object_count < 1 || object_count > 100_000 {
        return None;
    }

    let _guid = reader.read_guid().ok()?;
    let name_count = reader.read_i32().ok()?;
    if name_count < 1 || name_count > 16 {
        return None;
    }

    let marker = reader.read_fstring().ok()?;
    // World headers land here with garbage; an implausible "name" means
    // this is not a bundle.
    if marker.is_empty() || marker.len() > 512 || !marker.is_ascii() {
        return None;
    }
    Some(marker)
}
