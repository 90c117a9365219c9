//! The modern relational-store walker.
//!
//! A modern save is a SQLite database: one key/value header table, one
//! fixed-width actor-transform table keyed by GUID, and one table of
//! compressed per-object property blobs keyed by GUID. Table and column
//! names drift across game patches, so tables are recognized by column
//! shape, with names only as a tiebreaker.

mod rle;

use std::collections::HashMap;
use std::path::Path;

use flate2::read::ZlibDecoder;
use rusqlite::{Connection, OpenFlags};
use rusqlite::types::ValueRef;
use subslice_to_array::SubsliceToArray as _;

use obelisk_properties::{
    DecodeContext, Name, NameStrategy, NameTable, Property, SaveFormat, SliceReader,
    parse::read_property_list_into,
};
use obelisk_util::OrWarn as _;

use crate::container::ObjectContainer;
use crate::detect::FileKind;
use crate::ase::read_name_list;
use crate::load::{ArchiveError, LoadOptions, LoadedSave, SaveHeader};
use crate::object::{GameObject, LocationData};
use self::rle::RleReader;


/// Six f64 components: position then rotation.
const TRANSFORM_ROW_LEN: usize = 48;

/// Cap on a single blob's declared uncompressed length.
const MAX_BLOB_LEN: usize = 256 * 1024 * 1024;

/// Header-row keys. These have been stable even while table names drift.
const KEY_VERSION:   &str = "SaveGameVersion";
const KEY_GAME_TIME: &str = "GameTime";
const KEY_NAMES:     &str = "Names";

/// The three tables of interest, located by shape.
#[derive(Debug)]
struct StoreLayout {
    header:     String,
    transforms: Option<String>,
    blobs:      String,
}

fn discover_layout(conn: &Connection) -> Result<StoreLayout, ArchiveError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut header = None;
    let mut blob_keyed = Vec::new();

    for table in tables {
        let types = column_types(conn, &table)?;
        if types.len() != 2 {
            continue;
        }
        // An omitted column type has BLOB affinity in practice here.
        let text_key = types[0].contains("TEXT") || types[0].contains("CHAR");
        let blob_key = types[0].contains("BLOB") || types[0].is_empty();
        let blob_value = types[1].contains("BLOB") || types[1].is_empty();

        if text_key && blob_value && header.is_none() {
            header = Some(table);
        } else if blob_key && blob_value {
            blob_keyed.push(table);
        }
    }

    let mut transforms = None;
    let mut blobs = None;
    let mut empties = Vec::new();

    for table in blob_keyed {
        match first_value_len(conn, &table)? {
            Some(TRANSFORM_ROW_LEN) if transforms.is_none() => transforms = Some(table),
            Some(_) if blobs.is_none() => blobs = Some(table),
            Some(_) => {}
            None => empties.push(table),
        }
    }
    // Empty tables cannot be probed; fall back to their names.
    for table in empties {
        log::debug!("classifying empty table {table:?} by name");
        let lowered = table.to_ascii_lowercase();
        if transforms.is_none() && (lowered.contains("transform") || lowered.contains("actor")) {
            transforms = Some(table);
        } else if blobs.is_none() {
            blobs = Some(table);
        }
    }

    Ok(StoreLayout {
        header: header.ok_or(ArchiveError::MissingTable("key/value header"))?,
        transforms,
        blobs:  blobs.ok_or(ArchiveError::MissingTable("object blob"))?,
    })
}

fn column_types(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let types = stmt
        .query_map([], |row| row.get::<_, String>(2))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(types
        .into_iter()
        .map(|t| t.to_ascii_uppercase())
        .collect())
}

/// Length of the first row's value column, to tell the fixed-width
/// transform table apart from the blob table.
fn first_value_len(conn: &Connection, table: &str) -> Result<Option<usize>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\" LIMIT 1"))?;
    let mut rows = stmt.query([])?;
    if let Some(row) = rows.next()? {
        if let ValueRef::Blob(bytes) = row.get_ref(1)? {
            return Ok(Some(bytes.len()));
        }
    }
    Ok(None)
}

/// Header rows, with every value normalized to little-endian bytes.
fn read_header_rows(
    conn:  &Connection,
    table: &str,
) -> Result<HashMap<String, Vec<u8>>, ArchiveError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
    let mut rows = stmt.query([])?;
    let mut header = HashMap::new();

    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let value = match row.get_ref(1)? {
            ValueRef::Blob(bytes)    => bytes.to_vec(),
            ValueRef::Text(bytes)    => bytes.to_vec(),
            ValueRef::Integer(value) => value.to_le_bytes().to_vec(),
            ValueRef::Real(value)    => value.to_le_bytes().to_vec(),
            ValueRef::Null           => Vec::new(),
        };
        header.insert(key, value);
    }
    Ok(header)
}

fn header_i32(bytes: &[u8]) -> Option<i32> {
    (bytes.len() >= 4).then(|| i32::from_le_bytes(bytes.subslice_to_array::<0, 4>()))
}

fn header_f64(bytes: &[u8]) -> Option<f64> {
    match bytes.len() {
        4 => Some(f64::from(f32::from_le_bytes(bytes.subslice_to_array::<0, 4>()))),
        8 => Some(f64::from_le_bytes(bytes.subslice_to_array::<0, 8>())),
        _ => None,
    }
}

fn read_transforms(
    conn:  &Connection,
    table: &str,
    log:   &mut obelisk_properties::ParseLog,
) -> Result<HashMap<[u8; 16], LocationData>, ArchiveError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
    let mut rows = stmt.query([])?;
    let mut transforms = HashMap::new();

    while let Some(row) = rows.next()? {
        let ValueRef::Blob(guid) = row.get_ref(0)? else {
            log.record("actor-transform row has a non-blob key");
            continue;
        };
        if guid.len() != 16 {
            log.record(format!("actor-transform key is {} bytes, not 16", guid.len()));
            continue;
        }
        let ValueRef::Blob(value) = row.get_ref(1)? else {
            log.record("actor-transform row has a non-blob value");
            continue;
        };
        if value.len() != TRANSFORM_ROW_LEN {
            log.record(format!(
                "actor-transform value is {} bytes, not {TRANSFORM_ROW_LEN}",
                value.len(),
            ));
            continue;
        }

        transforms.insert(
            guid.subslice_to_array::<0, 16>(),
            LocationData {
                x:     f64::from_le_bytes(value.subslice_to_array::<0, 8>()),
                y:     f64::from_le_bytes(value.subslice_to_array::<8, 16>()),
                z:     f64::from_le_bytes(value.subslice_to_array::<16, 24>()),
                pitch: f64::from_le_bytes(value.subslice_to_array::<24, 32>()),
                yaw:   f64::from_le_bytes(value.subslice_to_array::<32, 40>()),
                roll:  f64::from_le_bytes(value.subslice_to_array::<40, 48>()),
            },
        );
    }
    Ok(transforms)
}

/// Inflate and parse one object blob: a u32 uncompressed length, then a
/// zlib stream whose output is run-length packed (see [`rle`]).
fn decode_object_blob(
    data: &[u8],
    ctx:  &mut DecodeContext,
) -> Result<(Vec<Name>, bool, Vec<Property>, Vec<u8>), ArchiveError> {
    let mut prefix = SliceReader::new(data);
    let inflated_len = prefix.read_u32()? as usize;
    if inflated_len > MAX_BLOB_LEN {
        return Err(ArchiveError::Decompress(format!(
            "blob declares {inflated_len} uncompressed bytes, beyond the cap",
        )));
    }

    let zlib = ZlibDecoder::new(&data[4 ..]);
    let mut rle = RleReader::new(zlib, inflated_len);
    let mut bytes = Vec::with_capacity(inflated_len);
    std::io::Read::read_to_end(&mut rle, &mut bytes)
        .map_err(|error| ArchiveError::Decompress(error.to_string()))?;
    if bytes.len() != inflated_len {
        return Err(ArchiveError::Decompress(format!(
            "blob inflated to {} bytes but declared {inflated_len}",
            bytes.len(),
        )));
    }

    let mut reader = SliceReader::new(&bytes);
    let names = read_name_list(&mut reader, ctx, 1)?;
    let is_item = reader.read_bool32()?;

    let mut properties = Vec::new();
    if let Err(error) = read_property_list_into(&mut reader, ctx, &mut properties) {
        ctx.log.record(format!(
            "object {} kept {} properties before a list error: {error}",
            names[0],
            properties.len(),
        ));
    }
    let extra_data = reader.read_bytes(reader.remaining())?.to_vec();

    Ok((names, is_item, properties, extra_data))
}

/// Decode a modern save database. Header and schema problems are fatal;
/// individual rows and blobs are recovered (skipped and logged).
pub(crate) fn decode_db(path: &Path, opts: &LoadOptions) -> Result<LoadedSave, ArchiveError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let layout = discover_layout(&conn)?;

    let header_rows = read_header_rows(&conn, &layout.header)?;
    let version = header_rows
        .get(KEY_VERSION)
        .or_warn("the save-version header row")
        .and_then(|bytes| header_i32(bytes))
        .unwrap_or(0);
    let game_time = header_rows
        .get(KEY_GAME_TIME)
        .or_warn("the game-time header row")
        .and_then(|bytes| header_f64(bytes))
        .unwrap_or(0.0);

    // The name table is load-bearing: every name reference in every blob
    // points into it, so there is nothing to salvage without it.
    let names_blob = header_rows
        .get(KEY_NAMES)
        .ok_or(ArchiveError::MissingTable("name-table header row"))?;
    let table = NameTable::parse(&mut SliceReader::new(names_blob))?;
    let mut ctx = DecodeContext::new(SaveFormat::Asa, NameStrategy::Tabled(table));

    let transforms = match &layout.transforms {
        Some(table) => read_transforms(&conn, table, &mut ctx.log)?,
        None => HashMap::new(),
    };

    let mut container = ObjectContainer::new();
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", layout.blobs))?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        if let Some(cap) = opts.max_objects {
            if container.len() >= cap {
                return Err(ArchiveError::TooManyObjects {
                    count: container.len() + 1,
                    cap,
                });
            }
        }

        let ValueRef::Blob(guid) = row.get_ref(0)? else {
            ctx.log.record("object row has a non-blob key; skipped");
            continue;
        };
        if guid.len() != 16 {
            ctx.log.record(format!("object key is {} bytes, not 16; skipped", guid.len()));
            continue;
        }
        let guid: [u8; 16] = guid.subslice_to_array::<0, 16>();
        let ValueRef::Blob(data) = row.get_ref(1)? else {
            ctx.log.record("object row has a non-blob value; skipped");
            continue;
        };

        match decode_object_blob(data, &mut ctx) {
            Ok((names, is_item, properties, extra_data)) => {
                // Locations live in their own table, joined here by GUID.
                let location = transforms.get(&guid).copied();
                container.push(GameObject::new(
                    guid,
                    names,
                    Vec::new(),
                    is_item,
                    location,
                    properties,
                    extra_data,
                ));
            }
            Err(error) => {
                ctx.log.record(format!("skipped an undecodable object blob: {error}"));
            }
        }
    }
    container.build_relationships(&mut ctx.log);
    container.audit_references(&mut ctx.log);

    Ok(LoadedSave {
        header: SaveHeader {
            format: SaveFormat::Asa,
            kind: FileKind::World,
            version,
            game_time,
            save_count: None,
            data_files: Vec::new(),
        },
        container,
        parse_errors: ctx.log.into_errors(),
    })
}
