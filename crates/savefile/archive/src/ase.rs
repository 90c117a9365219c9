//! The legacy pure-binary walkers: world saves with a trailing name table,
//! and the smaller "bundle" files (profiles, tribes, cloud inventories)
//! whose names are inline strings.

use obelisk_properties::{
    DecodeContext, Name, NameStrategy, NameTable, SaveFormat, SliceReader,
    parse::read_property_list_into,
};
use obelisk_util::u64_to_usize;

use crate::container::ObjectContainer;
use crate::detect::{FileKind, KnownVersion};
use crate::load::{ArchiveError, LoadOptions, LoadedSave, SaveHeader};
use crate::object::{GameObject, LocationData};


/// Caps on count fields, applied before allocation. Real saves stay far
/// below these; a value beyond them is corruption, not scale.
const MAX_NAME_LIST: i32 = 4096;
const MAX_OBJECTS_HARD: usize = 16_000_000;

/// An object record as it sits in the objects region, before its property
/// list has been visited.
struct RawObjectRecord {
    guid:            [u8; 16],
    names:           Vec<Name>,
    component_names: Vec<Name>,
    is_item:         bool,
    location:        Option<LocationData>,
    properties_at:   u32,
    extra_data_size: u32,
}

/// Read a count-prefixed list of name references.
pub(crate) fn read_name_list(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    least:  i32,
) -> Result<Vec<Name>, ArchiveError> {
    let count = reader.read_i32()?;
    if count < least || count > MAX_NAME_LIST {
        return Err(ArchiveError::corrupt(format!("implausible name count {count}")));
    }
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0 .. count {
        names.push(ctx.read_name(reader)?);
    }
    Ok(names)
}

fn read_object_record(
    reader:  &mut SliceReader<'_>,
    ctx:     &mut DecodeContext,
    version: i32,
) -> Result<RawObjectRecord, ArchiveError> {
    let guid = reader.read_guid()?;
    let names = read_name_list(reader, ctx, 1)?;
    let is_item = reader.read_bool32()?;
    let component_names = read_name_list(reader, ctx, 0)?;

    let location = if reader.read_bool32()? {
        Some(LocationData {
            x:     f64::from(reader.read_f32()?),
            y:     f64::from(reader.read_f32()?),
            z:     f64::from(reader.read_f32()?),
            pitch: f64::from(reader.read_f32()?),
            yaw:   f64::from(reader.read_f32()?),
            roll:  f64::from(reader.read_f32()?),
        })
    } else {
        None
    };

    let properties_at = reader.read_u32()?;
    let _should_be_loaded = reader.read_bool32()?;

    // Older versions never carry trailing data; the size field itself only
    // exists from version 10 on.
    let extra_data_size = if version >= i32::from(KnownVersion::V10) {
        reader.read_u32()?
    } else {
        0
    };

    Ok(RawObjectRecord {
        guid,
        names,
        component_names,
        is_item,
        location,
        properties_at,
        extra_data_size,
    })
}

/// Visit one record's property list at `properties_base + properties_at`,
/// then its trailing bytes. Property failures inside the list are already
/// recovered by the list parser; failures at the list level are logged and
/// leave the object with whatever was decoded before the failure.
fn finish_object(
    reader:          &mut SliceReader<'_>,
    ctx:             &mut DecodeContext,
    properties_base: usize,
    record:          RawObjectRecord,
) -> Result<GameObject, ArchiveError> {
    let Some(at) = properties_base.checked_add(record.properties_at as usize) else {
        return Err(ArchiveError::corrupt("property offset overflow"));
    };
    reader.seek(at)?;

    let mut properties = Vec::new();
    if let Err(error) = read_property_list_into(reader, ctx, &mut properties) {
        ctx.log.record(format!(
            "object {} kept {} properties before a list error: {error}",
            record.names[0],
            properties.len(),
        ));
    }

    let extra_data = if record.extra_data_size > 0 {
        match reader.read_bytes(record.extra_data_size as usize) {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                ctx.log.record(format!(
                    "object {} declared {} trailing bytes it does not have: {error}",
                    record.names[0], record.extra_data_size,
                ));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(GameObject::new(
        record.guid,
        record.names,
        record.component_names,
        record.is_item,
        record.location,
        properties,
        extra_data,
    ))
}

fn check_object_count(count: i32, opts: &LoadOptions) -> Result<usize, ArchiveError> {
    if count < 0 {
        return Err(ArchiveError::corrupt(format!("negative object count {count}")));
    }
    let count = count as usize;
    let cap = opts.max_objects.unwrap_or(MAX_OBJECTS_HARD);
    if count > cap {
        return Err(ArchiveError::TooManyObjects { count, cap });
    }
    Ok(count)
}

fn read_split_u64(reader: &mut SliceReader<'_>) -> Result<usize, ArchiveError> {
    let low = reader.read_u32()?;
    let high = reader.read_u32()?;
    let offset = u64::from(high) << 32 | u64::from(low);
    u64_to_usize(offset)
        .ok_or_else(|| ArchiveError::corrupt(format!("offset {offset} does not fit in memory")))
}

/// Decode a legacy world save: header, trailing name table, two passes over
/// the objects region.
pub(crate) fn decode_world(bytes: &[u8], opts: &LoadOptions) -> Result<LoadedSave, ArchiveError> {
    let mut reader = SliceReader::new(bytes);

    let version = reader.read_i32()?;
    if KnownVersion::try_from(version).is_err() && !opts.best_effort {
        return Err(ArchiveError::UnsupportedFormat { version });
    }

    let save_count = if version >= i32::from(KnownVersion::V9) {
        Some(reader.read_i32()?)
    } else {
        None
    };
    let game_time = f64::from(reader.read_f32()?);

    let name_table_offset = read_split_u64(&mut reader)?;
    let object_count = reader.read_i32()?;
    let objects_offset = read_split_u64(&mut reader)?;
    let properties_offset = read_split_u64(&mut reader)?;
    let data_files = reader.read_fstrings()?;

    // The name table trails the data; load it before anything needs a name.
    let resume_at = reader.position();
    reader.seek(name_table_offset)?;
    let table = NameTable::parse(&mut reader)?;
    reader.seek(resume_at)?;

    let mut ctx = DecodeContext::new(SaveFormat::Ase, NameStrategy::Tabled(table));
    let object_count = check_object_count(object_count, opts)?;

    reader.seek(objects_offset)?;
    let mut records = Vec::with_capacity(object_count);
    for _ in 0 .. object_count {
        records.push(read_object_record(&mut reader, &mut ctx, version)?);
    }

    let mut container = ObjectContainer::new();
    for record in records {
        let object = finish_object(&mut reader, &mut ctx, properties_offset, record)?;
        container.push(object);
    }
    container.build_relationships(&mut ctx.log);
    container.audit_references(&mut ctx.log);

    Ok(LoadedSave {
        header: SaveHeader {
            format: SaveFormat::Ase,
            kind: FileKind::World,
            version,
            game_time,
            save_count,
            data_files,
        },
        container,
        parse_errors: ctx.log.into_errors(),
    })
}

/// Decode a bundle file: a profile, tribe snapshot, or cloud inventory.
///
/// Bundles use inline names, and their property blocks begin immediately
/// after the object table (per-object offsets are relative to that point).
pub(crate) fn decode_bundle(
    bytes: &[u8],
    kind:  FileKind,
    opts:  &LoadOptions,
) -> Result<LoadedSave, ArchiveError> {
    let mut reader = SliceReader::new(bytes);
    let mut ctx = DecodeContext::new(SaveFormat::Ase, NameStrategy::Inline);

    let version = reader.read_i32()?;
    let object_count = check_object_count(reader.read_i32()?, opts)?;

    let mut records = Vec::with_capacity(object_count);
    for _ in 0 .. object_count {
        records.push(read_object_record(&mut reader, &mut ctx, version)?);
    }
    let properties_base = reader.position();

    let mut container = ObjectContainer::new();
    for record in records {
        let object = finish_object(&mut reader, &mut ctx, properties_base, record)?;
        container.push(object);
    }
    container.build_relationships(&mut ctx.log);
    container.audit_references(&mut ctx.log);

    Ok(LoadedSave {
        header: SaveHeader {
            format: SaveFormat::Ase,
            kind,
            version,
            game_time: 0.0,
            save_count: None,
            data_files: Vec::new(),
        },
        container,
        parse_errors: ctx.log.into_errors(),
    })
}

/// Decode an embedded mini-save, e.g. the creature bytes inside a cryopod.
/// These are bundles with inline names; this is the decoder's only
/// intentional recursion.
pub fn decode_embedded(bytes: &[u8]) -> Result<LoadedSave, ArchiveError> {
    decode_bundle(bytes, FileKind::Unknown, &LoadOptions::default())
}
