//! The self-describing property system shared by every save kind.
//!
//! A property list is a sequence of `(name, tag, size, index, prelude,
//! value)` records terminated by the name `"None"`. The declared `size`
//! covers exactly the value bytes, which is what makes per-property recovery
//! possible: whatever goes wrong inside a value, the decoder can jump to the
//! declared end and keep going.

use thiserror::Error;

use crate::names::{DecodeContext, Name, SaveFormat};
use crate::reader::{ReadError, SliceReader};
use crate::structs::read_struct_value;
use crate::value::{
    ByteValue, ObjectRef, Property, PropertyTag, PropertyValue, TextValue,
};


/// Nested `Fields` structs recurse through the list parser; this bounds that
/// recursion. Real saves nest a handful of levels at most.
pub const DEPTH_LIMIT: u32 = 64;

/// Describes an error hit while decoding properties.
///
/// Which of these abort a load and which are recovered (skip to the declared
/// value end, log, continue) is the enclosing decoder's call; see the module
/// docs of [`crate::parse`].
#[derive(Error, Debug)]
pub enum PropertyError {
    #[error(transparent)]
    Read(#[from] ReadError),
    /// A property header named a tag outside the known set.
    #[error("unknown property tag {0:?}")]
    UnknownTag(String),
    /// A `StructProperty` named a struct type outside the registry.
    #[error("unknown struct type {0:?}")]
    UnknownStruct(String),
    /// A name reference pointed outside the name table. Always fatal.
    #[error("name index {index} out of range for a table of {len} entries")]
    BadNameIndex {
        index: u32,
        len:   usize,
    },
    /// Structurally valid bytes with a value outside what the format allows.
    #[error("unexpected data: {0}")]
    Unexpected(String),
}

/// Decode a property list up to and including its `"None"` terminator.
pub fn read_property_list(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
) -> Result<Vec<Property>, PropertyError> {
    let mut properties = Vec::new();
    read_property_list_into(reader, ctx, &mut properties)?;
    Ok(properties)
}

/// As [`read_property_list`], but appending into a caller-owned vec so that
/// properties decoded before a fatal error are not lost.
pub fn read_property_list_into(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    out:    &mut Vec<Property>,
) -> Result<(), PropertyError> {
    if ctx.depth >= DEPTH_LIMIT {
        return Err(PropertyError::Unexpected(format!(
            "struct nesting exceeded the depth limit of {DEPTH_LIMIT}",
        )));
    }
    ctx.depth += 1;
    let result = read_list_body(reader, ctx, out);
    ctx.depth -= 1;
    result
}

fn read_list_body(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    out:    &mut Vec<Property>,
) -> Result<(), PropertyError> {
    loop {
        let name = ctx.read_name(reader)?;
        if name.is_none_sentinel() {
            return Ok(());
        }

        let tag_name = ctx.read_name(reader)?;
        let size = reader.read_u32()?;
        let index = reader.read_u32()?;

        let Some(tag) = PropertyTag::from_name(&tag_name.text) else {
            // Unknown tags have no known prelude; best effort is to assume
            // an empty one and honor the declared size.
            ctx.log.record(format!(
                "unknown property tag {:?} on {name}; skipping {size} bytes",
                tag_name.text,
            ));
            reader.skip(size as usize)?;
            continue;
        };

        if let Some(property) = read_property(reader, ctx, &name, tag, size, index)? {
            out.push(property);
        }
    }
}

/// Decode one property's prelude and value, enforcing the size contract.
///
/// `Ok(None)` means the property was recovered-over: the log gained an entry
/// and the reader sits at the declared value end.
fn read_property(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    name:   &Name,
    tag:    PropertyTag,
    size:   u32,
    index:  u32,
) -> Result<Option<Property>, PropertyError> {
    // Prelude errors are header errors: the value boundary is not yet
    // established, so there is nothing to skip to.
    let prelude = read_prelude(reader, ctx, tag)?;

    let value_start = reader.position();
    let value_end = value_start + size as usize;

    match read_value(reader, ctx, tag, &prelude, value_end) {
        Ok(value) => {
            let consumed = reader.position() - value_start;
            if consumed == size as usize {
                return Ok(Some(Property {
                    name: name.clone(),
                    tag,
                    index,
                    value,
                }));
            }
            ctx.log.record(format!(
                "property {name} ({}) consumed {consumed} bytes but declared {size}",
                tag.name(),
            ));
        }
        Err(error @ PropertyError::BadNameIndex { .. }) => return Err(error),
        Err(error) => {
            ctx.log.record(format!("property {name} ({}): {error}", tag.name()));
        }
    }

    // Recovery: jump to the declared end. If even that is out of bounds, the
    // size itself is lies and the whole list is unsalvageable.
    reader.seek(value_end).map_err(|_| {
        PropertyError::Read(ReadError::Corrupt {
            offset:  value_start,
            message: format!(
                "declared size {size} of property {name} runs past the end of the buffer",
            ),
        })
    })?;
    Ok(None)
}

/// Tag-specific data that precedes the sized value bytes.
enum Prelude {
    Empty,
    Bool(bool),
    ByteEnum(Name),
    EnumType(Name),
    ElementTag(Name),
    MapTags {
        key:   Name,
        value: Name,
    },
    StructType(Name),
}

fn read_prelude(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    tag:    PropertyTag,
) -> Result<Prelude, PropertyError> {
    Ok(match tag {
        PropertyTag::Bool => {
            let value = reader.read_u8()? != 0;
            if ctx.format == SaveFormat::Asa {
                // The modern format pads the prelude with a terminator byte.
                reader.skip(1)?;
            }
            Prelude::Bool(value)
        }
        PropertyTag::Byte   => Prelude::ByteEnum(ctx.read_name(reader)?),
        PropertyTag::Enum   => Prelude::EnumType(ctx.read_name(reader)?),
        PropertyTag::Array
        | PropertyTag::Set  => Prelude::ElementTag(ctx.read_name(reader)?),
        PropertyTag::Map => Prelude::MapTags {
            key:   ctx.read_name(reader)?,
            value: ctx.read_name(reader)?,
        },
        PropertyTag::Struct => Prelude::StructType(ctx.read_name(reader)?),
        _ => Prelude::Empty,
    })
}

fn resolve_tag(tag_name: &Name) -> Result<PropertyTag, PropertyError> {
    PropertyTag::from_name(&tag_name.text)
        .ok_or_else(|| PropertyError::UnknownTag(tag_name.text.clone()))
}

fn read_value(
    reader:    &mut SliceReader<'_>,
    ctx:       &mut DecodeContext,
    tag:       PropertyTag,
    prelude:   &Prelude,
    value_end: usize,
) -> Result<PropertyValue, PropertyError> {
    Ok(match (tag, prelude) {
        (PropertyTag::Bool, Prelude::Bool(value)) => PropertyValue::Bool(*value),
        (PropertyTag::Byte, Prelude::ByteEnum(enum_type)) => {
            if enum_type.is_none_sentinel() {
                PropertyValue::Byte(ByteValue::Raw(reader.read_u8()?))
            } else {
                PropertyValue::Byte(ByteValue::Named(ctx.read_name(reader)?))
            }
        }
        (PropertyTag::Int8,   _) => PropertyValue::Int8(reader.read_i8()?),
        (PropertyTag::Int16,  _) => PropertyValue::Int16(reader.read_i16()?),
        (PropertyTag::UInt16, _) => PropertyValue::UInt16(reader.read_u16()?),
        (PropertyTag::Int,    _) => PropertyValue::Int(reader.read_i32()?),
        (PropertyTag::UInt32, _) => PropertyValue::UInt32(reader.read_u32()?),
        (PropertyTag::Int64,  _) => PropertyValue::Int64(reader.read_i64()?),
        (PropertyTag::UInt64, _) => PropertyValue::UInt64(reader.read_u64()?),
        (PropertyTag::Float,  _) => PropertyValue::Float(reader.read_f32()?),
        (PropertyTag::Double, _) => PropertyValue::Double(reader.read_f64()?),
        (PropertyTag::Str,    _) => PropertyValue::Str(reader.read_fstring()?),
        (PropertyTag::Name,   _) => PropertyValue::Name(ctx.read_name(reader)?),
        (PropertyTag::Text,   _) => PropertyValue::Text(read_text(reader, ctx, value_end)?),
        (PropertyTag::Enum, Prelude::EnumType(enum_type)) => PropertyValue::Enum {
            enum_type: enum_type.clone(),
            value:     ctx.read_name(reader)?,
        },
        (PropertyTag::Object, _) => PropertyValue::Object(read_object_ref(reader, ctx.format)?),
        (PropertyTag::Struct, Prelude::StructType(struct_type)) => {
            PropertyValue::Struct(Box::new(read_struct_value(reader, ctx, struct_type)?))
        }
        (PropertyTag::Array, Prelude::ElementTag(inner))
        | (PropertyTag::Set, Prelude::ElementTag(inner)) => {
            let inner_tag = resolve_tag(inner)?;
            let values = read_elements(reader, ctx, inner_tag)?;
            if tag == PropertyTag::Array {
                PropertyValue::Array {
                    inner: inner_tag,
                    values,
                }
            } else {
                PropertyValue::Set {
                    inner: inner_tag,
                    values,
                }
            }
        }
        (PropertyTag::Map, Prelude::MapTags { key, value }) => {
            let key_tag = resolve_tag(key)?;
            let value_tag = resolve_tag(value)?;
            // Entries flagged for removal precede the live count; they carry
            // no payload in saves and are discarded.
            let _num_removed = reader.read_u32()?;
            let count = reader.read_u32()?;
            let mut pairs = Vec::with_capacity(count.min(0xFFFF) as usize);
            for _ in 0 .. count {
                let k = read_element(reader, ctx, key_tag)?;
                let v = read_element(reader, ctx, value_tag)?;
                pairs.push((k, v));
            }
            PropertyValue::Map {
                key_tag,
                value_tag,
                pairs,
            }
        }
        _ => {
            return Err(PropertyError::Unexpected(format!(
                "prelude did not match tag {}",
                tag.name(),
            )));
        }
    })
}

/// The element sequence of an array or set: `count: u32` then the elements.
/// A struct element tag inserts one shared inner header before the bodies.
fn read_elements(
    reader:    &mut SliceReader<'_>,
    ctx:       &mut DecodeContext,
    inner_tag: PropertyTag,
) -> Result<Vec<PropertyValue>, PropertyError> {
    let count = reader.read_u32()?;
    let mut values = Vec::with_capacity(count.min(0xFFFF) as usize);

    if inner_tag == PropertyTag::Struct {
        let _entry_name = ctx.read_name(reader)?;
        let entry_type = ctx.read_name(reader)?;
        if entry_type.text != "StructProperty" {
            return Err(PropertyError::Unexpected(format!(
                "struct element header declared {:?} instead of StructProperty",
                entry_type.text,
            )));
        }
        let _entry_size = reader.read_u32()?;
        let _entry_index = reader.read_u32()?;
        let struct_type = ctx.read_name(reader)?;

        for _ in 0 .. count {
            let value = read_struct_value(reader, ctx, &struct_type)?;
            values.push(PropertyValue::Struct(Box::new(value)));
        }
    } else {
        for _ in 0 .. count {
            values.push(read_element(reader, ctx, inner_tag)?);
        }
    }

    Ok(values)
}

/// One bare element inside an array, set, or map. Elements have no header of
/// their own, and the recursive-container case does not occur in saves.
fn read_element(
    reader: &mut SliceReader<'_>,
    ctx:    &mut DecodeContext,
    tag:    PropertyTag,
) -> Result<PropertyValue, PropertyError> {
    Ok(match tag {
        PropertyTag::Bool   => PropertyValue::Bool(reader.read_u8()? != 0),
        PropertyTag::Byte   => PropertyValue::Byte(ByteValue::Raw(reader.read_u8()?)),
        PropertyTag::Int8   => PropertyValue::Int8(reader.read_i8()?),
        PropertyTag::Int16  => PropertyValue::Int16(reader.read_i16()?),
        PropertyTag::UInt16 => PropertyValue::UInt16(reader.read_u16()?),
        PropertyTag::Int    => PropertyValue::Int(reader.read_i32()?),
        PropertyTag::UInt32 => PropertyValue::UInt32(reader.read_u32()?),
        PropertyTag::Int64  => PropertyValue::Int64(reader.read_i64()?),
        PropertyTag::UInt64 => PropertyValue::UInt64(reader.read_u64()?),
        PropertyTag::Float  => PropertyValue::Float(reader.read_f32()?),
        PropertyTag::Double => PropertyValue::Double(reader.read_f64()?),
        PropertyTag::Str    => PropertyValue::Str(reader.read_fstring()?),
        PropertyTag::Name
        | PropertyTag::Enum => PropertyValue::Name(ctx.read_name(reader)?),
        PropertyTag::Object => PropertyValue::Object(read_object_ref(reader, ctx.format)?),
        PropertyTag::Struct => {
            // Bare struct elements (map values, mostly) are field bodies.
            let fields = read_property_list(reader, ctx)?;
            PropertyValue::Struct(Box::new(crate::structs::StructValue::Fields(fields)))
        }
        PropertyTag::Text | PropertyTag::Array | PropertyTag::Map | PropertyTag::Set => {
            return Err(PropertyError::Unexpected(format!(
                "{} cannot be an element type",
                tag.name(),
            )));
        }
    })
}

fn read_object_ref(
    reader: &mut SliceReader<'_>,
    format: SaveFormat,
) -> Result<ObjectRef, PropertyError> {
    Ok(match format {
        SaveFormat::Ase => {
            let id = reader.read_i32()?;
            if id == -1 {
                ObjectRef::Null
            } else {
                ObjectRef::Id(id)
            }
        }
        SaveFormat::Asa => {
            let guid = reader.read_guid()?;
            if guid == [0; 16] {
                ObjectRef::Null
            } else {
                ObjectRef::Guid(guid)
            }
        }
    })
}

/// Text properties carry a flags word and a history discriminant; only the
/// layouts observed in save files are materialized, the rest keep their
/// flags and skip to the declared end.
fn read_text(
    reader:    &mut SliceReader<'_>,
    ctx:       &mut DecodeContext,
    value_end: usize,
) -> Result<TextValue, PropertyError> {
    let flags = reader.read_u32()?;
    let history = reader.read_i8()?;
    let mut text = TextValue {
        flags,
        history,
        ..TextValue::default()
    };

    match history {
        // Culture-invariant: a presence flag and at most one string.
        -1 => {
            let has_invariant = reader.read_i32()?;
            if has_invariant != 0 {
                text.source = Some(reader.read_fstring()?);
            }
        }
        // Base: namespace, key, source.
        0 => {
            text.namespace = Some(reader.read_fstring()?);
            text.key = Some(reader.read_fstring()?);
            text.source = Some(reader.read_fstring()?);
        }
        other => {
            ctx.log.record(format!(
                "text history {other} (flags {flags:#x}) is not materialized; keeping flags only",
            ));
            reader.seek(value_end)?;
        }
    }

    Ok(text)
}
