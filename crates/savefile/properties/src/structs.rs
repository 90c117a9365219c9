//! Decoders for the typed structs embedded in property values.
//!
//! A `StructProperty` either names one of the fixed binary layouts below, or
//! one of the game structs whose body is itself a property list. The mapping
//! is a closed table; a name outside it is an error the property parser
//! recovers from by skipping to the declared end.

use crate::names::{DecodeContext, Name, SaveFormat};
use crate::parse::{read_property_list, PropertyError};
use crate::reader::SliceReader;
use crate::value::Property;


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotator {
    pub pitch: f64,
    pub yaw:   f64,
    pub roll:  f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Stored in BGRA byte order on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueNetId {
    pub kind:  u32,
    pub value: String,
}

/// A full transform; only the modern format serializes these, always as f64.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation:    Quat,
    pub translation: Vector,
    pub scale:       Vector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructValue {
    Vector(Vector),
    Rotator(Rotator),
    Quat(Quat),
    Vector2D(Vector2D),
    LinearColor(LinearColor),
    Color(Color),
    Guid([u8; 16]),
    UniqueNetId(UniqueNetId),
    /// Ticks since the engine epoch.
    DateTime(i64),
    Timespan(i64),
    Transform(Transform),
    /// A property-list body terminated by the `"None"` sentinel.
    Fields(Vec<Property>),
}

/// The binary layout a struct-type name routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructLayout {
    Vector,
    Rotator,
    Quat,
    Vector2D,
    LinearColor,
    Color,
    Guid,
    UniqueNetId,
    DateTime,
    Timespan,
    Transform,
    Fields,
}

fn layout_for(struct_type: &str) -> Option<StructLayout> {
    Some(match struct_type {
        "Vector"          => StructLayout::Vector,
        "Rotator"         => StructLayout::Rotator,
        "Quat"            => StructLayout::Quat,
        "Vector2D"        => StructLayout::Vector2D,
        "LinearColor"     => StructLayout::LinearColor,
        "Color"           => StructLayout::Color,
        "Guid"            => StructLayout::Guid,
        "UniqueNetIdRepl" => StructLayout::UniqueNetId,
        "DateTime"        => StructLayout::DateTime,
        "Timespan"        => StructLayout::Timespan,
        "Transform"       => StructLayout::Transform,

        // Game structs whose body is a nested property list.
        "DinoAncestorsEntry"
        | "DinoOrderGroup"
        | "PrimalPlayerDataStruct"
        | "PrimalPlayerCharacterConfigStruct"
        | "PrimalPersistentCharacterStatsStruct"
        | "ArkInventoryData"
        | "ArkTribeGovernment"
        | "TribeGovernment"
        | "TribeAlliance"
        | "TribeData"
        | "TribeRankGroup"
        | "CryopodPayload"
        | "CustomItemData"
        | "CustomItemByteArrays"
        | "ItemNetID"
        | "ItemNetInfo"
        | "WeightedObjectList" => StructLayout::Fields,

        _ => return None,
    })
}

/// Whether a struct-type name is in the closed table at all.
pub fn is_registered_struct(struct_type: &str) -> bool {
    layout_for(struct_type).is_some()
}

/// One float of the format's vector width: f32 on the legacy wire (widened),
/// f64 on the modern wire.
fn read_vector_float(
    reader: &mut SliceReader<'_>,
    format: SaveFormat,
) -> Result<f64, PropertyError> {
    Ok(match format {
        SaveFormat::Ase => f64::from(reader.read_f32()?),
        SaveFormat::Asa => reader.read_f64()?,
    })
}

fn read_vector(
    reader: &mut SliceReader<'_>,
    format: SaveFormat,
) -> Result<Vector, PropertyError> {
    Ok(Vector {
        x: read_vector_float(reader, format)?,
        y: read_vector_float(reader, format)?,
        z: read_vector_float(reader, format)?,
    })
}

fn read_quat(
    reader: &mut SliceReader<'_>,
    format: SaveFormat,
) -> Result<Quat, PropertyError> {
    Ok(Quat {
        x: read_vector_float(reader, format)?,
        y: read_vector_float(reader, format)?,
        z: read_vector_float(reader, format)?,
        w: read_vector_float(reader, format)?,
    })
}

/// Decode the body of a `StructProperty` according to its declared type.
///
/// An unregistered name returns [`PropertyError::UnknownStruct`]; the caller
/// owns recovery (skip to the property's declared end).
pub fn read_struct_value(
    reader:      &mut SliceReader<'_>,
    ctx:         &mut DecodeContext,
    struct_type: &Name,
) -> Result<StructValue, PropertyError> {
    let Some(layout) = layout_for(&struct_type.text) else {
        return Err(PropertyError::UnknownStruct(struct_type.text.clone()));
    };

    Ok(match layout {
        StructLayout::Vector => StructValue::Vector(read_vector(reader, ctx.format)?),
        StructLayout::Rotator => {
            StructValue::Rotator(Rotator {
                pitch: read_vector_float(reader, ctx.format)?,
                yaw:   read_vector_float(reader, ctx.format)?,
                roll:  read_vector_float(reader, ctx.format)?,
            })
        }
        StructLayout::Quat => StructValue::Quat(read_quat(reader, ctx.format)?),
        StructLayout::Vector2D => {
            StructValue::Vector2D(Vector2D {
                x: read_vector_float(reader, ctx.format)?,
                y: read_vector_float(reader, ctx.format)?,
            })
        }
        StructLayout::LinearColor => {
            StructValue::LinearColor(LinearColor {
                r: reader.read_f32()?,
                g: reader.read_f32()?,
                b: reader.read_f32()?,
                a: reader.read_f32()?,
            })
        }
        StructLayout::Color => {
            StructValue::Color(Color {
                b: reader.read_u8()?,
                g: reader.read_u8()?,
                r: reader.read_u8()?,
                a: reader.read_u8()?,
            })
        }
        StructLayout::Guid => StructValue::Guid(reader.read_guid()?),
        StructLayout::UniqueNetId => {
            StructValue::UniqueNetId(UniqueNetId {
                kind:  reader.read_u32()?,
                value: reader.read_fstring()?,
            })
        }
        StructLayout::DateTime => StructValue::DateTime(reader.read_i64()?),
        StructLayout::Timespan => StructValue::Timespan(reader.read_i64()?),
        StructLayout::Transform => {
            // Transforms only occur in the modern format and are always f64.
            StructValue::Transform(Transform {
                rotation:    read_quat(reader, SaveFormat::Asa)?,
                translation: read_vector(reader, SaveFormat::Asa)?,
                scale:       read_vector(reader, SaveFormat::Asa)?,
            })
        }
        StructLayout::Fields => StructValue::Fields(read_property_list(reader, ctx)?),
    })
}

#[cfg(test)]
mod tests {
    use crate::names::{DecodeContext, Name, NameStrategy, SaveFormat};
    use crate::parse::PropertyError;
    use crate::reader::SliceReader;
    use super::{is_registered_struct, read_struct_value, StructValue, Vector};

    fn inline_ctx(format: SaveFormat) -> DecodeContext {
        DecodeContext::new(format, NameStrategy::Inline)
    }

    #[test]
    fn vector_width_follows_the_format() {
        let mut narrow = Vec::new();
        for v in [1.0_f32, 2.0, 3.0] {
            narrow.extend_from_slice(&v.to_le_bytes());
        }
        let mut reader = SliceReader::new(&narrow);
        let mut ctx = inline_ctx(SaveFormat::Ase);
        let value = read_struct_value(&mut reader, &mut ctx, &Name::new("Vector"))
            .expect("three f32s form a legacy vector");
        assert_eq!(value, StructValue::Vector(Vector { x: 1.0, y: 2.0, z: 3.0 }));

        let mut wide = Vec::new();
        for v in [1.0_f64, 2.0, 3.0] {
            wide.extend_from_slice(&v.to_le_bytes());
        }
        let mut reader = SliceReader::new(&wide);
        let mut ctx = inline_ctx(SaveFormat::Asa);
        let value = read_struct_value(&mut reader, &mut ctx, &Name::new("Vector"))
            .expect("three f64s form a modern vector");
        assert_eq!(value, StructValue::Vector(Vector { x: 1.0, y: 2.0, z: 3.0 }));
    }

    #[test]
    fn color_is_bgra_on_the_wire() {
        let mut reader = SliceReader::new(&[10, 20, 30, 255]);
        let mut ctx = inline_ctx(SaveFormat::Ase);
        let value = read_struct_value(&mut reader, &mut ctx, &Name::new("Color"))
            .expect("four bytes form a color");
        let StructValue::Color(color) = value else {
            panic!("expected a color, got {value:?}");
        };
        assert_eq!((color.r, color.g, color.b, color.a), (30, 20, 10, 255));
    }

    #[test]
    fn unknown_struct_names_are_rejected() {
        let mut reader = SliceReader::new(&[0; 16]);
        let mut ctx = inline_ctx(SaveFormat::Ase);
        let err = read_struct_value(&mut reader, &mut ctx, &Name::new("ModdedMystery"));
        assert!(matches!(err, Err(PropertyError::UnknownStruct(name)) if name == "ModdedMystery"));
    }

    #[test]
    fn registry_covers_the_game_structs() {
        for name in ["DinoAncestorsEntry", "TribeData", "CryopodPayload", "UniqueNetIdRepl"] {
            assert!(is_registered_struct(name), "{name} should be registered");
        }
        assert!(!is_registered_struct("SomethingModded"));
    }
}
