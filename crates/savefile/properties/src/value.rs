use crate::names::Name;
use crate::structs::StructValue;


/// The closed set of property tags that appear in the two save generations.
///
/// Dispatch is by this enum, never by repeated string comparison: the wire
/// tag name is mapped once, at the property header, via [`Self::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTag {
    Bool,
    Byte,
    Int8,
    Int16,
    UInt16,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Str,
    Name,
    Text,
    Enum,
    Object,
    Struct,
    Array,
    Map,
    Set,
}

impl PropertyTag {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "BoolProperty"   => Self::Bool,
            "ByteProperty"   => Self::Byte,
            "Int8Property"   => Self::Int8,
            "Int16Property"  => Self::Int16,
            "UInt16Property" => Self::UInt16,
            "IntProperty"    => Self::Int,
            "UInt32Property" => Self::UInt32,
            "Int64Property"  => Self::Int64,
            "UInt64Property" => Self::UInt64,
            "FloatProperty"  => Self::Float,
            "DoubleProperty" => Self::Double,
            "StrProperty"    => Self::Str,
            "NameProperty"   => Self::Name,
            "TextProperty"   => Self::Text,
            "EnumProperty"   => Self::Enum,
            "ObjectProperty" => Self::Object,
            "StructProperty" => Self::Struct,
            "ArrayProperty"  => Self::Array,
            "MapProperty"    => Self::Map,
            "SetProperty"    => Self::Set,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool   => "BoolProperty",
            Self::Byte   => "ByteProperty",
            Self::Int8   => "Int8Property",
            Self::Int16  => "Int16Property",
            Self::UInt16 => "UInt16Property",
            Self::Int    => "IntProperty",
            Self::UInt32 => "UInt32Property",
            Self::Int64  => "Int64Property",
            Self::UInt64 => "UInt64Property",
            Self::Float  => "FloatProperty",
            Self::Double => "DoubleProperty",
            Self::Str    => "StrProperty",
            Self::Name   => "NameProperty",
            Self::Text   => "TextProperty",
            Self::Enum   => "EnumProperty",
            Self::Object => "ObjectProperty",
            Self::Struct => "StructProperty",
            Self::Array  => "ArrayProperty",
            Self::Map    => "MapProperty",
            Self::Set    => "SetProperty",
        }
    }
}

/// A `ByteProperty` value: raw when the prelude's enum name is `None`,
/// otherwise a name out of the declared enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteValue {
    Raw(u8),
    Named(Name),
}

/// A reference to another object in the same save.
///
/// The legacy format stores an index into the objects table (`-1` is null);
/// the modern format stores a GUID (all-zero is null). Null decodes without
/// error; a dangling reference is only detectable once the container exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    Id(i32),
    Guid([u8; 16]),
    Null,
}

/// A decoded `TextProperty`. Only the history layouts observed in saves are
/// materialized; anything else keeps its flags and skips the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextValue {
    pub flags:     u32,
    pub history:   i8,
    pub namespace: Option<String>,
    pub key:       Option<String>,
    pub source:    Option<String>,
}

/// A decoded property value, one variant per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Byte(ByteValue),
    Int8(i8),
    Int16(i16),
    UInt16(u16),
    Int(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Str(String),
    Name(Name),
    Text(TextValue),
    Enum {
        enum_type: Name,
        value:     Name,
    },
    Object(ObjectRef),
    Struct(Box<StructValue>),
    Array {
        inner:  PropertyTag,
        values: Vec<PropertyValue>,
    },
    Set {
        inner:  PropertyTag,
        values: Vec<PropertyValue>,
    },
    Map {
        key_tag:   PropertyTag,
        value_tag: PropertyTag,
        pairs:     Vec<(PropertyValue, PropertyValue)>,
    },
}

impl PropertyValue {
    /// The nested property list when this value is a `Fields`-shaped struct
    /// (the usual shape of struct elements inside arrays).
    pub fn fields(&self) -> Option<&[Property]> {
        match self {
            Self::Struct(inner) => match &**inner {
                StructValue::Fields(fields) => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One self-describing record out of an object's property list.
///
/// `index` disambiguates repeated names: stat arrays are serialized as twelve
/// properties sharing one name with indices 0 through 11.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name:  Name,
    pub tag:   PropertyTag,
    pub index: u32,
    pub value: PropertyValue,
}

impl Property {
    /// Any integer-shaped value widened to `i64`, including raw bytes.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match &self.value {
            PropertyValue::Byte(ByteValue::Raw(v)) => i64::from(*v),
            PropertyValue::Int8(v)   => i64::from(*v),
            PropertyValue::Int16(v)  => i64::from(*v),
            PropertyValue::UInt16(v) => i64::from(*v),
            PropertyValue::Int(v)    => i64::from(*v),
            PropertyValue::UInt32(v) => i64::from(*v),
            PropertyValue::Int64(v)  => *v,
            PropertyValue::UInt64(v) => i64::try_from(*v).ok()?,
            _ => return None,
        })
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self.value {
            PropertyValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Any float-shaped value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            PropertyValue::Float(v)  => Some(f64::from(v)),
            PropertyValue::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            PropertyValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Str(v)  => Some(v),
            PropertyValue::Name(v) => Some(&v.text),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match &self.value {
            PropertyValue::Name(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_ref(&self) -> Option<ObjectRef> {
        match self.value {
            PropertyValue::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match &self.value {
            PropertyValue::Struct(v) => Some(v),
            _ => None,
        }
    }

    /// The nested property list of a `Fields`-shaped struct value.
    pub fn as_fields(&self) -> Option<&[Property]> {
        match self.as_struct()? {
            StructValue::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match &self.value {
            PropertyValue::Array { values, .. } => Some(values),
            _ => None,
        }
    }
}

/// Lookup helpers over a decoded property list.
pub trait PropertySlice {
    /// The first property with this name (any index).
    fn find(&self, name: &str) -> Option<&Property>;

    /// The first property with this name and exactly this index.
    fn find_indexed(&self, name: &str, index: u32) -> Option<&Property>;

    /// Sum every same-named property at this index, widened to `i64`.
    /// Repeated properties are how stat arrays are serialized.
    fn sum_by_index(&self, name: &str, index: u32) -> i64;

    /// The nested fields of a struct-valued property with this name.
    fn find_fields(&self, name: &str) -> Option<&[Property]>;
}

impl PropertySlice for [Property] {
    fn find(&self, name: &str) -> Option<&Property> {
        self.iter().find(|p| p.name.text == name)
    }

    fn find_indexed(&self, name: &str, index: u32) -> Option<&Property> {
        self.iter().find(|p| p.name.text == name && p.index == index)
    }

    fn sum_by_index(&self, name: &str, index: u32) -> i64 {
        self.iter()
            .filter(|p| p.name.text == name && p.index == index)
            .filter_map(Property::as_i64)
            .sum()
    }

    fn find_fields(&self, name: &str) -> Option<&[Property]> {
        self.find(name)?.as_fields()
    }
}

#[cfg(test)]
mod tests {
    use crate::names::Name;
    use super::{ByteValue, Property, PropertySlice, PropertyTag, PropertyValue};

    fn byte_prop(name: &str, index: u32, value: u8) -> Property {
        Property {
            name:  Name::new(name),
            tag:   PropertyTag::Byte,
            index,
            value: PropertyValue::Byte(ByteValue::Raw(value)),
        }
    }

    #[test]
    fn tag_names_round_trip() {
        for tag in [
            PropertyTag::Bool, PropertyTag::Byte, PropertyTag::Int, PropertyTag::UInt64,
            PropertyTag::Str, PropertyTag::Struct, PropertyTag::Array, PropertyTag::Map,
        ] {
            assert_eq!(PropertyTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(PropertyTag::from_name("FancyNewProperty"), None);
    }

    #[test]
    fn sum_by_index_only_counts_matching_indices() {
        let props = vec![
            byte_prop("NumberOfLevelUpPointsApplied", 0, 10),
            byte_prop("NumberOfLevelUpPointsApplied", 0, 5),
            byte_prop("NumberOfLevelUpPointsApplied", 7, 40),
            byte_prop("SomethingElse", 0, 99),
        ];
        assert_eq!(props.sum_by_index("NumberOfLevelUpPointsApplied", 0), 15);
        assert_eq!(props.sum_by_index("NumberOfLevelUpPointsApplied", 7), 40);
        assert_eq!(props.sum_by_index("NumberOfLevelUpPointsApplied", 3), 0);
    }

    #[test]
    fn find_indexed_distinguishes_repeats() {
        let props = vec![byte_prop("Stat", 0, 1), byte_prop("Stat", 1, 2)];
        assert_eq!(props.find_indexed("Stat", 1).and_then(Property::as_i64), Some(2));
        assert!(props.find_indexed("Stat", 2).is_none());
    }
}
