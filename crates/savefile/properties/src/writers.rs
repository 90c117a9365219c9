//! Minimal byte-level encoders for assembling fixture saves in tests.
//!
//! Writing real save files is not a goal of this workspace; these helpers
//! exist so tests can exercise the decoders against known bytes without
//! checking binary blobs into the repository.

use crate::names::Name;


pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_f32(buf: &mut Vec<u8>, value: f32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a string the way saves do: length prefix, UTF-8 bytes, NUL.
pub fn put_fstring(buf: &mut Vec<u8>, text: &str) {
    if text.is_empty() {
        put_i32(buf, 0);
        return;
    }
    put_i32(buf, (text.len() + 1) as i32);
    buf.extend_from_slice(text.as_bytes());
    buf.push(0);
}

/// Encode a string as UTF-16LE code units with a negative length prefix.
pub fn put_fstring_utf16(buf: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    put_i32(buf, -((units.len() + 1) as i32));
    for unit in units {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf.extend_from_slice(&0_u16.to_le_bytes());
}

/// How a writer materializes name references; mirrors the decoder's
/// `NameStrategy`.
pub trait NameSink {
    fn put_name_suffixed(&mut self, buf: &mut Vec<u8>, text: &str, suffix: u32);

    fn put_name(&mut self, buf: &mut Vec<u8>, text: &str) {
        self.put_name_suffixed(buf, text, 0);
    }

    /// The encoded bytes of one reference, for hand-assembled values.
    fn name_bytes(&mut self, text: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        self.put_name(&mut buf, text);
        buf
    }
}

/// Names written as bare `FString`s (profiles, tribes, cryopod payloads).
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineNames;

impl NameSink for InlineNames {
    fn put_name_suffixed(&mut self, buf: &mut Vec<u8>, text: &str, suffix: u32) {
        // Inline references cannot carry a suffix; fold it into the text the
        // same way `Name` renders.
        if suffix == 0 {
            put_fstring(buf, text);
        } else {
            put_fstring(buf, &Name::with_suffix(text, suffix).to_string());
        }
    }
}

/// Names interned into a table, written as `(index, suffix)` pairs.
#[derive(Debug, Default)]
pub struct TabledNames {
    entries: Vec<String>,
}

impl TabledNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> u32 {
        if let Some(index) = self.entries.iter().position(|e| e == text) {
            return index as u32;
        }
        self.entries.push(text.to_owned());
        (self.entries.len() - 1) as u32
    }

    /// The table blob: count-prefixed `FString`s.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_i32(&mut buf, self.entries.len() as i32);
        for entry in &self.entries {
            put_fstring(&mut buf, entry);
        }
        buf
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl NameSink for TabledNames {
    fn put_name_suffixed(&mut self, buf: &mut Vec<u8>, text: &str, suffix: u32) {
        let index = self.intern(text);
        put_u32(buf, index);
        put_u32(buf, suffix);
    }
}

/// Emits property records in wire order: name, tag, size, index, prelude,
/// value.
#[derive(Debug)]
pub struct PropertyWriter<'a, N: NameSink> {
    buf:   Vec<u8>,
    names: &'a mut N,
}

impl<'a, N: NameSink> PropertyWriter<'a, N> {
    pub fn new(names: &'a mut N) -> Self {
        Self {
            buf: Vec::new(),
            names,
        }
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.none();
        self.buf
    }

    /// The raw list bytes *without* a terminator; for malformed fixtures.
    pub fn into_unterminated_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// The `"None"` terminator ending a property list.
    pub fn none(&mut self) {
        self.names.put_name(&mut self.buf, Name::NONE);
    }

    /// A fully explicit record, for odd shapes the typed helpers don't
    /// cover. `size` is written as given, whether or not it matches.
    pub fn raw_property(
        &mut self,
        name:    &str,
        tag:     &str,
        size:    u32,
        index:   u32,
        prelude: &[u8],
        value:   &[u8],
    ) {
        self.names.put_name(&mut self.buf, name);
        self.names.put_name(&mut self.buf, tag);
        put_u32(&mut self.buf, size);
        put_u32(&mut self.buf, index);
        self.buf.extend_from_slice(prelude);
        self.buf.extend_from_slice(value);
    }

    fn property(&mut self, name: &str, tag: &str, index: u32, prelude: &[u8], value: &[u8]) {
        self.raw_property(name, tag, value.len() as u32, index, prelude, value);
    }

    pub fn int(&mut self, name: &str, value: i32) {
        self.property(name, "IntProperty", 0, &[], &value.to_le_bytes());
    }

    pub fn uint16(&mut self, name: &str, value: u16) {
        self.property(name, "UInt16Property", 0, &[], &value.to_le_bytes());
    }

    pub fn uint32(&mut self, name: &str, value: u32) {
        self.property(name, "UInt32Property", 0, &[], &value.to_le_bytes());
    }

    pub fn int64(&mut self, name: &str, value: i64) {
        self.property(name, "Int64Property", 0, &[], &value.to_le_bytes());
    }

    pub fn uint64(&mut self, name: &str, value: u64) {
        self.property(name, "UInt64Property", 0, &[], &value.to_le_bytes());
    }

    pub fn float(&mut self, name: &str, value: f32) {
        self.property(name, "FloatProperty", 0, &[], &value.to_le_bytes());
    }

    pub fn double(&mut self, name: &str, value: f64) {
        self.property(name, "DoubleProperty", 0, &[], &value.to_le_bytes());
    }

    pub fn string(&mut self, name: &str, value: &str) {
        let mut bytes = Vec::new();
        put_fstring(&mut bytes, value);
        self.property(name, "StrProperty", 0, &[], &bytes);
    }

    /// `asa_padding` matches the decoder's format rule: the modern format
    /// pads the Bool prelude with one terminator byte.
    pub fn boolean(&mut self, name: &str, value: bool, asa_padding: bool) {
        let prelude: &[u8] = if asa_padding {
            if value { &[1, 0] } else { &[0, 0] }
        } else if value {
            &[1]
        } else {
            &[0]
        };
        self.property(name, "BoolProperty", 0, prelude, &[]);
    }

    pub fn byte_raw(&mut self, name: &str, index: u32, value: u8) {
        let prelude = self.names.name_bytes(Name::NONE);
        self.property(name, "ByteProperty", index, &prelude, &[value]);
    }

    pub fn object_id(&mut self, name: &str, id: i32) {
        self.property(name, "ObjectProperty", 0, &[], &id.to_le_bytes());
    }

    pub fn object_guid(&mut self, name: &str, guid: [u8; 16]) {
        self.property(name, "ObjectProperty", 0, &[], &guid);
    }

    /// A struct property whose body is a nested property list.
    pub fn struct_fields(
        &mut self,
        name:        &str,
        struct_type: &str,
        build:       impl FnOnce(&mut PropertyWriter<'_, N>),
    ) {
        let prelude = self.names.name_bytes(struct_type);
        let mut inner = PropertyWriter::new(&mut *self.names);
        build(&mut inner);
        let body = inner.into_bytes();
        self.property(name, "StructProperty", 0, &prelude, &body);
    }

    /// An array of property-list structs, including the shared inner header.
    pub fn array_of_fields(
        &mut self,
        name:        &str,
        struct_type: &str,
        count:       u32,
        mut build:   impl FnMut(&mut PropertyWriter<'_, N>, u32),
    ) {
        let prelude = self.names.name_bytes("StructProperty");

        let mut bodies = Vec::new();
        for i in 0 .. count {
            let mut inner = PropertyWriter::new(&mut *self.names);
            build(&mut inner, i);
            bodies.push(inner.into_bytes());
        }

        let mut value = Vec::new();
        put_u32(&mut value, count);
        let mut header = Vec::new();
        header.extend(self.names.name_bytes(name));
        header.extend(self.names.name_bytes("StructProperty"));
        put_u32(&mut header, bodies.iter().map(Vec::len).sum::<usize>() as u32);
        put_u32(&mut header, 0);
        header.extend(self.names.name_bytes(struct_type));
        value.extend(header);
        for body in bodies {
            value.extend(body);
        }

        self.property(name, "ArrayProperty", 0, &prelude, &value);
    }

    pub fn array_str(&mut self, name: &str, values: &[&str]) {
        let prelude = self.names.name_bytes("StrProperty");
        let mut value = Vec::new();
        put_u32(&mut value, values.len() as u32);
        for v in values {
            put_fstring(&mut value, v);
        }
        self.property(name, "ArrayProperty", 0, &prelude, &value);
    }

    pub fn array_u32(&mut self, name: &str, values: &[u32]) {
        let prelude = self.names.name_bytes("UInt32Property");
        let mut value = Vec::new();
        put_u32(&mut value, values.len() as u32);
        for v in values {
            put_u32(&mut value, *v);
        }
        self.property(name, "ArrayProperty", 0, &prelude, &value);
    }

    /// An `ArrayProperty` of raw bytes (`ByteProperty` elements).
    pub fn byte_array(&mut self, name: &str, bytes: &[u8]) {
        let prelude = self.names.name_bytes("ByteProperty");
        let mut value = Vec::new();
        put_u32(&mut value, bytes.len() as u32);
        value.extend_from_slice(bytes);
        self.property(name, "ArrayProperty", 0, &prelude, &value);
    }
}
