use std::fmt;
use std::fmt::{Display, Formatter};

use crate::parse::PropertyError;
use crate::reader::{ReadError, SliceReader};


/// Which generation of the save format is being decoded. The two generations
/// share the property system but differ in primitive widths (f32 vs f64
/// vectors), object-reference shape (table index vs GUID), and a couple of
/// placeholder bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveFormat {
    /// The legacy pure-binary format.
    Ase,
    /// The modern format: SQLite container, compressed per-object blobs.
    Asa,
}

/// A resolved name reference: an interned string plus a numeric instance
/// suffix. `suffix == 0` means the bare name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub text:   String,
    pub suffix: u32,
}

impl Name {
    /// The sentinel that terminates property lists.
    pub const NONE: &'static str = "None";

    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text:   text.into(),
            suffix: 0,
        }
    }

    pub fn with_suffix<T: Into<String>>(text: T, suffix: u32) -> Self {
        Self {
            text: text.into(),
            suffix,
        }
    }

    /// Whether this is the `"None"` terminator.
    pub fn is_none_sentinel(&self) -> bool {
        self.suffix == 0 && self.text == Self::NONE
    }

    /// The last segment of a qualified UE-style class path, e.g.
    /// `/Game/Dinos/Rex.Rex_Character_BP_C` becomes `Rex_Character_BP_C`.
    pub fn class_segment(&self) -> &str {
        self.text
            .rsplit(['.', '/'])
            .next()
            .unwrap_or(&self.text)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.suffix == 0 {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}_{}", self.text, self.suffix)
        }
    }
}

/// The deduplicated string pool of a save. Indices on the wire are
/// zero-based positions into this table.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: Vec<String>,
}

impl NameTable {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Decode a table blob: a count-prefixed list of `FString`s.
    pub fn parse(reader: &mut SliceReader<'_>) -> Result<Self, ReadError> {
        Ok(Self {
            entries: reader.read_fstrings()?,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }
}

/// How name references are materialized on the wire.
#[derive(Debug, Clone)]
pub enum NameStrategy {
    /// Every reference is a bare `FString` read in place (profiles, tribes,
    /// cloud files, cryopod payloads).
    Inline,
    /// A reference is `(index: u32, suffix: u32)` into a table loaded ahead
    /// of time (world saves).
    Tabled(NameTable),
}

/// Recoverable problems collected while decoding. Every entry is mirrored to
/// the `log` facade at warn level as it is recorded.
#[derive(Debug, Default)]
pub struct ParseLog {
    errors: Vec<String>,
}

impl ParseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<M: Into<String>>(&mut self, message: M) {
        let message = message.into();
        log::warn!("{message}");
        self.errors.push(message);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Fold another log's entries into this one (used when a nested decode,
    /// such as a cryopod payload, keeps its own log).
    pub fn absorb(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }
}

/// Everything a property decoder needs besides the bytes themselves: the
/// format generation, the name strategy, and the recoverable-error log.
/// One context is threaded through a whole decode call.
#[derive(Debug)]
pub struct DecodeContext {
    pub format: SaveFormat,
    pub names:  NameStrategy,
    pub log:    ParseLog,
    pub(crate) depth: u32,
}

impl DecodeContext {
    pub fn new(format: SaveFormat, names: NameStrategy) -> Self {
        Self {
            format,
            names,
            log: ParseLog::new(),
            depth: 0,
        }
    }

    /// Read one name reference according to the active strategy.
    pub fn read_name(&self, reader: &mut SliceReader<'_>) -> Result<Name, PropertyError> {
        match &self.names {
            NameStrategy::Inline => Ok(Name::new(reader.read_fstring()?)),
            NameStrategy::Tabled(table) => {
                let index = reader.read_u32()?;
                let suffix = reader.read_u32()?;
                let Some(text) = table.resolve(index) else {
                    return Err(PropertyError::BadNameIndex {
                        index,
                        len: table.len(),
                    });
                };
                Ok(Name::with_suffix(text, suffix))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::PropertyError;
    use crate::reader::SliceReader;
    use super::{DecodeContext, Name, NameStrategy, NameTable, SaveFormat};

    #[test]
    fn display_appends_nonzero_suffixes() {
        assert_eq!(Name::new("Rex_Character_BP_C").to_string(), "Rex_Character_BP_C");
        assert_eq!(Name::with_suffix("Rex_Character_BP_C", 7).to_string(), "Rex_Character_BP_C_7");
    }

    #[test]
    fn class_segment_takes_the_last_path_piece() {
        let qualified = Name::new("/Game/PrimalEarth/Dinos/Rex.Rex_Character_BP_C");
        assert_eq!(qualified.class_segment(), "Rex_Character_BP_C");
        assert_eq!(Name::new("PrimalPlayerData_C").class_segment(), "PrimalPlayerData_C");
    }

    #[test]
    fn tabled_names_resolve_through_the_pool() {
        let table = NameTable::new(vec!["None".to_owned(), "Health".to_owned()]);
        let ctx = DecodeContext::new(SaveFormat::Ase, NameStrategy::Tabled(table));

        let bytes = [1_u8, 0, 0, 0, 3, 0, 0, 0];
        let mut reader = SliceReader::new(&bytes);
        let name = ctx.read_name(&mut reader).expect("index 1 is in range");
        assert_eq!(name, Name::with_suffix("Health", 3));
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        let table = NameTable::new(vec!["None".to_owned()]);
        let ctx = DecodeContext::new(SaveFormat::Ase, NameStrategy::Tabled(table));

        let bytes = [9_u8, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = SliceReader::new(&bytes);
        assert!(matches!(
            ctx.read_name(&mut reader),
            Err(PropertyError::BadNameIndex { index: 9, len: 1 }),
        ));
    }

    #[test]
    fn inline_names_are_plain_strings() {
        let ctx = DecodeContext::new(SaveFormat::Ase, NameStrategy::Inline);
        let mut bytes = 5_i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"None\0");
        let mut reader = SliceReader::new(&bytes);
        let name = ctx.read_name(&mut reader).expect("inline name");
        assert!(name.is_none_sentinel());
    }
}
