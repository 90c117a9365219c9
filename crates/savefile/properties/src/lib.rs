mod names;
mod reader;
mod value;

pub mod parse;
pub mod structs;

#[cfg(any(test, feature = "test-writers"))]
pub mod writers;


pub use self::names::*;
pub use self::reader::*;
pub use self::value::*;
