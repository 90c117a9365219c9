//! Small utilities shared across the obelisk crates, with no save-format
//! knowledge of their own.

mod offsets;
mod or_warn;


pub use self::offsets::u64_to_usize;
pub use self::or_warn::OrWarn;
