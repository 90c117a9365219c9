//! The export pass: project extracted models into the ASV-compatible JSON
//! shape, with optional world-to-GPS coordinate mapping.

mod asv;
mod gps;


pub use self::asv::export_all;
pub use self::gps::{MapSpec, BUILTIN_MAPS};
