use thiserror::Error;


/// Describes a failure to project a model out of decoded objects.
///
/// Absent properties never error (they default); these are the hard cases:
/// the object a model is built from is missing entirely, or a property
/// exists with a shape the format does not allow.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("this save holds no {0} object")]
    MissingObject(&'static str),
    #[error("property {0:?} does not have the expected shape")]
    Shape(&'static str),
    /// An error from a caller-provided projection.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
