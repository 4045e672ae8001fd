//! Describer collaborators
//!
//! Renderers hand symbol sets and acceleration descriptors to these traits
//! instead of formatting them directly, so callers can swap in their own
//! notation.

use crate::Result;
use crate::program::AccelView;

pub mod accel;
pub mod charclass;

pub use accel::AccelInfoDescriber;
pub use charclass::{ByteSet, CharClassDescriber};

/// Where a class description will be embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMode {
    /// Plain text dumps
    Text,
    /// Inside a double-quoted DOT edge label
    DotLabel,
}

/// Turns a set of byte values into a compact class description
pub trait ClassDescriber {
    fn describe(&self, set: &ByteSet, mode: ClassMode) -> String;
}

/// Describes an acceleration descriptor without the renderer opening it
pub trait AccelDescriber {
    fn describe(&self, accel: AccelView<'_>) -> Result<String>;
}
