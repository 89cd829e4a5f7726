//! Handle type for DWG objects.
//!
//! Handles are unique 64-bit identifiers for all objects in a drawing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for DWG objects.
///
/// Handle 0 is reserved and invalid; cross-references store handles, never
/// owning references, so reference cycles (owner ↔ reactor) stay
/// representational.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    /// The null/invalid handle (0).
    pub const NULL: Handle = Handle(0);

    /// Create a new handle from a u64 value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Handle(value)
    }

    /// Get the raw u64 value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if this is a null/invalid handle.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Check if this is a valid handle.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl fmt::UpperHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// How a handle reference relates to the referencing object.
///
/// The code nibble of an on-wire handle distinguishes absolute references
/// from owner/pointer relationships and relative encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// Soft ownership (code 0x2)
    SoftOwner,
    /// Hard ownership (code 0x3)
    HardOwner,
    /// Soft pointer (code 0x4)
    SoftPointer,
    /// Hard pointer (code 0x5)
    HardPointer,
    /// Relative to the referencing object's handle (codes 0x6, 0x8, 0xA, 0xC)
    Relative,
    /// Any other code
    Undefined,
}

impl HandleKind {
    /// Classify a 4-bit handle code nibble.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x2 => HandleKind::SoftOwner,
            0x3 => HandleKind::HardOwner,
            0x4 => HandleKind::SoftPointer,
            0x5 => HandleKind::HardPointer,
            0x6 | 0x8 | 0xA | 0xC => HandleKind::Relative,
            _ => HandleKind::Undefined,
        }
    }
}
