//! Core value types shared across the decoder.

pub mod color;
pub mod handle;
pub mod vector;
pub mod version;

pub use color::Color;
pub use handle::{Handle, HandleKind};
pub use vector::{Vector2, Vector3};
pub use version::DwgVersion;
