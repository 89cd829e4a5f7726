//! DWG-specific LZ77 decompression.
//!
//! Two incompatible variants exist: the AC1018 one (also used by AC1024
//! and AC1027) and the AC1021 one. Both reconstruct into an output bounded
//! by the decompressed size the page header declares; overruns fail
//! [`crate::error::DwgError::CorruptStream`].

pub mod lz77_ac18;
pub mod lz77_ac21;
