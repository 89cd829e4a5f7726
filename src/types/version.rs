//! DWG version codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DwgError, Result};

/// DWG file version, identified by the 6-byte magic at offset 0.
///
/// The ordering follows release order, so version gates can be written as
/// range comparisons (`version >= DwgVersion::Ac1018`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DwgVersion {
    /// R2000
    Ac1015,
    /// R2004
    Ac1018,
    /// R2007
    Ac1021,
    /// R2010
    Ac1024,
    /// R2013
    Ac1027,
}

impl DwgVersion {
    /// All supported versions, in release order.
    pub const ALL: [DwgVersion; 5] = [
        DwgVersion::Ac1015,
        DwgVersion::Ac1018,
        DwgVersion::Ac1021,
        DwgVersion::Ac1024,
        DwgVersion::Ac1027,
    ];

    /// The version code string as it appears in the file.
    pub fn as_str(&self) -> &'static str {
        match self {
            DwgVersion::Ac1015 => "AC1015",
            DwgVersion::Ac1018 => "AC1018",
            DwgVersion::Ac1021 => "AC1021",
            DwgVersion::Ac1024 => "AC1024",
            DwgVersion::Ac1027 => "AC1027",
        }
    }

    /// The release name commonly used for this version.
    pub fn release_name(&self) -> &'static str {
        match self {
            DwgVersion::Ac1015 => "R2000",
            DwgVersion::Ac1018 => "R2004",
            DwgVersion::Ac1021 => "R2007",
            DwgVersion::Ac1024 => "R2010",
            DwgVersion::Ac1027 => "R2013",
        }
    }

    /// Parse a version code string.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "AC1015" => Some(DwgVersion::Ac1015),
            "AC1018" => Some(DwgVersion::Ac1018),
            "AC1021" => Some(DwgVersion::Ac1021),
            "AC1024" => Some(DwgVersion::Ac1024),
            "AC1027" => Some(DwgVersion::Ac1027),
            _ => None,
        }
    }

    /// Detect the version from the first bytes of a DWG file.
    ///
    /// Fails with [`DwgError::UnsupportedVersion`] when the magic does not
    /// match a supported code.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 6 {
            return Err(DwgError::Truncated { offset: 0 });
        }
        let tag = std::str::from_utf8(&bytes[..6])
            .map_err(|_| DwgError::UnsupportedVersion(format!("{:02X?}", &bytes[..6])))?;
        Self::parse(tag).ok_or_else(|| DwgError::UnsupportedVersion(tag.to_string()))
    }

    /// Whether this version uses the paged system-section layout (AC1018+).
    pub fn has_system_sections(&self) -> bool {
        *self >= DwgVersion::Ac1018
    }
}

impl fmt::Display for DwgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
