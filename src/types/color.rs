//! Color representation for decoded entities.

use serde::{Deserialize, Serialize};

/// Entity color as decoded from the CMC/ENC wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Color taken from the entity's layer (index 256)
    ByLayer,
    /// Color taken from the containing block (index 0)
    ByBlock,
    /// Indexed ACI color (1-255)
    Index(u8),
    /// 24-bit true color
    Rgb(u8, u8, u8),
}

impl Color {
    /// Build a color from an ACI color index.
    ///
    /// Index 0 means ByBlock and 256 means ByLayer per the DXF convention.
    pub fn from_index(index: i16) -> Self {
        match index {
            0 => Color::ByBlock,
            256 => Color::ByLayer,
            i if (1..=255).contains(&i) => Color::Index(i as u8),
            _ => Color::ByLayer,
        }
    }

    /// Build a true color from RGB components.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(r, g, b)
    }

    /// The ACI index, when this is an indexed (or ByLayer/ByBlock) color.
    pub fn index(&self) -> Option<u16> {
        match self {
            Color::ByBlock => Some(0),
            Color::ByLayer => Some(256),
            Color::Index(i) => Some(*i as u16),
            Color::Rgb(..) => None,
        }
    }

    /// The packed 0xRRGGBB value, when this is a true color.
    pub fn true_color(&self) -> Option<u32> {
        match self {
            Color::Rgb(r, g, b) => {
                Some(((*r as u32) << 16) | ((*g as u32) << 8) | (*b as u32))
            }
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::ByLayer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index() {
        assert_eq!(Color::from_index(0), Color::ByBlock);
        assert_eq!(Color::from_index(256), Color::ByLayer);
        assert_eq!(Color::from_index(7), Color::Index(7));
    }

    #[test]
    fn test_true_color_packing() {
        let c = Color::from_rgb(0x12, 0x34, 0x56);
        assert_eq!(c.true_color(), Some(0x123456));
        assert_eq!(c.index(), None);
    }

    #[test]
    fn test_index_accessor() {
        assert_eq!(Color::ByLayer.index(), Some(256));
        assert_eq!(Color::Index(1).index(), Some(1));
    }
}
