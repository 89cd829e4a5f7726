//! Object type codes and their classification.
//!
//! Type codes below 500 are fixed by the format; codes from 500 up index
//! the class definitions in AcDb:Classes. The dispatcher only needs to
//! know which parser (if any) handles a code and whether an unknown code
//! denotes a graphical entity.

/// Entity types this decoder fully parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedType {
    Text,
    Insert,
    Arc,
    Circle,
    Line,
    DimLinear,
    DimRadius,
    DimDiameter,
    Point,
    Ellipse,
    MText,
    LwPolyline,
}

/// What a raw type code means to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    /// An entity we decode into a full record
    Supported(SupportedType),
    /// A fixed code for a graphical entity outside the supported set
    UnsupportedEntity,
    /// A LAYER table entry, decoded into the layer symbol table
    Layer,
    /// Any other fixed non-graphical code (tables, controls, dictionaries)
    NonGraphical,
    /// A class-based code (≥ 500) resolved through AcDb:Classes
    ClassBased,
}

/// Classify a raw object type code.
pub fn classify(raw: i16) -> ObjectClass {
    use ObjectClass::*;
    use SupportedType::*;

    match raw {
        0x01 => Supported(Text),
        0x07 => Supported(Insert),
        0x11 => Supported(Arc),
        0x12 => Supported(Circle),
        0x13 => Supported(Line),
        0x15 => Supported(DimLinear),
        0x19 => Supported(DimRadius),
        0x1A => Supported(DimDiameter),
        0x1B => Supported(Point),
        0x23 => Supported(Ellipse),
        0x2C => Supported(MText),
        0x4D => Supported(LwPolyline),

        0x33 => Layer,

        // Remaining fixed entity codes: attributes, blocks, vertices,
        // heavy polylines, the other dimension kinds, faces, solids,
        // shapes, viewports, splines, modeler bodies, rays, leaders,
        // tolerances, mlines, OLE frames, hatches, proxy entities.
        0x02..=0x06
        | 0x08..=0x10
        | 0x14
        | 0x16..=0x18
        | 0x1C..=0x22
        | 0x24..=0x29
        | 0x2B
        | 0x2D..=0x2F
        | 0x4A
        | 0x4E
        | 0x1F2 => UnsupportedEntity,

        code if code >= 500 => ClassBased,

        _ => NonGraphical,
    }
}

/// Human-readable name for a fixed entity code outside the supported set.
pub fn fixed_code_name(raw: i16) -> Option<&'static str> {
    let name = match raw {
        0x02 => "ATTRIB",
        0x03 => "ATTDEF",
        0x04 => "BLOCK",
        0x05 => "ENDBLK",
        0x06 => "SEQEND",
        0x08 => "MINSERT",
        0x0A..=0x0E => "VERTEX",
        0x0F => "POLYLINE",
        0x10 => "POLYLINE3D",
        0x14 => "DIM_ORDINATE",
        0x16 => "DIM_ALIGNED",
        0x17 => "DIM_ANG3PT",
        0x18 => "DIM_ANG2LN",
        0x1C => "3DFACE",
        0x1D => "POLYLINE_PFACE",
        0x1E => "POLYLINE_MESH",
        0x1F => "SOLID",
        0x20 => "TRACE",
        0x21 => "SHAPE",
        0x22 => "VIEWPORT",
        0x24 => "SPLINE",
        0x25 => "REGION",
        0x26 => "3DSOLID",
        0x27 => "BODY",
        0x28 => "RAY",
        0x29 => "XLINE",
        0x2B => "OLEFRAME",
        0x2D => "LEADER",
        0x2E => "TOLERANCE",
        0x2F => "MLINE",
        0x4A => "OLE2FRAME",
        0x4E => "HATCH",
        0x1F2 => "ACAD_PROXY_ENTITY",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_codes() {
        assert_eq!(classify(0x13), ObjectClass::Supported(SupportedType::Line));
        assert_eq!(classify(0x11), ObjectClass::Supported(SupportedType::Arc));
        assert_eq!(
            classify(0x4D),
            ObjectClass::Supported(SupportedType::LwPolyline)
        );
        assert_eq!(classify(0x2C), ObjectClass::Supported(SupportedType::MText));
    }

    #[test]
    fn test_layer_code() {
        assert_eq!(classify(0x33), ObjectClass::Layer);
    }

    #[test]
    fn test_unsupported_entities() {
        assert_eq!(classify(0x24), ObjectClass::UnsupportedEntity); // SPLINE
        assert_eq!(classify(0x4E), ObjectClass::UnsupportedEntity); // HATCH
        assert_eq!(fixed_code_name(0x24), Some("SPLINE"));
    }

    #[test]
    fn test_non_graphical() {
        assert_eq!(classify(0x2A), ObjectClass::NonGraphical); // DICTIONARY
        assert_eq!(classify(0x31), ObjectClass::NonGraphical); // BLOCK_HEADER
        assert_eq!(classify(0x42), ObjectClass::NonGraphical); // APPID ctrl
    }

    #[test]
    fn test_class_based() {
        assert_eq!(classify(500), ObjectClass::ClassBased);
        assert_eq!(classify(0x1F4), ObjectClass::ClassBased);
    }
}
