//! Type-specific entity parsers.
//!
//! Each parser starts with the object stream positioned after the common
//! entity header and consumes exactly the fields its type defines,
//! leaving cross-reference handles to the handle sub-stream.

use super::object_reader::{ObjectReader, ObjectStreams};
use crate::entities::{
    Arc, Circle, Dimension, DimensionCommon, DimensionKind, Ellipse, EntityCommon, EntityRecord,
    Insert, Line, LwPolyline, MText, Point, Text,
};
use crate::error::{DwgError, Result};
use crate::io::dwg::object_type::SupportedType;
use crate::types::{Handle, Vector2, Vector3};

impl ObjectReader<'_> {
    /// Dispatch to the parser for a supported entity type.
    pub(super) fn read_entity(
        &mut self,
        kind: SupportedType,
        streams: &mut ObjectStreams<'_>,
    ) -> Result<EntityRecord> {
        let common = self.read_common_entity_data(streams)?;
        let record = match kind {
            SupportedType::Line => EntityRecord::Line(self.read_line(streams, common)?),
            SupportedType::Arc => EntityRecord::Arc(self.read_arc(streams, common)?),
            SupportedType::Circle => EntityRecord::Circle(self.read_circle(streams, common)?),
            SupportedType::Point => EntityRecord::Point(self.read_point(streams, common)?),
            SupportedType::Ellipse => EntityRecord::Ellipse(self.read_ellipse(streams, common)?),
            SupportedType::LwPolyline => {
                EntityRecord::LwPolyline(self.read_lwpolyline(streams, common)?)
            }
            SupportedType::Text => EntityRecord::Text(self.read_text(streams, common)?),
            SupportedType::MText => EntityRecord::MText(self.read_mtext(streams, common)?),
            SupportedType::Insert => EntityRecord::Insert(self.read_insert(streams, common)?),
            SupportedType::DimLinear => {
                EntityRecord::Dimension(self.read_dim_linear(streams, common)?)
            }
            SupportedType::DimRadius => {
                EntityRecord::Dimension(self.read_dim_radial(streams, common, false)?)
            }
            SupportedType::DimDiameter => {
                EntityRecord::Dimension(self.read_dim_radial(streams, common, true)?)
            }
        };
        Ok(record)
    }

    /// LINE: z-zero flag, then per-axis RD start / DD end pairs.
    fn read_line(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Line> {
        let z_is_zero = streams.object.read_bit()?;
        let x_start = streams.object.read_raw_double()?;
        let x_end = streams.object.read_bit_double_with_default(x_start)?;
        let y_start = streams.object.read_raw_double()?;
        let y_end = streams.object.read_bit_double_with_default(y_start)?;
        let (z_start, z_end) = if z_is_zero {
            (0.0, 0.0)
        } else {
            let z_start = streams.object.read_raw_double()?;
            let z_end = streams.object.read_bit_double_with_default(z_start)?;
            (z_start, z_end)
        };
        let thickness = streams.object.read_bit_thickness()?;
        let normal = streams.object.read_bit_extrusion()?;

        Ok(Line {
            common,
            start: Vector3::new(x_start, y_start, z_start),
            end: Vector3::new(x_end, y_end, z_end),
            thickness,
            normal,
        })
    }

    fn read_arc(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Arc> {
        let center = streams.object.read_3bit_double()?;
        let radius = streams.object.read_bit_double()?;
        if radius < 0.0 {
            return Err(DwgError::Parse(format!("negative arc radius {radius}")));
        }
        let thickness = streams.object.read_bit_thickness()?;
        let normal = streams.object.read_bit_extrusion()?;
        let start_angle = streams.object.read_bit_double()?;
        let end_angle = streams.object.read_bit_double()?;

        Ok(Arc {
            common,
            center,
            radius,
            start_angle,
            end_angle,
            thickness,
            normal,
        })
    }

    fn read_circle(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Circle> {
        let center = streams.object.read_3bit_double()?;
        let radius = streams.object.read_bit_double()?;
        if radius < 0.0 {
            return Err(DwgError::Parse(format!("negative circle radius {radius}")));
        }
        let thickness = streams.object.read_bit_thickness()?;
        let normal = streams.object.read_bit_extrusion()?;

        Ok(Circle {
            common,
            center,
            radius,
            thickness,
            normal,
        })
    }

    fn read_point(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Point> {
        let location = streams.object.read_3bit_double()?;
        let thickness = streams.object.read_bit_thickness()?;
        let normal = streams.object.read_bit_extrusion()?;
        let x_axis_angle = streams.object.read_bit_double()?;

        Ok(Point {
            common,
            location,
            thickness,
            normal,
            x_axis_angle,
        })
    }

    fn read_ellipse(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Ellipse> {
        let center = streams.object.read_3bit_double()?;
        let major_axis = streams.object.read_3bit_double()?;
        let normal = streams.object.read_3bit_double()?;
        let minor_axis_ratio = streams.object.read_bit_double()?;
        if !(minor_axis_ratio > 0.0 && minor_axis_ratio <= 1.0) {
            return Err(DwgError::Parse(format!(
                "ellipse axis ratio {minor_axis_ratio} outside (0, 1]"
            )));
        }
        let start_parameter = streams.object.read_bit_double()?;
        let end_parameter = streams.object.read_bit_double()?;

        Ok(Ellipse {
            common,
            center,
            major_axis,
            minor_axis_ratio,
            start_parameter,
            end_parameter,
            normal,
        })
    }

    /// LWPOLYLINE: flag-gated scalars, counts, the first vertex as 2RD
    /// and the rest as DD deltas against the previous vertex.
    fn read_lwpolyline(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<LwPolyline> {
        let flags = streams.object.read_bit_short()? as u16;

        let const_width = if flags & 0x04 != 0 {
            Some(streams.object.read_bit_double()?)
        } else {
            None
        };
        let elevation = if flags & 0x08 != 0 {
            Some(streams.object.read_bit_double()?)
        } else {
            None
        };
        let thickness = if flags & 0x02 != 0 {
            Some(streams.object.read_bit_double()?)
        } else {
            None
        };
        let normal = if flags & 0x01 != 0 {
            Some(streams.object.read_3bit_double()?)
        } else {
            None
        };

        let num_vertices = read_count(streams, "vertex")?;
        let num_bulges = if flags & 0x10 != 0 {
            read_count(streams, "bulge")?
        } else {
            0
        };
        let num_vertex_ids = if self.flags.r2010_plus && flags & 0x400 != 0 {
            read_count(streams, "vertex id")?
        } else {
            0
        };
        let num_widths = if flags & 0x20 != 0 {
            read_count(streams, "width")?
        } else {
            0
        };

        let mut vertices = Vec::with_capacity(num_vertices);
        if num_vertices > 0 {
            let mut previous = streams.object.read_2raw_double()?;
            vertices.push(previous);
            for _ in 1..num_vertices {
                let x = streams.object.read_bit_double_with_default(previous.x)?;
                let y = streams.object.read_bit_double_with_default(previous.y)?;
                previous = Vector2::new(x, y);
                vertices.push(previous);
            }
        }

        // Bulges and widths normalize to one value per vertex.
        let mut bulges = Vec::new();
        if num_bulges > 0 {
            bulges = vec![0.0; num_vertices];
            for index in 0..num_bulges {
                let bulge = streams.object.read_bit_double()?;
                if index < bulges.len() {
                    bulges[index] = bulge;
                }
            }
        }

        for _ in 0..num_vertex_ids {
            let _vertex_id = streams.object.read_bit_long()?;
        }

        let mut widths = Vec::new();
        if num_widths > 0 || const_width.is_some() {
            let fill = const_width.unwrap_or(0.0);
            widths = vec![(fill, fill); num_vertices];
            for index in 0..num_widths {
                let start_width = streams.object.read_bit_double()?;
                let end_width = streams.object.read_bit_double()?;
                if index < widths.len() {
                    widths[index] = (start_width, end_width);
                }
            }
        }

        Ok(LwPolyline {
            common,
            flags,
            const_width,
            elevation,
            thickness,
            normal,
            vertices,
            bulges,
            widths,
        })
    }

    /// TEXT: a data-flags byte gates each optional field.
    fn read_text(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Text> {
        let data_flags = streams.object.read_raw_char()?;

        let elevation = if data_flags & 0x01 == 0 {
            streams.object.read_raw_double()?
        } else {
            0.0
        };

        let insertion_2d = streams.object.read_2raw_double()?;
        let insertion = Vector3::new(insertion_2d.x, insertion_2d.y, elevation);

        let alignment = if data_flags & 0x02 == 0 {
            let x = streams
                .object
                .read_bit_double_with_default(insertion_2d.x)?;
            let y = streams
                .object
                .read_bit_double_with_default(insertion_2d.y)?;
            Some(Vector3::new(x, y, elevation))
        } else {
            None
        };

        let normal = streams.object.read_bit_extrusion()?;
        let thickness = streams.object.read_bit_thickness()?;

        let oblique_angle = if data_flags & 0x04 == 0 {
            streams.object.read_raw_double()?
        } else {
            0.0
        };
        let rotation = if data_flags & 0x08 == 0 {
            streams.object.read_raw_double()?
        } else {
            0.0
        };

        let height = streams.object.read_raw_double()?;

        let width_factor = if data_flags & 0x10 == 0 {
            streams.object.read_raw_double()?
        } else {
            1.0
        };

        let value = streams.read_text()?;

        let generation = if data_flags & 0x20 == 0 {
            streams.object.read_bit_short()? as u16
        } else {
            0
        };
        let horizontal_alignment = if data_flags & 0x40 == 0 {
            streams.object.read_bit_short()? as u16
        } else {
            0
        };
        let vertical_alignment = if data_flags & 0x80 == 0 {
            streams.object.read_bit_short()? as u16
        } else {
            0
        };

        let style_handle = Handle::new(streams.handle_ref()?);

        Ok(Text {
            common,
            value,
            insertion,
            alignment,
            normal,
            thickness,
            oblique_angle,
            rotation,
            height,
            width_factor,
            generation,
            horizontal_alignment,
            vertical_alignment,
            style_handle,
        })
    }

    fn read_mtext(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<MText> {
        let insertion = streams.object.read_3bit_double()?;
        let normal = streams.object.read_3bit_double()?;
        let direction = streams.object.read_3bit_double()?;
        let rect_width = streams.object.read_bit_double()?;
        if self.flags.r2007_plus {
            let _rect_height = streams.object.read_bit_double()?;
        }
        let height = streams.object.read_bit_double()?;
        let attachment = streams.object.read_bit_short()? as u16;
        let drawing_direction = streams.object.read_bit_short()? as u16;
        let _extents_height = streams.object.read_bit_double()?;
        let _extents_width = streams.object.read_bit_double()?;
        let value = streams.read_text()?;
        let line_spacing_style = streams.object.read_bit_short()? as u16;
        let line_spacing_factor = streams.object.read_bit_double()?;
        let _unknown_bit = streams.object.read_bit()?;

        let background_flags = if self.flags.r2004_plus {
            let bg_flags = streams.object.read_bit_long()? as u32;
            if bg_flags & 0x01 != 0 || bg_flags & 0x10 != 0 {
                let _scale_factor = streams.object.read_bit_double()?;
                let _bg_color = streams.object.read_cm_color()?;
                let _transparency = streams.object.read_bit_long()?;
            }
            Some(bg_flags)
        } else {
            None
        };

        let style_handle = Handle::new(streams.handle_ref()?);

        Ok(MText {
            common,
            value,
            insertion,
            normal,
            direction,
            rect_width,
            height,
            attachment,
            drawing_direction,
            line_spacing_style,
            line_spacing_factor,
            background_flags,
            style_handle,
        })
    }

    /// INSERT: scale encoding selected by a 2-bit flag.
    fn read_insert(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Insert> {
        let insertion = streams.object.read_3bit_double()?;

        let data_flags = streams.object.read_2bits()?;
        let (x_scale, y_scale, z_scale) = match data_flags {
            3 => (1.0, 1.0, 1.0),
            2 => {
                let uniform = streams.object.read_raw_double()?;
                (uniform, uniform, uniform)
            }
            1 => {
                let y = streams.object.read_bit_double_with_default(1.0)?;
                let z = streams.object.read_bit_double_with_default(1.0)?;
                (1.0, y, z)
            }
            _ => {
                let x = streams.object.read_raw_double()?;
                let y = streams.object.read_bit_double_with_default(x)?;
                let z = streams.object.read_bit_double_with_default(x)?;
                (x, y, z)
            }
        };

        let rotation = streams.object.read_bit_double()?;
        let normal = streams.object.read_3bit_double()?;
        let has_attributes = streams.object.read_bit()?;

        let owned_count = if has_attributes && self.flags.r2004_plus {
            let count = streams.object.read_bit_long()?;
            if !(0..=100_000).contains(&count) {
                return Err(DwgError::Parse(format!(
                    "implausible attribute count {count}"
                )));
            }
            count as usize
        } else {
            0
        };

        let block_handle = Handle::new(streams.handle_ref()?);

        // Consume the attribute chain handles so later readers of the
        // handle stream stay aligned.
        if has_attributes {
            if self.flags.r2004_plus {
                for _ in 0..owned_count {
                    let _attribute = streams.handle_ref()?;
                }
            } else {
                let _first_attribute = streams.handle_ref()?;
                let _last_attribute = streams.handle_ref()?;
            }
            let _seqend = streams.handle_ref()?;
        }

        Ok(Insert {
            common,
            insertion,
            x_scale,
            y_scale,
            z_scale,
            rotation,
            normal,
            has_attributes,
            block_handle,
        })
    }

    /// The prologue shared by every dimension subtype.
    fn read_dimension_common(
        &mut self,
        streams: &mut ObjectStreams<'_>,
    ) -> Result<DimensionCommon> {
        if self.flags.r2010_plus {
            let _version = streams.object.read_raw_char()?;
        }

        let normal = streams.object.read_3bit_double()?;
        let text_midpoint = streams.object.read_2raw_double()?;
        let elevation = streams.object.read_bit_double()?;
        let flags = streams.object.read_raw_char()?;
        let text = streams.read_text()?;
        let text_rotation = streams.object.read_bit_double()?;
        let horizontal_direction = streams.object.read_bit_double()?;
        let insert_scale = streams.object.read_3bit_double()?;
        let insert_rotation = streams.object.read_bit_double()?;
        let attachment_point = streams.object.read_bit_short()? as u16;
        let line_spacing_style = streams.object.read_bit_short()? as u16;
        let line_spacing_factor = streams.object.read_bit_double()?;
        let actual_measurement = streams.object.read_bit_double()?;
        let _unknown = streams.object.read_bit()?;
        let _flip_arrow1 = streams.object.read_bit()?;
        let _flip_arrow2 = streams.object.read_bit()?;
        let insertion = streams.object.read_2raw_double()?;

        Ok(DimensionCommon {
            normal,
            text_midpoint,
            elevation,
            flags,
            text,
            text_rotation,
            horizontal_direction,
            insert_scale,
            insert_rotation,
            attachment_point,
            line_spacing_style,
            line_spacing_factor,
            actual_measurement,
            insertion,
            dimstyle_handle: Handle::NULL,
            block_handle: Handle::NULL,
        })
    }

    /// Trailing dimension handles: style, then the anonymous block.
    fn read_dimension_handles(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        dim: &mut DimensionCommon,
    ) -> Result<()> {
        dim.dimstyle_handle = Handle::new(streams.handle_ref()?);
        dim.block_handle = Handle::new(streams.handle_ref()?);
        Ok(())
    }

    fn read_dim_linear(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
    ) -> Result<Dimension> {
        let mut dim = self.read_dimension_common(streams)?;

        let first_point = streams.object.read_3bit_double()?;
        let second_point = streams.object.read_3bit_double()?;
        let definition_point = streams.object.read_3bit_double()?;
        let ext_line_rotation = streams.object.read_bit_double()?;
        let rotation = streams.object.read_bit_double()?;

        self.read_dimension_handles(streams, &mut dim)?;

        Ok(Dimension {
            common,
            dim,
            kind: DimensionKind::Linear {
                first_point,
                second_point,
                definition_point,
                rotation,
                ext_line_rotation,
            },
        })
    }

    fn read_dim_radial(
        &mut self,
        streams: &mut ObjectStreams<'_>,
        common: EntityCommon,
        diameter: bool,
    ) -> Result<Dimension> {
        let mut dim = self.read_dimension_common(streams)?;

        let definition_point = streams.object.read_3bit_double()?;
        let chord_point = streams.object.read_3bit_double()?;
        let leader_length = streams.object.read_bit_double()?;

        self.read_dimension_handles(streams, &mut dim)?;

        let kind = if diameter {
            DimensionKind::Diameter {
                definition_point,
                chord_point,
                leader_length,
            }
        } else {
            DimensionKind::Radius {
                definition_point,
                chord_point,
                leader_length,
            }
        };

        Ok(Dimension { common, dim, kind })
    }
}

/// Read a BL count field, rejecting implausible values.
fn read_count(streams: &mut ObjectStreams<'_>, what: &str) -> Result<usize> {
    let count = streams.object.read_bit_long()?;
    if !(0..=10_000_000).contains(&count) {
        return Err(DwgError::Parse(format!(
            "implausible {what} count {count}"
        )));
    }
    Ok(count as usize)
}
