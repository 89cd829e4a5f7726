//! Common entity and non-entity header parsing.
//!
//! Every object starts with a shared prologue: its handle, extended
//! data, an optional graphics blob, and (for entities) the mode bits,
//! reactor count, color, linetype scale, and the flag pairs gating the
//! cross-reference handles. All of it is version-conditional.
//!
//! For AC1015/AC1018 the prologue opens with an RL giving the object
//! data size in bits, which locates the trailing handle stream. From
//! AC1024 on that position is known before the type code is read.

use super::object_reader::{ObjectReader, ObjectStreams};
use crate::entities::EntityCommon;
use crate::error::{DwgError, Result};
use crate::types::Handle;

impl ObjectReader<'_> {
    /// Position the handle (and AC1021 text) sub-streams from the RL
    /// object-data size at the head of the common data.
    fn position_trailing_streams(&mut self, streams: &mut ObjectStreams<'_>) -> Result<()> {
        let bitsize = streams.object.read_raw_long()?;
        if bitsize < 0 {
            return Err(DwgError::Parse("negative object bit size".into()));
        }
        let start = streams.body_start_bits + bitsize as u64;
        if start > streams.data_end_bits {
            return Err(DwgError::Parse(format!(
                "handle stream start {start} past object end {}",
                streams.data_end_bits
            )));
        }
        streams.handles.set_position_in_bits(start);
        streams.handle_stream_start = Some(start);

        if self.flags.r2007_plus {
            streams.text.set_position_by_flag(start - 1)?;
            streams.separate_text = true;
        }
        Ok(())
    }

    /// Skip the extended (application) data block.
    fn skip_extended_data(&mut self, streams: &mut ObjectStreams<'_>) -> Result<()> {
        loop {
            let size = streams.object.read_bit_short()?;
            if size <= 0 {
                return Ok(());
            }
            let _app_handle = streams.object.read_handle()?;
            streams.object.advance_bytes(size as usize)?;
        }
    }

    /// Skip the proxy graphics blob when the present-bit is set.
    fn skip_graphics(&mut self, streams: &mut ObjectStreams<'_>) -> Result<()> {
        if !streams.object.read_bit()? {
            return Ok(());
        }
        let size = if self.flags.r2010_plus {
            streams.object.read_bit_long_long()?
        } else {
            streams.object.read_raw_long()? as i64 as u64
        };
        if size > 16 * 1024 * 1024 {
            return Err(DwgError::Parse(format!(
                "implausible graphics blob of {size} bytes"
            )));
        }
        streams.object.advance_bytes(size as usize)
    }

    /// Read the common entity data shared by every graphical entity.
    ///
    /// On return the object stream is positioned at the first
    /// type-specific field and the handle stream has consumed the
    /// cross-references up to (and including) the plot-style group.
    pub(super) fn read_common_entity_data(
        &mut self,
        streams: &mut ObjectStreams<'_>,
    ) -> Result<EntityCommon> {
        if !self.flags.r2010_plus {
            self.position_trailing_streams(streams)?;
        }

        let handle = streams.object.read_handle()?.value;
        streams.current_handle = handle;

        self.skip_extended_data(streams)?;
        self.skip_graphics(streams)?;

        let entity_mode = streams.object.read_2bits()?;
        if entity_mode == 0 {
            let _owner = streams.handle_ref()?;
        }

        let num_reactors = streams.object.read_bit_long()?;
        if !(0..=10_000).contains(&num_reactors) {
            return Err(DwgError::Parse(format!(
                "implausible reactor count {num_reactors}"
            )));
        }

        let xdict_missing = if self.flags.r2004_plus {
            streams.object.read_bit()?
        } else {
            false
        };
        if self.flags.r2013_plus {
            let _has_ds_data = streams.object.read_bit()?;
        }

        for _ in 0..num_reactors {
            let _reactor = streams.handle_ref()?;
        }
        if !xdict_missing {
            let _xdict = streams.handle_ref()?;
        }

        // AC1015: previous/next entity links.
        if !self.flags.r2004_plus {
            let no_links = streams.object.read_bit()?;
            if !no_links {
                let _previous = streams.handle_ref()?;
                let _next = streams.handle_ref()?;
            }
        }

        let (color, has_color_handle) = streams.object.read_en_color()?;
        if has_color_handle {
            let _color_handle = streams.handle_ref()?;
        }

        let linetype_scale = streams.object.read_bit_double()?;

        let layer_handle = streams.handle_ref()?;

        let linetype_flags = streams.object.read_2bits()?;
        if linetype_flags == 3 {
            let _linetype = streams.handle_ref()?;
        }

        if self.flags.r2007_plus {
            let material_flags = streams.object.read_2bits()?;
            if material_flags == 3 {
                let _material = streams.handle_ref()?;
            }
            let _shadow_flags = streams.object.read_raw_char()?;
        }

        let plotstyle_flags = streams.object.read_2bits()?;
        if plotstyle_flags == 3 {
            let _plotstyle = streams.handle_ref()?;
        }

        if self.flags.r2010_plus {
            let has_full_visualstyle = streams.object.read_bit()?;
            let has_face_visualstyle = streams.object.read_bit()?;
            let has_edge_visualstyle = streams.object.read_bit()?;
            if has_full_visualstyle {
                let _ = streams.handle_ref()?;
            }
            if has_face_visualstyle {
                let _ = streams.handle_ref()?;
            }
            if has_edge_visualstyle {
                let _ = streams.handle_ref()?;
            }
        }

        let invisibility = streams.object.read_bit_short()?;
        let lineweight = streams.object.read_raw_char()? as i16;

        Ok(EntityCommon {
            handle: Handle::new(handle),
            layer_handle: Handle::new(layer_handle),
            color,
            entity_mode,
            linetype_scale,
            invisible: invisibility & 1 != 0,
            lineweight,
        })
    }

    /// Read the common data of a non-graphical object (table entries).
    ///
    /// Returns the object's handle; the handle stream is positioned past
    /// the owner, reactor, and xdict references.
    pub(super) fn read_common_non_entity_data(
        &mut self,
        streams: &mut ObjectStreams<'_>,
    ) -> Result<Handle> {
        if !self.flags.r2010_plus {
            self.position_trailing_streams(streams)?;
        }

        let handle = streams.object.read_handle()?.value;
        streams.current_handle = handle;

        self.skip_extended_data(streams)?;

        let num_reactors = streams.object.read_bit_long()?;
        if !(0..=10_000).contains(&num_reactors) {
            return Err(DwgError::Parse(format!(
                "implausible reactor count {num_reactors}"
            )));
        }

        let xdict_missing = if self.flags.r2004_plus {
            streams.object.read_bit()?
        } else {
            false
        };
        if self.flags.r2013_plus {
            let _has_ds_data = streams.object.read_bit()?;
        }

        let _owner = streams.handle_ref()?;
        for _ in 0..num_reactors {
            let _reactor = streams.handle_ref()?;
        }
        if !xdict_missing {
            let _xdict = streams.handle_ref()?;
        }

        Ok(Handle::new(handle))
    }
}
