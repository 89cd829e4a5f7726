//! LAYER table entry parsing.
//!
//! Layers are the one symbol table the document model keeps: entity
//! layer handles resolve against it and the CLI reports it.

use super::object_reader::{ObjectReader, ObjectStreams};
use crate::document::LayerRecord;
use crate::error::Result;
use crate::types::Handle;

impl ObjectReader<'_> {
    pub(super) fn read_layer(
        &mut self,
        _handle: Handle,
        streams: &mut ObjectStreams<'_>,
    ) -> Result<LayerRecord> {
        let handle = self.read_common_non_entity_data(streams)?;

        let name = streams.read_text()?;

        // Xref dependency block differs at AC1021.
        if self.flags.r2007_plus {
            let _xref_index = streams.object.read_bit_short()?;
        } else {
            let _referenced = streams.object.read_bit()?;
            let _xref_index = streams.object.read_bit_short()?;
            let _xref_dependent = streams.object.read_bit()?;
        }

        // Packed word: frozen/on/locked/plot bits plus the lineweight.
        let flags = streams.object.read_bit_short()?;

        let color = streams.object.read_cm_color()?;

        let _layer_control = streams.handle_ref()?;
        let _external_reference = streams.handle_ref()?;
        let _plotstyle = streams.handle_ref()?;
        if self.flags.r2007_plus {
            let _material = streams.handle_ref()?;
        }
        let linetype_handle = Handle::new(streams.handle_ref()?);

        Ok(LayerRecord {
            handle,
            name,
            color,
            flags,
            linetype_handle,
        })
    }
}
