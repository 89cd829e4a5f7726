//! AcDb:Classes section parsing.
//!
//! Object type codes at or above 500 index into the class definitions
//! stored here. The decoder only needs the class-number → DXF-name map,
//! so anything else in a class record is read and dropped.

use std::collections::HashMap;

use super::constants::sentinels;
use super::bit_reader::BitReader;
use crate::error::Result;
use crate::types::DwgVersion;

/// One class definition.
#[derive(Debug, Clone)]
pub struct DwgClass {
    pub class_number: i16,
    pub dxf_name: String,
    /// Item class id: 0x1F2 marks an entity class, 0x1F3 an object class.
    pub item_class_id: i16,
}

/// Map from class number to definition.
#[derive(Debug, Clone, Default)]
pub struct ClassMap {
    by_number: HashMap<i16, DwgClass>,
}

impl ClassMap {
    pub fn get(&self, number: i16) -> Option<&DwgClass> {
        self.by_number.get(&number)
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

/// Parse the classes section.
///
/// The section opens and closes with 16-byte sentinels around an RL data
/// size, a BS maximum class number, two reserved bytes, a flag bit, and
/// the class records. A malformed record list yields whatever parsed
/// cleanly; class data only feeds diagnostics.
pub fn parse(data: &[u8], version: DwgVersion) -> Result<ClassMap> {
    let mut map = ClassMap::default();
    if data.is_empty() {
        return Ok(map);
    }

    let mut reader = BitReader::new(data, version);
    let sentinel = reader.read_sentinel()?;
    if sentinel != sentinels::CLASSES_START {
        // Some files store classes without the sentinel framing.
        reader.set_position_in_bits(0);
    }

    let size = reader.read_raw_long()? as u32 as u64;
    let data_start_bits = reader.position_in_bits();
    let data_end_bits = data_start_bits.saturating_add(size * 8);

    let max_class_number = reader.read_bit_short()?;
    let _reserved0 = reader.read_raw_char()?;
    let _reserved1 = reader.read_raw_char()?;
    let _flag = reader.read_bit()?;

    while reader.position_in_bits() < data_end_bits {
        let record = (|| -> Result<DwgClass> {
            let class_number = reader.read_bit_short()?;
            let _proxy_flags = reader.read_bit_short()?;
            let _app_name = reader.read_variable_text()?;
            let _cpp_name = reader.read_variable_text()?;
            let dxf_name = reader.read_variable_text()?;
            let _was_zombie = reader.read_bit()?;
            let item_class_id = reader.read_bit_short()?;
            if version >= DwgVersion::Ac1018 {
                let _instance_count = reader.read_bit_long()?;
                let _dwg_version = reader.read_bit_short()?;
                let _maintenance_version = reader.read_bit_short()?;
                let _unknown0 = reader.read_bit_long()?;
                let _unknown1 = reader.read_bit_long()?;
            }
            Ok(DwgClass {
                class_number,
                dxf_name,
                item_class_id,
            })
        })();

        match record {
            Ok(class) => {
                let number = class.class_number;
                map.by_number.insert(number, class);
                if number >= max_class_number {
                    break;
                }
            }
            // Stop at the first malformed record; keep what parsed.
            Err(_) => break,
        }
    }

    Ok(map)
}
