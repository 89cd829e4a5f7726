//! Bit-granular reader for DWG object data.
//!
//! DWG object data is packed without byte alignment; every value carries
//! its own small tag or length prefix. This reader keeps a
//! `(byte_pos, bit_pos)` cursor over a borrowed slice and implements the
//! typed encodings: B, BB, 3B, BS, BL, BLL, BD, DD, MC, MS, RC/RS/RL/RD,
//! 2RD/2BD/3BD, BE, BT, CMC/ENC, H, and TV/TU text.
//!
//! Reads past the end of the buffer fail with
//! [`DwgError::BitUnderflow`]. The cursor advances monotonically; parsers
//! that peek must save and restore the bit position explicitly.

use encoding_rs::Encoding;

use crate::error::{DwgError, Result};
use crate::types::{Color, DwgVersion, HandleKind, Vector2, Vector3};

/// A raw handle reference as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRef {
    /// Code nibble distinguishing absolute/pointer/relative forms
    pub code: u8,
    /// Number of value bytes that followed
    pub counter: u8,
    /// Value bytes interpreted as an unsigned big-endian integer
    pub value: u64,
}

impl HandleRef {
    /// Classify the reference by its code nibble.
    pub fn kind(&self) -> HandleKind {
        HandleKind::from_code(self.code)
    }
}

/// Bit-level reader over a borrowed data slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
    version: DwgVersion,
    encoding: &'static Encoding,
    /// Set when a separate string stream was expected but absent; text
    /// reads then yield empty strings.
    empty: bool,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data` for the given version.
    pub fn new(data: &'a [u8], version: DwgVersion) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
            version,
            encoding: encoding_rs::WINDOWS_1252,
            empty: false,
        }
    }

    /// The version this reader gates conditional encodings on.
    pub fn version(&self) -> DwgVersion {
        self.version
    }

    /// Override the code-page encoding used for pre-AC1021 text.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    /// Total length of the underlying slice in bits.
    pub fn len_bits(&self) -> u64 {
        (self.data.len() as u64) * 8
    }

    /// Current cursor position in bits from the start of the slice.
    pub fn position_in_bits(&self) -> u64 {
        (self.byte_pos as u64) * 8 + self.bit_pos as u64
    }

    /// Move the cursor to an absolute bit position.
    pub fn set_position_in_bits(&mut self, position: u64) {
        self.byte_pos = (position / 8) as usize;
        self.bit_pos = (position % 8) as u8;
    }

    /// Whether this reader was marked as having no string stream.
    pub fn is_empty_stream(&self) -> bool {
        self.empty
    }

    fn underflow(&self) -> DwgError {
        DwgError::BitUnderflow {
            bit_position: self.position_in_bits(),
        }
    }

    fn advance_bits(&mut self, bits: u8) {
        let total = self.bit_pos as usize + bits as usize;
        self.byte_pos += total / 8;
        self.bit_pos = (total % 8) as u8;
    }

    /// Read up to 64 bits MSB-first, assembling byte-at-a-time.
    pub fn read_bits(&mut self, count: u8) -> Result<u64> {
        debug_assert!(count <= 64);
        let mut remaining = count;
        let mut value = 0u64;

        while remaining > 0 {
            if self.byte_pos >= self.data.len() {
                return Err(self.underflow());
            }
            let available = 8 - self.bit_pos;
            let take = remaining.min(available);
            let aligned = self.data[self.byte_pos] << self.bit_pos;
            let chunk = aligned >> (8 - take);
            value = (value << take) | chunk as u64;
            self.advance_bits(take);
            remaining -= take;
        }

        Ok(value)
    }

    /// Skip `count` whole bytes of bit-packed data.
    pub fn advance_bytes(&mut self, count: usize) -> Result<()> {
        let target = self.position_in_bits() + (count as u64) * 8;
        if target > self.len_bits() {
            return Err(self.underflow());
        }
        self.set_position_in_bits(target);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Bit codes
    // -------------------------------------------------------------------

    /// B: a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// BB: two bits.
    pub fn read_2bits(&mut self) -> Result<u8> {
        Ok(self.read_bits(2)? as u8)
    }

    /// 3B: three bits (the BLL length selector).
    pub fn read_3bits(&mut self) -> Result<u8> {
        Ok(self.read_bits(3)? as u8)
    }

    /// RC: one raw byte, straddling the bit cursor.
    pub fn read_raw_char(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if self.bit_pos == 0 {
            let end = self
                .byte_pos
                .checked_add(count)
                .ok_or_else(|| self.underflow())?;
            if end > self.data.len() {
                return Err(self.underflow());
            }
            let out = self.data[self.byte_pos..end].to_vec();
            self.byte_pos = end;
            return Ok(out);
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_raw_char()?);
        }
        Ok(out)
    }

    /// RS: raw short, little-endian.
    pub fn read_raw_short(&mut self) -> Result<i16> {
        Ok(self.read_raw_ushort()? as i16)
    }

    /// RS: raw unsigned short, little-endian.
    pub fn read_raw_ushort(&mut self) -> Result<u16> {
        let lo = self.read_raw_char()? as u16;
        let hi = self.read_raw_char()? as u16;
        Ok(lo | (hi << 8))
    }

    /// RL: raw long, little-endian.
    pub fn read_raw_long(&mut self) -> Result<i32> {
        let lo = self.read_raw_ushort()? as u32;
        let hi = self.read_raw_ushort()? as u32;
        Ok((lo | (hi << 16)) as i32)
    }

    /// RD: raw IEEE double, little-endian.
    pub fn read_raw_double(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut() {
            *byte = self.read_raw_char()?;
        }
        Ok(f64::from_le_bytes(bytes))
    }

    /// 2RD: two raw doubles.
    pub fn read_2raw_double(&mut self) -> Result<Vector2> {
        let x = self.read_raw_double()?;
        let y = self.read_raw_double()?;
        Ok(Vector2::new(x, y))
    }

    /// BS: bit short.
    pub fn read_bit_short(&mut self) -> Result<i16> {
        match self.read_2bits()? {
            0 => self.read_raw_short(),
            1 => Ok(self.read_raw_char()? as i16),
            2 => Ok(0),
            _ => Ok(256),
        }
    }

    /// BL: bit long.
    pub fn read_bit_long(&mut self) -> Result<i32> {
        match self.read_2bits()? {
            0 => self.read_raw_long(),
            1 => Ok(self.read_raw_char()? as i32),
            2 => Ok(0),
            _ => Err(DwgError::Parse("reserved BL tag 0b11".into())),
        }
    }

    /// BLL: bit long long — 3-bit byte count then that many bytes,
    /// low byte first.
    pub fn read_bit_long_long(&mut self) -> Result<u64> {
        let size = self.read_3bits()?;
        let mut value = 0u64;
        for i in 0..size {
            let byte = self.read_raw_char()? as u64;
            value |= byte << (8 * i as u64);
        }
        Ok(value)
    }

    /// BD: bit double.
    pub fn read_bit_double(&mut self) -> Result<f64> {
        match self.read_2bits()? {
            0 => self.read_raw_double(),
            1 => Ok(1.0),
            2 => Ok(0.0),
            _ => Err(DwgError::Parse("reserved BD tag 0b11".into())),
        }
    }

    /// DD: bit double patching a default value.
    pub fn read_bit_double_with_default(&mut self, default: f64) -> Result<f64> {
        match self.read_2bits()? {
            0 => Ok(default),
            1 => {
                let mut bytes = default.to_le_bytes();
                for slot in bytes.iter_mut().take(4) {
                    *slot = self.read_raw_char()?;
                }
                Ok(f64::from_le_bytes(bytes))
            }
            2 => {
                let mut bytes = default.to_le_bytes();
                bytes[4] = self.read_raw_char()?;
                bytes[5] = self.read_raw_char()?;
                bytes[0] = self.read_raw_char()?;
                bytes[1] = self.read_raw_char()?;
                bytes[2] = self.read_raw_char()?;
                bytes[3] = self.read_raw_char()?;
                Ok(f64::from_le_bytes(bytes))
            }
            _ => self.read_raw_double(),
        }
    }

    /// 2BD: two bit doubles.
    pub fn read_2bit_double(&mut self) -> Result<Vector2> {
        let x = self.read_bit_double()?;
        let y = self.read_bit_double()?;
        Ok(Vector2::new(x, y))
    }

    /// 3BD: three bit doubles.
    pub fn read_3bit_double(&mut self) -> Result<Vector3> {
        let x = self.read_bit_double()?;
        let y = self.read_bit_double()?;
        let z = self.read_bit_double()?;
        Ok(Vector3::new(x, y, z))
    }

    /// BE: bit extrusion — flag bit means the default (0, 0, 1).
    pub fn read_bit_extrusion(&mut self) -> Result<Vector3> {
        if self.read_bit()? {
            Ok(Vector3::UNIT_Z)
        } else {
            self.read_3bit_double()
        }
    }

    /// BT: bit thickness — flag bit means 0.0.
    pub fn read_bit_thickness(&mut self) -> Result<f64> {
        if self.read_bit()? {
            Ok(0.0)
        } else {
            self.read_bit_double()
        }
    }

    // -------------------------------------------------------------------
    // Modular values
    // -------------------------------------------------------------------

    /// MC: unsigned modular char — 7-bit groups, high bit continues,
    /// little-endian assembly.
    pub fn read_modular_char(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_raw_char()?;
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(DwgError::Parse("modular char does not terminate".into()));
            }
        }
    }

    /// Signed MC: the terminating byte carries the sign in bit 6.
    pub fn read_signed_modular_char(&mut self) -> Result<i64> {
        let mut value = 0i64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_raw_char()?;
            if byte & 0x80 == 0 {
                value |= ((byte & 0x3F) as i64) << shift;
                if byte & 0x40 != 0 {
                    value = -value;
                }
                return Ok(value);
            }
            value |= ((byte & 0x7F) as i64) << shift;
            shift += 7;
            if shift > 62 {
                return Err(DwgError::Parse(
                    "signed modular char does not terminate".into(),
                ));
            }
        }
    }

    /// MS: modular short — 15-bit groups, high bit of the second byte
    /// continues.
    pub fn read_modular_short(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let word = self.read_raw_ushort()? as u32;
            value |= (word & 0x7FFF) << shift;
            if word & 0x8000 == 0 {
                return Ok(value);
            }
            shift += 15;
            if shift > 30 {
                return Err(DwgError::Parse("modular short does not terminate".into()));
            }
        }
    }

    // -------------------------------------------------------------------
    // Handles
    // -------------------------------------------------------------------

    /// H: code nibble, length nibble, then that many value bytes
    /// interpreted as unsigned big-endian.
    pub fn read_handle(&mut self) -> Result<HandleRef> {
        let prefix = self.read_raw_char()?;
        let code = prefix >> 4;
        let counter = prefix & 0x0F;
        if counter > 8 {
            return Err(DwgError::Parse(format!(
                "handle byte count {counter} exceeds maximum of 8"
            )));
        }
        let mut value = 0u64;
        for _ in 0..counter {
            value = (value << 8) | self.read_raw_char()? as u64;
        }
        Ok(HandleRef {
            code,
            counter,
            value,
        })
    }

    /// Read a handle reference and resolve the relative forms against the
    /// referencing object's handle.
    pub fn handle_reference(&mut self, base: u64) -> Result<u64> {
        let handle = self.read_handle()?;
        match handle.code {
            0..=5 => Ok(handle.value),
            0x6 => Ok(base.wrapping_add(1)),
            0x8 => Ok(base.wrapping_sub(1)),
            0xA => Ok(base.wrapping_add(handle.value)),
            0xC => Ok(base.wrapping_sub(handle.value)),
            code => Err(DwgError::Parse(format!(
                "invalid handle reference code {code:#X}"
            ))),
        }
    }

    // -------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------

    /// TV/TU: variable text. BS length, then code-page bytes (pre-AC1021)
    /// or that many UTF-16LE code units (AC1021+).
    pub fn read_variable_text(&mut self) -> Result<String> {
        if self.empty {
            return Ok(String::new());
        }
        let length = self.read_bit_short()?;
        if length <= 0 {
            return Ok(String::new());
        }
        if self.version >= DwgVersion::Ac1021 {
            let bytes = self.read_bytes((length as usize) * 2)?;
            let (decoded, _, _) = encoding_rs::UTF_16LE.decode(&bytes);
            Ok(decoded.replace('\0', ""))
        } else {
            let bytes = self.read_bytes(length as usize)?;
            let (decoded, _, _) = self.encoding.decode(&bytes);
            Ok(decoded.replace('\0', ""))
        }
    }

    /// Read a 16-byte section sentinel.
    pub fn read_sentinel(&mut self) -> Result<[u8; 16]> {
        let bytes = self.read_bytes(16)?;
        let mut sentinel = [0u8; 16];
        sentinel.copy_from_slice(&bytes);
        Ok(sentinel)
    }

    // -------------------------------------------------------------------
    // Colors
    // -------------------------------------------------------------------

    /// CMC: the full color encoding used outside entity headers.
    pub fn read_cm_color(&mut self) -> Result<Color> {
        if self.version >= DwgVersion::Ac1018 {
            let _index = self.read_bit_short()?;
            let rgb = self.read_bit_long()? as u32;
            let bytes = rgb.to_le_bytes();

            let color = if rgb == 0xC000_0000 {
                Color::ByLayer
            } else if rgb & 0x0100_0000 != 0 {
                Color::Index(bytes[0])
            } else {
                Color::from_rgb(bytes[2], bytes[1], bytes[0])
            };

            // Color byte: &1 color name follows, &2 book name follows.
            let flags = self.read_raw_char()?;
            if flags & 1 != 0 {
                let _ = self.read_variable_text()?;
            }
            if flags & 2 != 0 {
                let _ = self.read_variable_text()?;
            }
            Ok(color)
        } else {
            let index = self.read_bit_short()?;
            Ok(Color::from_index(index))
        }
    }

    /// ENC: the compact entity color encoding.
    ///
    /// Returns the color and whether an AcDbColor handle follows in the
    /// handle stream (AC1018+ book colors).
    pub fn read_en_color(&mut self) -> Result<(Color, bool)> {
        if self.version >= DwgVersion::Ac1018 {
            let word = self.read_bit_short()? as u16;
            if word == 0 {
                return Ok((Color::ByBlock, false));
            }

            let flags = word & 0xFF00;
            let mut has_color_handle = false;

            let color = if flags & 0x4000 != 0 {
                has_color_handle = true;
                Color::ByBlock
            } else if flags & 0x8000 != 0 {
                let rgb = self.read_bit_long()? as u32;
                let bytes = rgb.to_le_bytes();
                Color::from_rgb(bytes[2], bytes[1], bytes[0])
            } else {
                Color::from_index((word & 0x0FFF) as i16)
            };

            if flags & 0x2000 != 0 {
                let _transparency = self.read_bit_long()?;
            }

            Ok((color, has_color_handle))
        } else {
            let index = self.read_bit_short()?;
            Ok((Color::from_index(index), false))
        }
    }

    // -------------------------------------------------------------------
    // Object type
    // -------------------------------------------------------------------

    /// OT: object type code. BS before AC1024; a 2-bit-tagged compact
    /// form from AC1024 on.
    pub fn read_object_type(&mut self) -> Result<i16> {
        if self.version >= DwgVersion::Ac1024 {
            match self.read_2bits()? {
                0 => Ok(self.read_raw_char()? as i16),
                1 => Ok(0x1F0 + self.read_raw_char()? as i16),
                _ => self.read_raw_short(),
            }
        } else {
            self.read_bit_short()
        }
    }

    // -------------------------------------------------------------------
    // String stream positioning (AC1021+)
    // -------------------------------------------------------------------

    /// Position this reader at the start of the separate string stream
    /// that ends at `end_position` (in bits), per the present-flag stored
    /// in the last bit before it.
    ///
    /// Returns the stream's start position. When the flag is clear the
    /// reader is marked empty and text reads yield empty strings.
    pub fn set_position_by_flag(&mut self, end_position: u64) -> Result<u64> {
        self.set_position_in_bits(end_position);
        let present = self.read_bit()?;

        if !present {
            self.empty = true;
            self.set_position_in_bits(self.len_bits());
            return Ok(end_position);
        }

        // Size word sits 16 bits before the end; a set 0x8000 bit chains a
        // second word 16 bits earlier carrying the high bits.
        if end_position < 32 {
            return Err(DwgError::Parse(
                "string stream end position before stream start".into(),
            ));
        }
        let mut boundary = end_position - 16;
        self.set_position_in_bits(boundary);
        let mut size = self.read_raw_ushort()? as u64;
        if size & 0x8000 != 0 {
            boundary -= 16;
            self.set_position_in_bits(boundary);
            size &= 0x7FFF;
            let high = self.read_raw_ushort()? as u64;
            size += high << 15;
        }

        if size > boundary {
            return Err(DwgError::Parse(format!(
                "string stream size {size} exceeds boundary {boundary}"
            )));
        }
        let start = boundary - size;
        self.set_position_in_bits(start);
        Ok(start)
    }
}
