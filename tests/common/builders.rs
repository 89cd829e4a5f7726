//! Synthetic DWG file builders.
//!
//! These mirror the reader's expectations bit for bit: a bit writer with
//! the typed encodings, an object record builder producing the common
//! entity prologue and type-specific bodies, and file assemblers for the
//! AC1015 locator layout and the AC1018-family paged layout.

use dwgread::io::dwg::crc::{crc16, section_page_checksum};
use dwgread::io::dwg::encryption;
use dwgread::types::DwgVersion;

pub const CRC16_SEED: u16 = 0xC0C1;

// ---------------------------------------------------------------------------
// Bit writer
// ---------------------------------------------------------------------------

/// MSB-first bit accumulator mirroring the reader's cursor model.
#[derive(Default)]
pub struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn write_bits(&mut self, value: u64, count: u8) {
        for shift in (0..count).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.write_bits(byte as u64, 8);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// RS: little-endian raw short.
    pub fn write_rs(&mut self, value: u16) {
        self.write_byte(value as u8);
        self.write_byte((value >> 8) as u8);
    }

    /// RL: little-endian raw long.
    pub fn write_rl(&mut self, value: u32) {
        self.write_rs(value as u16);
        self.write_rs((value >> 16) as u16);
    }

    /// RD: little-endian raw double.
    pub fn write_rd(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// BS: bit short with the shortest applicable form.
    pub fn write_bs(&mut self, value: i16) {
        match value {
            0 => self.write_bits(0b10, 2),
            256 => self.write_bits(0b11, 2),
            1..=255 => {
                self.write_bits(0b01, 2);
                self.write_byte(value as u8);
            }
            _ => {
                self.write_bits(0b00, 2);
                self.write_rs(value as u16);
            }
        }
    }

    /// BL: bit long with the shortest applicable form.
    pub fn write_bl(&mut self, value: i32) {
        match value {
            0 => self.write_bits(0b10, 2),
            1..=255 => {
                self.write_bits(0b01, 2);
                self.write_byte(value as u8);
            }
            _ => {
                self.write_bits(0b00, 2);
                self.write_rl(value as u32);
            }
        }
    }

    /// BD: bit double with the shortest applicable form.
    pub fn write_bd(&mut self, value: f64) {
        if value == 0.0 {
            self.write_bits(0b10, 2);
        } else if value == 1.0 {
            self.write_bits(0b01, 2);
        } else {
            self.write_bits(0b00, 2);
            self.write_rd(value);
        }
    }

    /// DD: keep the default or store a full double.
    pub fn write_dd(&mut self, value: f64, default: f64) {
        if value == default {
            self.write_bits(0b00, 2);
        } else {
            self.write_bits(0b11, 2);
            self.write_rd(value);
        }
    }

    /// BT: thickness.
    pub fn write_bt(&mut self, value: f64) {
        if value == 0.0 {
            self.write_bit(true);
        } else {
            self.write_bit(false);
            self.write_bd(value);
        }
    }

    /// BE: extrusion.
    pub fn write_be(&mut self, normal: (f64, f64, f64)) {
        if normal == (0.0, 0.0, 1.0) {
            self.write_bit(true);
        } else {
            self.write_bit(false);
            self.write_3bd(normal);
        }
    }

    pub fn write_3bd(&mut self, (x, y, z): (f64, f64, f64)) {
        self.write_bd(x);
        self.write_bd(y);
        self.write_bd(z);
    }

    pub fn write_2rd(&mut self, (x, y): (f64, f64)) {
        self.write_rd(x);
        self.write_rd(y);
    }

    /// H: handle with code nibble and minimal value bytes.
    pub fn write_h(&mut self, code: u8, value: u64) {
        let bytes = handle_bytes(value);
        self.write_bits(code as u64, 4);
        self.write_bits(bytes.len() as u64, 4);
        self.write_bytes(&bytes);
    }

    /// TV: code-page variable text (ASCII payloads only in tests).
    pub fn write_tv(&mut self, text: &str) {
        self.write_bs(text.len() as i16);
        self.write_bytes(text.as_bytes());
    }

    /// Patch a previously written RL at `bit_pos` with a new value.
    pub fn patch_rl(&mut self, bit_pos: usize, value: u32) {
        let bytes = value.to_le_bytes();
        for (index, byte) in bytes.iter().enumerate() {
            for shift in 0..8 {
                self.bits[bit_pos + index * 8 + shift] = (byte >> (7 - shift)) & 1 == 1;
            }
        }
    }

    /// Append another writer's bits.
    pub fn append(&mut self, other: &BitWriter) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Pack into bytes, zero-padding the final partial byte.
    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bits.len().div_ceil(8));
        for chunk in self.bits.chunks(8) {
            let mut byte = 0u8;
            for (index, &bit) in chunk.iter().enumerate() {
                if bit {
                    byte |= 1 << (7 - index);
                }
            }
            out.push(byte);
        }
        out
    }
}

fn handle_bytes(value: u64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.first() == Some(&0) {
        bytes.remove(0);
    }
    bytes
}

// ---------------------------------------------------------------------------
// Object records
// ---------------------------------------------------------------------------

fn r2004_plus(version: DwgVersion) -> bool {
    version >= DwgVersion::Ac1018
}

fn r2010_plus(version: DwgVersion) -> bool {
    version >= DwgVersion::Ac1024
}

/// Builds one object record: size prefix, common entity prologue, a
/// type-specific body, the trailing handle stream, and the CRC.
pub struct ObjectBuilder {
    version: DwgVersion,
    body: BitWriter,
    /// Bit position of the RL bit-size placeholder (pre-AC1024 layouts)
    rl_pos: Option<usize>,
    handle_stream: BitWriter,
}

impl ObjectBuilder {
    /// Start an entity object with the common prologue already written.
    ///
    /// `entity_mode` 2 = model space, 1 = paper space, 0 = block content
    /// (mode 0 adds an owner reference to the handle stream).
    pub fn entity(version: DwgVersion, type_code: u16, handle: u64, layer: u64) -> Self {
        Self::entity_with_mode(version, type_code, handle, layer, 2)
    }

    pub fn entity_with_mode(
        version: DwgVersion,
        type_code: u16,
        handle: u64,
        layer: u64,
        entity_mode: u8,
    ) -> Self {
        let mut body = BitWriter::new();
        let mut handle_stream = BitWriter::new();

        // Object type.
        if r2010_plus(version) {
            if type_code < 0x100 {
                body.write_bits(0b00, 2);
                body.write_byte(type_code as u8);
            } else {
                body.write_bits(0b10, 2);
                body.write_rs(type_code);
            }
        } else {
            body.write_bs(type_code as i16);
        }

        // RL object size in bits, patched at finish time.
        let rl_pos = if r2010_plus(version) {
            None
        } else {
            let pos = body.len_bits();
            body.write_rl(0);
            Some(pos)
        };

        // H: the object's own handle.
        body.write_h(0, handle);
        // BS 0: end of extended data.
        body.write_bs(0);
        // B: no proxy graphics.
        body.write_bit(false);
        // BB: entity mode.
        body.write_bits(entity_mode as u64, 2);
        if entity_mode == 0 {
            handle_stream.write_h(4, handle.saturating_sub(1));
        }
        // BL: no reactors.
        body.write_bl(0);
        if r2004_plus(version) {
            // B: xdictionary missing.
            body.write_bit(true);
        } else {
            // Pre-AC1018 objects always carry the xdict reference.
            handle_stream.write_h(5, 0);
        }
        if version >= DwgVersion::Ac1027 {
            // B: no data-store data.
            body.write_bit(false);
        }
        if !r2004_plus(version) {
            // B: no prev/next links.
            body.write_bit(true);
        }
        // Entity color: ByLayer.
        if r2004_plus(version) {
            body.write_bs(0x100); // ENC word: index 256, no flag bits
        } else {
            body.write_bs(256);
        }
        // BD: linetype scale.
        body.write_bd(1.0);
        // Layer reference.
        handle_stream.write_h(5, layer);
        // BB: linetype flags (ByLayer).
        body.write_bits(0, 2);
        if version >= DwgVersion::Ac1021 {
            // BB: material flags + RC shadow flags.
            body.write_bits(0, 2);
            body.write_byte(0);
        }
        // BB: plot style flags.
        body.write_bits(0, 2);
        if r2010_plus(version) {
            // B ×3: no visual style overrides.
            body.write_bit(false);
            body.write_bit(false);
            body.write_bit(false);
        }
        // BS: invisibility.
        body.write_bs(0);
        // RC: lineweight (ByLayer).
        body.write_byte(0x1D);

        Self {
            version,
            body,
            rl_pos,
            handle_stream,
        }
    }

    /// Access the body writer for type-specific fields.
    pub fn writer(&mut self) -> &mut BitWriter {
        &mut self.body
    }

    /// Queue a type-specific handle (text style, dimension style, block).
    pub fn add_handle(&mut self, code: u8, value: u64) {
        self.handle_stream.write_h(code, value);
    }

    /// Assemble the record: `MS size | object data | CRC-16`.
    pub fn finish(mut self) -> Vec<u8> {
        let mut data = BitWriter::new();

        if let Some(rl_pos) = self.rl_pos {
            // Pre-AC1024: the RL names the handle stream start, measured
            // from the start of the object data.
            let handle_start = self.body.len_bits();
            self.body.patch_rl(rl_pos, handle_start as u32);
            data.append(&self.body);
            data.append(&self.handle_stream);
        } else {
            // AC1024+: MC handle stream size precedes the object data;
            // a string-stream-present flag bit sits right before the
            // handle stream. Everything must end byte-aligned.
            let handle_bits = self.handle_stream.len_bits();
            assert!(handle_bits < 0x80, "handle stream exceeds 1-byte MC");
            let mc_bits = 8usize;
            let flag_bits = 1usize;
            let content = mc_bits + self.body.len_bits() + flag_bits + handle_bits;
            let padding = (8 - content % 8) % 8;

            data.write_byte(handle_bits as u8); // MC, single byte
            data.append(&self.body);
            for _ in 0..padding {
                data.write_bit(false);
            }
            data.write_bit(false); // no string stream
            data.append(&self.handle_stream);
        }

        let payload = data.finish();
        assert!(payload.len() < 0x8000, "object exceeds single MS group");
        let size = payload.len() as u16;

        let mut record = size.to_le_bytes().to_vec();
        record.extend_from_slice(&payload);
        let crc = crc16(CRC16_SEED, &record);
        record.extend_from_slice(&crc.to_le_bytes());
        record
    }
}

impl ObjectBuilder {
    // -- Type-specific bodies -------------------------------------------

    pub fn line(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        start: (f64, f64, f64),
        end: (f64, f64, f64),
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x13, handle, layer);
        let w = object.writer();
        let z_is_zero = start.2 == 0.0 && end.2 == 0.0;
        w.write_bit(z_is_zero);
        w.write_rd(start.0);
        w.write_dd(end.0, start.0);
        w.write_rd(start.1);
        w.write_dd(end.1, start.1);
        if !z_is_zero {
            w.write_rd(start.2);
            w.write_dd(end.2, start.2);
        }
        w.write_bt(0.0);
        w.write_be((0.0, 0.0, 1.0));
        object.finish()
    }

    pub fn arc(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        center: (f64, f64, f64),
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x11, handle, layer);
        let w = object.writer();
        w.write_3bd(center);
        w.write_bd(radius);
        w.write_bt(0.0);
        w.write_be((0.0, 0.0, 1.0));
        w.write_bd(start_angle);
        w.write_bd(end_angle);
        object.finish()
    }

    pub fn circle(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        center: (f64, f64, f64),
        radius: f64,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x12, handle, layer);
        let w = object.writer();
        w.write_3bd(center);
        w.write_bd(radius);
        w.write_bt(0.0);
        w.write_be((0.0, 0.0, 1.0));
        object.finish()
    }

    pub fn point(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        location: (f64, f64, f64),
        x_axis_angle: f64,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x1B, handle, layer);
        let w = object.writer();
        w.write_3bd(location);
        w.write_bt(0.0);
        w.write_be((0.0, 0.0, 1.0));
        w.write_bd(x_axis_angle);
        object.finish()
    }

    pub fn ellipse(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        center: (f64, f64, f64),
        major_axis: (f64, f64, f64),
        ratio: f64,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x23, handle, layer);
        let w = object.writer();
        w.write_3bd(center);
        w.write_3bd(major_axis);
        w.write_3bd((0.0, 0.0, 1.0));
        w.write_bd(ratio);
        w.write_bd(0.0);
        w.write_bd(std::f64::consts::TAU);
        object.finish()
    }

    pub fn lwpolyline(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        vertices: &[(f64, f64)],
        bulges: Option<&[f64]>,
        closed: bool,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x4D, handle, layer);
        let w = object.writer();

        let mut flags: i16 = 0;
        if bulges.is_some() {
            flags |= 0x10;
        }
        if closed {
            flags |= 0x200;
        }
        w.write_bs(flags);
        w.write_bl(vertices.len() as i32);
        if let Some(bulges) = bulges {
            w.write_bl(bulges.len() as i32);
        }
        if let Some((first, rest)) = vertices.split_first() {
            w.write_2rd(*first);
            let mut previous = *first;
            for &vertex in rest {
                w.write_dd(vertex.0, previous.0);
                w.write_dd(vertex.1, previous.1);
                previous = vertex;
            }
        }
        if let Some(bulges) = bulges {
            for &bulge in bulges {
                w.write_bd(bulge);
            }
        }
        object.finish()
    }

    pub fn text(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        value: &str,
        insertion: (f64, f64),
        height: f64,
        rotation: f64,
        style_handle: u64,
    ) -> Vec<u8> {
        assert!(
            version < DwgVersion::Ac1021,
            "test TEXT builder writes inline strings only"
        );
        let mut object = Self::entity(version, 0x01, handle, layer);
        let w = object.writer();
        // Data flags: elevation zero (1), no alignment (2), no oblique
        // (4), default width (0x10), generation (0x20), halign (0x40),
        // valign (0x80) defaulted; rotation present when nonzero.
        let mut data_flags: u8 = 0x01 | 0x02 | 0x04 | 0x10 | 0x20 | 0x40 | 0x80;
        if rotation == 0.0 {
            data_flags |= 0x08;
        }
        w.write_byte(data_flags);
        w.write_2rd(insertion);
        w.write_be((0.0, 0.0, 1.0));
        w.write_bt(0.0);
        if rotation != 0.0 {
            w.write_rd(rotation);
        }
        w.write_rd(height);
        w.write_tv(value);
        object.add_handle(5, style_handle);
        object.finish()
    }

    pub fn mtext(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        value: &str,
        insertion: (f64, f64, f64),
        rect_width: f64,
        height: f64,
        style_handle: u64,
    ) -> Vec<u8> {
        assert!(
            version < DwgVersion::Ac1021,
            "test MTEXT builder writes inline strings only"
        );
        let mut object = Self::entity(version, 0x2C, handle, layer);
        let w = object.writer();
        w.write_3bd(insertion);
        w.write_3bd((0.0, 0.0, 1.0));
        w.write_3bd((1.0, 0.0, 0.0));
        w.write_bd(rect_width);
        w.write_bd(height);
        w.write_bs(1); // attachment: top left
        w.write_bs(1); // drawing direction: left to right
        w.write_bd(0.0); // extents height
        w.write_bd(0.0); // extents width
        w.write_tv(value);
        w.write_bs(1); // line spacing style
        w.write_bd(1.0); // line spacing factor
        w.write_bit(false); // unknown bit
        if r2004_plus(version) {
            w.write_bl(0); // no background fill
        }
        object.add_handle(5, style_handle);
        object.finish()
    }

    pub fn insert(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        insertion: (f64, f64, f64),
        rotation: f64,
        block_handle: u64,
    ) -> Vec<u8> {
        let mut object = Self::entity(version, 0x07, handle, layer);
        let w = object.writer();
        w.write_3bd(insertion);
        w.write_bits(0b11, 2); // unit scale
        w.write_bd(rotation);
        w.write_3bd((0.0, 0.0, 1.0));
        w.write_bit(false); // no attributes
        object.add_handle(5, block_handle);
        object.finish()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn dim_linear(
        version: DwgVersion,
        handle: u64,
        layer: u64,
        text_midpoint: (f64, f64),
        first: (f64, f64, f64),
        second: (f64, f64, f64),
        definition: (f64, f64, f64),
        rotation: f64,
        dimstyle: u64,
        block: u64,
    ) -> Vec<u8> {
        assert!(
            version < DwgVersion::Ac1021,
            "test DIMENSION builder writes inline strings only"
        );
        let mut object = Self::entity(version, 0x15, handle, layer);
        let w = object.writer();
        w.write_3bd((0.0, 0.0, 1.0)); // extrusion
        w.write_2rd(text_midpoint);
        w.write_bd(0.0); // elevation
        w.write_byte(0); // dimension flags
        w.write_tv(""); // measured text
        w.write_bd(0.0); // text rotation
        w.write_bd(0.0); // horizontal direction
        w.write_3bd((1.0, 1.0, 1.0)); // insert scale
        w.write_bd(0.0); // insert rotation
        w.write_bs(5); // attachment: middle center
        w.write_bs(1); // line spacing style
        w.write_bd(1.0); // line spacing factor
        w.write_bd(0.0); // actual measurement
        w.write_bit(false); // unknown
        w.write_bit(false); // flip arrow 1
        w.write_bit(false); // flip arrow 2
        w.write_2rd((0.0, 0.0)); // insertion point
        w.write_3bd(first);
        w.write_3bd(second);
        w.write_3bd(definition);
        w.write_bd(0.0); // extension line rotation
        w.write_bd(rotation);
        object.add_handle(5, dimstyle);
        object.add_handle(5, block);
        object.finish()
    }

    /// An entity with a fixed code outside the supported set (a SPLINE
    /// prologue with no body). Decodes to an UNSUPPORTED placeholder.
    pub fn unsupported_entity(version: DwgVersion, handle: u64, layer: u64) -> Vec<u8> {
        Self::entity(version, 0x24, handle, layer).finish()
    }
}

// ---------------------------------------------------------------------------
// Object map encoding
// ---------------------------------------------------------------------------

fn encode_unsigned_mc(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            out.push(byte | 0x80);
        } else {
            out.push(byte);
            return;
        }
    }
}

fn encode_signed_mc(value: i64, out: &mut Vec<u8>) {
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    loop {
        if magnitude < 0x40 {
            let mut byte = magnitude as u8;
            if negative {
                byte |= 0x40;
            }
            out.push(byte);
            return;
        }
        out.push(((magnitude & 0x7F) as u8) | 0x80);
        magnitude >>= 7;
    }
}

/// Encode the handles section for (handle, offset) pairs in order.
pub fn build_handles_section(entries: &[(u64, u64)]) -> Vec<u8> {
    let mut payload = Vec::new();
    let mut last_handle = 0u64;
    let mut last_offset = 0i64;
    for &(handle, offset) in entries {
        encode_unsigned_mc(handle - last_handle, &mut payload);
        encode_signed_mc(offset as i64 - last_offset, &mut payload);
        last_handle = handle;
        last_offset = offset as i64;
    }

    let mut section = Vec::new();
    if !entries.is_empty() {
        let size = (payload.len() + 2) as u16;
        section.extend_from_slice(&size.to_be_bytes());
        section.extend_from_slice(&payload);
        let crc = crc16(CRC16_SEED, &section);
        section.extend_from_slice(&crc.to_be_bytes());
    }
    // Terminating empty subsection.
    section.extend_from_slice(&[0x00, 0x02]);
    section
}

// ---------------------------------------------------------------------------
// AC1015 file assembly
// ---------------------------------------------------------------------------

/// Assemble a minimal AC1015 file from object records.
///
/// Layout: fixed header + locator (one record for the object map),
/// object records, then the handles section.
pub fn build_ac1015_file(objects: &[(u64, Vec<u8>)]) -> Vec<u8> {
    const SENTINEL: [u8; 16] = [
        0x95, 0xA0, 0x4E, 0x28, 0x99, 0x82, 0x1A, 0xE5, 0x5E, 0x41, 0xE0, 0x5F, 0x9D, 0x3A,
        0x4D, 0x00,
    ];

    // 6 magic + 7 padding + 4 preview + 2 unknown + 2 codepage +
    // 4 record count + 9 per record + 2 crc + 16 sentinel.
    let header_len = 6 + 7 + 4 + 2 + 2 + 4 + 9 + 2 + 16;

    let mut offsets = Vec::with_capacity(objects.len());
    let mut objects_blob = Vec::new();
    for (handle, record) in objects {
        offsets.push((*handle, (header_len + objects_blob.len()) as u64));
        objects_blob.extend_from_slice(record);
    }

    let handles = build_handles_section(&offsets);
    let handles_offset = header_len + objects_blob.len();

    let mut file = Vec::new();
    file.extend_from_slice(b"AC1015");
    file.extend_from_slice(&[0u8; 7]);
    file.extend_from_slice(&0i32.to_le_bytes()); // preview address
    file.extend_from_slice(&[0u8; 2]);
    file.extend_from_slice(&30u16.to_le_bytes()); // code page
    file.extend_from_slice(&1i32.to_le_bytes()); // locator record count
    file.push(2); // record 2: object map
    file.extend_from_slice(&(handles_offset as i32).to_le_bytes());
    file.extend_from_slice(&(handles.len() as i32).to_le_bytes());
    file.extend_from_slice(&0u16.to_le_bytes()); // header CRC (unvalidated)
    file.extend_from_slice(&SENTINEL);
    assert_eq!(file.len(), header_len);

    file.extend_from_slice(&objects_blob);
    file.extend_from_slice(&handles);
    file
}

// ---------------------------------------------------------------------------
// AC1018-family paged file assembly
// ---------------------------------------------------------------------------

const PAGE_TYPE_DATA: u32 = 0x4163043B;
const PAGE_TYPE_PAGE_MAP: u32 = 0x41630E3B;
const PAGE_TYPE_SECTION_MAP: u32 = 0x4163003B;
const DECRYPTION_MASK: u32 = 0x4164536B;

/// Encode data as a literal-only LZ77 AC18 stream.
pub fn lz77_literals(data: &[u8]) -> Vec<u8> {
    assert!(data.len() >= 4, "literal form needs at least 4 bytes");
    let mut out = Vec::new();
    let count = data.len() as i64 - 3;
    if count <= 0x0F {
        out.push(count as u8);
    } else {
        out.push(0x00);
        let mut rest = count - 0x0F;
        while rest > 0xFF {
            out.push(0x00);
            rest -= 0xFF;
        }
        out.push(rest as u8);
    }
    out.extend_from_slice(data);
    out.push(0x11);
    out
}

fn lz77_literal_len(data_len: usize) -> usize {
    let count = data_len as i64 - 3;
    let header = if count <= 0x0F {
        1
    } else {
        let mut rest = count - 0x0F;
        let mut zeros = 1;
        while rest > 0xFF {
            zeros += 1;
            rest -= 0xFF;
        }
        zeros + 1
    };
    header + data_len + 1
}

fn system_page(magic: u32, content: &[u8]) -> Vec<u8> {
    let compressed = lz77_literals(content);
    let mut page = Vec::new();
    page.extend_from_slice(&magic.to_le_bytes());
    page.extend_from_slice(&(content.len() as u32).to_le_bytes());
    page.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    page.extend_from_slice(&2u32.to_le_bytes()); // compression type
    page.extend_from_slice(&0u32.to_le_bytes()); // checksum (unvalidated)
    page.extend_from_slice(&compressed);
    page
}

fn system_page_len(content_len: usize) -> usize {
    0x14 + lz77_literal_len(content_len)
}

struct DataPage {
    id: u32,
    start_offset: u64,
    compressed: Vec<u8>,
    data_checksum: u32,
}

fn split_into_pages(content: &[u8], page_size: usize, first_id: u32) -> Vec<DataPage> {
    let mut pages = Vec::new();
    let mut offset = 0usize;
    let mut id = first_id;
    while offset < content.len() {
        let end = (offset + page_size).min(content.len());
        let chunk = &content[offset..end];
        let compressed = lz77_literals(chunk);
        let data_checksum = section_page_checksum(0, &compressed);
        pages.push(DataPage {
            id,
            start_offset: offset as u64,
            compressed,
            data_checksum,
        });
        offset = end;
        id += 1;
    }
    pages
}

/// Description of an assembled paged file, for corruption tests.
pub struct PagedFile {
    pub bytes: Vec<u8>,
    /// File offset of the first objects-section page payload byte
    pub first_objects_payload: usize,
}

/// Assemble a paged (AC1018/AC1024/AC1027) file with AcDb:Handles and
/// AcDb:AcDbObjects sections. `page_size` bounds the decompressed bytes
/// per data page, so small values force multi-page sections.
pub fn build_paged_file(
    version: DwgVersion,
    objects: &[(u64, Vec<u8>)],
    page_size: usize,
) -> PagedFile {
    let magic = version.as_str().as_bytes();
    assert!(r2004_plus(version) && version != DwgVersion::Ac1021);

    // Section contents: object offsets are relative to the assembled
    // objects stream.
    let mut offsets = Vec::with_capacity(objects.len());
    let mut objects_blob = Vec::new();
    for (handle, record) in objects {
        offsets.push((*handle, objects_blob.len() as u64));
        objects_blob.extend_from_slice(record);
    }
    let mut handles_blob = build_handles_section(&offsets);

    // The literal LZ77 form cannot express runs under 4 bytes, so pad
    // the blobs until no page chunk would end up that short. Trailing
    // zeros are dead bytes to both section parsers.
    for blob in [&mut objects_blob, &mut handles_blob] {
        while blob.len() % page_size != 0 && blob.len() % page_size < 4 {
            blob.push(0);
        }
    }

    const PAGE_MAP_ID: u32 = 1;
    const SECTION_MAP_ID: u32 = 2;
    let handles_pages = split_into_pages(&handles_blob, page_size, 3);
    let objects_first_id = 3 + handles_pages.len() as u32;
    let objects_pages = split_into_pages(&objects_blob, page_size, objects_first_id);

    // Section map content.
    let mut section_map = Vec::new();
    section_map.extend_from_slice(&2u32.to_le_bytes()); // descriptor count
    section_map.extend_from_slice(&2u32.to_le_bytes());
    section_map.extend_from_slice(&0x7400u32.to_le_bytes());
    section_map.extend_from_slice(&0u32.to_le_bytes());
    section_map.extend_from_slice(&2u32.to_le_bytes());

    let mut write_descriptor =
        |map: &mut Vec<u8>, name: &str, total: usize, pages: &[DataPage], section_id: u32| {
            map.extend_from_slice(&(total as u64).to_le_bytes());
            map.extend_from_slice(&(pages.len() as u32).to_le_bytes());
            map.extend_from_slice(&(page_size as u32).to_le_bytes());
            map.extend_from_slice(&0u32.to_le_bytes()); // unknown
            map.extend_from_slice(&2u32.to_le_bytes()); // compressed
            map.extend_from_slice(&section_id.to_le_bytes());
            map.extend_from_slice(&0u32.to_le_bytes()); // not encrypted
            let mut name_bytes = [0u8; 64];
            name_bytes[..name.len()].copy_from_slice(name.as_bytes());
            map.extend_from_slice(&name_bytes);
            for page in pages {
                map.extend_from_slice(&page.id.to_le_bytes());
                map.extend_from_slice(&(page.compressed.len() as u32).to_le_bytes());
                map.extend_from_slice(&page.start_offset.to_le_bytes());
            }
        };

    write_descriptor(
        &mut section_map,
        "AcDb:Handles",
        handles_blob.len(),
        &handles_pages,
        1,
    );
    write_descriptor(
        &mut section_map,
        "AcDb:AcDbObjects",
        objects_blob.len(),
        &objects_pages,
        2,
    );

    // Page map content: every page in file order.
    let page_map_entries = 2 + handles_pages.len() + objects_pages.len();
    let page_map_content_len = page_map_entries * 8;
    let page_map_page_len = system_page_len(page_map_content_len);
    let section_map_page_len = system_page_len(section_map.len());

    let mut page_map = Vec::new();
    let mut push_entry = |map: &mut Vec<u8>, id: u32, size: usize| {
        map.extend_from_slice(&(id as i32).to_le_bytes());
        map.extend_from_slice(&(size as u32).to_le_bytes());
    };
    push_entry(&mut page_map, PAGE_MAP_ID, page_map_page_len);
    push_entry(&mut page_map, SECTION_MAP_ID, section_map_page_len);
    for page in handles_pages.iter().chain(objects_pages.iter()) {
        push_entry(&mut page_map, page.id, 32 + page.compressed.len());
    }
    assert_eq!(page_map.len(), page_map_content_len);

    // File assembly.
    let mut file = Vec::new();
    file.extend_from_slice(magic);
    file.resize(0x80, 0);

    // Encrypted metadata block: page/section map pointers at 0x50.
    let mut metadata = vec![0u8; 0x6C];
    metadata[0x50..0x54].copy_from_slice(&PAGE_MAP_ID.to_le_bytes());
    metadata[0x54..0x5C].copy_from_slice(&0u64.to_le_bytes()); // map at 0x100
    metadata[0x5C..0x60].copy_from_slice(&SECTION_MAP_ID.to_le_bytes());
    metadata[0x60..0x64].copy_from_slice(&(page_map_entries as u32).to_le_bytes());
    metadata[0x64..0x68].copy_from_slice(&0u32.to_le_bytes());
    // The XOR mask is an involution, so "decrypting" plaintext encrypts it.
    file.extend_from_slice(&encryption::decrypt_metadata_block(&metadata));
    file.resize(0x100, 0);

    file.extend_from_slice(&system_page(PAGE_TYPE_PAGE_MAP, &page_map));
    file.extend_from_slice(&system_page(PAGE_TYPE_SECTION_MAP, &section_map));

    let mut first_objects_payload = 0usize;
    for (section_number, pages) in [(1u32, &handles_pages), (2u32, &objects_pages)] {
        for page in pages.iter() {
            let address = file.len() as u64;
            let words = [
                PAGE_TYPE_DATA,
                section_number,
                page.compressed.len() as u32,
                page_size as u32,
                page.start_offset as u32,
                (page.start_offset >> 32) as u32,
                0, // header checksum (unvalidated)
                page.data_checksum,
            ];
            let mask = DECRYPTION_MASK ^ (address as u32);
            for word in words {
                file.extend_from_slice(&(word ^ mask).to_le_bytes());
            }
            if section_number == 2 && first_objects_payload == 0 {
                first_objects_payload = file.len();
            }
            file.extend_from_slice(&page.compressed);
        }
    }

    PagedFile {
        bytes: file,
        first_objects_payload,
    }
}

/// Write bytes to a fresh temp file and return its path.
pub fn write_temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("dwgread-test-{}-{name}", std::process::id()));
    std::fs::write(&path, bytes).expect("write temp file");
    path
}
