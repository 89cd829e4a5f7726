//! Document model and query surface.
//!
//! A [`Document`] is built in one pass by the DWG reader and frozen before
//! being handed out. Entities keep their on-disk order; layouts group them
//! by the entity-mode bits of the common header. The query surface
//! normalizes geometry to the public convention: angles in degrees in
//! [0, 360), coordinates as 3D doubles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entities::{DimensionKind, EntityRecord};
use crate::notification::Notification;
use crate::types::{Color, DwgVersion, Handle, Vector2, Vector3};

/// Name of the always-present model space layout.
pub const MODEL_LAYOUT: &str = "Model";
/// Name of the paper space layout, created when paper-space entities exist.
pub const PAPER_LAYOUT: &str = "Paper";

/// A LAYER table entry, kept so entity layer handles resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub handle: Handle,
    pub name: String,
    pub color: Color,
    /// Packed layer flags word (frozen/locked bits plus the color sign)
    pub flags: i16,
    pub linetype_handle: Handle,
}

/// A decoded drawing.
#[derive(Debug)]
pub struct Document {
    /// Version of the source file
    pub version: DwgVersion,
    /// Version actually decoded (differs when the downgrade shim ran)
    pub decode_version: DwgVersion,
    /// Every decoded entity, keyed by handle, in on-disk order
    pub entities_by_handle: IndexMap<Handle, EntityRecord>,
    /// Layer symbol table
    pub layers: IndexMap<Handle, LayerRecord>,
    /// Decode warnings
    pub notifications: Vec<Notification>,
    layout_members: IndexMap<String, Vec<Handle>>,
}

impl Document {
    /// Create an empty document; the model layout always exists.
    pub fn new(version: DwgVersion, decode_version: DwgVersion) -> Self {
        let mut layout_members = IndexMap::new();
        layout_members.insert(MODEL_LAYOUT.to_string(), Vec::new());
        Self {
            version,
            decode_version,
            entities_by_handle: IndexMap::new(),
            layers: IndexMap::new(),
            notifications: Vec::new(),
            layout_members,
        }
    }

    /// Insert a decoded entity, grouping it into a layout by its mode.
    pub fn insert_entity(&mut self, record: EntityRecord) {
        let handle = record.handle();
        let layout = match record.entity_mode() {
            Some(2) => Some(MODEL_LAYOUT),
            Some(1) => Some(PAPER_LAYOUT),
            _ => None,
        };
        if let Some(name) = layout {
            self.layout_members
                .entry(name.to_string())
                .or_default()
                .push(handle);
        }
        self.entities_by_handle.insert(handle, record);
    }

    /// Insert a layer table entry.
    pub fn insert_layer(&mut self, layer: LayerRecord) {
        self.layers.insert(layer.handle, layer);
    }

    /// The model space layout.
    pub fn modelspace(&self) -> Layout<'_> {
        self.layout(MODEL_LAYOUT)
            .expect("model layout always exists")
    }

    /// A layout by name, if present.
    pub fn layout(&self, name: &str) -> Option<Layout<'_>> {
        let (name, handles) = self.layout_members.get_key_value(name)?;
        Some(Layout {
            doc: self,
            name: name.as_str(),
            handles: handles.as_slice(),
        })
    }

    /// Names of the layouts present in this document.
    pub fn layout_names(&self) -> impl Iterator<Item = &str> {
        self.layout_members.keys().map(String::as_str)
    }

    /// Every entity in on-disk order, regardless of layout.
    pub fn entities(&self) -> impl Iterator<Item = Entity<'_>> {
        self.entities_by_handle.values().map(|record| Entity { record })
    }

    /// Resolve a layer handle against the symbol table.
    pub fn layer(&self, handle: Handle) -> Option<&LayerRecord> {
        self.layers.get(&handle)
    }
}

/// A named group of entities (model space or a paper space).
#[derive(Clone, Copy)]
pub struct Layout<'a> {
    doc: &'a Document,
    name: &'a str,
    handles: &'a [Handle],
}

impl<'a> Layout<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// All entities of this layout, in source order.
    pub fn iter(self) -> impl Iterator<Item = Entity<'a>> + 'a {
        let doc = self.doc;
        let handles: &'a [Handle] = self.handles;
        handles.iter().filter_map(move |handle| {
            doc.entities_by_handle
                .get(handle)
                .map(|record| Entity { record })
        })
    }

    /// Filter entities by type.
    ///
    /// `type_spec` is `*` (everything) or a whitespace/comma separated
    /// list of type names (`"LINE ARC"`). Unknown names select nothing.
    /// Filtering preserves source order.
    pub fn query(self, type_spec: &str) -> impl Iterator<Item = Entity<'a>> + 'a {
        let filter = TypeFilter::parse(type_spec);
        self.iter().filter(move |entity| filter.matches(entity.dxftype()))
    }
}

/// Parsed query filter over entity type names.
#[derive(Debug, Clone)]
enum TypeFilter {
    All,
    Names(Vec<String>),
}

impl TypeFilter {
    fn parse(spec: &str) -> Self {
        let mut names = Vec::new();
        for token in spec.split([' ', '\t', ',']) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if token == "*" || token.eq_ignore_ascii_case("all") {
                return TypeFilter::All;
            }
            names.push(token.to_ascii_uppercase());
        }
        if names.is_empty() {
            TypeFilter::All
        } else {
            TypeFilter::Names(names)
        }
    }

    fn matches(&self, dxftype: &str) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Names(names) => names.iter().any(|n| n == dxftype),
        }
    }
}

/// One entity as seen through the query surface.
#[derive(Clone, Copy)]
pub struct Entity<'a> {
    record: &'a EntityRecord,
}

impl<'a> Entity<'a> {
    pub fn new(record: &'a EntityRecord) -> Self {
        Self { record }
    }

    /// The DXF type name (`"LINE"`, `"ARC"`, …).
    pub fn dxftype(&self) -> &'static str {
        self.record.dxftype()
    }

    pub fn handle(&self) -> Handle {
        self.record.handle()
    }

    /// The underlying raw record (angles in radians, as read).
    pub fn record(&self) -> &'a EntityRecord {
        self.record
    }

    /// Attribute map with the normalized public convention: angles in
    /// degrees in [0, 360), coordinates as 3D doubles.
    pub fn dxf(&self) -> DxfAttributes {
        let mut map = DxfAttributes::new();
        match self.record {
            EntityRecord::Line(e) => {
                map.set("start", DxfValue::point(e.start));
                map.set("end", DxfValue::point(e.end));
                map.set("thickness", DxfValue::Float(e.thickness));
                map.set("extrusion", DxfValue::point(e.normal));
            }
            EntityRecord::Arc(e) => {
                map.set("center", DxfValue::point(e.center));
                map.set("radius", DxfValue::Float(e.radius));
                map.set("start_angle", DxfValue::Float(degrees(e.start_angle)));
                map.set("end_angle", DxfValue::Float(degrees(e.end_angle)));
                map.set("thickness", DxfValue::Float(e.thickness));
                map.set("extrusion", DxfValue::point(e.normal));
            }
            EntityRecord::Circle(e) => {
                map.set("center", DxfValue::point(e.center));
                map.set("radius", DxfValue::Float(e.radius));
                map.set("thickness", DxfValue::Float(e.thickness));
                map.set("extrusion", DxfValue::point(e.normal));
            }
            EntityRecord::Point(e) => {
                map.set("location", DxfValue::point(e.location));
                map.set("x_axis_angle", DxfValue::Float(degrees(e.x_axis_angle)));
                map.set("thickness", DxfValue::Float(e.thickness));
                map.set("extrusion", DxfValue::point(e.normal));
            }
            EntityRecord::Ellipse(e) => {
                map.set("center", DxfValue::point(e.center));
                map.set("major_axis", DxfValue::point(e.major_axis));
                map.set("extrusion", DxfValue::point(e.normal));
                map.set("axis_ratio", DxfValue::Float(e.minor_axis_ratio));
                map.set("start_param", DxfValue::Float(e.start_parameter));
                map.set("end_param", DxfValue::Float(e.end_parameter));
            }
            EntityRecord::LwPolyline(e) => {
                let elevation = e.elevation.unwrap_or(0.0);
                let points: Vec<Vector3> = e
                    .vertices
                    .iter()
                    .map(|v| Vector3::new(v.x, v.y, elevation))
                    .collect();
                map.set("points", DxfValue::points(&points));
                map.set("count", DxfValue::Int(e.vertices.len() as i64));
                map.set("flags", DxfValue::Int(e.flags as i64));
                map.set("closed", DxfValue::Bool(e.is_closed()));
                if !e.bulges.is_empty() {
                    map.set("bulges", DxfValue::Floats(e.bulges.clone()));
                }
                if let Some(width) = e.const_width {
                    map.set("const_width", DxfValue::Float(width));
                }
            }
            EntityRecord::Text(e) => {
                map.set("text", DxfValue::Text(e.value.clone()));
                map.set("insert", DxfValue::point(e.insertion));
                map.set(
                    "align_point",
                    e.alignment.map(DxfValue::point).unwrap_or(DxfValue::Null),
                );
                map.set("extrusion", DxfValue::point(e.normal));
                map.set("thickness", DxfValue::Float(e.thickness));
                map.set("height", DxfValue::Float(e.height));
                map.set("rotation", DxfValue::Float(degrees(e.rotation)));
                map.set("oblique", DxfValue::Float(degrees(e.oblique_angle)));
                map.set("width", DxfValue::Float(e.width_factor));
                map.set("text_generation_flag", DxfValue::Int(e.generation as i64));
                map.set("halign", DxfValue::Int(e.horizontal_alignment as i64));
                map.set("valign", DxfValue::Int(e.vertical_alignment as i64));
                map.set("style_handle", DxfValue::Handle(e.style_handle));
            }
            EntityRecord::MText(e) => {
                map.set("text", DxfValue::Text(e.plain_text()));
                map.set("raw_text", DxfValue::Text(e.value.clone()));
                map.set("insert", DxfValue::point(e.insertion));
                map.set("extrusion", DxfValue::point(e.normal));
                map.set("text_direction", DxfValue::point(e.direction));
                map.set("rotation", DxfValue::Float(degrees(e.rotation())));
                map.set("rect_width", DxfValue::Float(e.rect_width));
                map.set("char_height", DxfValue::Float(e.height));
                map.set("attachment_point", DxfValue::Int(e.attachment as i64));
                map.set("drawing_direction", DxfValue::Int(e.drawing_direction as i64));
                map.set(
                    "line_spacing_factor",
                    DxfValue::Float(e.line_spacing_factor),
                );
                map.set("style_handle", DxfValue::Handle(e.style_handle));
            }
            EntityRecord::Dimension(e) => {
                map.set("dimtype", DxfValue::Text(e.kind.name().to_string()));
                map.set(
                    "text_midpoint",
                    DxfValue::point(lift(e.dim.text_midpoint, e.dim.elevation)),
                );
                map.set(
                    "insert",
                    DxfValue::point(lift(e.dim.insertion, e.dim.elevation)),
                );
                map.set("extrusion", DxfValue::point(e.dim.normal));
                map.set("text", DxfValue::Text(e.dim.text.clone()));
                map.set("text_rotation", DxfValue::Float(degrees(e.dim.text_rotation)));
                map.set(
                    "horizontal_direction",
                    DxfValue::Float(degrees(e.dim.horizontal_direction)),
                );
                map.set("insert_scale", DxfValue::point(e.dim.insert_scale));
                map.set(
                    "insert_rotation",
                    DxfValue::Float(degrees(e.dim.insert_rotation)),
                );
                map.set("dim_flags", DxfValue::Int(e.dim.flags as i64));
                map.set(
                    "actual_measurement",
                    DxfValue::Float(e.dim.actual_measurement),
                );
                map.set(
                    "attachment_point",
                    DxfValue::Int(e.dim.attachment_point as i64),
                );
                map.set(
                    "line_spacing_factor",
                    DxfValue::Float(e.dim.line_spacing_factor),
                );
                map.set("dimstyle_handle", DxfValue::Handle(e.dim.dimstyle_handle));
                map.set(
                    "anonymous_block_handle",
                    DxfValue::Handle(e.dim.block_handle),
                );
                match &e.kind {
                    DimensionKind::Linear {
                        first_point,
                        second_point,
                        definition_point,
                        rotation,
                        ext_line_rotation,
                    } => {
                        map.set("defpoint", DxfValue::point(*definition_point));
                        map.set("defpoint2", DxfValue::point(*first_point));
                        map.set("defpoint3", DxfValue::point(*second_point));
                        map.set("angle", DxfValue::Float(degrees(*rotation)));
                        map.set(
                            "oblique_angle",
                            DxfValue::Float(degrees(*ext_line_rotation)),
                        );
                    }
                    DimensionKind::Radius {
                        definition_point,
                        chord_point,
                        leader_length,
                    }
                    | DimensionKind::Diameter {
                        definition_point,
                        chord_point,
                        leader_length,
                    } => {
                        map.set("defpoint", DxfValue::point(*definition_point));
                        map.set("defpoint4", DxfValue::point(*chord_point));
                        map.set("leader_length", DxfValue::Float(*leader_length));
                    }
                }
            }
            EntityRecord::Insert(e) => {
                map.set("insert", DxfValue::point(e.insertion));
                map.set("xscale", DxfValue::Float(e.x_scale));
                map.set("yscale", DxfValue::Float(e.y_scale));
                map.set("zscale", DxfValue::Float(e.z_scale));
                map.set("rotation", DxfValue::Float(degrees(e.rotation)));
                map.set("extrusion", DxfValue::point(e.normal));
                map.set("block_handle", DxfValue::Handle(e.block_handle));
            }
            EntityRecord::Unsupported(e) => {
                map.set("raw_type", DxfValue::Int(e.raw_type as i64));
                map.set(
                    "dxf_name",
                    e.dxf_name
                        .clone()
                        .map(DxfValue::Text)
                        .unwrap_or(DxfValue::Null),
                );
            }
        }

        if let Some(common) = self.record.common() {
            map.set(
                "color_index",
                common
                    .color
                    .index()
                    .map(|i| DxfValue::Int(i as i64))
                    .unwrap_or(DxfValue::Null),
            );
            map.set(
                "true_color",
                common
                    .color
                    .true_color()
                    .map(|c| DxfValue::Int(c as i64))
                    .unwrap_or(DxfValue::Null),
            );
            // A zero layer handle stays unresolved; callers pick defaults.
            map.set(
                "layer_handle",
                if common.layer_handle.is_null() {
                    DxfValue::Null
                } else {
                    DxfValue::Handle(common.layer_handle)
                },
            );
        }

        map
    }
}

/// Convert radians to degrees normalized to [0, 360).
pub fn degrees(radians: f64) -> f64 {
    let deg = radians.to_degrees() % 360.0;
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

fn lift(point: Vector2, elevation: f64) -> Vector3 {
    Vector3::new(point.x, point.y, elevation)
}

/// A single normalized attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DxfValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Point([f64; 3]),
    Points(Vec<[f64; 3]>),
    Floats(Vec<f64>),
    Handle(Handle),
}

impl DxfValue {
    fn point(v: Vector3) -> Self {
        DxfValue::Point([v.x, v.y, v.z])
    }

    fn points(vs: &[Vector3]) -> Self {
        DxfValue::Points(vs.iter().map(|v| [v.x, v.y, v.z]).collect())
    }

    /// The value as a float, when it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DxfValue::Float(f) => Some(*f),
            DxfValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The value as a 3D point, when it is one.
    pub fn as_point(&self) -> Option<(f64, f64, f64)> {
        match self {
            DxfValue::Point([x, y, z]) => Some((*x, *y, *z)),
            _ => None,
        }
    }

    /// The value as text, when it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DxfValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered attribute name → value map.
#[derive(Debug, Clone, Default)]
pub struct DxfAttributes {
    values: IndexMap<&'static str, DxfValue>,
}

impl DxfAttributes {
    fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, key: &'static str, value: DxfValue) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&DxfValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DxfValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
